//! Template engine boundary.
//!
//! Pipelines never build response bodies themselves; they hand a `View` to
//! whatever `ViewEngine` the application was wired with.

pub mod json;

pub use json::JsonViewEngine;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Failed to serialize view data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything a template needs: which template, page identifier, title, data
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub template: &'static str,
    pub page: &'static str,
    pub title: &'static str,
    pub data: Map<String, Value>,
}

impl View {
    pub fn new(template: &'static str, page: &'static str, title: &'static str) -> Self {
        Self {
            template,
            page,
            title,
            data: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }
}

/// Final body produced by a view engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub content_type: &'static str,
    pub body: String,
}

pub trait ViewEngine: Send + Sync {
    fn render(&self, view: &View) -> Result<Rendered, ViewError>;
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}
