use serde_json::json;

use super::{Rendered, View, ViewEngine, ViewError};

/// Renders every page as the standard JSON success envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonViewEngine {
    pretty: bool,
}

impl JsonViewEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ViewEngine for JsonViewEngine {
    fn render(&self, view: &View) -> Result<Rendered, ViewError> {
        let envelope = json!({
            "success": true,
            "template": view.template,
            "page": view.page,
            "title": view.title,
            "data": view.data,
        });

        let body = if self.pretty {
            serde_json::to_string_pretty(&envelope)?
        } else {
            serde_json::to_string(&envelope)?
        };

        Ok(Rendered {
            content_type: "application/json",
            body,
        })
    }
}
