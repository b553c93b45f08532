// Discussion resource: actions, redirect and page stages, and their wiring

pub mod actions;
pub mod pages;
pub mod params;
pub mod redirect;
pub mod routes;

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::database::store::DiscussionStore;
use crate::pipeline::Pipeline;
use crate::types::Action;
use crate::views::ViewEngine;

use actions::{
    CreateDiscussion, DeleteDiscussion, EditDiscussion, ListDiscussions, ShowDiscussion, UpdateDiscussion,
    ViewIncrement,
};
use pages::{Page, RenderPage};
use redirect::RedirectView;

/// One fixed pipeline per action, built once at startup
pub struct DiscussionPipelines {
    pub new: Pipeline,
    pub create: Pipeline,
    pub index: Pipeline,
    pub show: Pipeline,
    pub edit: Pipeline,
    pub update: Pipeline,
    pub delete: Pipeline,
}

impl DiscussionPipelines {
    pub fn new(store: Arc<dyn DiscussionStore>, engine: Arc<dyn ViewEngine>, config: &PipelineConfig) -> Self {
        let list_path = config.list_path.as_str();
        let increment = if config.await_view_increment {
            ViewIncrement::Awaited
        } else {
            ViewIncrement::Detached
        };

        Self {
            new: Pipeline::new(Action::New).stage(RenderPage::new(Page::New, engine.clone())),
            create: Pipeline::new(Action::Create)
                .stage(CreateDiscussion::new(store.clone(), list_path))
                .stage(RedirectView),
            index: Pipeline::new(Action::Index)
                .stage(ListDiscussions::new(store.clone()))
                .stage(RenderPage::new(Page::Index, engine.clone())),
            show: Pipeline::new(Action::Show)
                .stage(ShowDiscussion::new(store.clone(), increment))
                .stage(RenderPage::new(Page::Show, engine.clone())),
            edit: Pipeline::new(Action::Edit).stage(EditDiscussion::new(store.clone(), engine)),
            update: Pipeline::new(Action::Update)
                .stage(UpdateDiscussion::new(store.clone(), list_path))
                .stage(RedirectView),
            delete: Pipeline::new(Action::Delete)
                .stage(DeleteDiscussion::new(store, list_path, config.surface_delete_errors))
                .stage(RedirectView),
        }
    }

    pub fn get(&self, action: Action) -> &Pipeline {
        match action {
            Action::New => &self.new,
            Action::Create => &self.create,
            Action::Index => &self.index,
            Action::Show => &self.show,
            Action::Edit => &self.edit,
            Action::Update => &self.update,
            Action::Delete => &self.delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::views::JsonViewEngine;

    #[test]
    fn wires_each_action_to_its_stages() {
        let pipelines = DiscussionPipelines::new(
            Arc::new(MemoryStore::new()),
            Arc::new(JsonViewEngine::new()),
            &PipelineConfig::default(),
        );

        assert_eq!(pipelines.get(Action::New).stage_names(), vec!["NewView"]);
        assert_eq!(pipelines.get(Action::Create).stage_names(), vec!["CreateDiscussion", "RedirectView"]);
        assert_eq!(pipelines.get(Action::Index).stage_names(), vec!["ListDiscussions", "IndexView"]);
        assert_eq!(pipelines.get(Action::Show).stage_names(), vec!["ShowDiscussion", "ShowView"]);
        assert_eq!(pipelines.get(Action::Edit).stage_names(), vec!["EditDiscussion"]);
        assert_eq!(pipelines.get(Action::Update).stage_names(), vec!["UpdateDiscussion", "RedirectView"]);
        assert_eq!(pipelines.get(Action::Delete).stage_names(), vec!["DeleteDiscussion", "RedirectView"]);

        for action in [Action::Create, Action::Update, Action::Delete] {
            assert_eq!(pipelines.get(action).stage_names().last(), Some(&"RedirectView"));
        }
    }
}
