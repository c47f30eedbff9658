use crate::model_service::ModelService;
use std::sync::Arc;

#[derive(Clone)]
pub struct SharedState {
    pub model_service: Arc<dyn ModelService>,
}

impl SharedState {
    pub fn new(model_service: impl ModelService) -> Self {
        Self {
            model_service: Arc::new(model_service),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model_service.model_name()
    }
}
