//! Shared application state for all routes. Holds the store only; each request builds its own context.

use crate::context::SchoolContext;
use crate::store::SchoolStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SchoolStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn SchoolStore>) -> Self {
        AppState { store }
    }

    /// Fresh data context scoped to one request.
    pub fn context(&self) -> SchoolContext {
        SchoolContext::new(self.store.clone())
    }
}
