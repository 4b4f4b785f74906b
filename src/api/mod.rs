pub mod database_update;

use std::sync::{Arc, Mutex};

use crate::migration::UpdateEngine;

/// Shared application state passed to all Axum handlers via `.with_state()`.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<UpdateEngine>>,
}

impl AppState {
    pub fn new(engine: UpdateEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }
}
