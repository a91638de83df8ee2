//! HTTP API for hanzi-helper
//!
//! Channel webhook plus read-only catalog, session inspection and practice
//! endpoints.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::config::AppConfig;
use crate::db::Database;
use crate::practice::PracticeService;
use crate::runtime::{DatabaseStorage, ProductionRuntime};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ProductionRuntime>,
    pub practice: Arc<PracticeService<Database>>,
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database, config: &AppConfig) -> Self {
        let storage = DatabaseStorage::new(db.clone());
        Self {
            runtime: Arc::new(ProductionRuntime::new(
                config.dialog.clone(),
                storage.clone(),
                storage,
            )),
            practice: Arc::new(PracticeService::new(db.clone(), config.practice_ttl)),
            db,
        }
    }
}
