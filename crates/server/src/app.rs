use db::DBService;
use services::services::{
    config::Config, document_viewer::DocumentViewerService, storage::StorageService,
};

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    storage: StorageService,
    viewer: DocumentViewerService,
}

impl AppState {
    pub fn new(db: DBService, config: &Config) -> Self {
        Self {
            db,
            storage: StorageService::new(config.data_dir.clone()),
            viewer: DocumentViewerService::new(config.public_base_url.clone()),
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    pub fn viewer(&self) -> &DocumentViewerService {
        &self.viewer
    }
}
