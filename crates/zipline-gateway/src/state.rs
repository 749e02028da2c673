use std::sync::Arc;

use zipline_core::{KvCache, UrlStore};
use zipline_service::UrlService;

/// Service over type-erased backends, so one router serves any
/// storage/cache pairing the binary was started with.
pub type DynUrlService = UrlService<dyn UrlStore, dyn KvCache>;

#[derive(Clone)]
pub struct AppState {
    service: Arc<DynUrlService>,
    base_url: String,
}

impl AppState {
    pub fn new(service: Arc<DynUrlService>, public_base_url: impl Into<String>) -> Self {
        Self {
            service,
            base_url: public_base_url.into(),
        }
    }

    pub fn service(&self) -> &DynUrlService {
        &self.service
    }

    /// Public base used to render `short_url` fields.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
