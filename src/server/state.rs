use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::Settings;
use crate::inference::VisualClassifier;
use crate::location::Catalog;

/// Shared, read-only request context. The classifier is built once at
/// startup and injected here.
pub struct AppState {
    pub settings: Settings,
    pub catalog: Catalog,
    pub classifier: Option<Arc<dyn VisualClassifier>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(settings: Settings, catalog: Catalog, classifier: Option<Arc<dyn VisualClassifier>>) -> Self {
        Self {
            settings,
            catalog,
            classifier,
            started_at: Utc::now(),
        }
    }
}
