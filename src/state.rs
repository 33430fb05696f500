use crate::config::settings::AppConfig;
use crate::infrastructure::queue::transcode::TranscodeQueue;
use crate::infrastructure::storage::local::StorageService;
use crate::modules::job::registry::JobRegistry;
use crate::modules::media::probe::MediaInspector;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<dyn JobRegistry>,
    pub storage: StorageService,
    pub queue: TranscodeQueue,
    pub inspector: MediaInspector,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        registry: Arc<dyn JobRegistry>,
        storage: StorageService,
        queue: TranscodeQueue,
    ) -> Self {
        let inspector = MediaInspector::new(config.ffprobe_bin.clone());

        Self {
            config,
            registry,
            storage,
            queue,
            inspector,
        }
    }
}
