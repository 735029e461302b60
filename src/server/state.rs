use std::sync::Arc;

use crate::projection::{ProjectionService, QueueBuildOptions};
use crate::snapshot::SnapshotSource;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProjectionService>,
}

impl AppState {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self::with_service(ProjectionService::new(source))
    }

    pub fn with_service(service: ProjectionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Rebuild the service with the given queue options
    pub fn with_queue_options(self, options: QueueBuildOptions) -> Self {
        let service = (*self.service).clone().with_queue_options(options);
        Self::with_service(service)
    }
}
