//! HTTP binding of the projection views
//!
//! - `GET /api/v1/visualizer/summary`
//! - `GET /api/v1/visualizer/queues`
//! - `GET /api/v1/visualizer/jobs?namespace=NS`
//! - `GET /api/v1/visualizer/nodes`
//! - `GET /health`

pub mod handlers;
pub mod state;

pub use handlers::{create_router, API_PREFIX};
pub use state::AppState;
