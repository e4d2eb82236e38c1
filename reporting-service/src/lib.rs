pub mod api;
pub mod config;
pub mod db;
pub mod lookup;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod shutdown;
pub mod sinks;
pub mod sources;
pub mod store;
pub mod transform;
pub mod validation;

pub use pipeline::{Envelope, Pipeline};
