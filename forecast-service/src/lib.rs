pub mod compact;
pub mod config;
pub mod error;
pub mod metrics_server;
pub mod model;
pub mod observability;
pub mod period;
pub mod pipeline;
pub mod policy;
pub mod routes;
pub mod series;
pub mod store;
pub mod timestamp;
pub mod window;

pub use error::ForecastError;
pub use pipeline::ForecastPipeline;
