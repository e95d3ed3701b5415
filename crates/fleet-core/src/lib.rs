pub mod config;
pub mod error;
pub mod service;
pub mod status;
pub mod types;

pub use config::{FleetConfig, PollPolicy, ServiceConfig};
pub use error::{ConfigError, QueryError};
pub use service::{FleetQuery, NodeTerminator};
pub use status::{StatusClass, StatusTable};
pub use types::*;
