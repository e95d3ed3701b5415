//! fleetgrid-client: blocking REST client for the cluster-management service.
//!
//! Each call issues one HTTP/1.1 request and waits for the answer. A
//! private current-thread tokio runtime drives hyper underneath, so callers
//! stay fully synchronous.
//!
//! # Architecture
//!
//! ```text
//! ClusterClient (ServiceConfig, immutable)
//!   ├── Transport
//!   │   ├── TCP, or TLS via rustls (Mozilla roots + optional CA bundle)
//!   │   ├── basic auth, JSON or form bodies, percent-encoded paths
//!   │   └── non-2xx → ClientError::Status
//!   ├── wire records (PascalCase node attributes) → fleet_core::Node
//!   └── implements NodeTerminator; fleet_query(scope) yields a FleetQuery
//! ```

pub mod client;
pub mod error;
pub mod model;
pub mod tls;
pub mod transport;

pub use client::{ClusterClient, ClusterImport, ScaleTarget};
pub use error::{ClientError, ClientResult};
pub use tls::TlsConfig;
