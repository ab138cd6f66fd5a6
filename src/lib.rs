//! HTTP load balancer library: backend registry, peer selection, and the
//! retry/failover routing engine.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::BackendRegistry;
pub use routing::{Forwarder, Orchestrator};
