//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML or JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → handed to the registry, orchestrator and servers at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend list never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::BalancerConfig;
pub use schema::ListenerConfig;
pub use schema::BackendConfig;
pub use schema::{BalancingConfig, BalancingPolicy};
pub use schema::{RetryConfig, TimeoutConfig, ForwardingConfig, HeaderConfig};
pub use schema::{ObservabilityConfig, AdminConfig};
