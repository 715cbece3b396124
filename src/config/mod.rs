//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → handed to RpcManager at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the endpoint set never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, HealthConfig, ObservabilityConfig, QueueConfig, RetryConfig, RouterConfig,
    SelectionStrategy, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
