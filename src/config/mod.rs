//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CLI overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! On file change (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → forwarding settings swapped atomically in the interceptor
//! ```
//!
//! # Design Decisions
//! - All fields have defaults except the downstream URL
//! - Validation separates syntactic (serde) from semantic checks
//! - An invalid reload is logged and ignored; the running settings stay

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{
    load_config, load_config_with, parse_config, read_config, ConfigError, ConfigOverrides,
};
pub use schema::{
    ForwardingConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig,
    SecurityConfig, ServerInfoConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
