//! Shared plumbing for the Fancy crawling workspace.
//!
//! Only cross-cutting concerns live here so every crate can depend on it
//! without dragging in HTTP or HTML machinery.
//!
//! - [`observability`]: centralised `tracing` initialisation for binaries and tests
//!
//! ```rust
//! use fancy_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.app_name, "fancy");
//! ```

pub mod observability;
