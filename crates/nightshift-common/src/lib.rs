//! Common types for nightshift: CRDs, errors, and event publishing

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod events;

pub use error::Error;
pub use events::{EventPublisher, KubeEventPublisher, NoopEventPublisher};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Field manager name used for server-side apply and status patches
pub const FIELD_MANAGER: &str = "nightshift-operator";
