//! Deprecation notices for selected keys of a key-value mapping.
//!
//! Lets a library rename or remove entries of a mapping it hands out without
//! breaking callers outright: touching a deprecated key still works, but
//! emits a notice on a diagnostic sink.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use dkey::{DeprecatedKeys, KeyDeprecation, RecordingSink};
//!
//! let sink = Arc::new(RecordingSink::new());
//! let mut settings = DeprecatedKeys::with_sink(
//!     [("color".to_string(), 1), ("legacy".to_string(), 2)],
//!     [
//!         KeyDeprecation::renamed("colour".to_string(), "color".to_string()).build()?,
//!         KeyDeprecation::removed("legacy".to_string()).removed_in("2.0").build()?,
//!     ],
//!     sink.clone(),
//! )?;
//!
//! assert_eq!(settings.get_item("colour")?, &1);
//! assert_eq!(
//!     sink.messages(),
//!     vec!["Key `colour` is deprecated. Use `color` from now on."]
//! );
//!
//! settings.pop("legacy")?;
//! assert_eq!(sink.len(), 2);
//! # Ok::<(), dkey::DkeyError>(())
//! ```

pub mod config;
pub mod descriptor;
pub mod filter;
pub mod map;
pub mod notice;
pub mod sink;

pub use config::{ConfigError, DeprecationEntry, DkeyConfig};
pub use descriptor::{DeprecationBuilder, KeyDeprecation, Severity, dkey};
pub use filter::{WarningAction, WarningFilter};
pub use map::{DeprecatedKeys, Iter};
pub use notice::DeprecationNotice;
pub use sink::{
    FilteredSink, GlobalSink, RecordingSink, TracingSink, WarningSink, global_sink,
    reset_global_sink, set_global_sink,
};

use thiserror::Error;

/// Errors raised by descriptors and deprecated-key mappings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DkeyError {
    /// A descriptor was built from zero or more than two keys.
    #[error("{}", arity_message(.count))]
    InvalidArity { count: usize },
    /// A descriptor points at a key missing from the wrapped mapping.
    #[error(
        "The new key `{new_key}` which should replace the old key `{old_key}` is not in the given mapping."
    )]
    InvalidReplacement { old_key: String, new_key: String },
    #[error("Key `{key}` not found")]
    KeyNotFound { key: String },
}

fn arity_message(count: &usize) -> String {
    if *count == 0 {
        "No key given".to_string()
    } else {
        format!(
            "More than two keys were given ({}). Maximum allowed: 2.",
            count
        )
    }
}

/// Result type for dkey operations.
pub type Result<T> = std::result::Result<T, DkeyError>;
