//! Error types for stepviz-core.

use thiserror::Error;

use crate::mediator::CursorId;

/// Result type for stepviz-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while recording or replaying events.
///
/// Every variant is recoverable at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A negative duration was passed to an event or step.
    #[error("invalid {field}: {value} (durations must be non-negative)")]
    InvalidDuration { field: &'static str, value: i64 },

    /// A tick period of zero was configured.
    #[error("invalid period: {0} (must be at least 1)")]
    InvalidPeriod(u64),

    /// Payload lookup miss.
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    /// The attribute exists but has a different shape than requested.
    #[error("attribute {name} is not a {expected}")]
    AttributeShape { name: String, expected: &'static str },

    /// The index was dropped from the front of the log.
    #[error("event {index} was evicted (first retained index is {first_index})")]
    IndexEvicted { index: u64, first_index: u64 },

    /// The index has not been produced yet.
    #[error("event {index} not yet produced (last index is {last_index})")]
    IndexNotYetProduced { index: u64, last_index: u64 },

    /// Progress scaling against a zero-tick timeline.
    #[error("progress scaling against a zero-tick timeline")]
    DivisionGuard,

    /// No cursor is registered under this id.
    #[error("unknown cursor: {0}")]
    UnknownCursor(CursorId),

    /// The mapper has no visual step for this event kind.
    #[error("no visual step registered for event kind {0:?}")]
    UnmappedKind(String),
}
