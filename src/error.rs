/*
 * Error taxonomy shared by every control, handler, and application operation.
 * All failures are raised synchronously to the caller and are deterministic:
 * operations validate their preconditions before mutating any state.
 */

use crate::native::PeerId;
use crate::types::ControlId;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// A mutating or handler-accessing call reached a disposed control or application.
    #[error("object is disposed: {0}")]
    Disposed(String),
    /// `find_control` found no control with the requested name.
    #[error("not found: {0}")]
    NotFound(String),
    /// The call is not valid in the current state (e.g. detaching an unbound handler).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// A logical or native identifier does not resolve to a known object.
    #[error("invalid handle: {0}")]
    InvalidHandle(String),
    /// The native layer delivered an event tag the router does not know about.
    /// This means the binding is out of sync with the native layer and the
    /// caller must not continue as if the event had been handled.
    #[error("unsupported native event tag {tag} for peer {peer:?}")]
    UnsupportedEvent { peer: PeerId, tag: u32 },
    /// A native peer reported a failure.
    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl PlatformError {
    pub(crate) fn disposed(id: ControlId) -> Self {
        PlatformError::Disposed(format!("control {} is disposed", id.raw()))
    }

    pub(crate) fn unknown_control(id: ControlId) -> Self {
        PlatformError::InvalidHandle(format!("control {} does not exist", id.raw()))
    }

    /// Fatal errors indicate corrupted binding state rather than caller misuse.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlatformError::UnsupportedEvent { .. })
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;
