//! Central error types for the pointer surface.
//!
//! The taxonomy separates fatal setup failures, fatal per-frame render
//! failures, and pointer-protocol violations. Setup and render errors
//! abort the renderer; protocol violations signal a broken contract with
//! the input stack and are never clamped or sanitized.

use thiserror::Error;

/// Main error type for pointer-surface operations.
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// Device, swap-chain, drawing-context, or panel-binding creation failed.
    /// Fatal: renderer startup is aborted, there is no retry.
    #[error("Graphics setup failed: {0}")]
    Setup(String),

    /// A draw or present call failed inside the running render loop.
    /// Fatal: the loop terminates, a corrupt frame is never retried.
    #[error("Frame rendering failed: {0}")]
    Render(String),

    /// The input stack broke the pointer event-stream contract.
    #[error("Pointer protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// The render thread has already stopped.
    #[error("Render loop is not running")]
    Shutdown,
}

/// A contract break in the pointer event stream.
///
/// The event stream must be well-ordered per id: entered precedes
/// moved/pressed/released, which precede exited. Anything else is a logic
/// error in the input stack, not input to recover from.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// An entered event carried an id that is already tracked.
    #[error("a pointer with id {id} already exists in the contact table")]
    DuplicateContact { id: u32 },

    /// A moved/pressed/released event referenced an untracked id.
    #[error("an untracked pointer {id} received a {event} event")]
    UntrackedContact { id: u32, event: &'static str },

    /// A pressed event reported the pointer as not in contact.
    #[error("a pressed pointer {id} is reporting as not in contact")]
    NotInContact { id: u32 },

    /// A released event reported the pointer as still in contact.
    #[error("a released pointer {id} is reporting as in contact")]
    StillInContact { id: u32 },
}

/// Type alias for Results using SurfaceError.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SurfaceError::Setup("no adapter".to_string());
        assert_eq!(err.to_string(), "Graphics setup failed: no adapter");
    }

    #[test]
    fn test_protocol_violation_display() {
        let err = ProtocolViolation::UntrackedContact {
            id: 7,
            event: "moved",
        };
        assert_eq!(
            err.to_string(),
            "an untracked pointer 7 received a moved event"
        );
    }

    #[test]
    fn test_protocol_violation_converts() {
        let err: SurfaceError = ProtocolViolation::DuplicateContact { id: 3 }.into();
        assert!(matches!(
            err,
            SurfaceError::Protocol(ProtocolViolation::DuplicateContact { id: 3 })
        ));
        assert!(err.to_string().contains("already exists"));
    }
}
