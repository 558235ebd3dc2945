use thiserror::Error;

/// Failures of the window-owning side of an alert.
///
/// None of these ever reach the user: each is logged at the boundary of the
/// thread that hit it and the remaining alert channels carry on.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("no usable display surface")]
    DisplayUnavailable,

    #[error("failed to create overlay on monitor {monitor}: {reason}")]
    WindowCreation { monitor: String, reason: String },

    #[error("ui dispatch failed: {0}")]
    Dispatch(String),

    #[error("window operation failed: {0}")]
    Window(String),
}

pub type OverlayResult<T> = Result<T, OverlayError>;
