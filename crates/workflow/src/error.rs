/// Operations rejected by the workflow before any network activity, and
/// export failures.
///
/// Request outcomes (transport, service and malformed-body errors) are
/// not represented here; they land in [`WorkflowState::Failed`].
///
/// [`WorkflowState::Failed`]: crate::workflow::WorkflowState::Failed
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("No source image selected")]
    NoSourceImage,

    #[error("A conversion request is already in flight")]
    AlreadySubmitting,

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("No converted image available to export")]
    NoResult,

    #[error("Failed to save result: {0}")]
    Export(#[from] std::io::Error),
}
