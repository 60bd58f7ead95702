//! Client-side lifecycle of a symbol-art conversion.
//!
//! Ties the settings store, the conversion service and a local artifact
//! sink together into one state machine with stale-response suppression.

pub mod error;
pub mod export;
pub mod handle;
pub mod workflow;

pub use error::WorkflowError;
pub use workflow::{
    ResultView, SubmitOutcome, TransformationWorkflow, WorkflowState, CANCELLED_MESSAGE,
};
