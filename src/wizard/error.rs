//! Error types for the provisioning wizard.

use thiserror::Error;

use super::StepId;

/// Boxed error raised by an injected provider or completion handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the wizard session and controller.
#[derive(Debug, Error)]
pub enum WizardError {
    /// A field on the current step failed validation; the step is kept.
    #[error("{field}: {message}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// Explanation shown next to the field.
        message: String,
    },
    /// `previous` was requested on the first step.
    #[error("already on the first step")]
    NoPreviousStep,
    /// A jump was requested from a step other than the last, or to a step
    /// that is not earlier in the flow.
    #[error("cannot jump from {from} to {to}")]
    JumpNotAllowed {
        /// Current step.
        from: StepId,
        /// Requested step.
        to: StepId,
    },
    /// The field does not belong to the current step.
    #[error("{field} is not a field of step {step}")]
    UnknownField {
        /// Current step.
        step: StepId,
        /// Field that was set.
        field: String,
    },
    /// The field belongs to a section the current view does not show.
    #[error("{field} is not shown on step {step}")]
    HiddenField {
        /// Current step.
        step: StepId,
        /// Field that was set.
        field: String,
    },
    /// The step flow is empty or repeats a step.
    #[error("invalid step flow: {0}")]
    InvalidFlow(String),
    /// The provider returned data for a different step.
    #[error("provider returned data that does not belong to step {step}")]
    UnexpectedData {
        /// Step being entered.
        step: StepId,
    },
    /// The current step has not been rendered yet.
    #[error("step {step} has no data loaded")]
    NotReady {
        /// Current step.
        step: StepId,
    },
    /// The step data provider failed.
    #[error("failed to load step {step}: {source}")]
    Provider {
        /// Step being entered.
        step: StepId,
        /// Provider error.
        #[source]
        source: HandlerError,
    },
    /// The completion handler failed. The wizard stays submitted.
    #[error("failed to complete the wizard: {source}")]
    Completion {
        /// Completion error.
        #[source]
        source: HandlerError,
    },
    /// The wizard was already submitted.
    #[error("the wizard has already been submitted")]
    Finished,
    /// The wizard was closed.
    #[error("the wizard has been closed")]
    Closed,
}
