//! Provisioning wizard.
//!
//! [`WizardSession`] is the pure state machine; [`Wizard`] drives it,
//! loading each step's data from an injected [`StepDataProvider`] and
//! handing the final payload to a [`WizardCompletion`] exactly once. The
//! controller itself never talks to the network.

mod error;
pub mod session;
pub mod steps;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use tracing::info;

pub use error::{HandlerError, WizardError};
pub use session::{SessionStatus, Transition, WizardSession};
pub use steps::{
    Choice, FieldValue, FormData, NetworkMode, OptionGroup, Sections, StepData, StepId,
    StepValues, StepView,
};

/// Future returned by wizard handlers.
pub type HandlerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, HandlerError>> + Send + 'a>>;

/// Loads the data a step needs before it is shown.
pub trait StepDataProvider: Send + Sync {
    /// Returns data for `step` given the values entered so far.
    fn load<'a>(&'a self, step: StepId, form: &'a FormData) -> HandlerFuture<'a, StepData>;
}

/// Receives the payload when the wizard is submitted.
pub trait WizardCompletion: Send + Sync {
    /// Value produced by a successful completion.
    type Output: Send;

    /// Acts on the submitted payload.
    fn complete<'a>(&'a self, payload: &'a FormData) -> HandlerFuture<'a, Self::Output>;
}

/// Values to enter per step when driving the wizard non-interactively.
pub type Answers = BTreeMap<StepId, StepValues>;

/// Result of advancing the wizard.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WizardEvent<T> {
    /// The given step is now shown.
    Step(StepId),
    /// The wizard was submitted and completion produced this output.
    Submitted(T),
}

/// Wizard controller.
#[derive(Debug)]
pub struct Wizard<P, F> {
    session: WizardSession,
    provider: P,
    completion: F,
}

impl<P, F> Wizard<P, F>
where
    P: StepDataProvider,
    F: WizardCompletion,
{
    /// Opens the wizard and shows its first step.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::InvalidFlow`] for a bad flow and
    /// [`WizardError::Provider`] when the first step cannot be loaded.
    pub async fn open(flow: Vec<StepId>, provider: P, completion: F) -> Result<Self, WizardError> {
        let mut wizard = Self {
            session: WizardSession::new(flow)?,
            provider,
            completion,
        };
        wizard.load_current().await?;
        Ok(wizard)
    }

    /// Underlying session.
    #[must_use]
    pub const fn session(&self) -> &WizardSession {
        &self.session
    }

    /// View of the current step.
    #[must_use]
    pub const fn view(&self) -> Option<&StepView> {
        self.session.view()
    }

    /// Sets a field on the current step.
    ///
    /// # Errors
    ///
    /// See [`WizardSession::set_field`].
    pub fn set_field(
        &mut self,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), WizardError> {
        self.session.set_field(field, value)
    }

    /// Validates the current step, then shows the next one or submits.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::Validation`] when the step is invalid,
    /// [`WizardError::Provider`] when the next step cannot be loaded and
    /// [`WizardError::Completion`] when the completion handler fails.
    pub async fn next(&mut self) -> Result<WizardEvent<F::Output>, WizardError> {
        match self.session.request_next()? {
            Transition::Enter(step) => {
                self.load_current().await?;
                Ok(WizardEvent::Step(step))
            }
            Transition::Submit(payload) => {
                info!(fields = payload.len(), "submitting wizard");
                let output = self
                    .completion
                    .complete(&payload)
                    .await
                    .map_err(|source| WizardError::Completion { source })?;
                Ok(WizardEvent::Submitted(output))
            }
        }
    }

    /// Shows the previous step with its values restored.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::NoPreviousStep`] on the first step.
    pub async fn previous(&mut self) -> Result<StepId, WizardError> {
        let transition = self.session.request_previous()?;
        self.follow(transition).await
    }

    /// Jumps from the review step back to `step`.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::JumpNotAllowed`] unless on the last step and
    /// `step` is earlier.
    pub async fn jump(&mut self, step: StepId) -> Result<StepId, WizardError> {
        let transition = self.session.request_jump(step)?;
        self.follow(transition).await
    }

    /// Reloads the current step after a provider failure.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::Provider`] when loading fails again.
    pub async fn reload(&mut self) -> Result<StepId, WizardError> {
        self.load_current().await?;
        Ok(self.session.current_step())
    }

    /// Discards the wizard without submitting.
    pub fn close(&mut self) {
        self.session.close();
    }

    /// Enters `answers` step by step until the wizard is submitted.
    ///
    /// Steps without answers keep their pre-selected values.
    ///
    /// # Errors
    ///
    /// Propagates the first [`WizardError`] raised along the way.
    pub async fn complete_with(&mut self, answers: &Answers) -> Result<F::Output, WizardError> {
        loop {
            let step = self.session.current_step();
            if let Some(values) = answers.get(&step) {
                for (field, value) in values {
                    self.session.set_field(field, value.clone())?;
                }
            }
            if let WizardEvent::Submitted(output) = self.next().await? {
                return Ok(output);
            }
        }
    }

    async fn follow(&mut self, transition: Transition) -> Result<StepId, WizardError> {
        match transition {
            Transition::Enter(step) => {
                self.load_current().await?;
                Ok(step)
            }
            Transition::Submit(_) => Err(WizardError::Finished),
        }
    }

    async fn load_current(&mut self) -> Result<(), WizardError> {
        let step = self.session.current_step();
        let form = self.session.form_data();
        let data = self
            .provider
            .load(step, &form)
            .await
            .map_err(|source| WizardError::Provider { step, source })?;
        self.session.enter(data)?;
        Ok(())
    }
}
