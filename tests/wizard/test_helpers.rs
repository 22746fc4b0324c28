//! Shared fixtures for wizard BDD scenarios.

use std::sync::{Arc, Mutex};

use cumulus::wizard::{StepId, Wizard, WizardError};
use rstest::fixture;
use thiserror::Error;
use tokio::runtime::Runtime;

use super::test_doubles::{CannedSteps, RecordingCompletion};

pub type ConsoleWizard = Wizard<CannedSteps, RecordingCompletion>;

/// Outcome of the most recent wizard request, reduced to what steps assert on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RequestOutcome {
    Succeeded,
    Failed { kind: &'static str, field: Option<String> },
}

#[derive(Clone, Debug)]
pub struct WizardContext {
    pub steps: CannedSteps,
    pub completion: RecordingCompletion,
    runtime: Arc<Runtime>,
    wizard: Arc<Mutex<ConsoleWizard>>,
    last: Arc<Mutex<Option<RequestOutcome>>>,
}

#[derive(Debug, Error)]
pub enum WizardTestError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("wizard lock poisoned")]
    Poisoned,
}

#[fixture]
pub fn wizard_context_result() -> Result<WizardContext, WizardTestError> {
    build_wizard_context()
}

#[fixture]
pub fn wizard_context(
    wizard_context_result: Result<WizardContext, WizardTestError>,
) -> WizardContext {
    wizard_context_result
        .unwrap_or_else(|err| panic!("wizard context fixture should initialise: {err}"))
}

fn build_wizard_context() -> Result<WizardContext, WizardTestError> {
    let runtime = Runtime::new()?;
    let steps = CannedSteps::new();
    let completion = RecordingCompletion::default();
    let wizard = runtime.block_on(Wizard::open(
        StepId::ALL.to_vec(),
        steps.clone(),
        completion.clone(),
    ))?;
    Ok(WizardContext {
        steps,
        completion,
        runtime: Arc::new(runtime),
        wizard: Arc::new(Mutex::new(wizard)),
        last: Arc::default(),
    })
}

impl WizardContext {
    /// Runs `action` against the wizard on the context's runtime.
    pub fn drive<T>(
        &self,
        action: impl FnOnce(&mut ConsoleWizard, &Runtime) -> T,
    ) -> Result<T, WizardTestError> {
        let mut wizard = self.wizard.lock().map_err(|_| WizardTestError::Poisoned)?;
        Ok(action(&mut wizard, &self.runtime))
    }

    /// Runs a request and remembers how it ended.
    pub fn request<T>(
        &self,
        action: impl FnOnce(&mut ConsoleWizard, &Runtime) -> Result<T, WizardError>,
    ) -> Result<(), WizardTestError> {
        let outcome = match self.drive(action)? {
            Ok(_) => RequestOutcome::Succeeded,
            Err(err) => RequestOutcome::Failed {
                kind: error_kind(&err),
                field: error_field(&err),
            },
        };
        let mut last = self.last.lock().map_err(|_| WizardTestError::Poisoned)?;
        *last = Some(outcome);
        Ok(())
    }

    pub fn last_outcome(&self) -> Option<RequestOutcome> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

const fn error_kind(err: &WizardError) -> &'static str {
    match err {
        WizardError::Validation { .. } => "validation",
        WizardError::NoPreviousStep => "no-previous-step",
        WizardError::JumpNotAllowed { .. } => "jump-not-allowed",
        WizardError::UnknownField { .. } => "unknown-field",
        WizardError::HiddenField { .. } => "hidden-field",
        WizardError::InvalidFlow(_) => "invalid-flow",
        WizardError::UnexpectedData { .. } => "unexpected-data",
        WizardError::NotReady { .. } => "not-ready",
        WizardError::Provider { .. } => "provider",
        WizardError::Completion { .. } => "completion",
        WizardError::Finished => "finished",
        WizardError::Closed => "closed",
    }
}

fn error_field(err: &WizardError) -> Option<String> {
    match err {
        WizardError::Validation { field, .. } => Some((*field).to_owned()),
        WizardError::UnknownField { field, .. } | WizardError::HiddenField { field, .. } => {
            Some(field.clone())
        }
        _ => None,
    }
}
