//! Shared fixtures for volume action BDD scenarios.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cumulus::actions::{AssumeYes, Confirm};
use cumulus::test_support::{ScriptedControlPlane, volume_json};
use cumulus::{
    ActionError, ActionExecutor, ActionOutcome, JobPoller, Page, PollError, ResourceRecord,
    Section, ViewRegistry, VolumeAction,
};
use rstest::fixture;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::runtime::Runtime;

/// Declines every confirmation.
struct AssumeNo;

impl Confirm for AssumeNo {
    fn confirm(&self, _message: &str) -> bool {
        false
    }
}

/// How the most recent action ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ActionResult {
    Completed { message: String },
    Declined,
    Failed { kind: &'static str, message: String },
}

#[derive(Clone, Debug)]
pub struct ActionContext {
    pub api: ScriptedControlPlane,
    pub views: Arc<ViewRegistry<ScriptedControlPlane>>,
    executor: ActionExecutor<ScriptedControlPlane>,
    runtime: Arc<Runtime>,
    listed: Arc<Mutex<Vec<Value>>>,
    page: Arc<Mutex<Option<Page>>>,
    declines: Arc<Mutex<bool>>,
    result: Arc<Mutex<Option<ActionResult>>>,
}

#[derive(Debug, Error)]
pub enum ActionTestError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] cumulus::ApiError),
    #[error("context lock poisoned")]
    Poisoned,
    #[error("the volume list has not been opened")]
    NoPage,
}

#[fixture]
pub fn action_context_result() -> Result<ActionContext, ActionTestError> {
    build_action_context()
}

#[fixture]
pub fn action_context(
    action_context_result: Result<ActionContext, ActionTestError>,
) -> ActionContext {
    action_context_result
        .unwrap_or_else(|err| panic!("action context fixture should initialise: {err}"))
}

fn build_action_context() -> Result<ActionContext, ActionTestError> {
    let api = ScriptedControlPlane::new();
    let poller = JobPoller::new(Duration::from_millis(1), Duration::from_secs(2));
    Ok(ActionContext {
        views: Arc::new(ViewRegistry::new(api.clone(), 20)),
        executor: ActionExecutor::new(api.clone(), poller),
        runtime: Arc::new(Runtime::new()?),
        api,
        listed: Arc::default(),
        page: Arc::default(),
        declines: Arc::default(),
        result: Arc::default(),
    })
}

impl ActionContext {
    /// Adds a volume to the listing the service will return.
    pub fn add_volume(&self, id: &str, attached: bool) -> Result<(), ActionTestError> {
        let overrides = if attached {
            vec![("virtualmachineid", json!("vm-1")), ("vmstate", json!("Running"))]
        } else {
            Vec::new()
        };
        let mut listed = self.listed.lock().map_err(|_| ActionTestError::Poisoned)?;
        listed.push(volume_json(id, &overrides));
        Ok(())
    }

    pub fn decline_confirmations(&self) -> Result<(), ActionTestError> {
        let mut declines = self.declines.lock().map_err(|_| ActionTestError::Poisoned)?;
        *declines = true;
        Ok(())
    }

    /// Serves the scripted volumes and loads the first page.
    pub fn open_list(&self) -> Result<(), ActionTestError> {
        let volumes = self.listed.lock().map_err(|_| ActionTestError::Poisoned)?.clone();
        self.api.push_body(json!({ "count": volumes.len(), "volume": volumes }));
        let page = self.runtime.block_on(self.views.list(Section::Volumes, 1))?;
        let mut slot = self.page.lock().map_err(|_| ActionTestError::Poisoned)?;
        *slot = Some(page);
        Ok(())
    }

    /// Runs `action` against the row it names and applies the row effect.
    pub fn run(&self, action: &VolumeAction, volume_id: &str) -> Result<(), ActionTestError> {
        let mut page = self.page.lock().map_err(|_| ActionTestError::Poisoned)?;
        let current: Option<ResourceRecord> = page
            .as_ref()
            .ok_or(ActionTestError::NoPage)?
            .rows
            .iter()
            .find(|row| row.id() == Some(volume_id))
            .map(|row| row.record().clone());
        let declines = *self.declines.lock().map_err(|_| ActionTestError::Poisoned)?;
        let confirm: &dyn Confirm = if declines { &AssumeNo } else { &AssumeYes };
        let cancel = self.views.cancellation();

        let outcome = self.runtime.block_on(self.executor.execute(
            action,
            current.as_ref(),
            confirm,
            &cancel,
        ));
        let result = match outcome {
            Ok(ActionOutcome::Completed(completion)) => {
                if let Some(page) = page.as_mut() {
                    page.apply(completion.effect);
                }
                ActionResult::Completed {
                    message: completion.messages.complete,
                }
            }
            Ok(ActionOutcome::Declined) => ActionResult::Declined,
            Err(err) => ActionResult::Failed {
                kind: error_kind(&err),
                message: err.user_message(),
            },
        };
        let mut slot = self.result.lock().map_err(|_| ActionTestError::Poisoned)?;
        *slot = Some(result);
        Ok(())
    }

    pub fn result(&self) -> Option<ActionResult> {
        self.result.lock().ok().and_then(|result| result.clone())
    }

    pub fn page(&self) -> Option<Page> {
        self.page.lock().ok().and_then(|page| page.clone())
    }
}

const fn error_kind(err: &ActionError) -> &'static str {
    match err {
        ActionError::NotAvailable { .. } => "not-available",
        ActionError::MissingInput { .. } => "missing-input",
        ActionError::Api { .. } => "rejected",
        ActionError::Poll {
            source: PollError::Cancelled { .. },
            ..
        } => "cancelled",
        ActionError::Poll {
            source: PollError::JobFailed { .. },
            ..
        } => "job-failed",
        ActionError::Poll { .. } => "poll",
    }
}
