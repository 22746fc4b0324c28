//! Action executor: confirm, issue, follow.

use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::{self, ApiError, ControlPlane};
use crate::jobs::{JobPoller, PollError};
use crate::record::ResourceRecord;
use crate::views::{Row, RowEffect, Section};

use super::{ActionKind, ActionMessages, JobResultKind, PollStrategy, VolumeAction, available_actions};

/// Decides whether a confirmation message is accepted.
pub trait Confirm: Send + Sync {
    /// Returns true when the user accepts `message`.
    fn confirm(&self, message: &str) -> bool;
}

/// Accepts every confirmation; used for `--yes`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Errors raised while executing an action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The latest record does not offer the action.
    #[error("{action} is not available for {volume}")]
    NotAvailable {
        /// Refused action.
        action: ActionKind,
        /// Display name of the volume.
        volume: String,
    },
    /// A row action was issued without the latest record of the volume it
    /// names.
    #[error("{action} needs the latest record of volume {expected}, got {actual}")]
    MissingInput {
        /// Action kind.
        action: ActionKind,
        /// Volume named by the action.
        expected: String,
        /// Id of the record supplied, or "nothing".
        actual: String,
    },
    /// The service rejected the request.
    #[error("{action} was rejected: {}", .source.user_message())]
    Api {
        /// Action kind.
        action: ActionKind,
        /// Underlying API error.
        #[source]
        source: ApiError,
    },
    /// Following the job failed.
    #[error("{action} did not complete: {source}")]
    Poll {
        /// Action kind.
        action: ActionKind,
        /// Underlying poll error.
        #[source]
        source: PollError,
    },
}

impl ActionError {
    /// Text to show the user; service errors surface their `errortext`.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { source, .. }
            | Self::Poll {
                source: PollError::Api(source),
                ..
            } => source.user_message(),
            Self::Poll {
                source: PollError::JobFailed { message, .. },
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result of a completed action.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    /// Action kind.
    pub kind: ActionKind,
    /// Texts for this invocation.
    pub messages: ActionMessages,
    /// Change to apply to the list the action was started from.
    pub effect: RowEffect,
    /// Raw `jobresult` of the job, `Null` for immediate actions.
    pub job_result: Value,
}

/// Outcome of an action that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    /// The user declined the confirmation; nothing was sent.
    Declined,
    /// The action completed.
    Completed(Completion),
}

/// Runs volume actions against a control plane.
#[derive(Clone, Debug)]
pub struct ActionExecutor<C> {
    api: C,
    poller: JobPoller,
}

impl<C: ControlPlane> ActionExecutor<C> {
    /// Creates an executor following jobs with `poller`.
    #[must_use]
    pub const fn new(api: C, poller: JobPoller) -> Self {
        Self { api, poller }
    }

    /// The control plane behind the executor.
    #[must_use]
    pub const fn api(&self) -> &C {
        &self.api
    }

    /// Executes `action`.
    ///
    /// Row actions require `current`, the latest known record of the
    /// volume they name; the action is refused when that record no longer
    /// offers it. `cancel` stops a job poll when the view is dismissed.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when the action is refused, rejected, or its
    /// job fails. The list is left unchanged in every error case.
    pub async fn execute(
        &self,
        action: &VolumeAction,
        current: Option<&ResourceRecord>,
        confirm: &dyn Confirm,
        cancel: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError> {
        let kind = action.kind();
        let display_name = Self::check_target(action, current)?;
        let messages = action.messages(&display_name);

        if !confirm.confirm(&messages.confirm) {
            info!(action = %kind, volume = %display_name, "action declined");
            return Ok(ActionOutcome::Declined);
        }

        let command = action.command();
        let body = self.api.call(&command).await.map_err(|source| {
            warn!(action = %kind, error = %source, "action rejected");
            ActionError::Api {
                action: kind,
                source,
            }
        })?;
        info!(action = %kind, volume = %display_name, "{}", messages.success);

        let (effect, job_result) = match action.poll_strategy() {
            PollStrategy::Immediate => (Self::immediate_effect(action), Value::Null),
            PollStrategy::Job(result_kind) => {
                let job_id = api::job_id(&command, &body).map_err(|source| {
                    ActionError::Api {
                        action: kind,
                        source,
                    }
                })?;
                info!(action = %kind, job = %job_id, "{}", messages.notification);
                let result = self
                    .poller
                    .wait(&self.api, &job_id, cancel)
                    .await
                    .map_err(|source| {
                        warn!(action = %kind, job = %job_id, error = %source, "job did not complete");
                        ActionError::Poll {
                            action: kind,
                            source,
                        }
                    })?;
                let effect = Self::job_effect(action, result_kind, &result)?;
                (effect, result)
            }
        };

        info!(action = %kind, volume = %display_name, "{}", messages.complete);
        Ok(ActionOutcome::Completed(Completion {
            kind,
            messages,
            effect,
            job_result,
        }))
    }

    fn check_target(
        action: &VolumeAction,
        current: Option<&ResourceRecord>,
    ) -> Result<String, ActionError> {
        let kind = action.kind();
        let Some(volume_id) = action.volume_id() else {
            return Ok(match action {
                VolumeAction::AddVolume(request) => request.name.clone(),
                _ => String::new(),
            });
        };

        let record = current
            .filter(|record| record.id() == Some(volume_id))
            .ok_or_else(|| ActionError::MissingInput {
                action: kind,
                expected: volume_id.to_owned(),
                actual: current
                    .and_then(ResourceRecord::id)
                    .unwrap_or("nothing")
                    .to_owned(),
            })?;

        if !available_actions(record).contains(&kind) {
            return Err(ActionError::NotAvailable {
                action: kind,
                volume: record.display_name().to_owned(),
            });
        }
        Ok(record.display_name().to_owned())
    }

    fn immediate_effect(action: &VolumeAction) -> RowEffect {
        match action {
            VolumeAction::Delete { volume_id } => RowEffect::Remove(volume_id.clone()),
            _ => RowEffect::Unchanged,
        }
    }

    fn job_effect(
        action: &VolumeAction,
        result_kind: JobResultKind,
        result: &Value,
    ) -> Result<RowEffect, ActionError> {
        if result_kind != JobResultKind::Volume {
            return Ok(RowEffect::Unchanged);
        }
        let record = result
            .get(result_kind.key())
            .cloned()
            .and_then(ResourceRecord::from_value)
            .ok_or_else(|| ActionError::Poll {
                action: action.kind(),
                source: PollError::Api(ApiError::malformed(
                    "queryAsyncJobResult",
                    "job result carries no volume",
                )),
            })?;
        let row = Row::new(Section::Volumes, record);
        Ok(match action {
            VolumeAction::AddVolume(_) => RowEffect::Insert(row),
            _ => RowEffect::Replace(row),
        })
    }
}
