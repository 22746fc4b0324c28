//! BDD step definitions for volume row actions.

use cumulus::test_support::{job_failed, job_started, job_succeeded_with, volume_json};
use cumulus::{ActionKind, VolumeAction};
use rstest_bdd_macros::{given, then, when};
use serde_json::json;

use super::test_helpers::{ActionContext, ActionResult, ActionTestError};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Setup(#[from] ActionTestError),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn action_kind(name: &str) -> Result<ActionKind, StepError> {
    ActionKind::ROW_ACTIONS
        .into_iter()
        .find(|kind| kind.name() == name)
        .ok_or_else(|| StepError::Assertion(format!("unknown action {name}")))
}

fn row_action(kind: ActionKind, volume_id: String) -> Result<VolumeAction, StepError> {
    match kind {
        ActionKind::TakeSnapshot => Ok(VolumeAction::TakeSnapshot { volume_id }),
        ActionKind::DetachDisk => Ok(VolumeAction::DetachDisk { volume_id }),
        ActionKind::Delete => Ok(VolumeAction::Delete { volume_id }),
        other => Err(StepError::Assertion(format!("{other} needs form input"))),
    }
}

fn row_actions(action_context: &ActionContext, id: &str) -> Result<Vec<ActionKind>, StepError> {
    let page = action_context
        .page()
        .ok_or_else(|| StepError::Assertion(String::from("the list was not opened")))?;
    let row = page
        .rows
        .iter()
        .find(|row| row.id() == Some(id))
        .ok_or_else(|| StepError::Assertion(format!("volume {id} is not listed")))?;
    Ok(row.actions().iter().copied().collect())
}

#[given("a detached volume \"{id}\"")]
fn detached_volume(action_context: &ActionContext, id: String) -> Result<(), StepError> {
    action_context.add_volume(&id, false)?;
    Ok(())
}

#[given("a volume \"{id}\" attached to a running instance")]
fn attached_volume(action_context: &ActionContext, id: String) -> Result<(), StepError> {
    action_context.add_volume(&id, true)?;
    Ok(())
}

#[given("the volume list is open")]
fn list_open(action_context: &ActionContext) -> Result<(), StepError> {
    action_context.open_list()?;
    Ok(())
}

#[given("the user declines confirmations")]
fn user_declines(action_context: &ActionContext) -> Result<(), StepError> {
    action_context.decline_confirmations()?;
    Ok(())
}

#[given("the detach job finishes with volume \"{id}\" detached")]
fn detach_job_finishes(action_context: &ActionContext, id: String) {
    action_context.api.push_body(job_started("job-1"));
    action_context.api.push_body(json!({"jobstatus": 0}));
    action_context
        .api
        .push_body(job_succeeded_with("volume", volume_json(&id, &[])));
}

#[given("the service accepts the delete")]
fn delete_accepted(action_context: &ActionContext) {
    action_context.api.push_body(json!({"success": "true"}));
}

#[given("the service rejects \"{command}\" with \"{text}\"")]
fn command_rejected(action_context: &ActionContext, command: String, text: String) {
    action_context.api.push_rejection(&command, 530, &text);
}

#[given("the job fails with \"{text}\"")]
fn job_fails(action_context: &ActionContext, text: String) {
    action_context.api.push_body(job_started("job-2"));
    action_context.api.push_body(job_failed(530, &text));
}

#[given("the job never finishes")]
fn job_never_finishes(action_context: &ActionContext) {
    action_context.api.push_body(job_started("job-3"));
    action_context.api.repeat_body(json!({"jobstatus": 0}));
}

#[given("the view is dismissed")]
fn view_dismissed(action_context: &ActionContext) {
    action_context.views.dismiss();
}

#[when("I run \"{action}\" on volume \"{id}\"")]
fn run_action(action_context: &ActionContext, action: String, id: String) -> Result<(), StepError> {
    let request = row_action(action_kind(&action)?, id.clone())?;
    action_context.run(&request, &id)?;
    Ok(())
}

#[when("I attach volume \"{id}\" to instance \"{vm}\"")]
fn attach_volume(action_context: &ActionContext, id: String, vm: String) -> Result<(), StepError> {
    let request = VolumeAction::AttachDisk {
        volume_id: id.clone(),
        virtual_machine_id: vm,
    };
    action_context.run(&request, &id)?;
    Ok(())
}

#[then("the action completes with \"{message}\"")]
fn completes_with(action_context: &ActionContext, message: String) -> Result<(), StepError> {
    match action_context.result() {
        Some(ActionResult::Completed { message: actual }) if actual == message => Ok(()),
        other => Err(StepError::Assertion(format!("expected completion, got {other:?}"))),
    }
}

#[then("the action is declined")]
fn declined(action_context: &ActionContext) -> Result<(), StepError> {
    match action_context.result() {
        Some(ActionResult::Declined) => Ok(()),
        other => Err(StepError::Assertion(format!("expected decline, got {other:?}"))),
    }
}

#[then("the action fails as \"{kind}\"")]
fn fails_as(action_context: &ActionContext, kind: String) -> Result<(), StepError> {
    match action_context.result() {
        Some(ActionResult::Failed { kind: actual, .. }) if actual == kind => Ok(()),
        other => Err(StepError::Assertion(format!("expected {kind} failure, got {other:?}"))),
    }
}

#[then("the user is told \"{message}\"")]
fn user_told(action_context: &ActionContext, message: String) -> Result<(), StepError> {
    match action_context.result() {
        Some(ActionResult::Failed { message: actual, .. }) if actual == message => Ok(()),
        other => Err(StepError::Assertion(format!("expected \"{message}\", got {other:?}"))),
    }
}

#[then("the list shows \"{ids}\"")]
fn list_shows(action_context: &ActionContext, ids: String) -> Result<(), StepError> {
    let page = action_context
        .page()
        .ok_or_else(|| StepError::Assertion(String::from("the list was not opened")))?;
    let shown: Vec<&str> = page.rows.iter().filter_map(|row| row.id()).collect();
    let expected: Vec<&str> = ids.split(',').map(str::trim).collect();
    if shown == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected rows {expected:?}, got {shown:?}")))
    }
}

#[then("volume \"{id}\" offers \"{action}\"")]
fn volume_offers(action_context: &ActionContext, id: String, action: String) -> Result<(), StepError> {
    let kind = action_kind(&action)?;
    if row_actions(action_context, &id)?.contains(&kind) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("{id} does not offer {kind}")))
    }
}

#[then("volume \"{id}\" no longer offers \"{action}\"")]
fn volume_lacks(action_context: &ActionContext, id: String, action: String) -> Result<(), StepError> {
    let kind = action_kind(&action)?;
    if row_actions(action_context, &id)?.contains(&kind) {
        Err(StepError::Assertion(format!("{id} still offers {kind}")))
    } else {
        Ok(())
    }
}

#[then("\"{command}\" was sent \"{count}\" times")]
fn command_count(action_context: &ActionContext, command: String, count: usize) -> Result<(), StepError> {
    let sent = action_context.api.commands_named(&command);
    if sent == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("{command} sent {sent} times, expected {count}")))
    }
}

#[then("at most one job status query was sent")]
fn at_most_one_query(action_context: &ActionContext) -> Result<(), StepError> {
    let sent = action_context.api.commands_named("queryAsyncJobResult");
    if sent <= 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("{sent} job status queries after dismissal")))
    }
}
