//! BDD scenarios for volume row actions.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ActionContext, action_context};

#[scenario(
    path = "tests/features/volume_actions.feature",
    name = "Detaching a disk updates its row in place"
)]
fn scenario_detach_updates_row(action_context: ActionContext) {
    drop(action_context);
}

#[scenario(
    path = "tests/features/volume_actions.feature",
    name = "Deleting a volume removes its row"
)]
fn scenario_delete_removes_row(action_context: ActionContext) {
    drop(action_context);
}

#[scenario(
    path = "tests/features/volume_actions.feature",
    name = "A rejected command surfaces the service text"
)]
fn scenario_rejection_surfaces_text(action_context: ActionContext) {
    drop(action_context);
}

#[scenario(
    path = "tests/features/volume_actions.feature",
    name = "A failed job surfaces the job error"
)]
fn scenario_failed_job_surfaces_error(action_context: ActionContext) {
    drop(action_context);
}

#[scenario(
    path = "tests/features/volume_actions.feature",
    name = "Dismissing the view stops polling"
)]
fn scenario_dismiss_stops_polling(action_context: ActionContext) {
    drop(action_context);
}

#[scenario(
    path = "tests/features/volume_actions.feature",
    name = "An action the latest record does not offer is refused"
)]
fn scenario_stale_record_refused(action_context: ActionContext) {
    drop(action_context);
}

#[scenario(
    path = "tests/features/volume_actions.feature",
    name = "A declined confirmation sends nothing"
)]
fn scenario_declined_sends_nothing(action_context: ActionContext) {
    drop(action_context);
}
