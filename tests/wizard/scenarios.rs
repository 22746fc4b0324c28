//! BDD scenarios for the provisioning wizard.

use rstest_bdd_macros::scenario;

use super::test_helpers::{WizardContext, wizard_context};

#[scenario(
    path = "tests/features/wizard.feature",
    name = "Default choices submit exactly once"
)]
fn scenario_defaults_submit_once(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "Going back restores entered values"
)]
fn scenario_previous_restores_values(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "An unknown zone keeps the wizard on the first step"
)]
fn scenario_unknown_zone_keeps_step(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "A custom disk size outside the allowed range is rejected"
)]
fn scenario_custom_size_bounded(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "An ISO image requires a data disk"
)]
fn scenario_iso_requires_disk(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "Only the review step can jump back"
)]
fn scenario_review_jumps_back(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "Closing the wizard discards it without submitting"
)]
fn scenario_close_discards(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "A step that failed to load can be reloaded"
)]
fn scenario_reload_after_failure(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "Network fields are hidden in a security group zone"
)]
fn scenario_network_fields_hidden(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "Security groups that were not offered are rejected"
)]
fn scenario_unoffered_security_groups(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "The disk size is hidden for fixed offerings"
)]
fn scenario_size_hidden_for_fixed_offering(wizard_context: WizardContext) {
    drop(wizard_context);
}

#[scenario(
    path = "tests/features/wizard.feature",
    name = "Choosing a fixed offering drops the custom size"
)]
fn scenario_fixed_offering_drops_size(wizard_context: WizardContext) {
    drop(wizard_context);
}
