//! BDD step definitions for the provisioning wizard.

use cumulus::wizard::{FieldValue, StepId, WizardEvent};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{RequestOutcome, WizardContext, WizardTestError};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Setup(#[from] WizardTestError),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn step_id(name: &str) -> Result<StepId, StepError> {
    name.parse::<StepId>().map_err(StepError::Assertion)
}

fn split_values(values: &str) -> Vec<String> {
    values
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}

#[given("an open provisioning wizard")]
fn open_wizard(wizard_context: &WizardContext) -> Result<(), StepError> {
    let step = wizard_context.drive(|wizard, _| wizard.session().current_step())?;
    if step == StepId::Setup {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("wizard opened on {step}")))
    }
}

#[given("the zone uses security groups")]
fn zone_uses_security_groups(wizard_context: &WizardContext) {
    wizard_context.steps.use_security_groups();
}

#[given("loading step \"{step}\" fails once")]
fn loading_fails_once(wizard_context: &WizardContext, step: String) -> Result<(), StepError> {
    wizard_context.steps.fail_once_at(step_id(&step)?);
    Ok(())
}

#[when("I set \"{field}\" to \"{value}\"")]
fn set_field(wizard_context: &WizardContext, field: String, value: String) -> Result<(), StepError> {
    wizard_context.request(|wizard, _| wizard.set_field(&field, value))?;
    Ok(())
}

#[when("I select \"{values}\" for \"{field}\"")]
fn select_values(
    wizard_context: &WizardContext,
    values: String,
    field: String,
) -> Result<(), StepError> {
    let selected = FieldValue::from(split_values(&values));
    wizard_context.request(|wizard, _| wizard.set_field(&field, selected))?;
    Ok(())
}

#[when("I request the next step")]
fn request_next(wizard_context: &WizardContext) -> Result<(), StepError> {
    wizard_context.request(|wizard, runtime| runtime.block_on(wizard.next()))?;
    Ok(())
}

#[when("I go back")]
fn go_back(wizard_context: &WizardContext) -> Result<(), StepError> {
    wizard_context.request(|wizard, runtime| runtime.block_on(wizard.previous()))?;
    Ok(())
}

#[when("I jump to step \"{step}\"")]
fn jump_to(wizard_context: &WizardContext, step: String) -> Result<(), StepError> {
    let target = step_id(&step)?;
    wizard_context.request(|wizard, runtime| runtime.block_on(wizard.jump(target)))?;
    Ok(())
}

#[when("I reload the step")]
fn reload(wizard_context: &WizardContext) -> Result<(), StepError> {
    wizard_context.request(|wizard, runtime| runtime.block_on(wizard.reload()))?;
    Ok(())
}

#[when("I close the wizard")]
fn close(wizard_context: &WizardContext) -> Result<(), StepError> {
    wizard_context.drive(|wizard, _| wizard.close())?;
    Ok(())
}

#[when("I advance to step \"{step}\"")]
fn advance_to(wizard_context: &WizardContext, step: String) -> Result<(), StepError> {
    let target = step_id(&step)?;
    wizard_context.drive(|wizard, runtime| {
        while wizard.session().current_step() != target {
            match runtime.block_on(wizard.next()) {
                Ok(WizardEvent::Step(_)) => {}
                Ok(WizardEvent::Submitted(_)) => {
                    return Err(StepError::Assertion(format!("submitted before reaching {target}")));
                }
                Err(err) => return Err(StepError::Assertion(format!("advance failed: {err}"))),
            }
        }
        Ok(())
    })?
}

#[then("the last request succeeded")]
fn last_succeeded(wizard_context: &WizardContext) -> Result<(), StepError> {
    match wizard_context.last_outcome() {
        Some(RequestOutcome::Succeeded) => Ok(()),
        other => Err(StepError::Assertion(format!("expected success, got {other:?}"))),
    }
}

#[then("the last request was refused as \"{kind}\"")]
fn last_failed_with(wizard_context: &WizardContext, kind: String) -> Result<(), StepError> {
    match wizard_context.last_outcome() {
        Some(RequestOutcome::Failed { kind: actual, .. }) if actual == kind => Ok(()),
        other => Err(StepError::Assertion(format!("expected {kind} failure, got {other:?}"))),
    }
}

#[then("field \"{field}\" was rejected as \"{kind}\"")]
fn last_failed_for_field(
    wizard_context: &WizardContext,
    field: String,
    kind: String,
) -> Result<(), StepError> {
    match wizard_context.last_outcome() {
        Some(RequestOutcome::Failed {
            kind: actual,
            field: Some(actual_field),
        }) if actual == kind && actual_field == field => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected {kind} failure on {field}, got {other:?}"
        ))),
    }
}

#[then("the wizard is on step \"{step}\"")]
fn wizard_on_step(wizard_context: &WizardContext, step: String) -> Result<(), StepError> {
    let expected = step_id(&step)?;
    let actual = wizard_context.drive(|wizard, _| wizard.session().current_step())?;
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected step {expected}, got {actual}")))
    }
}

#[then("\"{field}\" holds \"{value}\"")]
fn field_holds(wizard_context: &WizardContext, field: String, value: String) -> Result<(), StepError> {
    let held = wizard_context.drive(|wizard, _| {
        let session = wizard.session();
        session
            .values(session.current_step())
            .and_then(|values| values.get(&field))
            .cloned()
    })?;
    if held == Some(FieldValue::from(value.as_str())) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected {field} = {value}, got {held:?}")))
    }
}

#[then("the current step has no view")]
fn no_view(wizard_context: &WizardContext) -> Result<(), StepError> {
    if wizard_context.drive(|wizard, _| wizard.view().is_none())? {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from("a view is still shown")))
    }
}

#[then("the data disk is required")]
fn data_disk_required(wizard_context: &WizardContext) -> Result<(), StepError> {
    let required = wizard_context.drive(|wizard, _| {
        wizard
            .view()
            .is_some_and(|view| view.required && !view.sections.no_thanks)
    })?;
    if required {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from("the disk step offers no thanks")))
    }
}

#[then("the completion received \"{count}\" payloads")]
fn completion_count(wizard_context: &WizardContext, count: usize) -> Result<(), StepError> {
    let received = wizard_context.completion.payloads().len();
    if received == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected {count} payloads, got {received}")))
    }
}

#[then("the submitted payload has \"{field}\" set to \"{value}\"")]
fn payload_field(wizard_context: &WizardContext, field: String, value: String) -> Result<(), StepError> {
    let payloads = wizard_context.completion.payloads();
    let Some(payload) = payloads.first() else {
        return Err(StepError::Assertion(String::from("nothing was submitted")));
    };
    let expected = FieldValue::from(value.as_str());
    if payload.get(&field) == Some(&expected) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {field} = {value}, got {:?}",
            payload.get(&field)
        )))
    }
}

#[then("the submitted payload has no \"{field}\"")]
fn payload_lacks_field(wizard_context: &WizardContext, field: String) -> Result<(), StepError> {
    let payloads = wizard_context.completion.payloads();
    let Some(payload) = payloads.first() else {
        return Err(StepError::Assertion(String::from("nothing was submitted")));
    };
    match payload.get(&field) {
        None => Ok(()),
        Some(value) => Err(StepError::Assertion(format!("{field} was sent as {value:?}"))),
    }
}

#[then("step \"{step}\" was loaded \"{count}\" times")]
fn step_loads(wizard_context: &WizardContext, step: String, count: usize) -> Result<(), StepError> {
    let target = step_id(&step)?;
    let loads = wizard_context
        .steps
        .loads()
        .into_iter()
        .filter(|loaded| *loaded == target)
        .count();
    if loads == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("{target} loaded {loads} times, expected {count}")))
    }
}
