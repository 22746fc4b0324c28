//! Pure wizard state machine.
//!
//! The session knows nothing about where step data comes from. It tracks
//! the current step, the rendered view, and the values of every visited
//! step in the order the steps were first visited.

use std::collections::BTreeMap;

use tracing::debug;

use super::WizardError;
use super::steps::{self, FieldValue, FormData, StepData, StepId, StepValues, StepView};

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionStatus {
    /// Accepting field changes and transitions.
    Active,
    /// The payload has been handed off.
    Submitted,
    /// Discarded without submitting.
    Closed,
}

/// What the host must do after a transition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// Load data for this step and call [`WizardSession::enter`].
    Enter(StepId),
    /// Hand the payload to the completion handler.
    Submit(FormData),
}

/// State of one wizard run.
#[derive(Clone, Debug)]
pub struct WizardSession {
    flow: Vec<StepId>,
    current: usize,
    visited: Vec<StepId>,
    values: BTreeMap<StepId, StepValues>,
    view: Option<StepView>,
    status: SessionStatus,
}

impl WizardSession {
    /// Opens a session positioned on the first step of `flow`.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::InvalidFlow`] when `flow` is empty or repeats
    /// a step.
    pub fn new(flow: Vec<StepId>) -> Result<Self, WizardError> {
        if flow.is_empty() {
            return Err(WizardError::InvalidFlow(String::from("no steps")));
        }
        for (position, step) in flow.iter().enumerate() {
            if flow.iter().skip(position + 1).any(|later| later == step) {
                return Err(WizardError::InvalidFlow(format!("{step} appears twice")));
            }
        }
        Ok(Self {
            flow,
            current: 0,
            visited: Vec::new(),
            values: BTreeMap::new(),
            view: None,
            status: SessionStatus::Active,
        })
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Steps of the flow.
    #[must_use]
    pub fn flow(&self) -> &[StepId] {
        &self.flow
    }

    /// Current step.
    #[must_use]
    pub fn current_step(&self) -> StepId {
        self.flow
            .get(self.current)
            .copied()
            .unwrap_or(StepId::Review)
    }

    /// 1-based position of the current step.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.current + 1
    }

    /// True on the last step of the flow.
    #[must_use]
    pub fn on_last_step(&self) -> bool {
        self.position() == self.flow.len()
    }

    /// View of the current step, once entered.
    #[must_use]
    pub const fn view(&self) -> Option<&StepView> {
        self.view.as_ref()
    }

    /// Steps visited so far, in first-visit order.
    #[must_use]
    pub fn visited(&self) -> &[StepId] {
        &self.visited
    }

    /// Values entered on `step`, if it was visited.
    #[must_use]
    pub fn values(&self, step: StepId) -> Option<&StepValues> {
        self.values.get(&step)
    }

    /// Snapshot of all values across visited steps.
    #[must_use]
    pub fn form_data(&self) -> FormData {
        self.visited
            .iter()
            .filter_map(|step| self.values.get(step))
            .flat_map(|values| values.iter())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn ensure_active(&self) -> Result<(), WizardError> {
        match self.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::Submitted => Err(WizardError::Finished),
            SessionStatus::Closed => Err(WizardError::Closed),
        }
    }

    fn values_mut(&mut self, step: StepId) -> &mut StepValues {
        if !self.visited.contains(&step) {
            self.visited.push(step);
        }
        self.values.entry(step).or_default()
    }

    /// Renders the current step from provider data.
    ///
    /// The first visit records the step; later visits keep the values
    /// entered before and pre-select them again.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::UnexpectedData`] when `data` belongs to another
    /// step, or [`WizardError::Finished`]/[`WizardError::Closed`] once the
    /// session has ended.
    pub fn enter(&mut self, data: StepData) -> Result<&StepView, WizardError> {
        self.ensure_active()?;
        let step = self.current_step();
        let (view, selected) = steps::generate(step, data, self.values(step))?;
        *self.values_mut(step) = selected;
        debug!(step = %step, position = self.position(), "entered wizard step");
        Ok(self.view.insert(view))
    }

    /// Sets a field on the current step.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::UnknownField`] when the field belongs to
    /// another step, [`WizardError::HiddenField`] when its section is not
    /// shown and [`WizardError::NotReady`] before the step is entered.
    pub fn set_field(
        &mut self,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), WizardError> {
        self.ensure_active()?;
        let step = self.current_step();
        if !step.fields().contains(&field) {
            return Err(WizardError::UnknownField {
                step,
                field: field.to_owned(),
            });
        }
        let view = self.view.as_mut().ok_or(WizardError::NotReady { step })?;
        if !view.shows(field) {
            return Err(WizardError::HiddenField {
                step,
                field: field.to_owned(),
            });
        }

        let mut values = self.values.get(&step).cloned().unwrap_or_default();
        values.insert(field.to_owned(), value.into());
        view.refresh(&mut values);
        *self.values_mut(step) = values;
        Ok(())
    }

    /// Validates the current step and advances, or submits on the last step.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::Validation`] without moving when the step is
    /// invalid, and [`WizardError::NotReady`] before the step is entered.
    pub fn request_next(&mut self) -> Result<Transition, WizardError> {
        self.ensure_active()?;
        let step = self.current_step();
        let view = self.view.as_ref().ok_or(WizardError::NotReady { step })?;
        let empty = StepValues::new();
        steps::validate(view, self.values(step).unwrap_or(&empty))?;

        if self.on_last_step() {
            self.status = SessionStatus::Submitted;
            self.view = None;
            debug!(step = %step, "wizard submitted");
            return Ok(Transition::Submit(self.form_data()));
        }

        self.move_to(self.current + 1);
        Ok(Transition::Enter(self.current_step()))
    }

    /// Moves back one step.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::NoPreviousStep`] on the first step.
    pub fn request_previous(&mut self) -> Result<Transition, WizardError> {
        self.ensure_active()?;
        let target = self
            .current
            .checked_sub(1)
            .ok_or(WizardError::NoPreviousStep)?;
        self.move_to(target);
        Ok(Transition::Enter(self.current_step()))
    }

    /// Jumps from the last step back to an earlier step.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::JumpNotAllowed`] unless the session is on its
    /// last step and `step` comes earlier in the flow.
    pub fn request_jump(&mut self, step: StepId) -> Result<Transition, WizardError> {
        self.ensure_active()?;
        let from = self.current_step();
        let target = self
            .flow
            .iter()
            .position(|candidate| *candidate == step)
            .filter(|index| self.on_last_step() && *index < self.current)
            .ok_or(WizardError::JumpNotAllowed { from, to: step })?;
        self.move_to(target);
        Ok(Transition::Enter(step))
    }

    /// Discards the session. Nothing is submitted.
    pub fn close(&mut self) {
        self.visited.clear();
        self.values.clear();
        self.view = None;
        self.status = SessionStatus::Closed;
        debug!("wizard closed");
    }

    fn move_to(&mut self, index: usize) {
        let from = self.current_step();
        self.current = index;
        self.view = None;
        debug!(from = %from, to = %self.current_step(), "wizard transition");
    }
}
