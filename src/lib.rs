//! Core library for the Cumulus storage console.
//!
//! The crate models the storage section of a CloudStack-style management
//! console: list and detail views over volumes and snapshots, the filter
//! deciding which row actions a volume offers, an executor that issues
//! those actions and follows their asynchronous jobs, and the multi-step
//! wizard used to provision new instances.

pub mod actions;
pub mod api;
pub mod config;
pub mod jobs;
pub mod logging;
pub mod provisioning;
pub mod record;
pub mod test_support;
pub mod views;
pub mod wizard;

pub use actions::{
    ActionError, ActionExecutor, ActionKind, ActionOutcome, ActionSet, VolumeAction,
    available_actions,
};
pub use api::{ApiCommand, ApiError, ControlPlane, HttpControlPlane};
pub use config::{ConfigError, ConsoleConfig};
pub use jobs::{JobId, JobPoller, JobStatus, PollError};
pub use logging::{LoggingError, init_logging};
pub use provisioning::{ApiStepProvider, DeployCompletion, DeployError, DeployRequest};
pub use record::ResourceRecord;
pub use views::{Page, Row, RowEffect, Section, ViewRegistry};
pub use wizard::{StepId, Wizard, WizardError, WizardSession};
