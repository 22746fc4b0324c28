//! Volume actions.
//!
//! Each action a user can take against the volumes section is a
//! [`VolumeAction`] variant carrying exactly the parameters its command
//! needs. [`filter::available_actions`] decides which row actions a record
//! offers, [`forms`] gathers the extra input some actions ask for, and
//! [`executor::ActionExecutor`] confirms, issues and follows them.

pub mod executor;
pub mod filter;
pub mod forms;

use std::collections::BTreeSet;
use std::fmt;

use crate::api::ApiCommand;

pub use executor::{ActionError, ActionExecutor, ActionOutcome, AssumeYes, Completion, Confirm};
pub use filter::available_actions;
pub use forms::{AddVolumeForm, CreateTemplateForm, FormError, attach_candidates};

/// Kinds of action offered by the volumes section.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ActionKind {
    /// Create a new data disk. Offered on the list, never on a row.
    AddVolume,
    /// Snapshot a volume.
    TakeSnapshot,
    /// Create a template from a stopped instance's root disk.
    CreateTemplate,
    /// Attach a detached data disk to an instance.
    AttachDisk,
    /// Detach a data disk from its instance.
    DetachDisk,
    /// Delete a detached data disk.
    Delete,
}

impl ActionKind {
    /// Every row-level action, in display order.
    pub const ROW_ACTIONS: [Self; 5] = [
        Self::TakeSnapshot,
        Self::CreateTemplate,
        Self::AttachDisk,
        Self::DetachDisk,
        Self::Delete,
    ];

    /// Identifier used on the command line and in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AddVolume => "add",
            Self::TakeSnapshot => "take-snapshot",
            Self::CreateTemplate => "create-template",
            Self::AttachDisk => "attach-disk",
            Self::DetachDisk => "detach-disk",
            Self::Delete => "delete",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AddVolume => "Add volume",
            Self::TakeSnapshot => "Take snapshot",
            Self::CreateTemplate => "Create template",
            Self::AttachDisk => "Attach disk",
            Self::DetachDisk => "Detach disk",
            Self::Delete => "Delete volume",
        }
    }

    /// True for actions that operate on an existing row.
    #[must_use]
    pub const fn is_row_action(self) -> bool {
        !matches!(self, Self::AddVolume)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of actions a row currently offers.
pub type ActionSet = BTreeSet<ActionKind>;

/// Parameters of a new data disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AddVolumeRequest {
    /// Volume name.
    pub name: String,
    /// Target zone.
    pub zone_id: String,
    /// Chosen disk offering.
    pub disk_offering_id: String,
    /// Size in GB; only set for customised offerings.
    pub size_gb: Option<u64>,
}

/// Parameters of a template created from a root disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateTemplateRequest {
    /// Source volume.
    pub volume_id: String,
    /// Template name.
    pub name: String,
    /// Template description.
    pub display_text: String,
    /// Guest OS type.
    pub os_type_id: String,
}

/// A fully specified volume action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VolumeAction {
    /// `createVolume`.
    AddVolume(AddVolumeRequest),
    /// `createSnapshot`.
    TakeSnapshot {
        /// Volume to snapshot.
        volume_id: String,
    },
    /// `createTemplate`.
    CreateTemplate(CreateTemplateRequest),
    /// `attachVolume`.
    AttachDisk {
        /// Volume to attach.
        volume_id: String,
        /// Target instance.
        virtual_machine_id: String,
    },
    /// `detachVolume`.
    DetachDisk {
        /// Volume to detach.
        volume_id: String,
    },
    /// `deleteVolume`.
    Delete {
        /// Volume to delete.
        volume_id: String,
    },
}

/// Which `jobresult` member carries an action's result.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobResultKind {
    /// `jobresult.volume`; replaces or inserts the row.
    Volume,
    /// `jobresult.snapshot`; the row is untouched.
    Snapshot,
    /// `jobresult.template`; the row is untouched.
    Template,
}

impl JobResultKind {
    /// Key of the result member inside `jobresult`.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Snapshot => "snapshot",
            Self::Template => "template",
        }
    }
}

/// How an action's completion is observed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PollStrategy {
    /// The response carries a `jobid` that is polled until terminal.
    Job(JobResultKind),
    /// The response itself completes the action.
    Immediate,
}

/// User-facing texts of one action invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionMessages {
    /// Question asked before the request is issued.
    pub confirm: String,
    /// Shown once the request is accepted.
    pub success: String,
    /// Label of the pending notification.
    pub notification: String,
    /// Shown when the action completes.
    pub complete: String,
}

impl VolumeAction {
    /// Kind of this action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::AddVolume(_) => ActionKind::AddVolume,
            Self::TakeSnapshot { .. } => ActionKind::TakeSnapshot,
            Self::CreateTemplate(_) => ActionKind::CreateTemplate,
            Self::AttachDisk { .. } => ActionKind::AttachDisk,
            Self::DetachDisk { .. } => ActionKind::DetachDisk,
            Self::Delete { .. } => ActionKind::Delete,
        }
    }

    /// Volume the action targets; `None` for add-volume.
    #[must_use]
    pub fn volume_id(&self) -> Option<&str> {
        match self {
            Self::AddVolume(_) => None,
            Self::CreateTemplate(request) => Some(&request.volume_id),
            Self::TakeSnapshot { volume_id }
            | Self::AttachDisk { volume_id, .. }
            | Self::DetachDisk { volume_id }
            | Self::Delete { volume_id } => Some(volume_id),
        }
    }

    /// Builds the API command for this action.
    #[must_use]
    pub fn command(&self) -> ApiCommand {
        match self {
            Self::AddVolume(request) => ApiCommand::new("createVolume")
                .param("name", &request.name)
                .param("zoneId", &request.zone_id)
                .param("diskOfferingId", &request.disk_offering_id)
                .param_opt("size", request.size_gb),
            Self::TakeSnapshot { volume_id } => {
                ApiCommand::new("createSnapshot").param("volumeid", volume_id)
            }
            Self::CreateTemplate(request) => ApiCommand::new("createTemplate")
                .param("volumeid", &request.volume_id)
                .param("name", &request.name)
                .param("displayText", &request.display_text)
                .param("osTypeId", &request.os_type_id),
            Self::AttachDisk {
                volume_id,
                virtual_machine_id,
            } => ApiCommand::new("attachVolume")
                .param("id", volume_id)
                .param("virtualMachineId", virtual_machine_id),
            Self::DetachDisk { volume_id } => {
                ApiCommand::new("detachVolume").param("id", volume_id)
            }
            Self::Delete { volume_id } => ApiCommand::new("deleteVolume").param("id", volume_id),
        }
    }

    /// How completion is observed for this action.
    #[must_use]
    pub const fn poll_strategy(&self) -> PollStrategy {
        match self {
            Self::AddVolume(_) | Self::AttachDisk { .. } | Self::DetachDisk { .. } => {
                PollStrategy::Job(JobResultKind::Volume)
            }
            Self::TakeSnapshot { .. } => PollStrategy::Job(JobResultKind::Snapshot),
            Self::CreateTemplate(_) => PollStrategy::Job(JobResultKind::Template),
            Self::Delete { .. } => PollStrategy::Immediate,
        }
    }

    /// Texts for this action applied to a resource displayed as `name`.
    #[must_use]
    pub fn messages(&self, name: &str) -> ActionMessages {
        match self {
            Self::AddVolume(request) => ActionMessages {
                confirm: format!("Are you sure you want to add {}?", request.name),
                success: String::from("Your new volume is being created."),
                notification: String::from("Creating new volume"),
                complete: String::from("Volume has been created successfully!"),
            },
            Self::TakeSnapshot { .. } => ActionMessages {
                confirm: format!("Please confirm that you want to take a snapshot of {name}"),
                success: format!("Your new snapshot {name} is being created."),
                notification: format!("Made snapshot of volume: {name}"),
                complete: format!("Snapshot {name} is ready."),
            },
            Self::CreateTemplate(request) => ActionMessages {
                confirm: format!("Are you sure you want to create a template from {name}?"),
                success: format!("Template {} is being created.", request.name),
                notification: format!("Creating template from volume: {name}"),
                complete: format!("Template {} is ready.", request.name),
            },
            Self::AttachDisk { .. } => ActionMessages {
                confirm: String::from("Are you sure you want to attach disk?"),
                success: String::from("Disk is being attached to instance"),
                notification: String::from("Attaching disk to instance"),
                complete: String::from("Disk has been attached to instance"),
            },
            Self::DetachDisk { .. } => ActionMessages {
                confirm: String::from("Are you sure you want to detach disk?"),
                success: String::from("Disk is being detached."),
                notification: String::from("Detaching disk"),
                complete: String::from("Disk has been detached."),
            },
            Self::Delete { .. } => ActionMessages {
                confirm: String::from("Are you sure you want to delete volume?"),
                success: String::from("Volume is being deleted."),
                notification: String::from("Deleting volume"),
                complete: String::from("Volume has been deleted."),
            },
        }
    }
}
