//! Command-line interface definitions for the `cumulus` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI for the `cumulus` binary.
#[derive(Debug, Parser)]
#[command(
    name = "cumulus",
    about = "Manage volumes and snapshots and provision instances on a CloudStack cloud",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// List, inspect and act on volumes.
    #[command(subcommand)]
    Volumes(VolumeCommand),
    /// List and inspect snapshots.
    #[command(subcommand)]
    Snapshots(SnapshotCommand),
    /// Provision a new instance through the wizard.
    #[command(name = "provision", about = "Provision a new instance through the wizard")]
    Provision(ProvisionCommand),
}

/// Subcommands of `cumulus volumes`.
#[derive(Debug, Subcommand)]
pub(crate) enum VolumeCommand {
    /// List volumes with the actions each offers.
    List(PageArgs),
    /// Show a volume's details and snapshots.
    Show(IdArgs),
    /// Create a new data disk.
    Add(AddVolumeArgs),
    /// Take a snapshot of a volume.
    Snapshot(TargetArgs),
    /// Create a template from a stopped instance's root disk.
    Template(TemplateArgs),
    /// Attach a data disk to an instance.
    Attach(AttachArgs),
    /// Detach a data disk from its instance.
    Detach(TargetArgs),
    /// Delete a detached data disk.
    Delete(TargetArgs),
}

/// Subcommands of `cumulus snapshots`.
#[derive(Debug, Subcommand)]
pub(crate) enum SnapshotCommand {
    /// List snapshots.
    List(PageArgs),
    /// Show a snapshot's details.
    Show(IdArgs),
}

/// Page selection for list commands.
#[derive(Debug, Args)]
pub(crate) struct PageArgs {
    /// 1-based page number.
    #[arg(long, default_value_t = 1, value_name = "N")]
    pub(crate) page: u32,
}

/// A single resource identifier.
#[derive(Debug, Args)]
pub(crate) struct IdArgs {
    /// Resource identifier.
    #[arg(value_name = "ID")]
    pub(crate) id: String,
}

/// A volume targeted by a row action.
#[derive(Debug, Args)]
pub(crate) struct TargetArgs {
    /// Volume identifier.
    #[arg(value_name = "ID")]
    pub(crate) id: String,
    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub(crate) yes: bool,
}

/// Arguments for `cumulus volumes add`.
#[derive(Debug, Args)]
pub(crate) struct AddVolumeArgs {
    /// Name of the new volume.
    #[arg(long)]
    pub(crate) name: String,
    /// Availability zone identifier.
    #[arg(long, value_name = "ZONE_ID")]
    pub(crate) zone: String,
    /// Disk offering identifier.
    #[arg(long, value_name = "OFFERING_ID")]
    pub(crate) disk_offering: String,
    /// Size in GB; required for customised offerings and ignored otherwise.
    #[arg(long, value_name = "GB")]
    pub(crate) size: Option<String>,
    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub(crate) yes: bool,
}

/// Arguments for `cumulus volumes template`.
#[derive(Debug, Args)]
pub(crate) struct TemplateArgs {
    /// Root volume identifier.
    #[arg(value_name = "ID")]
    pub(crate) id: String,
    /// Template name.
    #[arg(long)]
    pub(crate) name: String,
    /// Template description; defaults to the name.
    #[arg(long)]
    pub(crate) display_text: Option<String>,
    /// Guest OS type identifier.
    #[arg(long, value_name = "OS_TYPE_ID")]
    pub(crate) os_type: String,
    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub(crate) yes: bool,
}

/// Arguments for `cumulus volumes attach`.
#[derive(Debug, Args)]
pub(crate) struct AttachArgs {
    /// Volume identifier.
    #[arg(value_name = "ID")]
    pub(crate) id: String,
    /// Target instance; omit to list the candidates.
    #[arg(long, value_name = "VM_ID")]
    pub(crate) vm: Option<String>,
    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub(crate) yes: bool,
}

/// Arguments for `cumulus provision`.
#[derive(Debug, Args)]
pub(crate) struct ProvisionCommand {
    /// Zone identifier.
    #[arg(long, value_name = "ZONE_ID")]
    pub(crate) zone: String,
    /// Template identifier, or ISO identifier with `--iso`.
    #[arg(long, value_name = "TEMPLATE_ID")]
    pub(crate) template: String,
    /// Treat `--template` as an ISO.
    #[arg(long)]
    pub(crate) iso: bool,
    /// Service offering identifier.
    #[arg(long, value_name = "OFFERING_ID")]
    pub(crate) service_offering: String,
    /// Data disk offering identifier.
    #[arg(long, value_name = "OFFERING_ID")]
    pub(crate) disk_offering: Option<String>,
    /// Data disk size in GB; refused unless the offering is customised.
    #[arg(long, value_name = "GB", requires = "disk_offering")]
    pub(crate) size: Option<String>,
    /// Default network identifier; refused in security-group zones.
    #[arg(long, value_name = "NETWORK_ID", conflicts_with = "security_group")]
    pub(crate) network: Option<String>,
    /// Additional network identifiers.
    #[arg(long, value_name = "NETWORK_ID", requires = "network")]
    pub(crate) extra_network: Vec<String>,
    /// Security group identifiers.
    #[arg(long, value_name = "GROUP_ID")]
    pub(crate) security_group: Vec<String>,
}
