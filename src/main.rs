//! Binary entry point for the Cumulus CLI.

mod cli;

use std::io::{self, BufRead, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::debug;

use cumulus::actions::forms::{self, FormError};
use cumulus::actions::{
    ActionError, ActionExecutor, ActionOutcome, AddVolumeForm, AssumeYes, Confirm,
    CreateTemplateForm, VolumeAction, attach_candidates,
};
use cumulus::api::{ApiError, HttpControlPlane};
use cumulus::config::{ConfigError, ConsoleConfig};
use cumulus::jobs::JobPoller;
use cumulus::logging::{LoggingError, init_logging};
use cumulus::provisioning::{ApiStepProvider, DeployCompletion};
use cumulus::record::ResourceRecord;
use cumulus::views::{Page, Row, RowEffect, Section, ViewRegistry};
use cumulus::wizard::steps::{
    DEFAULT_NETWORK_FIELD, DISK_OFFERING_FIELD, DISK_SIZE_FIELD, FROM_ISO, FROM_TEMPLATE,
    IMAGE_SOURCE_FIELD, NO_DATA_DISK, OPTIONAL_NETWORKS_FIELD, SECURITY_GROUPS_FIELD,
    SERVICE_OFFERING_FIELD, TEMPLATE_FIELD, ZONE_FIELD,
};
use cumulus::wizard::{Answers, FieldValue, StepId, StepValues, Wizard, WizardError};

use cli::{
    AddVolumeArgs, AttachArgs, Cli, ProvisionCommand, SnapshotCommand, TargetArgs, TemplateArgs,
    VolumeCommand,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
    #[error("{}", .0.user_message())]
    Action(#[from] ActionError),
    #[error("invalid input: {0}")]
    Form(#[from] FormError),
    #[error("provisioning failed: {0}")]
    Wizard(#[from] WizardError),
    #[error("{section} {id} not found")]
    NotFound { section: Section, id: String },
    #[error("{0}")]
    Input(String),
}

/// Everything a command needs to talk to the control plane.
struct Console {
    views: ViewRegistry<HttpControlPlane>,
    executor: ActionExecutor<HttpControlPlane>,
    poller: JobPoller,
}

impl Console {
    fn connect() -> Result<Self, CliError> {
        let config = ConsoleConfig::load_without_cli_args()?;
        init_logging(&config.log_level)?;
        let api = HttpControlPlane::new(&config)?;
        let poller = JobPoller::new(config.poll_interval(), config.poll_timeout());
        let views = ViewRegistry::new(api.clone(), config.page_size);

        let dismiss = views.dismiss_handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                dismiss.cancel();
            }
        });

        Ok(Self {
            views,
            executor: ActionExecutor::new(api, poller),
            poller,
        })
    }

    async fn volume(&self, id: &str) -> Result<Row, CliError> {
        self.views
            .detail(Section::Volumes, id)
            .await?
            .ok_or_else(|| CliError::NotFound {
                section: Section::Volumes,
                id: id.to_owned(),
            })
    }

    async fn run_action(
        &self,
        action: &VolumeAction,
        current: Option<&Row>,
        yes: bool,
    ) -> Result<(), CliError> {
        let confirm: &dyn Confirm = if yes { &AssumeYes } else { &StdinConfirm };
        let outcome = self
            .executor
            .execute(
                action,
                current.map(Row::record),
                confirm,
                &self.views.cancellation(),
            )
            .await?;

        let mut out = io::stdout().lock();
        match outcome {
            ActionOutcome::Declined => {
                writeln!(out, "Cancelled.").ok();
            }
            ActionOutcome::Completed(completion) => {
                writeln!(out, "{}", completion.messages.complete).ok();
                if let RowEffect::Insert(row) | RowEffect::Replace(row) = &completion.effect {
                    write_detail(&mut out, row);
                }
            }
        }
        Ok(())
    }
}

/// Asks for confirmation on stderr and reads the answer from stdin.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        let mut err = io::stderr().lock();
        write!(err, "{message} [y/N] ").ok();
        err.flush().ok();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let console = Console::connect()?;
    match cli {
        Cli::Volumes(command) => volumes(&console, command).await,
        Cli::Snapshots(command) => snapshots(&console, command).await,
        Cli::Provision(command) => provision(&console, command).await,
    }
}

async fn volumes(console: &Console, command: VolumeCommand) -> Result<(), CliError> {
    match command {
        VolumeCommand::List(args) => {
            let page = console.views.list(Section::Volumes, args.page).await?;
            write_list(&mut io::stdout().lock(), Section::Volumes, &page);
            Ok(())
        }
        VolumeCommand::Show(args) => {
            let row = console.volume(&args.id).await?;
            let snapshots = console.views.snapshots_of(&args.id).await?;
            let mut out = io::stdout().lock();
            write_detail(&mut out, &row);
            write_related(&mut out, &snapshots);
            Ok(())
        }
        VolumeCommand::Add(args) => add_volume(console, args).await,
        VolumeCommand::Snapshot(TargetArgs { id, yes }) => {
            let row = console.volume(&id).await?;
            let action = VolumeAction::TakeSnapshot { volume_id: id };
            console.run_action(&action, Some(&row), yes).await
        }
        VolumeCommand::Template(args) => create_template(console, args).await,
        VolumeCommand::Attach(args) => attach(console, args).await,
        VolumeCommand::Detach(TargetArgs { id, yes }) => {
            let row = console.volume(&id).await?;
            let action = VolumeAction::DetachDisk { volume_id: id };
            console.run_action(&action, Some(&row), yes).await
        }
        VolumeCommand::Delete(TargetArgs { id, yes }) => {
            let row = console.volume(&id).await?;
            let action = VolumeAction::Delete { volume_id: id };
            console.run_action(&action, Some(&row), yes).await
        }
    }
}

async fn add_volume(console: &Console, args: AddVolumeArgs) -> Result<(), CliError> {
    let api = console.views.api();
    let zones = forms::load_zones(api).await?;
    if !zones.iter().any(|zone| zone.id == args.zone) {
        return Err(CliError::Input(format!(
            "zone {} is not available; choose one of: {}",
            args.zone,
            zones
                .iter()
                .map(|zone| format!("{} ({})", zone.id, zone.name))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    let offerings = forms::load_disk_offerings(api).await?;
    let action = AddVolumeForm {
        name: args.name,
        zone_id: args.zone,
        disk_offering_id: args.disk_offering,
        disk_size: args.size,
    }
    .resolve(&offerings)?;
    console.run_action(&action, None, args.yes).await
}

async fn create_template(console: &Console, args: TemplateArgs) -> Result<(), CliError> {
    let row = console.volume(&args.id).await?;
    let action = CreateTemplateForm {
        name: args.name,
        display_text: args.display_text,
        os_type_id: args.os_type,
    }
    .resolve(&args.id)?;
    console.run_action(&action, Some(&row), args.yes).await
}

async fn attach(console: &Console, args: AttachArgs) -> Result<(), CliError> {
    let row = console.volume(&args.id).await?;
    let candidates = attach_candidates(console.views.api(), row.record()).await?;
    let listing = || {
        candidates
            .iter()
            .map(|vm| format!("{} ({}, {})", vm.id, vm.label(), vm.state))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let Some(vm) = args.vm else {
        return Err(CliError::Input(format!(
            "choose an instance with --vm: {}",
            listing()
        )));
    };
    if !candidates.iter().any(|candidate| candidate.id == vm) {
        return Err(CliError::Input(format!(
            "instance {vm} cannot take this volume; choose one of: {}",
            listing()
        )));
    }

    let action = VolumeAction::AttachDisk {
        volume_id: args.id,
        virtual_machine_id: vm,
    };
    console.run_action(&action, Some(&row), args.yes).await
}

async fn snapshots(console: &Console, command: SnapshotCommand) -> Result<(), CliError> {
    match command {
        SnapshotCommand::List(args) => {
            let page = console.views.list(Section::Snapshots, args.page).await?;
            write_list(io::stdout().lock(), Section::Snapshots, &page);
        }
        SnapshotCommand::Show(args) => {
            let row = console
                .views
                .detail(Section::Snapshots, &args.id)
                .await?
                .ok_or_else(|| CliError::NotFound {
                    section: Section::Snapshots,
                    id: args.id.clone(),
                })?;
            write_detail(io::stdout().lock(), &row);
        }
    }
    Ok(())
}

async fn provision(console: &Console, command: ProvisionCommand) -> Result<(), CliError> {
    let api = console.views.api().clone();
    let mut wizard = Wizard::open(
        StepId::ALL.to_vec(),
        ApiStepProvider::new(api.clone()),
        DeployCompletion::new(api, console.poller, console.views.cancellation()),
    )
    .await?;
    let answers = provision_answers(command);
    debug!(steps = answers.len(), "driving provisioning wizard");
    let vm = wizard.complete_with(&answers).await?;
    write_instance(&mut io::stdout().lock(), &vm);
    Ok(())
}

fn provision_answers(command: ProvisionCommand) -> Answers {
    let step = |pairs: Vec<(&str, FieldValue)>| -> StepValues {
        pairs
            .into_iter()
            .map(|(field, value)| (field.to_owned(), value))
            .collect()
    };
    let source = if command.iso { FROM_ISO } else { FROM_TEMPLATE };

    let mut disk = vec![(
        DISK_OFFERING_FIELD,
        FieldValue::from(command.disk_offering.as_deref().unwrap_or(NO_DATA_DISK)),
    )];
    if let Some(size) = command.size {
        disk.push((DISK_SIZE_FIELD, FieldValue::from(size)));
    }

    let mut network = Vec::new();
    if let Some(default) = command.network {
        network.push((DEFAULT_NETWORK_FIELD, FieldValue::from(default)));
        network.push((OPTIONAL_NETWORKS_FIELD, FieldValue::from(command.extra_network)));
    }
    if !command.security_group.is_empty() {
        network.push((SECURITY_GROUPS_FIELD, FieldValue::from(command.security_group)));
    }

    Answers::from([
        (
            StepId::Setup,
            step(vec![
                (ZONE_FIELD, FieldValue::from(command.zone)),
                (IMAGE_SOURCE_FIELD, FieldValue::from(source)),
            ]),
        ),
        (
            StepId::SelectIso,
            step(vec![(TEMPLATE_FIELD, FieldValue::from(command.template))]),
        ),
        (
            StepId::ServiceOffering,
            step(vec![(
                SERVICE_OFFERING_FIELD,
                FieldValue::from(command.service_offering),
            )]),
        ),
        (StepId::DataDiskOffering, step(disk)),
        (StepId::Network, step(network)),
    ])
}

fn write_list(mut out: impl Write, section: Section, page: &Page) {
    let view = section.view();
    let mut header: Vec<&str> = vec!["ID"];
    header.extend(view.list.fields.iter().map(|field| field.label));
    if section == Section::Volumes {
        header.push("Actions");
    }
    writeln!(out, "{}", header.join("\t")).ok();

    for row in &page.rows {
        let mut cells = vec![row.id().unwrap_or_default().to_owned()];
        cells.extend(row.render(view.list.fields));
        if section == Section::Volumes {
            cells.push(action_names(row));
        }
        writeln!(out, "{}", cells.join("\t")).ok();
    }
    writeln!(out, "-- page {} ({} rows)", page.number, page.rows.len()).ok();
}

fn write_detail(mut out: impl Write, row: &Row) {
    let view = row.section().view();
    let values = row.render(view.detail.fields);
    for (field, value) in view.detail.fields.iter().zip(values) {
        writeln!(out, "{}: {value}", field.label).ok();
    }
    if row.section() == Section::Volumes {
        writeln!(out, "Actions: {}", action_names(row)).ok();
    }
}

fn write_related(mut out: impl Write, snapshots: &[Row]) {
    writeln!(out, "Snapshots: {}", snapshots.len()).ok();
    for snapshot in snapshots {
        let record = snapshot.record();
        writeln!(
            out,
            "  {}\t{}\t{}",
            record.id().unwrap_or_default(),
            record.name().unwrap_or_default(),
            record.state().unwrap_or_default()
        )
        .ok();
    }
}

fn write_instance(mut out: impl Write, vm: &ResourceRecord) {
    writeln!(
        out,
        "Instance {} ({}) is {}",
        vm.display_name(),
        vm.id().unwrap_or_default(),
        vm.state().unwrap_or("unknown")
    )
    .ok();
}

fn action_names(row: &Row) -> String {
    row.actions()
        .iter()
        .map(|action| action.name())
        .collect::<Vec<_>>()
        .join(",")
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
