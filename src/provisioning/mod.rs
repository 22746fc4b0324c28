//! Control-plane backed wizard handlers.
//!
//! [`ApiStepProvider`] loads each wizard step's options from the control
//! plane and [`DeployCompletion`] turns the submitted payload into a
//! `deployVirtualMachine` request whose job it follows to the end.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{
    self, ApiCommand, ApiError, ControlPlane, DiskOffering, Network, SecurityGroup,
    ServiceOffering, Template, Zone,
};
use crate::jobs::{JobPoller, PollError};
use crate::record::ResourceRecord;
use crate::wizard::steps::{
    DEFAULT_NETWORK_FIELD, DISK_OFFERING_FIELD, DISK_SIZE_FIELD, FROM_ISO, IMAGE_SOURCE_FIELD,
    NO_DATA_DISK, OPTIONAL_NETWORKS_FIELD, SECURITY_GROUPS_FIELD, SERVICE_OFFERING_FIELD,
    TEMPLATE_FIELD, ZONE_FIELD, single,
};
use crate::wizard::{
    Choice, FieldValue, FormData, HandlerFuture, NetworkMode, StepData, StepDataProvider, StepId,
    WizardCompletion,
};

/// Image filters listed by the image step, in display order.
const IMAGE_FILTERS: [&str; 3] = ["featured", "community", "selfexecutable"];

/// Loads wizard step data from the control plane.
#[derive(Clone, Debug)]
pub struct ApiStepProvider<C> {
    api: C,
}

impl<C: ControlPlane> ApiStepProvider<C> {
    /// Creates a provider backed by `api`.
    #[must_use]
    pub const fn new(api: C) -> Self {
        Self { api }
    }

    async fn step_data(&self, step: StepId, form: &FormData) -> Result<StepData, ApiError> {
        match step {
            StepId::Setup => {
                let command = ApiCommand::new("listZones").param("available", true);
                let zones: Vec<Zone> = api::list(&self.api, &command, "zone").await?;
                Ok(StepData::Setup {
                    zones: zones
                        .into_iter()
                        .map(|zone| Choice::new(zone.id, zone.name, String::new()))
                        .collect(),
                })
            }
            StepId::SelectIso => self.images(form).await,
            StepId::ServiceOffering => {
                let command = ApiCommand::new("listServiceOfferings");
                let offerings: Vec<ServiceOffering> =
                    api::list(&self.api, &command, "serviceoffering").await?;
                Ok(StepData::ServiceOfferings {
                    offerings: offerings
                        .into_iter()
                        .map(|offering| Choice::new(offering.id, offering.name, offering.displaytext))
                        .collect(),
                })
            }
            StepId::DataDiskOffering => {
                let command = ApiCommand::new("listDiskOfferings");
                let offerings: Vec<DiskOffering> =
                    api::list(&self.api, &command, "diskoffering").await?;
                Ok(StepData::DiskOfferings {
                    offerings: offerings
                        .into_iter()
                        .map(|offering| {
                            let custom = offering.iscustomized;
                            Choice::new(offering.id, offering.name, offering.displaytext)
                                .customisable(custom)
                        })
                        .collect(),
                    required: single(form, IMAGE_SOURCE_FIELD) == Some(FROM_ISO),
                })
            }
            StepId::Network => self.networks(form).await,
            StepId::Review => Ok(StepData::Review),
        }
    }

    async fn images(&self, form: &FormData) -> Result<StepData, ApiError> {
        let iso = single(form, IMAGE_SOURCE_FIELD) == Some(FROM_ISO);
        let (command, filter_key, key) = if iso {
            ("listIsos", "isofilter", "iso")
        } else {
            ("listTemplates", "templatefilter", "template")
        };

        let mut groups = Vec::with_capacity(IMAGE_FILTERS.len());
        for filter in IMAGE_FILTERS {
            let request = ApiCommand::new(command)
                .param(filter_key, filter)
                .param_opt("zoneid", single(form, ZONE_FIELD));
            let images: Vec<Template> = api::list(&self.api, &request, key).await?;
            groups.push(
                images
                    .into_iter()
                    .map(|image| Choice::new(image.id, image.name, image.displaytext))
                    .collect::<Vec<_>>(),
            );
        }
        let mut groups = groups.into_iter();
        Ok(StepData::Images {
            featured: groups.next().unwrap_or_default(),
            community: groups.next().unwrap_or_default(),
            mine: groups.next().unwrap_or_default(),
        })
    }

    async fn networks(&self, form: &FormData) -> Result<StepData, ApiError> {
        let zone_id = single(form, ZONE_FIELD);
        let command = ApiCommand::new("listZones").param_opt("id", zone_id);
        let zones: Vec<Zone> = api::list(&self.api, &command, "zone").await?;
        let security_group_zone = zones
            .iter()
            .find(|zone| Some(zone.id.as_str()) == zone_id)
            .is_some_and(Zone::uses_security_groups);

        if security_group_zone {
            let command = ApiCommand::new("listSecurityGroups");
            let groups: Vec<SecurityGroup> =
                api::list(&self.api, &command, "securitygroup").await?;
            return Ok(StepData::Networks {
                mode: NetworkMode::SecurityGroups,
                default_networks: Vec::new(),
                optional_networks: Vec::new(),
                security_groups: groups
                    .into_iter()
                    .map(|group| Choice::new(group.id, group.name, group.description))
                    .collect(),
            });
        }

        let command = ApiCommand::new("listNetworks").param_opt("zoneid", zone_id);
        let networks: Vec<Network> = api::list(&self.api, &command, "network").await?;
        let (defaults, optional): (Vec<Network>, Vec<Network>) =
            networks.into_iter().partition(|network| network.isdefault);
        let to_choice =
            |network: Network| Choice::new(network.id, network.name, network.displaytext);
        let default_networks: Vec<Choice> = if defaults.is_empty() {
            optional.iter().cloned().map(to_choice).collect()
        } else {
            defaults.into_iter().map(to_choice).collect()
        };
        Ok(StepData::Networks {
            mode: NetworkMode::SelectNetwork,
            default_networks,
            optional_networks: optional.into_iter().map(to_choice).collect(),
            security_groups: Vec::new(),
        })
    }
}

impl<C: ControlPlane> StepDataProvider for ApiStepProvider<C> {
    fn load<'a>(&'a self, step: StepId, form: &'a FormData) -> HandlerFuture<'a, StepData> {
        Box::pin(async move { self.step_data(step, form).await.map_err(Into::into) })
    }
}

/// Errors raised while deploying the submitted instance.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The payload lacks a field the deployment needs.
    #[error("missing {0} in the wizard payload")]
    MissingField(&'static str),
    /// The service rejected the request.
    #[error("deployment was rejected: {}", .0.user_message())]
    Api(#[from] ApiError),
    /// The deployment job failed or could not be followed.
    #[error("deployment did not complete: {0}")]
    Poll(#[from] PollError),
}

/// Parameters of `deployVirtualMachine` assembled from the wizard payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeployRequest {
    /// Target zone.
    pub zone_id: String,
    /// Template or ISO.
    pub template_id: String,
    /// Compute offering.
    pub service_offering_id: String,
    /// Data disk offering, when one was chosen.
    pub disk_offering_id: Option<String>,
    /// Custom data disk size in GB.
    pub size_gb: Option<String>,
    /// Networks, default first.
    pub network_ids: Vec<String>,
    /// Security groups.
    pub security_group_ids: Vec<String>,
}

impl DeployRequest {
    /// Reads the request out of a submitted payload.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::MissingField`] when the zone, image or service
    /// offering is missing.
    pub fn from_form(form: &FormData) -> Result<Self, DeployError> {
        let field = |name: &'static str| {
            single(form, name)
                .map(str::to_owned)
                .ok_or(DeployError::MissingField(name))
        };
        let disk_offering_id = single(form, DISK_OFFERING_FIELD)
            .filter(|offering| *offering != NO_DATA_DISK)
            .map(str::to_owned);
        let size_gb = disk_offering_id
            .as_ref()
            .and(single(form, DISK_SIZE_FIELD))
            .map(str::to_owned);

        let mut network_ids: Vec<String> = single(form, DEFAULT_NETWORK_FIELD)
            .map(str::to_owned)
            .into_iter()
            .collect();
        for extra in many(form, OPTIONAL_NETWORKS_FIELD) {
            if !network_ids.contains(&extra) {
                network_ids.push(extra);
            }
        }

        Ok(Self {
            zone_id: field(ZONE_FIELD)?,
            template_id: field(TEMPLATE_FIELD)?,
            service_offering_id: field(SERVICE_OFFERING_FIELD)?,
            disk_offering_id,
            size_gb,
            network_ids,
            security_group_ids: many(form, SECURITY_GROUPS_FIELD),
        })
    }

    /// Builds the API command.
    #[must_use]
    pub fn command(&self) -> ApiCommand {
        let joined = |ids: &[String]| (!ids.is_empty()).then(|| ids.join(","));
        ApiCommand::new("deployVirtualMachine")
            .param("zoneid", &self.zone_id)
            .param("templateid", &self.template_id)
            .param("serviceofferingid", &self.service_offering_id)
            .param_opt("diskofferingid", self.disk_offering_id.as_deref())
            .param_opt("size", self.size_gb.as_deref())
            .param_opt("networkids", joined(&self.network_ids))
            .param_opt("securitygroupids", joined(&self.security_group_ids))
    }
}

fn many(form: &FormData, field: &str) -> Vec<String> {
    form.get(field)
        .map(FieldValue::values)
        .unwrap_or_default()
        .into_iter()
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Deploys the submitted instance and waits for its job.
#[derive(Clone, Debug)]
pub struct DeployCompletion<C> {
    api: C,
    poller: JobPoller,
    cancel: CancellationToken,
}

impl<C: ControlPlane> DeployCompletion<C> {
    /// Creates a completion handler; `cancel` stops the job poll.
    #[must_use]
    pub const fn new(api: C, poller: JobPoller, cancel: CancellationToken) -> Self {
        Self {
            api,
            poller,
            cancel,
        }
    }

    /// Deploys from `form` and returns the new instance record.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError`] when the payload is incomplete, the request
    /// is rejected, or the job fails.
    pub async fn deploy(&self, form: &FormData) -> Result<ResourceRecord, DeployError> {
        let request = DeployRequest::from_form(form)?;
        let command = request.command();
        let body = self.api.call(&command).await?;
        let job_id = api::job_id(&command, &body)?;
        info!(job = %job_id, zone = %request.zone_id, "deploying instance");
        let result = self.poller.wait(&self.api, &job_id, &self.cancel).await?;
        result
            .get("virtualmachine")
            .cloned()
            .and_then(ResourceRecord::from_value)
            .ok_or_else(|| {
                DeployError::Api(ApiError::malformed(
                    "queryAsyncJobResult",
                    "job result carries no virtual machine",
                ))
            })
    }
}

impl<C: ControlPlane> WizardCompletion for DeployCompletion<C> {
    type Output = ResourceRecord;

    fn complete<'a>(&'a self, payload: &'a FormData) -> HandlerFuture<'a, Self::Output> {
        Box::pin(async move { self.deploy(payload).await.map_err(Into::into) })
    }
}
