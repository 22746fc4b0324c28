//! Extra input gathered by actions before their request is issued.

use thiserror::Error;

use crate::api::{self, ApiCommand, ApiError, ControlPlane, DiskOffering, VirtualMachine, Zone};
use crate::record::ResourceRecord;

use super::{AddVolumeRequest, CreateTemplateRequest, VolumeAction};

/// Errors raised while validating form input.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum FormError {
    /// A required field was left empty.
    #[error("{field} is required")]
    Required {
        /// Field key.
        field: &'static str,
    },
    /// A field holds a value the form cannot accept.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Field key.
        field: &'static str,
        /// Explanation shown next to the field.
        message: String,
    },
}

/// Kind of input a form field takes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Whole number.
    Number,
    /// One option from a list loaded from the control plane.
    Select,
}

/// Declarative description of a form field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormField {
    /// Key the value is stored under.
    pub key: &'static str,
    /// Label shown to the user.
    pub label: &'static str,
    /// Input kind.
    pub kind: FieldKind,
    /// Whether the field must be filled.
    pub required: bool,
    /// Whether the field starts hidden.
    pub hidden: bool,
}

/// Declarative description of a create form.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormSpec {
    /// Form title.
    pub title: &'static str,
    /// Short explanation.
    pub description: &'static str,
    /// Fields in display order.
    pub fields: &'static [FormField],
}

/// Fields of the add-volume form. `diskSize` is revealed only when the
/// chosen disk offering is customised.
pub const ADD_VOLUME_FORM: FormSpec = FormSpec {
    title: "Add volume",
    description: "Please fill in the following data to add a new volume.",
    fields: &[
        FormField {
            key: "name",
            label: "Name",
            kind: FieldKind::Text,
            required: true,
            hidden: false,
        },
        FormField {
            key: "availabilityZone",
            label: "Availability Zone",
            kind: FieldKind::Select,
            required: true,
            hidden: false,
        },
        FormField {
            key: "diskOffering",
            label: "Disk Offering",
            kind: FieldKind::Select,
            required: true,
            hidden: false,
        },
        FormField {
            key: "diskSize",
            label: "Disk size (in GB)",
            kind: FieldKind::Number,
            required: true,
            hidden: true,
        },
    ],
};

/// Raw add-volume input as typed by the user.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AddVolumeForm {
    /// Volume name.
    pub name: String,
    /// Chosen zone.
    pub zone_id: String,
    /// Chosen disk offering.
    pub disk_offering_id: String,
    /// Size in GB as typed; only read for customised offerings.
    pub disk_size: Option<String>,
}

impl AddVolumeForm {
    /// Validates the input against the offerings the user chose from.
    ///
    /// # Errors
    ///
    /// Returns [`FormError`] when a required field is empty, the offering is
    /// unknown, or a customised offering lacks a positive whole size.
    pub fn resolve(&self, offerings: &[DiskOffering]) -> Result<VolumeAction, FormError> {
        let name = required("name", &self.name)?;
        let zone_id = required("availabilityZone", &self.zone_id)?;
        let offering_id = required("diskOffering", &self.disk_offering_id)?;
        let offering = offerings
            .iter()
            .find(|offering| offering.id == offering_id)
            .ok_or_else(|| FormError::Invalid {
                field: "diskOffering",
                message: format!("unknown disk offering {offering_id}"),
            })?;

        let size_gb = if offering.iscustomized {
            let raw = self
                .disk_size
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or(FormError::Required { field: "diskSize" })?;
            Some(parse_size(raw)?)
        } else {
            None
        };

        Ok(VolumeAction::AddVolume(AddVolumeRequest {
            name: name.to_owned(),
            zone_id: zone_id.to_owned(),
            disk_offering_id: offering.id.clone(),
            size_gb,
        }))
    }
}

/// Raw create-template input.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CreateTemplateForm {
    /// Template name.
    pub name: String,
    /// Template description; defaults to the name.
    pub display_text: Option<String>,
    /// Guest OS type.
    pub os_type_id: String,
}

impl CreateTemplateForm {
    /// Builds the action for the given root volume.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Required`] when the name or OS type is empty.
    pub fn resolve(&self, volume_id: &str) -> Result<VolumeAction, FormError> {
        let name = required("name", &self.name)?;
        let os_type_id = required("osTypeId", &self.os_type_id)?;
        let display_text = self
            .display_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(name);
        Ok(VolumeAction::CreateTemplate(CreateTemplateRequest {
            volume_id: volume_id.to_owned(),
            name: name.to_owned(),
            display_text: display_text.to_owned(),
            os_type_id: os_type_id.to_owned(),
        }))
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormError::Required { field })
    } else {
        Ok(trimmed)
    }
}

fn parse_size(raw: &str) -> Result<u64, FormError> {
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(FormError::Invalid {
            field: "diskSize",
            message: format!("{raw} is not a positive whole number of GB"),
        }),
        Ok(size) => Ok(size),
    }
}

/// Zones offered by the add-volume form.
///
/// # Errors
///
/// Propagates [`ApiError`] from `listZones`.
pub async fn load_zones<C: ControlPlane + ?Sized>(api: &C) -> Result<Vec<Zone>, ApiError> {
    let command = ApiCommand::new("listZones").param("available", true);
    api::list(api, &command, "zone").await
}

/// Disk offerings offered by the add-volume form.
///
/// # Errors
///
/// Propagates [`ApiError`] from `listDiskOfferings`.
pub async fn load_disk_offerings<C: ControlPlane + ?Sized>(
    api: &C,
) -> Result<Vec<DiskOffering>, ApiError> {
    api::list(api, &ApiCommand::new("listDiskOfferings"), "diskoffering").await
}

/// Instances a detached volume can be attached to: running and stopped
/// instances in the volume's zone, domain and account, running first.
///
/// # Errors
///
/// Propagates [`ApiError`] from `listVirtualMachines`.
pub async fn attach_candidates<C: ControlPlane + ?Sized>(
    api: &C,
    volume: &ResourceRecord,
) -> Result<Vec<VirtualMachine>, ApiError> {
    let mut candidates = Vec::new();
    for state in ["Running", "Stopped"] {
        let command = ApiCommand::new("listVirtualMachines")
            .param("state", state)
            .param_opt("zoneid", volume.zone_id())
            .param_opt("domainid", volume.domain_id())
            .param_opt("account", volume.account());
        let machines: Vec<VirtualMachine> = api::list(api, &command, "virtualmachine").await?;
        candidates.extend(machines);
    }
    Ok(candidates)
}
