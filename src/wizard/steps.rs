//! Wizard steps: identifiers, provider data, generated views and
//! validation rules.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::WizardError;

/// Field holding the chosen zone.
pub const ZONE_FIELD: &str = "zoneid";
/// Field choosing between templates and ISOs.
pub const IMAGE_SOURCE_FIELD: &str = "select-template";
/// Field holding the chosen template or ISO.
pub const TEMPLATE_FIELD: &str = "templateid";
/// Field holding the chosen compute offering.
pub const SERVICE_OFFERING_FIELD: &str = "serviceofferingid";
/// Field holding the chosen disk offering.
pub const DISK_OFFERING_FIELD: &str = "diskofferingid";
/// Field holding the custom data disk size in GB.
pub const DISK_SIZE_FIELD: &str = "size";
/// Field holding the default network.
pub const DEFAULT_NETWORK_FIELD: &str = "default-network";
/// Field holding additional networks.
pub const OPTIONAL_NETWORKS_FIELD: &str = "optional-networks";
/// Field holding security groups.
pub const SECURITY_GROUPS_FIELD: &str = "security-groups";

/// Image source value selecting templates.
pub const FROM_TEMPLATE: &str = "select-template";
/// Image source value selecting ISOs.
pub const FROM_ISO: &str = "select-iso";
/// Disk offering value declining a data disk.
pub const NO_DATA_DISK: &str = "0";

/// Smallest custom data disk, in GB.
pub const MIN_DISK_SIZE_GB: u64 = 1;
/// Largest custom data disk, in GB.
pub const MAX_DISK_SIZE_GB: u64 = 100;

/// Steps of the provisioning wizard, in their default order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum StepId {
    /// Zone and image source.
    Setup,
    /// Template or ISO.
    SelectIso,
    /// Compute offering.
    ServiceOffering,
    /// Optional data disk.
    DataDiskOffering,
    /// Networks or security groups.
    Network,
    /// Summary before launch.
    Review,
}

impl StepId {
    /// The full provisioning flow.
    pub const ALL: [Self; 6] = [
        Self::Setup,
        Self::SelectIso,
        Self::ServiceOffering,
        Self::DataDiskOffering,
        Self::Network,
        Self::Review,
    ];

    /// Step identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::SelectIso => "select-iso",
            Self::ServiceOffering => "service-offering",
            Self::DataDiskOffering => "data-disk-offering",
            Self::Network => "network",
            Self::Review => "review",
        }
    }

    /// Fields the step's form owns.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Setup => &[ZONE_FIELD, IMAGE_SOURCE_FIELD],
            Self::SelectIso => &[TEMPLATE_FIELD],
            Self::ServiceOffering => &[SERVICE_OFFERING_FIELD],
            Self::DataDiskOffering => &[DISK_OFFERING_FIELD, DISK_SIZE_FIELD],
            Self::Network => &[
                DEFAULT_NETWORK_FIELD,
                OPTIONAL_NETWORKS_FIELD,
                SECURITY_GROUPS_FIELD,
            ],
            Self::Review => &[],
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StepId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.name() == value)
            .ok_or_else(|| format!("unknown wizard step: {value}"))
    }
}

/// Value of a form field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    /// Radio, select or text input.
    Single(String),
    /// Checkbox group.
    Multiple(Vec<String>),
}

impl FieldValue {
    /// The single value, if this is one.
    #[must_use]
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(_) => None,
        }
    }

    /// All selected values.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

/// Values entered on one step.
pub type StepValues = BTreeMap<String, FieldValue>;

/// Flattened form data across every visited step.
pub type FormData = BTreeMap<String, FieldValue>;

/// Reads a single-valued field from form data.
#[must_use]
pub fn single<'a>(data: &'a FormData, field: &str) -> Option<&'a str> {
    data.get(field)
        .and_then(FieldValue::as_single)
        .filter(|value| !value.is_empty())
}

/// One selectable option.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Choice {
    /// Submitted value.
    pub id: String,
    /// Label.
    pub name: String,
    /// Secondary text.
    pub description: String,
    /// For disk offerings: the size is chosen by the user.
    pub custom: bool,
}

impl Choice {
    /// Creates a non-custom choice.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            custom: false,
        }
    }

    /// Marks the choice as customisable.
    #[must_use]
    pub fn customisable(mut self, custom: bool) -> Self {
        self.custom = custom;
        self
    }
}

/// How the network step selects connectivity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NetworkMode {
    /// Pick a default network plus optional extras.
    SelectNetwork,
    /// Pick security groups.
    SecurityGroups,
}

/// Data the provider returns for a step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StepData {
    /// Zones.
    Setup {
        /// Available zones.
        zones: Vec<Choice>,
    },
    /// Images grouped by audience.
    Images {
        /// Featured images.
        featured: Vec<Choice>,
        /// Community images.
        community: Vec<Choice>,
        /// The caller's own images.
        mine: Vec<Choice>,
    },
    /// Compute offerings.
    ServiceOfferings {
        /// Offerings.
        offerings: Vec<Choice>,
    },
    /// Disk offerings.
    DiskOfferings {
        /// Offerings; `custom` marks customisable ones.
        offerings: Vec<Choice>,
        /// A data disk must be chosen.
        required: bool,
    },
    /// Networks or security groups.
    Networks {
        /// Which section to show.
        mode: NetworkMode,
        /// Candidates for the default network.
        default_networks: Vec<Choice>,
        /// Additional networks.
        optional_networks: Vec<Choice>,
        /// Security groups.
        security_groups: Vec<Choice>,
    },
    /// The review step needs no data.
    Review,
}

impl StepData {
    const fn matches(&self, step: StepId) -> bool {
        matches!(
            (step, self),
            (StepId::Setup, Self::Setup { .. })
                | (StepId::SelectIso, Self::Images { .. })
                | (StepId::ServiceOffering, Self::ServiceOfferings { .. })
                | (StepId::DataDiskOffering, Self::DiskOfferings { .. })
                | (StepId::Network, Self::Networks { .. })
                | (StepId::Review, Self::Review)
        )
    }
}

/// A group of options bound to one field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OptionGroup {
    /// Field the group writes.
    pub field: &'static str,
    /// Group heading.
    pub label: &'static str,
    /// Checkbox group rather than radio group.
    pub multiple: bool,
    /// Options in display order.
    pub options: Vec<Choice>,
}

impl OptionGroup {
    fn offers(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.id == value)
    }
}

/// Section visibility of a step.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Sections {
    /// Custom disk size input is shown.
    pub custom_size: bool,
    /// "No thanks" option is shown.
    pub no_thanks: bool,
    /// Network section shown, for the network step.
    pub network_mode: Option<NetworkMode>,
}

/// Rendered content of the current step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepView {
    /// Step shown.
    pub step: StepId,
    /// Option groups in display order.
    pub groups: Vec<OptionGroup>,
    /// Section visibility.
    pub sections: Sections,
    /// A data disk must be chosen.
    pub required: bool,
}

impl StepView {
    /// Option group writing `field`.
    #[must_use]
    pub fn group(&self, field: &str) -> Option<&OptionGroup> {
        self.groups.iter().find(|group| group.field == field)
    }

    fn custom_offering(&self, offering: Option<&str>) -> bool {
        offering
            .and_then(|id| {
                self.group(DISK_OFFERING_FIELD)?
                    .options
                    .iter()
                    .find(|option| option.id == id)
            })
            .is_some_and(|option| option.custom)
    }

    /// Returns true when `field` can be entered on this view: it belongs to
    /// a shown option group, or it is the disk size while the custom-size
    /// section is visible.
    #[must_use]
    pub fn shows(&self, field: &str) -> bool {
        self.group(field).is_some() || (field == DISK_SIZE_FIELD && self.sections.custom_size)
    }

    /// Recomputes sections that depend on the step's current values and
    /// drops values of sections that are now hidden.
    pub fn refresh(&mut self, values: &mut StepValues) {
        if self.step == StepId::DataDiskOffering {
            let offering = values.get(DISK_OFFERING_FIELD).and_then(FieldValue::as_single);
            self.sections.custom_size = self.custom_offering(offering);
        }
        if !self.sections.custom_size {
            values.remove(DISK_SIZE_FIELD);
        }
    }
}

fn group(field: &'static str, label: &'static str, options: Vec<Choice>) -> OptionGroup {
    OptionGroup {
        field,
        label,
        multiple: false,
        options,
    }
}

fn checkboxes(field: &'static str, label: &'static str, options: Vec<Choice>) -> OptionGroup {
    OptionGroup {
        field,
        label,
        multiple: true,
        options,
    }
}

/// Builds the view for `step` from provider data and pre-selects values.
///
/// Single-choice groups keep the previous value when it is still offered
/// and otherwise fall back to the first option. Checkbox groups keep the
/// previous selections that are still offered.
///
/// # Errors
///
/// Returns [`WizardError::UnexpectedData`] when `data` belongs to another
/// step.
pub fn generate(
    step: StepId,
    data: StepData,
    previous: Option<&StepValues>,
) -> Result<(StepView, StepValues), WizardError> {
    if !data.matches(step) {
        return Err(WizardError::UnexpectedData { step });
    }

    let mut sections = Sections::default();
    let mut required = false;
    let groups = match data {
        StepData::Setup { zones } => vec![
            group(ZONE_FIELD, "Zone", zones),
            group(
                IMAGE_SOURCE_FIELD,
                "Image source",
                vec![
                    Choice::new(FROM_TEMPLATE, "Template", "Boot from a template"),
                    Choice::new(FROM_ISO, "ISO", "Install from an ISO image"),
                ],
            ),
        ],
        StepData::Images {
            featured,
            community,
            mine,
        } => {
            let images = featured.into_iter().chain(community).chain(mine).collect();
            vec![group(TEMPLATE_FIELD, "Image", images)]
        }
        StepData::ServiceOfferings { offerings } => {
            vec![group(SERVICE_OFFERING_FIELD, "Service offering", offerings)]
        }
        StepData::DiskOfferings {
            offerings,
            required: disk_required,
        } => {
            required = disk_required;
            sections.no_thanks = !disk_required;
            let mut options = Vec::with_capacity(offerings.len() + 1);
            if !disk_required {
                options.push(Choice::new(NO_DATA_DISK, "No thanks", "Do not add a data disk"));
            }
            options.extend(offerings);
            vec![group(DISK_OFFERING_FIELD, "Data disk offering", options)]
        }
        StepData::Networks {
            mode,
            default_networks,
            optional_networks,
            security_groups,
        } => {
            sections.network_mode = Some(mode);
            match mode {
                NetworkMode::SelectNetwork => vec![
                    group(DEFAULT_NETWORK_FIELD, "Default network", default_networks),
                    checkboxes(OPTIONAL_NETWORKS_FIELD, "Additional networks", optional_networks),
                ],
                NetworkMode::SecurityGroups => {
                    vec![checkboxes(SECURITY_GROUPS_FIELD, "Security groups", security_groups)]
                }
            }
        }
        StepData::Review => Vec::new(),
    };

    let mut values = StepValues::new();
    for option_group in &groups {
        let prior = previous.and_then(|values| values.get(option_group.field));
        if let Some(value) = preselect(option_group, prior) {
            values.insert(option_group.field.to_owned(), value);
        }
    }
    if let Some(size) = previous.and_then(|values| values.get(DISK_SIZE_FIELD)) {
        values.insert(DISK_SIZE_FIELD.to_owned(), size.clone());
    }

    let mut view = StepView {
        step,
        groups,
        sections,
        required,
    };
    view.refresh(&mut values);
    Ok((view, values))
}

fn preselect(group: &OptionGroup, prior: Option<&FieldValue>) -> Option<FieldValue> {
    if group.multiple {
        let kept: Vec<String> = prior
            .map(FieldValue::values)
            .unwrap_or_default()
            .into_iter()
            .filter(|value| group.offers(value))
            .map(str::to_owned)
            .collect();
        return Some(FieldValue::Multiple(kept));
    }

    prior
        .and_then(FieldValue::as_single)
        .filter(|value| group.offers(value))
        .or_else(|| group.options.first().map(|option| option.id.as_str()))
        .map(FieldValue::from)
}

fn invalid(field: &'static str, message: impl Into<String>) -> WizardError {
    WizardError::Validation {
        field,
        message: message.into(),
    }
}

fn require_offered<'a>(
    view: &StepView,
    values: &'a StepValues,
    field: &'static str,
) -> Result<&'a str, WizardError> {
    let value = values
        .get(field)
        .and_then(FieldValue::as_single)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| invalid(field, "this field is required"))?;
    if view.group(field).is_some_and(|group| group.offers(value)) {
        Ok(value)
    } else {
        Err(invalid(field, format!("{value} is not one of the offered options")))
    }
}

/// Validates the values entered on the current step.
///
/// # Errors
///
/// Returns [`WizardError::Validation`] naming the first offending field.
pub fn validate(view: &StepView, values: &StepValues) -> Result<(), WizardError> {
    for option_group in view.groups.iter().filter(|option_group| option_group.multiple) {
        let selected = values
            .get(option_group.field)
            .map(FieldValue::values)
            .unwrap_or_default();
        if let Some(value) = selected.iter().find(|value| !option_group.offers(value)) {
            return Err(invalid(
                option_group.field,
                format!("{value} is not one of the offered options"),
            ));
        }
    }

    match view.step {
        StepId::Setup => {
            require_offered(view, values, ZONE_FIELD)?;
            require_offered(view, values, IMAGE_SOURCE_FIELD)?;
        }
        StepId::SelectIso => {
            require_offered(view, values, TEMPLATE_FIELD)?;
        }
        StepId::ServiceOffering => {
            require_offered(view, values, SERVICE_OFFERING_FIELD)?;
        }
        StepId::DataDiskOffering => validate_disk(view, values)?,
        StepId::Network => {
            if view.sections.network_mode == Some(NetworkMode::SelectNetwork) {
                require_offered(view, values, DEFAULT_NETWORK_FIELD)?;
            }
        }
        StepId::Review => {}
    }
    Ok(())
}

fn validate_disk(view: &StepView, values: &StepValues) -> Result<(), WizardError> {
    let offering = require_offered(view, values, DISK_OFFERING_FIELD)?;
    if offering == NO_DATA_DISK || !view.custom_offering(Some(offering)) {
        return Ok(());
    }

    let raw = values
        .get(DISK_SIZE_FIELD)
        .and_then(FieldValue::as_single)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| invalid(DISK_SIZE_FIELD, "this field is required"))?;
    match raw.parse::<u64>() {
        Ok(size) if (MIN_DISK_SIZE_GB..=MAX_DISK_SIZE_GB).contains(&size) => Ok(()),
        _ => Err(invalid(
            DISK_SIZE_FIELD,
            format!("enter a whole number of GB between {MIN_DISK_SIZE_GB} and {MAX_DISK_SIZE_GB}"),
        )),
    }
}
