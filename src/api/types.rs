//! Reference data returned by list commands.

use serde::Deserialize;

/// Availability zone.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Zone {
    /// Zone identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// `Basic` or `Advanced` networking.
    #[serde(default)]
    pub networktype: Option<String>,
    /// Whether security groups are enabled in the zone.
    #[serde(default)]
    pub securitygroupsenabled: Option<bool>,
}

impl Zone {
    /// Returns true when instances in this zone select security groups
    /// instead of networks.
    #[must_use]
    pub fn uses_security_groups(&self) -> bool {
        self.networktype.as_deref() == Some("Basic") || self.securitygroupsenabled == Some(true)
    }
}

/// Disk offering tier.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct DiskOffering {
    /// Offering identifier.
    pub id: String,
    /// Short name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub displaytext: String,
    /// True when the caller chooses the size.
    #[serde(default)]
    pub iscustomized: bool,
    /// Fixed size in GB for non-customised offerings.
    #[serde(default)]
    pub disksize: Option<u64>,
}

/// Compute offering tier.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ServiceOffering {
    /// Offering identifier.
    pub id: String,
    /// Short name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub displaytext: String,
}

/// Template or ISO image.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Template {
    /// Image identifier.
    pub id: String,
    /// Short name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub displaytext: String,
}

/// Guest network.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Network {
    /// Network identifier.
    pub id: String,
    /// Short name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub displaytext: String,
    /// True for the zone's default network.
    #[serde(default)]
    pub isdefault: bool,
}

/// Security group.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct SecurityGroup {
    /// Group identifier.
    pub id: String,
    /// Short name.
    pub name: String,
    /// Description entered by the owner.
    #[serde(default)]
    pub description: String,
}

/// Virtual machine summary used for attach-disk targets.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct VirtualMachine {
    /// Instance identifier.
    pub id: String,
    /// Instance name.
    pub name: String,
    /// Display name, when set by the owner.
    #[serde(default)]
    pub displayname: Option<String>,
    /// Run state.
    #[serde(default)]
    pub state: String,
}

impl VirtualMachine {
    /// Name shown in selection lists.
    #[must_use]
    pub fn label(&self) -> &str {
        self.displayname.as_deref().unwrap_or(&self.name)
    }
}
