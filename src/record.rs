//! Resource records returned by the control plane.
//!
//! Records are kept as the raw attribute map the API returns so views can
//! display any field, while the accessors below give typed access to the
//! attributes the action filter and executor depend on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Volume type reported by the control plane.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VolumeType {
    /// Boot disk of a virtual machine.
    Root,
    /// Additional data disk.
    DataDisk,
}

impl VolumeType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "ROOT" => Some(Self::Root),
            "DATADISK" => Some(Self::DataDisk),
            _ => None,
        }
    }
}

/// Storage pool scope of a volume.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageType {
    /// Primary storage shared across hosts in a cluster.
    Shared,
    /// Host-local storage.
    Local,
}

impl StorageType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "shared" => Some(Self::Shared),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Run state of the virtual machine a volume is attached to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VmState {
    /// The instance is running.
    Running,
    /// The instance is stopped.
    Stopped,
    /// The instance is destroyed but not yet expunged.
    Destroyed,
    /// Any other reported state (Starting, Stopping, Migrating, ...).
    Other,
}

impl VmState {
    fn parse(value: &str) -> Self {
        match value {
            "Running" => Self::Running,
            "Stopped" => Self::Stopped,
            "Destroyed" => Self::Destroyed,
            _ => Self::Other,
        }
    }
}

/// A resource (volume or snapshot) as returned by a list or job response.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ResourceRecord {
    attributes: Map<String, Value>,
}

impl ResourceRecord {
    /// Wraps an attribute map.
    #[must_use]
    pub const fn new(attributes: Map<String, Value>) -> Self {
        Self { attributes }
    }

    /// Builds a record from a JSON value, returning `None` when the value is
    /// not an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(attributes) => Some(Self { attributes }),
            _ => None,
        }
    }

    /// Returns the raw attribute map.
    #[must_use]
    pub const fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns a raw attribute value. JSON `null` is treated as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|value| !value.is_null())
    }

    /// Returns an attribute rendered as text. Strings are returned verbatim,
    /// numbers and booleans are formatted, and `null` or missing values
    /// yield `None`.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            Value::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Returns a string attribute without copying.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Resource identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.str("id")
    }

    /// Resource name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.str("name")
    }

    /// Name used in confirmation and notification messages.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.str("displayname")
            .or_else(|| self.name())
            .or_else(|| self.id())
            .unwrap_or("")
    }

    /// Lifecycle state (Allocated, Creating, Ready, ...).
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.str("state")
    }

    /// Parsed volume type; unknown values yield `None`.
    #[must_use]
    pub fn volume_type(&self) -> Option<VolumeType> {
        self.str("type").and_then(VolumeType::parse)
    }

    /// Hypervisor hosting the volume.
    #[must_use]
    pub fn hypervisor(&self) -> Option<&str> {
        self.str("hypervisor")
    }

    /// Parsed storage type; unknown values yield `None`.
    #[must_use]
    pub fn storage_type(&self) -> Option<StorageType> {
        self.str("storagetype").and_then(StorageType::parse)
    }

    /// Identifier of the attached virtual machine.
    #[must_use]
    pub fn virtual_machine_id(&self) -> Option<&str> {
        self.str("virtualmachineid")
    }

    /// Name of the attached virtual machine.
    #[must_use]
    pub fn vm_name(&self) -> Option<&str> {
        self.str("vmname")
    }

    /// Run state of the attached virtual machine.
    #[must_use]
    pub fn vm_state(&self) -> Option<VmState> {
        self.str("vmstate").map(VmState::parse)
    }

    /// Zone identifier.
    #[must_use]
    pub fn zone_id(&self) -> Option<&str> {
        self.str("zoneid")
    }

    /// Owning domain identifier.
    #[must_use]
    pub fn domain_id(&self) -> Option<&str> {
        self.str("domainid")
    }

    /// Owning account name.
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.str("account")
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.get("size").and_then(Value::as_u64)
    }
}

impl From<Map<String, Value>> for ResourceRecord {
    fn from(attributes: Map<String, Value>) -> Self {
        Self::new(attributes)
    }
}
