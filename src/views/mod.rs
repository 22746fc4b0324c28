//! Resource view registry.
//!
//! The registry describes the storage sections the console offers
//! (volumes and snapshots): which fields their list and detail views show,
//! how raw attribute values are rendered, and which actions each view
//! exposes. [`ViewRegistry`] pairs those descriptors with a control plane to
//! load pages of [`Row`]s.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::actions::forms::{ADD_VOLUME_FORM, FormSpec};
use crate::actions::{ActionKind, ActionSet, available_actions};
use crate::api::{ApiCommand, ApiError, ControlPlane, collection};
use crate::record::ResourceRecord;

/// Storage sections offered by the console.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Section {
    /// Volumes.
    Volumes,
    /// Volume snapshots.
    Snapshots,
}

impl Section {
    /// Every section, in navigation order.
    pub const ALL: [Self; 2] = [Self::Volumes, Self::Snapshots];

    /// Section identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Volumes => "volumes",
            Self::Snapshots => "snapshots",
        }
    }

    /// List command backing the section.
    #[must_use]
    pub const fn list_command(self) -> &'static str {
        match self {
            Self::Volumes => "listVolumes",
            Self::Snapshots => "listSnapshots",
        }
    }

    /// Key of the collection inside the list response.
    #[must_use]
    pub const fn collection_key(self) -> &'static str {
        match self {
            Self::Volumes => "volume",
            Self::Snapshots => "snapshot",
        }
    }

    /// Static descriptor of the section's views.
    #[must_use]
    pub const fn view(self) -> &'static SectionView {
        match self {
            Self::Volumes => &VOLUMES,
            Self::Snapshots => &SNAPSHOTS,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.name() == value)
            .ok_or_else(|| format!("unknown section: {value}"))
    }
}

/// How a raw attribute value is rendered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Converter {
    /// Shown as returned; absent values render empty.
    Plain,
    /// Byte counts in KB/MB/GB/TB; absent or zero renders empty.
    Bytes,
    /// Attached instance id; absent renders "detached".
    AttachedTo,
}

/// A field shown by a view.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldSpec {
    /// Attribute key.
    pub key: &'static str,
    /// Column or row label.
    pub label: &'static str,
    /// Value renderer.
    pub converter: Converter,
}

impl FieldSpec {
    const fn plain(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            converter: Converter::Plain,
        }
    }

    const fn with(key: &'static str, label: &'static str, converter: Converter) -> Self {
        Self {
            key,
            label,
            converter,
        }
    }

    /// Renders this field of `record`.
    #[must_use]
    pub fn render(&self, record: &ResourceRecord) -> String {
        match self.converter {
            Converter::Plain => record.text(self.key).unwrap_or_default(),
            Converter::Bytes => match record.get(self.key).and_then(Value::as_u64) {
                None | Some(0) => String::new(),
                Some(bytes) => convert_bytes(bytes),
            },
            Converter::AttachedTo => record
                .text(self.key)
                .unwrap_or_else(|| String::from("detached")),
        }
    }
}

/// Descriptor of a list view.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ListView {
    /// Columns.
    pub fields: &'static [FieldSpec],
    /// Actions offered on the list itself.
    pub actions: &'static [ActionKind],
}

/// Descriptor of a detail view.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DetailView {
    /// Title attribute.
    pub title_field: &'static str,
    /// Rows of the details tab.
    pub fields: &'static [FieldSpec],
    /// Section listing related resources, if any.
    pub related: Option<Section>,
}

/// Descriptor of a storage section.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SectionView {
    /// Section this descriptor belongs to.
    pub section: Section,
    /// Navigation title.
    pub title: &'static str,
    /// List view.
    pub list: ListView,
    /// Detail view.
    pub detail: DetailView,
    /// Create form for list-level add, if the section has one.
    pub create_form: Option<&'static FormSpec>,
}

const VOLUMES: SectionView = SectionView {
    section: Section::Volumes,
    title: "Volumes",
    list: ListView {
        fields: &[
            FieldSpec::plain("name", "Name"),
            FieldSpec::plain("type", "Type"),
            FieldSpec::plain("zonename", "Zone"),
            FieldSpec::plain("deviceid", "Device ID"),
            FieldSpec::with("size", "Size", Converter::Bytes),
        ],
        actions: &[ActionKind::AddVolume],
    },
    detail: DetailView {
        title_field: "name",
        fields: &[
            FieldSpec::plain("id", "ID"),
            FieldSpec::plain("name", "Name"),
            FieldSpec::plain("zonename", "Zone"),
            FieldSpec::plain("deviceid", "Device ID"),
            FieldSpec::plain("state", "State"),
            FieldSpec::plain("type", "Type"),
            FieldSpec::plain("storagetype", "Storage Type"),
            FieldSpec::plain("storage", "Storage"),
            FieldSpec::with("size", "Size", Converter::Bytes),
            FieldSpec::with("virtualmachineid", "VM ID", Converter::AttachedTo),
            FieldSpec::plain("vmname", "VM Name"),
            FieldSpec::plain("vmdisplayname", "VM Display Name"),
            FieldSpec::plain("created", "Created"),
            FieldSpec::plain("domain", "Domain"),
            FieldSpec::plain("account", "Account"),
        ],
        related: Some(Section::Snapshots),
    },
    create_form: Some(&ADD_VOLUME_FORM),
};

const SNAPSHOTS: SectionView = SectionView {
    section: Section::Snapshots,
    title: "Snapshots",
    list: ListView {
        fields: &[
            FieldSpec::plain("volumename", "Volume"),
            FieldSpec::plain("state", "State"),
            FieldSpec::plain("intervaltype", "Interval Type"),
            FieldSpec::plain("created", "Date"),
        ],
        actions: &[],
    },
    detail: DetailView {
        title_field: "name",
        fields: &[
            FieldSpec::plain("id", "ID"),
            FieldSpec::plain("name", "Name"),
            FieldSpec::plain("volumename", "Volume Name"),
            FieldSpec::plain("state", "State"),
            FieldSpec::plain("intervaltype", "Interval Type"),
            FieldSpec::plain("domain", "Domain"),
            FieldSpec::plain("account", "Account"),
            FieldSpec::plain("created", "Created"),
        ],
        related: None,
    },
    create_form: None,
};

/// Renders a byte count with two decimals in the largest unit below it.
#[must_use]
pub fn convert_bytes(bytes: u64) -> String {
    const KB: u128 = 1024;
    const MB: u128 = KB * 1024;
    const GB: u128 = MB * 1024;
    const TB: u128 = GB * 1024;

    let value = u128::from(bytes);
    let (unit, suffix) = if value < MB {
        (KB, "KB")
    } else if value < GB {
        (MB, "MB")
    } else if value < TB {
        (GB, "GB")
    } else {
        (TB, "TB")
    };
    let hundredths = (value * 100 + unit / 2).checked_div(unit).unwrap_or_default();
    let whole = hundredths.checked_div(100).unwrap_or_default();
    let fraction = hundredths.checked_rem(100).unwrap_or_default();
    format!("{whole}.{fraction:02} {suffix}")
}

/// A record paired with the row actions it currently offers.
///
/// The action set is always recomputed from the record, so a row never
/// offers an action its latest record does not allow.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    section: Section,
    record: ResourceRecord,
    actions: ActionSet,
}

impl Row {
    /// Builds a row and runs the section's action filter.
    #[must_use]
    pub fn new(section: Section, record: ResourceRecord) -> Self {
        let actions = match section {
            Section::Volumes => available_actions(&record),
            Section::Snapshots => ActionSet::new(),
        };
        Self {
            section,
            record,
            actions,
        }
    }

    /// Section the row belongs to.
    #[must_use]
    pub const fn section(&self) -> Section {
        self.section
    }

    /// Underlying record.
    #[must_use]
    pub const fn record(&self) -> &ResourceRecord {
        &self.record
    }

    /// Actions the row offers.
    #[must_use]
    pub const fn actions(&self) -> &ActionSet {
        &self.actions
    }

    /// Record identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.record.id()
    }

    /// Renders the given fields in order.
    #[must_use]
    pub fn render(&self, fields: &[FieldSpec]) -> Vec<String> {
        fields.iter().map(|field| field.render(&self.record)).collect()
    }
}

/// Change an action makes to the row it ran against.
#[derive(Clone, Debug, PartialEq)]
pub enum RowEffect {
    /// A new row joins the list.
    Insert(Row),
    /// The row is replaced with the updated record. Rows no longer on the
    /// page are left out.
    Replace(Row),
    /// The row with this id leaves the list.
    Remove(String),
    /// Nothing changes in the list.
    Unchanged,
}

/// One page of a list view.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    /// Rows in the order returned.
    pub rows: Vec<Row>,
}

impl Page {
    /// Applies an action's effect to the page.
    pub fn apply(&mut self, effect: RowEffect) {
        match effect {
            RowEffect::Insert(row) => self.rows.insert(0, row),
            RowEffect::Replace(row) => {
                let slot = self
                    .rows
                    .iter_mut()
                    .find(|existing| existing.id().is_some() && existing.id() == row.id());
                if let Some(existing) = slot {
                    *existing = row;
                }
            }
            RowEffect::Remove(id) => self.rows.retain(|row| row.id() != Some(id.as_str())),
            RowEffect::Unchanged => {}
        }
    }
}

/// Loads view data through a control plane.
///
/// The registry owns the cancellation token for work started from its
/// views; dropping it, or calling [`ViewRegistry::dismiss`], cancels any
/// job poll still in flight.
#[derive(Debug)]
pub struct ViewRegistry<C> {
    api: C,
    page_size: u32,
    cancel: CancellationToken,
}

impl<C: ControlPlane> ViewRegistry<C> {
    /// Creates a registry serving pages of `page_size` rows.
    #[must_use]
    pub fn new(api: C, page_size: u32) -> Self {
        Self {
            api,
            page_size,
            cancel: CancellationToken::new(),
        }
    }

    /// The control plane behind the registry.
    #[must_use]
    pub const fn api(&self) -> &C {
        &self.api
    }

    /// Token cancelled when the views are dismissed.
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Dismisses the views, cancelling in-flight polls.
    pub fn dismiss(&self) {
        self.cancel.cancel();
    }

    /// Handle that dismisses the views when cancelled, for use from a
    /// signal handler.
    #[must_use]
    pub fn dismiss_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Loads one page of a section's list view.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the list command.
    pub async fn list(&self, section: Section, page: u32) -> Result<Page, ApiError> {
        let number = page.max(1);
        let command = ApiCommand::new(section.list_command())
            .param("page", number)
            .param("pagesize", self.page_size);
        let rows = self.rows(section, &command).await?;
        debug!(section = section.name(), page = number, rows = rows.len(), "loaded list page");
        Ok(Page { number, rows })
    }

    /// Loads a single record for the detail view.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the list command.
    pub async fn detail(&self, section: Section, id: &str) -> Result<Option<Row>, ApiError> {
        let command = ApiCommand::new(section.list_command()).param("id", id);
        let rows = self.rows(section, &command).await?;
        Ok(rows.into_iter().find(|row| row.id() == Some(id)))
    }

    /// Lists the snapshots taken of a volume.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from `listSnapshots`.
    pub async fn snapshots_of(&self, volume_id: &str) -> Result<Vec<Row>, ApiError> {
        let command = ApiCommand::new(Section::Snapshots.list_command()).param("volumeid", volume_id);
        self.rows(Section::Snapshots, &command).await
    }

    async fn rows(&self, section: Section, command: &ApiCommand) -> Result<Vec<Row>, ApiError> {
        let body = self.api.call(command).await?;
        let records: Vec<ResourceRecord> = collection(command, &body, section.collection_key())?;
        Ok(records
            .into_iter()
            .map(|record| Row::new(section, record))
            .collect())
    }
}

impl<C> Drop for ViewRegistry<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
