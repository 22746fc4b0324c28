//! Action availability filter.

use crate::record::{ResourceRecord, StorageType, VmState, VolumeType};

use super::{ActionKind, ActionSet};

const OVM_HYPERVISOR: &str = "Ovm";
const ATTACHING_NAME: &str = "attaching";
const NO_VM_NAME: &str = "none";

/// Computes the row actions a volume record offers.
///
/// The result depends only on `record`. A record with no state, or with a
/// volume type the filter does not recognise, offers none of the actions
/// guarded by state and type.
#[must_use]
pub fn available_actions(record: &ResourceRecord) -> ActionSet {
    let mut actions = ActionSet::new();

    if record.hypervisor() != Some(OVM_HYPERVISOR) {
        actions.insert(ActionKind::TakeSnapshot);
    }

    if !is_settled(record) {
        return actions;
    }

    match record.volume_type() {
        Some(VolumeType::Root) => {
            if record.vm_state() == Some(VmState::Stopped) {
                actions.insert(ActionKind::CreateTemplate);
            }
        }
        Some(VolumeType::DataDisk) => data_disk_actions(record, &mut actions),
        None => {}
    }

    actions
}

/// Shared guard: a known state other than Creating or Corrupted, and a
/// volume not named "attaching".
fn is_settled(record: &ResourceRecord) -> bool {
    let state_ok = record
        .state()
        .is_some_and(|state| !matches!(state, "Creating" | "Corrupted"));
    state_ok && record.name() != Some(ATTACHING_NAME)
}

fn data_disk_actions(record: &ResourceRecord, actions: &mut ActionSet) {
    if record.storage_type() != Some(StorageType::Shared) {
        return;
    }

    if record.virtual_machine_id().is_some() {
        if matches!(
            record.vm_state(),
            Some(VmState::Running | VmState::Stopped | VmState::Destroyed)
        ) {
            actions.insert(ActionKind::DetachDisk);
        }
        return;
    }

    actions.insert(ActionKind::AttachDisk);
    if record.vm_name().is_none_or(|name| name == NO_VM_NAME) {
        actions.insert(ActionKind::Delete);
    }
}
