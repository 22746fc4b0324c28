//! Canned step data and a recording completion for wizard scenarios.

use std::io;
use std::sync::{Arc, Mutex};

use cumulus::wizard::steps::{FROM_ISO, IMAGE_SOURCE_FIELD};
use cumulus::wizard::{
    Choice, FormData, HandlerFuture, NetworkMode, StepData, StepDataProvider, StepId,
    WizardCompletion,
};

/// Serves fixed data for every step and records what it was asked.
#[derive(Clone, Debug)]
pub struct CannedSteps {
    loads: Arc<Mutex<Vec<StepId>>>,
    fail_once: Arc<Mutex<Option<StepId>>>,
    network_mode: Arc<Mutex<NetworkMode>>,
}

impl CannedSteps {
    pub fn new() -> Self {
        Self {
            loads: Arc::default(),
            fail_once: Arc::default(),
            network_mode: Arc::new(Mutex::new(NetworkMode::SelectNetwork)),
        }
    }

    pub fn fail_once_at(&self, step: StepId) {
        if let Ok(mut pending) = self.fail_once.lock() {
            *pending = Some(step);
        }
    }

    pub fn use_security_groups(&self) {
        if let Ok(mut mode) = self.network_mode.lock() {
            *mode = NetworkMode::SecurityGroups;
        }
    }

    pub fn loads(&self) -> Vec<StepId> {
        self.loads.lock().map(|loads| loads.clone()).unwrap_or_default()
    }

    fn data(&self, step: StepId, form: &FormData) -> StepData {
        match step {
            StepId::Setup => StepData::Setup {
                zones: vec![Choice::new("z1", "Zone 1", ""), Choice::new("z2", "Zone 2", "")],
            },
            StepId::SelectIso => StepData::Images {
                featured: vec![Choice::new("t1", "Ubuntu", "")],
                community: vec![Choice::new("t2", "Alpine", "")],
                mine: Vec::new(),
            },
            StepId::ServiceOffering => StepData::ServiceOfferings {
                offerings: vec![
                    Choice::new("small", "Small", "1 vCPU"),
                    Choice::new("large", "Large", "4 vCPU"),
                ],
            },
            StepId::DataDiskOffering => StepData::DiskOfferings {
                offerings: vec![
                    Choice::new("d5", "5 GB", ""),
                    Choice::new("custom", "Custom", "").customisable(true),
                ],
                required: form
                    .get(IMAGE_SOURCE_FIELD)
                    .is_some_and(|value| value.as_single() == Some(FROM_ISO)),
            },
            StepId::Network => StepData::Networks {
                mode: self
                    .network_mode
                    .lock()
                    .map(|mode| *mode)
                    .unwrap_or(NetworkMode::SelectNetwork),
                default_networks: vec![Choice::new("n1", "guest", "")],
                optional_networks: vec![Choice::new("n2", "backup", "")],
                security_groups: vec![
                    Choice::new("sg1", "default", ""),
                    Choice::new("sg2", "web", ""),
                ],
            },
            StepId::Review => StepData::Review,
        }
    }
}

impl StepDataProvider for CannedSteps {
    fn load<'a>(&'a self, step: StepId, form: &'a FormData) -> HandlerFuture<'a, StepData> {
        Box::pin(async move {
            if let Ok(mut loads) = self.loads.lock() {
                loads.push(step);
            }
            let fail = self
                .fail_once
                .lock()
                .map(|mut pending| pending.take_if(|failing| *failing == step).is_some())
                .unwrap_or(false);
            if fail {
                return Err(io::Error::other("request timed out").into());
            }
            Ok(self.data(step, form))
        })
    }
}

/// Records every payload it receives.
#[derive(Clone, Debug, Default)]
pub struct RecordingCompletion {
    payloads: Arc<Mutex<Vec<FormData>>>,
}

impl RecordingCompletion {
    pub fn payloads(&self) -> Vec<FormData> {
        self.payloads.lock().map(|payloads| payloads.clone()).unwrap_or_default()
    }
}

impl WizardCompletion for RecordingCompletion {
    type Output = usize;

    fn complete<'a>(&'a self, payload: &'a FormData) -> HandlerFuture<'a, usize> {
        Box::pin(async move {
            let mut payloads = self
                .payloads
                .lock()
                .map_err(|_| io::Error::other("poisoned"))?;
            payloads.push(payload.clone());
            Ok(payloads.len())
        })
    }
}
