//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Value, json};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::api::{ApiCommand, ApiError, ApiFuture, ControlPlane};

/// Scripted control plane that answers commands from pre-seeded responses.
///
/// Responses registered with [`ScriptedControlPlane::respond_to`] answer
/// every call to that command. Other calls consume the FIFO queue, then
/// fall back to the repeated body, and fail when nothing is left.
#[derive(Clone, Debug, Default)]
pub struct ScriptedControlPlane {
    state: Arc<Mutex<ScriptState>>,
}

#[derive(Debug, Default)]
struct ScriptState {
    queued: VecDeque<Result<Value, ApiError>>,
    by_command: HashMap<String, Result<Value, ApiError>>,
    repeated: Option<Value>,
    commands: Vec<ApiCommand>,
}

impl ScriptedControlPlane {
    /// Creates a control plane with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, apply: impl FnOnce(&mut ScriptState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard)
    }

    /// Queues a successful response body.
    pub fn push_body(&self, body: Value) {
        self.with_state(|state| state.queued.push_back(Ok(body)));
    }

    /// Queues a rejection carrying the given service error text.
    pub fn push_rejection(&self, command: &str, code: u32, message: &str) {
        self.with_state(|state| {
            state.queued.push_back(Err(ApiError::Rejected {
                command: command.to_owned(),
                code,
                message: message.to_owned(),
            }));
        });
    }

    /// Answers every call to `command` with `body`.
    pub fn respond_to(&self, command: &str, body: Value) {
        self.with_state(|state| {
            state.by_command.insert(command.to_owned(), Ok(body));
        });
    }

    /// Answers calls with `body` once the queue is exhausted.
    pub fn repeat_body(&self, body: Value) {
        self.with_state(|state| state.repeated = Some(body));
    }

    /// Returns every command issued so far.
    #[must_use]
    pub fn commands(&self) -> Vec<ApiCommand> {
        self.with_state(|state| state.commands.clone())
    }

    /// Counts issued commands with the given name.
    #[must_use]
    pub fn commands_named(&self, name: &str) -> usize {
        self.with_state(|state| {
            state
                .commands
                .iter()
                .filter(|command| command.name() == name)
                .count()
        })
    }

    /// Returns the first issued command with the given name.
    #[must_use]
    pub fn first_command(&self, name: &str) -> Option<ApiCommand> {
        self.with_state(|state| {
            state
                .commands
                .iter()
                .find(|command| command.name() == name)
                .cloned()
        })
    }

    fn answer(&self, command: &ApiCommand) -> Result<Value, ApiError> {
        self.with_state(|state| {
            state.commands.push(command.clone());
            if let Some(response) = state.by_command.get(command.name()) {
                return response.clone();
            }
            if let Some(response) = state.queued.pop_front() {
                return response;
            }
            state.repeated.clone().ok_or_else(|| ApiError::Transport {
                command: command.name().to_owned(),
                message: String::from("no scripted response available"),
            })
        })
    }
}

impl ControlPlane for ScriptedControlPlane {
    fn call<'a>(&'a self, command: &'a ApiCommand) -> ApiFuture<'a, Value> {
        let response = self.answer(command);
        Box::pin(async move { response })
    }
}

/// Body of a mutating command that started a job.
#[must_use]
pub fn job_started(job_id: &str) -> Value {
    json!({ "jobid": job_id })
}

/// Body of a successful `queryAsyncJobResult` carrying `item` under `key`.
#[must_use]
pub fn job_succeeded_with(key: &str, item: Value) -> Value {
    let mut result = serde_json::Map::new();
    result.insert(key.to_owned(), item);
    json!({ "jobstatus": 1, "jobresult": Value::Object(result) })
}

/// Body of a failed `queryAsyncJobResult`.
#[must_use]
pub fn job_failed(code: u32, message: &str) -> Value {
    json!({ "jobstatus": 2, "jobresult": { "errorcode": code, "errortext": message } })
}

/// Builds a data disk volume record with the given overrides applied.
#[must_use]
pub fn volume_json(id: &str, overrides: &[(&str, Value)]) -> Value {
    let mut volume = json!({
        "id": id,
        "name": format!("volume-{id}"),
        "state": "Ready",
        "type": "DATADISK",
        "hypervisor": "KVM",
        "storagetype": "shared",
        "zoneid": "zone-1",
        "zonename": "Zone 1",
        "domainid": "dom-1",
        "account": "admin",
        "size": 5_368_709_120_u64,
    });
    if let Value::Object(map) = &mut volume {
        for (key, value) in overrides {
            map.insert((*key).to_owned(), value.clone());
        }
    }
    volume
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and cleans up variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
