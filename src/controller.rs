use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures::task::{Spawn, SpawnExt};
use futures_timer::Delay;
use tracing::{debug, trace};

use crate::binding::{FieldHandle, ValidationSummary};
use crate::state::{Action, FieldName, FormState, ValidationState, reduce};
use crate::validation::{BatchId, BatchOutcome, run_validators};
use crate::validator::{Validator, ValidatorMessage};
use crate::value::FieldValue;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    SpawnFailed(&'static str),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::SpawnFailed(context) => {
                write!(f, "executor refused task while {context}")
            }
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

/// Per-field bookkeeping owned by the controller: change counter, latest
/// batch id, the literal-validator snapshot from the previous binding
/// call, and the memoized projections handed out to callers.
pub(crate) struct FieldCacheEntry {
    pub(crate) changes: u64,
    pub(crate) batch: u64,
    pub(crate) boolean_snapshot: Vec<Validator>,
    pub(crate) summary: Arc<ValidationSummary>,
    pub(crate) summary_source: ValidationState,
    pub(crate) handle: Arc<FieldHandle>,
}

/// One form instance. Clones share the same state; all mutation funnels
/// through the pure reducer under the state lock. Asynchronous validation
/// runs are handed to the host-supplied spawner.
#[derive(Clone)]
pub struct Form {
    pub(crate) state: Arc<RwLock<FormState>>,
    pub(crate) fields: Arc<RwLock<BTreeMap<FieldName, FieldCacheEntry>>>,
    pub(crate) spawner: Arc<dyn Spawn + Send + Sync>,
}

impl Form {
    pub fn new(spawner: impl Spawn + Send + Sync + 'static) -> Self {
        Self {
            state: Arc::new(RwLock::new(FormState::default())),
            fields: Arc::new(RwLock::new(BTreeMap::new())),
            spawner: Arc::new(spawner),
        }
    }

    pub fn snapshot(&self) -> FormResult<FormState> {
        Ok(read_lock(&self.state, "creating form snapshot")?.clone())
    }

    pub(crate) fn dispatch(&self, action: Action) -> FormResult<()> {
        let mut state = write_lock(&self.state, "dispatching form action")?;
        *state = reduce(state.clone(), action);
        Ok(())
    }

    pub(crate) fn is_latest_batch(&self, name: &FieldName, batch: BatchId) -> FormResult<bool> {
        Ok(read_lock(&self.fields, "checking latest validation batch")?
            .get(name)
            .is_some_and(|entry| BatchId(entry.batch) == batch))
    }

    /// Fire-and-forget validation of `value` under `batch`. A debounced run
    /// sleeps first and aborts if a newer batch was started meanwhile; the
    /// result commits only if the batch is still the latest when it lands.
    pub(crate) fn spawn_validation(
        &self,
        name: FieldName,
        validators: Vec<Validator>,
        value: FieldValue,
        batch: BatchId,
        debounce: Option<Duration>,
        validation_message: Option<ValidatorMessage>,
    ) -> FormResult<()> {
        let form = self.clone();
        let task = async move {
            if let Some(delay) = debounce {
                Delay::new(delay).await;
                if !form.is_latest_batch(&name, batch).unwrap_or(false) {
                    trace!(field = %name, batch = batch.0, "debounced run superseded before starting");
                    return;
                }
            }
            let outcome = run_validators(&validators, &value, batch).await;
            if let Err(error) = form.commit_batch(&name, outcome, validation_message) {
                debug!(field = %name, %error, "validation batch could not commit");
            }
        };
        self.spawner
            .spawn(task)
            .map_err(|_| FormError::SpawnFailed("spawning validation run"))
    }

    pub(crate) fn commit_batch(
        &self,
        name: &FieldName,
        outcome: BatchOutcome,
        validation_message: Option<ValidatorMessage>,
    ) -> FormResult<()> {
        if !self.is_latest_batch(name, outcome.batch)? {
            debug!(field = %name, batch = outcome.batch.0, "discarding stale validation batch");
            return Ok(());
        }
        self.dispatch(Action::SetValidation {
            field_name: name.clone(),
            validation: outcome.validation,
            validation_message,
        })
    }
}

pub(crate) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(crate) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
