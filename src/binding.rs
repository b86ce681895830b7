use std::sync::Arc;
use std::time::Duration;

use crate::controller::{FieldCacheEntry, Form, FormResult, read_lock, write_lock};
use crate::state::{Action, FieldName, ValidationState};
use crate::validation::BatchId;
use crate::validator::{Validator, ValidatorMessage, boolean_validators, merge_validators};
use crate::value::FieldValue;
use crate::visibility::{self, VisibilityContext, VisibilityStrategy};

/// Aggregated per-field validity handed to presentation code. Memoized by
/// the controller so an unchanged state yields the same `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationSummary {
    pub valid: bool,
    pub messages: Vec<ValidatorMessage>,
}

impl Default for ValidationSummary {
    fn default() -> Self {
        Self {
            valid: true,
            messages: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct ValidationOptions {
    pub debounce: Option<Duration>,
    pub on_blur: bool,
    pub show_validation: Option<VisibilityStrategy>,
}

/// Everything a caller supplies when requesting a field binding. The same
/// options are expected on every call for a given field name; changes to
/// the literal-validator subset are detected and trigger revalidation.
#[derive(Clone)]
pub struct FieldOptions {
    pub(crate) name: FieldName,
    pub(crate) initial_value: Option<FieldValue>,
    pub(crate) validation: ValidationOptions,
    pub(crate) validators: Vec<Validator>,
    pub(crate) validation_message: Option<ValidatorMessage>,
}

impl FieldOptions {
    pub fn new(name: impl Into<FieldName>) -> Self {
        Self {
            name: name.into(),
            initial_value: None,
            validation: ValidationOptions::default(),
            validators: Vec::new(),
            validation_message: None,
        }
    }

    pub fn initial_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn validators(mut self, validators: impl IntoIterator<Item = Validator>) -> Self {
        self.validators = validators.into_iter().collect();
        self
    }

    /// A message that applies to _all_ validators of this field. When set,
    /// it overrides any message supplied alongside individual validators.
    pub fn validation_message(mut self, message: impl Into<ValidatorMessage>) -> Self {
        self.validation_message = Some(message.into());
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.validation.debounce = Some(debounce);
        self
    }

    pub fn on_blur(mut self, on_blur: bool) -> Self {
        self.validation.on_blur = on_blur;
        self
    }

    pub fn show_validation<F>(mut self, strategy: F) -> Self
    where
        F: Fn(&VisibilityContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.validation.show_validation = Some(Arc::new(strategy));
        self
    }

    fn equivalent(&self, other: &Self) -> bool {
        self.name == other.name
            && self.initial_value == other.initial_value
            && self.validators == other.validators
            && self.validation_message == other.validation_message
            && self.validation.debounce == other.validation.debounce
            && self.validation.on_blur == other.validation.on_blur
            && match (
                &self.validation.show_validation,
                &other.validation.show_validation,
            ) {
                (None, None) => true,
                (Some(left), Some(right)) => Arc::ptr_eq(left, right),
                _ => false,
            }
    }
}

/// Per-field façade over the form: carries the field's options and turns
/// caller events into reducer dispatches and validation runs.
pub struct FieldHandle {
    pub(crate) form: Form,
    pub(crate) options: FieldOptions,
}

impl FieldHandle {
    pub fn name(&self) -> &FieldName {
        &self.options.name
    }

    /// Applies a new value. The value dispatch is always synchronous; only
    /// the validation trigger debounces, and only from the second change
    /// onward so the first edit surfaces feedback right away.
    pub fn change(&self, value: impl Into<FieldValue>) -> FormResult<()> {
        let value = value.into();
        let name = &self.options.name;

        let allocation = {
            let mut fields = write_lock(&self.form.fields, "recording field change")?;
            match fields.get_mut(name) {
                // Field already removed: a late change is a no-op.
                None => None,
                Some(entry) => {
                    entry.changes += 1;
                    entry.batch += 1;
                    let debounce = match self.options.validation.debounce {
                        Some(delay) if entry.changes > 1 => Some(delay),
                        _ => None,
                    };
                    Some((BatchId(entry.batch), debounce))
                }
            }
        };
        let Some((batch, debounce)) = allocation else {
            return Ok(());
        };

        self.form.dispatch(Action::SetValue {
            name: name.clone(),
            value: value.clone(),
            from_initial: false,
        })?;

        let validators = self.merged_validators()?;
        self.form.spawn_validation(
            name.clone(),
            validators,
            value,
            batch,
            debounce,
            self.options.validation_message.clone(),
        )
    }

    pub fn blur(&self) -> FormResult<()> {
        self.form.dispatch(Action::SetBlurred {
            field_name: self.options.name.clone(),
        })
    }

    pub fn focus(&self) -> FormResult<()> {
        self.form.dispatch(Action::SetFocussed {
            field_name: self.options.name.clone(),
        })
    }

    pub fn remove(&self) -> FormResult<()> {
        write_lock(&self.form.fields, "evicting field cache")?.remove(&self.options.name);
        self.form.dispatch(Action::RemoveField {
            name: self.options.name.clone(),
        })
    }

    // Literal validators captured at binding time can go stale by the time
    // a debounced run fires; the cache snapshot holds the freshest values.
    fn merged_validators(&self) -> FormResult<Vec<Validator>> {
        let snapshot = read_lock(&self.form.fields, "reading literal validator snapshot")?
            .get(&self.options.name)
            .map(|entry| entry.boolean_snapshot.clone())
            .unwrap_or_default();
        Ok(merge_validators(&snapshot, &self.options.validators))
    }
}

/// Render-ready projection of one field plus its event façade.
#[derive(Clone)]
pub struct FieldBinding {
    pub name: FieldName,
    pub value: FieldValue,
    pub touched: bool,
    pub validating: bool,
    pub validation: Arc<ValidationSummary>,
    pub show_validation: bool,
    handle: Arc<FieldHandle>,
}

impl FieldBinding {
    pub fn handle(&self) -> &Arc<FieldHandle> {
        &self.handle
    }

    pub fn change(&self, value: impl Into<FieldValue>) -> FormResult<()> {
        self.handle.change(value)
    }

    pub fn blur(&self) -> FormResult<()> {
        self.handle.blur()
    }

    pub fn focus(&self) -> FormResult<()> {
        self.handle.focus()
    }

    pub fn remove(&self) -> FormResult<()> {
        self.handle.remove()
    }
}

enum Trigger {
    Register(FieldValue),
    LiteralsChanged,
    None,
}

impl Form {
    /// Returns binding data for the named field, registering it on first
    /// call. Registration dispatches an initial value set (which does not
    /// mark the field touched) and starts one immediate validation run; on
    /// later calls a changed literal-validator subset also revalidates
    /// immediately, since those represent conditions controlled outside
    /// the form.
    pub fn field(&self, options: FieldOptions) -> FormResult<FieldBinding> {
        let name = options.name.clone();
        let fresh_literals = boolean_validators(&options.validators);

        let (trigger, batch, handle) = {
            let mut fields = write_lock(&self.fields, "preparing field binding")?;
            match fields.get_mut(&name) {
                None => {
                    let initial = options.initial_value.clone().unwrap_or_default();
                    let handle = Arc::new(FieldHandle {
                        form: self.clone(),
                        options: options.clone(),
                    });
                    fields.insert(
                        name.clone(),
                        FieldCacheEntry {
                            changes: 0,
                            batch: 1,
                            boolean_snapshot: fresh_literals.clone(),
                            summary: Arc::new(ValidationSummary::default()),
                            summary_source: ValidationState::new(),
                            handle: handle.clone(),
                        },
                    );
                    (Trigger::Register(initial), BatchId(1), handle)
                }
                Some(entry) => {
                    if !entry.handle.options.equivalent(&options) {
                        entry.handle = Arc::new(FieldHandle {
                            form: self.clone(),
                            options: options.clone(),
                        });
                    }
                    let handle = entry.handle.clone();
                    if entry.boolean_snapshot != fresh_literals {
                        entry.boolean_snapshot = fresh_literals.clone();
                        entry.batch += 1;
                        (Trigger::LiteralsChanged, BatchId(entry.batch), handle)
                    } else {
                        (Trigger::None, BatchId(entry.batch), handle)
                    }
                }
            }
        };

        match trigger {
            Trigger::Register(initial) => {
                self.dispatch(Action::SetValue {
                    name: name.clone(),
                    value: initial.clone(),
                    from_initial: true,
                })?;
                // Initial validity must be known without user interaction,
                // so the first run is never debounced.
                self.spawn_validation(
                    name.clone(),
                    options.validators.clone(),
                    initial,
                    batch,
                    None,
                    options.validation_message.clone(),
                )?;
            }
            Trigger::LiteralsChanged => {
                let value = read_lock(&self.state, "reading value for revalidation")?
                    .values
                    .get(&name)
                    .cloned()
                    .unwrap_or_default();
                let merged = merge_validators(&fresh_literals, &options.validators);
                self.spawn_validation(
                    name.clone(),
                    merged,
                    value,
                    batch,
                    None,
                    options.validation_message.clone(),
                )?;
            }
            Trigger::None => {}
        }

        let (value, touched, validating, blurred, focussed, validation_state) = {
            let state = read_lock(&self.state, "projecting field binding")?;
            (
                state.values.get(&name).cloned().unwrap_or_default(),
                state.touched.get(&name).copied().unwrap_or(false),
                state.validating.get(&name).copied().unwrap_or(false),
                state.blurred.get(&name).copied().unwrap_or(false),
                state.focussed.clone(),
                state.validation.get(&name).cloned().unwrap_or_default(),
            )
        };

        let (summary, had_changed) = {
            let mut fields = write_lock(&self.fields, "memoizing validation summary")?;
            match fields.get_mut(&name) {
                Some(entry) => {
                    if entry.summary_source != validation_state {
                        entry.summary = Arc::new(summarize(
                            &validation_state,
                            options.validation_message.as_ref(),
                        ));
                        entry.summary_source = validation_state;
                    }
                    (entry.summary.clone(), entry.changes > 0)
                }
                // Field evicted between scopes: serve an unmemoized summary.
                None => (
                    Arc::new(summarize(
                        &validation_state,
                        options.validation_message.as_ref(),
                    )),
                    false,
                ),
            }
        };

        let context = VisibilityContext {
            touched,
            blurred,
            current_focussed: focussed.as_ref(),
            is_focussed: focussed.as_ref() == Some(&name),
            validation: &summary,
            had_changed,
        };
        let show_validation = match &options.validation.show_validation {
            Some(strategy) => strategy(&context),
            None if options.validation.on_blur => visibility::strictly_on_blur(&context),
            None => visibility::generic(&context),
        };

        Ok(FieldBinding {
            name,
            value,
            touched,
            validating,
            validation: summary,
            show_validation,
            handle,
        })
    }
}

fn summarize(
    validation: &ValidationState,
    override_message: Option<&ValidatorMessage>,
) -> ValidationSummary {
    let valid = validation.values().all(|outcome| outcome.valid);
    let messages = if valid {
        Vec::new()
    } else if let Some(message) = override_message {
        // One failure message for the whole field, however many validators
        // actually failed.
        vec![message.clone()]
    } else {
        validation
            .values()
            .filter(|outcome| !outcome.valid)
            .filter_map(|outcome| outcome.message.clone())
            .collect()
    };
    ValidationSummary { valid, messages }
}
