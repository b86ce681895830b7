use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::validator::ValidatorMessage;
use crate::value::FieldValue;

/// Key of one field within a form. Fields register lazily under runtime
/// names, so the key is a cheaply clonable owned string.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldName(Arc<str>);

impl FieldName {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FieldName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Result of one validator run against one value.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: Option<ValidatorMessage>,
}

/// Per-field validation results, keyed by validator name. Duplicate names
/// resolve last-write-wins when results merge in.
pub type ValidationState = BTreeMap<&'static str, ValidationOutcome>;

/// The whole form's state. Owned by the reducer: every transition returns
/// a replacement, nothing is mutated in place by callers.
#[derive(Clone, Debug, PartialEq)]
pub struct FormState {
    pub values: BTreeMap<FieldName, FieldValue>,
    pub touched: BTreeMap<FieldName, bool>,
    pub validating: BTreeMap<FieldName, bool>,
    pub validation: BTreeMap<FieldName, ValidationState>,
    pub valid: bool,
    pub blurred: BTreeMap<FieldName, bool>,
    pub focussed: Option<FieldName>,
    pub changing: BTreeMap<FieldName, bool>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
            touched: BTreeMap::new(),
            validating: BTreeMap::new(),
            validation: BTreeMap::new(),
            valid: true,
            blurred: BTreeMap::new(),
            focussed: None,
            changing: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SetValue {
        name: FieldName,
        value: FieldValue,
        from_initial: bool,
    },
    SetValidation {
        field_name: FieldName,
        validation: ValidationState,
        validation_message: Option<ValidatorMessage>,
    },
    SetFocussed {
        field_name: FieldName,
    },
    SetBlurred {
        field_name: FieldName,
    },
    RemoveField {
        name: FieldName,
    },
}

/// True iff every validator of every field passed. Vacuously true for a
/// field with no validators and for a form with no fields.
pub fn all_fields_valid(state: &FormState) -> bool {
    state
        .validation
        .values()
        .all(|validation| validation.values().all(|outcome| outcome.valid))
}

pub fn reduce(state: FormState, action: Action) -> FormState {
    let mut next = state;
    match action {
        Action::SetValue {
            name,
            value,
            from_initial,
        } => {
            next.values.insert(name.clone(), value);
            next.touched.insert(name.clone(), !from_initial);
            next.validating.insert(name.clone(), !from_initial);
            next.changing.clear();
            next.changing.insert(name.clone(), !from_initial);
            if !from_initial {
                next.focussed = Some(name);
            }
        }
        Action::SetValidation {
            field_name,
            validation,
            validation_message,
        } => {
            next.validating.insert(field_name.clone(), false);
            let merged = next.validation.entry(field_name).or_default();
            for (validator, mut outcome) in validation {
                if let Some(message) = &validation_message {
                    outcome.message = Some(message.clone());
                }
                merged.insert(validator, outcome);
            }
            next.valid = all_fields_valid(&next);
        }
        Action::SetFocussed { field_name } => {
            next.focussed = Some(field_name);
            next.changing.clear();
        }
        Action::SetBlurred { field_name } => {
            next.focussed = None;
            next.touched.insert(field_name.clone(), true);
            next.blurred.insert(field_name, true);
            next.changing.clear();
        }
        Action::RemoveField { name } => {
            next.values.remove(&name);
            next.touched.remove(&name);
            next.validating.remove(&name);
            next.validation.remove(&name);
            next.changing.remove(&name);
            if next.focussed.as_ref() == Some(&name) {
                next.focussed = None;
            }
            next.valid = all_fields_valid(&next);
        }
    }
    next
}
