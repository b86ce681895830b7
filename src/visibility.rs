use std::sync::Arc;

use crate::binding::ValidationSummary;
use crate::state::FieldName;

/// Everything a visibility strategy may look at when deciding whether
/// validation feedback should currently be shown for a field.
pub struct VisibilityContext<'a> {
    pub touched: bool,
    pub blurred: bool,
    pub current_focussed: Option<&'a FieldName>,
    pub is_focussed: bool,
    pub validation: &'a ValidationSummary,
    pub had_changed: bool,
}

pub type VisibilityStrategy = Arc<dyn Fn(&VisibilityContext<'_>) -> bool + Send + Sync>;

/// Show feedback only once the field has been blurred while invalid.
pub fn strictly_on_blur(context: &VisibilityContext<'_>) -> bool {
    !context.validation.valid && context.blurred
}

/// Show feedback whenever the field is invalid, regardless of interaction.
pub fn generic(context: &VisibilityContext<'_>) -> bool {
    !context.validation.valid
}
