use crate::facts::humanize;
use crate::models::field::FieldDescriptor;

/// Natural-language question for a field, used both as the retrieval query
/// and as the oracle's prompt. Options travel separately.
pub fn field_question(field: &FieldDescriptor) -> String {
    let label = field.label.trim();
    let placeholder = field.placeholder.trim();
    let name = field.name.trim();

    let mut question = if !label.is_empty() {
        label.to_string()
    } else if !placeholder.is_empty() {
        placeholder.to_string()
    } else if !name.is_empty() {
        humanize(name)
    } else {
        field.id.trim().to_string()
    };

    if !label.is_empty() && !placeholder.is_empty() && !placeholder.eq_ignore_ascii_case(label) {
        question.push_str(&format!(" ({placeholder})"));
    }
    question
}
