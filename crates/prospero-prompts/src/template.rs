//! `{{argumentName}}` placeholder substitution.

use std::collections::HashMap;

/// Replace every `{{name}}` occurrence with the matching argument value.
///
/// Substitution is literal: no escaping, no nested expansion. Placeholders
/// without a supplied argument are left in place.
pub fn render(template: &str, args: &HashMap<String, String>) -> String {
    let mut text = template.to_string();
    for (name, value) in args {
        let placeholder = format!("{{{{{name}}}}}");
        if text.contains(&placeholder) {
            text = text.replace(&placeholder, value);
        }
    }
    text
}
