//! crates/tutor_core/src/prompt.rs
//!
//! Fills `{name}` placeholders in the prompt templates.

/// Substitutes `vars` into `template` in a single pass.
///
/// Only the template is scanned for placeholders; substituted values are copied
/// verbatim, so student text that looks like `{prompt}` reaches the model as
/// written. Unknown or unterminated placeholders are left as they are.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
