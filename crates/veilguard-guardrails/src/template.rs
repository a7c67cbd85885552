//! Prompt template interpolation
//!
//! Provides `${path}` substitution from a prompt-variable tree:
//! - Dotted paths into objects and arrays (`${lead.emails.0}`)
//! - Escape mechanism (`$${name}` becomes a literal `${name}`)
//! - Missing paths are kept verbatim
//!
//! Interpolate the *redacted* variables so the assembled prompt only carries
//! placeholders.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Escaped `$${...}` or a `${dotted.path}` reference
static TEMPLATE_VAR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\$\{([^}]*)\}|\$\{([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\}").unwrap()
});

/// Substitute `${path}` references in `template` with values from `variables`.
///
/// String leaves are inserted as-is, other values as compact JSON.
pub fn render_prompt(template: &str, variables: &Value) -> String {
    let rendered = TEMPLATE_VAR_REGEX.replace_all(template, |caps: &regex::Captures| {
        if let Some(escaped) = caps.get(1) {
            return format!("${{{}}}", escaped.as_str());
        }

        let path = &caps[2];
        match lookup(variables, path) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                tracing::debug!("Template variable not found, keeping as-is: ${{{}}}", path);
                caps[0].to_string()
            }
        }
    });

    rendered.into_owned()
}

fn lookup<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
