//! `{{placeholder}}` template rendering.
//!
//! Substitution is a single regex pass. A token whose key exists in the
//! variable map is replaced with the value; a token whose key is missing
//! is left in the output exactly as written, so a half-filled template is
//! visible instead of silently losing text.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("valid template token regex")
});

/// Render a template against a variable map.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    TOKEN
        .replace_all(template, |caps: &regex::Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Flatten an event payload's top-level fields into template variables.
///
/// Strings are used as-is; every other value keeps its JSON rendering
/// (numbers unquoted, nested objects as JSON text).
pub fn payload_vars(payload: &serde_json::Value) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    if let Some(obj) = payload.as_object() {
        for (key, value) in obj {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            vars.insert(key.clone(), text);
        }
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn known_tokens_replaced() {
        let out = render(
            "Hi {{name}}, your order {{orderId}} shipped.",
            &vars(&[("name", "Ana"), ("orderId", "A-17")]),
        );
        assert_eq!(out, "Hi Ana, your order A-17 shipped.");
    }

    #[test]
    fn unknown_tokens_stay_verbatim() {
        let out = render("Hi {{name}}, code {{missing}}.", &vars(&[("name", "Ana")]));
        assert_eq!(out, "Hi Ana, code {{missing}}.");
    }

    #[test]
    fn whitespace_inside_braces_tolerated() {
        let out = render("Stock of {{ sku }} is {{  quantity  }}", &vars(&[("sku", "TEE-s"), ("quantity", "2")]));
        assert_eq!(out, "Stock of TEE-s is 2");
    }

    #[test]
    fn repeated_token_replaced_everywhere() {
        let out = render("{{x}} and {{x}} again", &vars(&[("x", "1")]));
        assert_eq!(out, "1 and 1 again");
    }

    #[test]
    fn payload_values_stringified() {
        let payload = serde_json::json!({
            "name": "Ana",
            "quantity": 2,
            "price": 9.5,
            "active": true,
            "tags": ["a", "b"],
        });
        let vars = payload_vars(&payload);
        assert_eq!(vars["name"], "Ana");
        assert_eq!(vars["quantity"], "2");
        assert_eq!(vars["price"], "9.5");
        assert_eq!(vars["active"], "true");
        assert_eq!(vars["tags"], r#"["a","b"]"#);
    }

    #[test]
    fn non_object_payload_renders_nothing() {
        let vars = payload_vars(&serde_json::json!("just a string"));
        assert!(vars.is_empty());
        assert_eq!(render("{{a}}", &vars), "{{a}}");
    }

    #[test]
    fn template_without_tokens_unchanged() {
        let out = render("no tokens here { } {{", &vars(&[("a", "b")]));
        assert_eq!(out, "no tokens here { } {{");
    }
}
