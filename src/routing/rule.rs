//! Stored rule decoding.
//!
//! Domain and path rules share one wire shape:
//! `[rule_id, [["forward", target], ["cache-control", value], ...]]`.

use serde_json::Value;

/// One step of a rule, applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Select the application (domain rules) or process (path rules).
    Forward(String),
    /// Set the `Cache-Control` response header.
    CacheControl(String),
    /// Anything this router does not understand; ignored.
    Other(String),
}

/// A decoded domain or path rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: Value,
    pub actions: Vec<Action>,
}

impl Rule {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (id, raw_actions): (Value, Vec<Vec<Value>>) =
            serde_json::from_str(raw).map_err(|e| e.to_string())?;

        let actions = raw_actions.iter().map(|a| Action::from_parts(a)).collect();
        Ok(Self { id, actions })
    }
}

impl Action {
    fn from_parts(parts: &[Value]) -> Self {
        let name = parts.first().and_then(Value::as_str).unwrap_or_default();
        let arg = parts.get(1).and_then(scalar_to_string);

        match (name, arg) {
            ("forward", Some(target)) => Action::Forward(target),
            ("cache-control", Some(value)) => Action::CacheControl(value),
            (other, _) => Action::Other(other.to_string()),
        }
    }
}

/// Render a JSON string or number as text; other values have no scalar form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
