use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Execution parameters handed to every template as `config`.
///
/// The compiler never interprets these keys. They typically carry the
/// environment name and the names of the functions a target invokes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecConfig {
  pub values: Map<String, Value>,
}

impl ExecConfig {
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  /// Look up a parameter that is expected to be a string.
  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.values.get(key).and_then(Value::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_flat_object() {
    let config: ExecConfig =
      serde_json::from_str(r#"{ "environment": "dev", "pRetries": 3 }"#).unwrap();
    assert_eq!(config.get_str("environment"), Some("dev"));
    assert_eq!(config.get("pRetries"), Some(&Value::from(3)));
    assert_eq!(config.get_str("pRetries"), None);
  }
}
