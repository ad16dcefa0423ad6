//! Cache of compiled JSON Schema validators.
//!
//! Parameter and response-model schemas are compiled on first use and shared
//! afterwards. Keys are stable strings such as `show_person:query:age` or
//! `create_person:response`.

use jsonschema::Validator;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error};

#[derive(Default)]
pub struct ValidatorCache {
    compiled: RwLock<HashMap<String, Arc<Validator>>>,
}

impl ValidatorCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compiled validators currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.compiled.read().map(|m| m.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the validator for `key`, compiling `schema` on a miss.
    pub fn get_or_compile(&self, key: &str, schema: &Value) -> Result<Arc<Validator>, String> {
        if let Ok(map) = self.compiled.read() {
            if let Some(v) = map.get(key) {
                return Ok(Arc::clone(v));
            }
        }

        let validator = jsonschema::validator_for(schema).map_err(|e| e.to_string())?;
        let validator = Arc::new(validator);
        if let Ok(mut map) = self.compiled.write() {
            map.entry(key.to_string())
                .or_insert_with(|| Arc::clone(&validator));
        }
        debug!(key = %key, "Compiled schema validator");
        Ok(validator)
    }

    /// Validate `instance` against `schema`, returning one message per violation.
    pub fn validate(&self, key: &str, schema: &Value, instance: &Value) -> Vec<String> {
        match self.get_or_compile(key, schema) {
            Ok(validator) => validator
                .iter_errors(instance)
                .map(|e| e.to_string())
                .collect(),
            Err(e) => {
                error!(key = %key, error = %e, "Invalid schema - CRITICAL");
                vec![format!("invalid schema for {key}: {e}")]
            }
        }
    }
}
