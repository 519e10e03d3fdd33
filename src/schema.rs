use jsonschema::validator_for;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("Schema compile error: {0}")]
    SchemaCompile(String),
    #[error("{0}")]
    Invalid(String),
}

/// Validate a JSON instance against a JSON Schema (draft 2020-12).
///
/// On failure the error lists every violation, joined with `; `.
pub fn validate(schema: &Value, instance: &Value) -> Result<(), SchemaValidationError> {
    let validator =
        validator_for(schema).map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;

    let violations: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| e.to_string())
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaValidationError::Invalid(violations.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_every_violation() {
        let schema = json!({
            "type": "object",
            "required": ["payload"],
            "properties": {
                "payload": { "type": "string" },
                "timeout": { "type": "integer" }
            }
        });

        assert!(validate(&schema, &json!({"payload": "apfell"})).is_ok());

        let err = validate(&schema, &json!({"timeout": "soon"})).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("payload"), "{text}");
        assert!(text.contains("soon"), "{text}");
    }

    #[test]
    fn rejects_broken_schema() {
        let schema = json!({"type": 12});
        assert!(matches!(
            validate(&schema, &json!({})),
            Err(SchemaValidationError::SchemaCompile(_))
        ));
    }
}
