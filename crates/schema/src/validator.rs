//! Strict and non-strict validation of [`serde_json::Value`]s against a [`Schema`].
//!
//! Both modes coerce strings into the declared primitive (`"42"` into `42` for
//! [`Schema::Int`]), because path segments, query strings, headers and cookies only ever
//! carry strings. They differ on unknown struct keys: [`Mode::Strict`] rejects them,
//! [`Mode::NonStrict`] drops them from the output.

use crate::{Fields, Schema, ValidationError};
use serde_json::{Map, Number, Value};
use tracing::trace;

/// How unknown struct keys are treated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Unknown keys are dropped.
    #[default]
    NonStrict,
    /// Unknown keys are a validation error.
    Strict,
}

/// A schema paired with a validation [`Mode`].
///
/// Validators hold no state besides the schema, so building two from equal schemas yields
/// validators that accept and reject exactly the same inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    schema: Schema,
    mode: Mode,
}

impl Validator {
    pub fn new(schema: Schema, mode: Mode) -> Self {
        Self { schema, mode }
    }

    pub fn strict(schema: Schema) -> Self {
        Self::new(schema, Mode::Strict)
    }

    pub fn non_strict(schema: Schema) -> Self {
        Self::new(schema, Mode::NonStrict)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Validates `input`, returning the pruned and coerced value.
    pub fn validate(&self, input: &Value) -> Result<Value, ValidationError> {
        Walker { mode: self.mode, path: Vec::new() }.validate(&self.schema, input)
    }
}

struct Walker {
    mode: Mode,
    path: Vec<String>,
}

impl Walker {
    fn validate(&mut self, schema: &Schema, input: &Value) -> Result<Value, ValidationError> {
        match schema {
            Schema::Any => Ok(input.clone()),
            Schema::String => match input {
                Value::String(_) => Ok(input.clone()),
                _ => Err(self.expected("string", input)),
            },
            Schema::Number => match input {
                Value::Number(_) => Ok(input.clone()),
                Value::String(s) => parse_number(s).ok_or_else(|| self.expected("number", input)),
                _ => Err(self.expected("number", input)),
            },
            Schema::Int => match input {
                Value::Number(n) => integral(n).ok_or_else(|| self.expected("integer", input)),
                Value::String(s) => parse_int(s).ok_or_else(|| self.expected("integer", input)),
                _ => Err(self.expected("integer", input)),
            },
            Schema::Boolean => match input {
                Value::Bool(_) => Ok(input.clone()),
                Value::String(s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s == "false" => Ok(Value::Bool(false)),
                _ => Err(self.expected("boolean", input)),
            },
            Schema::Literal(literal) => match input {
                _ if input == literal => Ok(input.clone()),
                Value::String(s) if !literal.is_string() && literal.to_string() == *s => Ok(literal.clone()),
                _ => Err(self.error(format!("expected literal {literal}, received {input}"))),
            },
            Schema::Nullable(inner) => match input {
                Value::Null => Ok(Value::Null),
                _ => self.validate(inner, input),
            },
            Schema::List(item) => match input {
                Value::Array(values) => self.validate_items(values.iter().map(|value| (item.as_ref(), value))),
                Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                    // a single query value standing in for a one element list
                    self.validate_items(std::iter::once((item.as_ref(), input)))
                }
                _ => Err(self.expected("list", input)),
            },
            Schema::Tuple(items) => match input {
                Value::Array(values) if values.len() == items.len() => self.validate_items(items.iter().zip(values)),
                Value::Array(values) => {
                    Err(self.error(format!("expected a tuple of {} items, received {} items", items.len(), values.len())))
                }
                _ => Err(self.expected("tuple", input)),
            },
            Schema::Record(item) => match input {
                Value::Object(map) => {
                    let mut output = Map::new();
                    for (key, value) in map {
                        self.path.push(key.clone());
                        let result = self.validate(item, value);
                        self.path.pop();
                        output.insert(key.clone(), result?);
                    }
                    Ok(Value::Object(output))
                }
                _ => Err(self.expected("record", input)),
            },
            Schema::Union(variants) => {
                for (index, variant) in variants.iter().enumerate() {
                    match self.validate(variant, input) {
                        Ok(value) => return Ok(value),
                        Err(e) => trace!(variant = index, cause = %e, "union variant rejected"),
                    }
                }
                Err(self.error(format!("no union variant matched {input}")))
            }
            Schema::Struct(fields) => match input {
                Value::Object(map) => self.validate_struct(fields, map),
                _ => Err(self.expected("struct", input)),
            },
        }
    }

    fn validate_items<'a, I>(&mut self, items: I) -> Result<Value, ValidationError>
    where
        I: Iterator<Item = (&'a Schema, &'a Value)>,
    {
        let mut output = Vec::new();
        for (index, (schema, value)) in items.enumerate() {
            self.path.push(index.to_string());
            let result = self.validate(schema, value);
            self.path.pop();
            output.push(result?);
        }
        Ok(Value::Array(output))
    }

    fn validate_struct(&mut self, fields: &Fields, map: &Map<String, Value>) -> Result<Value, ValidationError> {
        let mut output = Map::new();

        for (name, schema) in fields {
            self.path.push(name.clone());
            let result = match map.get(name) {
                Some(value) => self.validate(schema, value).map(Some),
                None if schema.is_optional() => Ok(None),
                None => Err(self.error("missing required field")),
            };
            self.path.pop();

            if let Some(value) = result? {
                output.insert(name.clone(), value);
            }
        }

        if self.mode == Mode::Strict
            && let Some(unknown) = map.keys().find(|key| !fields.contains(key))
        {
            self.path.push(unknown.clone());
            let error = self.error("unknown field");
            self.path.pop();
            return Err(error);
        }

        Ok(Value::Object(output))
    }

    fn expected(&self, kind: &str, input: &Value) -> ValidationError {
        self.error(format!("expected {kind}, received {input}"))
    }

    fn error<S: ToString>(&self, message: S) -> ValidationError {
        ValidationError::new(&self.path, message)
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Some(value) = parse_int(s) {
        return Some(value);
    }
    s.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

fn parse_int(s: &str) -> Option<Value> {
    let s = s.trim();
    s.parse::<i64>().map(Value::from).or_else(|_| s.parse::<u64>().map(Value::from)).ok()
}

#[allow(clippy::cast_possible_truncation, reason = "the value is integral and range checked")]
fn integral(n: &Number) -> Option<Value> {
    if n.is_i64() || n.is_u64() {
        return Some(Value::Number(n.clone()));
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
        .map(|f| Value::from(f as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use serde_json::json;

    fn user() -> Schema {
        Schema::from(fields! {
            "id" => Schema::Int,
            "name" => Schema::String,
            "admin" => Schema::nullable(Schema::Boolean),
        })
    }

    #[test]
    fn test_non_strict_prunes_unknown() {
        let validator = Validator::non_strict(user());
        let value = validator.validate(&json!({ "id": 1, "name": "a", "debug": "1" })).unwrap();
        assert_eq!(value, json!({ "id": 1, "name": "a" }));
    }

    #[test]
    fn test_strict_rejects_unknown() {
        let validator = Validator::strict(user());
        let error = validator.validate(&json!({ "id": 1, "name": "a", "debug": "1" })).unwrap_err();
        assert_eq!(error.path(), ["debug"]);
        assert_eq!(error.to_string(), "debug: unknown field");
    }

    #[test]
    fn test_strict_rejects_nested_unknown() {
        let schema = Schema::from(fields! { "query" => Schema::from(fields! { "q" => Schema::String }) });
        let error = Validator::strict(schema).validate(&json!({ "query": { "q": "x", "debug": "1" } })).unwrap_err();
        assert_eq!(error.to_string(), "query.debug: unknown field");
    }

    #[test]
    fn test_coerce_strings() {
        let validator = Validator::strict(user());
        let value = validator.validate(&json!({ "id": "42", "name": "a", "admin": "true" })).unwrap();
        assert_eq!(value, json!({ "id": 42, "name": "a", "admin": true }));
    }

    #[test]
    fn test_coerce_failure_is_error() {
        let validator = Validator::non_strict(user());
        let error = validator.validate(&json!({ "id": "abc", "name": "a" })).unwrap_err();
        assert_eq!(error.to_string(), r#"id: expected integer, received "abc""#);
    }

    #[test]
    fn test_number_coercion() {
        let validator = Validator::non_strict(Schema::Number);
        assert_eq!(validator.validate(&json!("42")).unwrap(), json!(42));
        assert_eq!(validator.validate(&json!("1.5")).unwrap(), json!(1.5));
        assert!(validator.validate(&json!("")).is_err());
        assert!(validator.validate(&json!("NaN")).is_err());
    }

    #[test]
    fn test_int_rejects_fraction() {
        let validator = Validator::non_strict(Schema::Int);
        assert_eq!(validator.validate(&json!(3.0)).unwrap(), json!(3));
        assert!(validator.validate(&json!(3.5)).is_err());
        assert!(validator.validate(&json!("3.5")).is_err());
    }

    #[test]
    fn test_missing_required_field() {
        let error = Validator::non_strict(user()).validate(&json!({ "id": 1 })).unwrap_err();
        assert_eq!(error.to_string(), "name: missing required field");
    }

    #[test]
    fn test_nullable_field_may_be_missing_or_null() {
        let validator = Validator::non_strict(user());
        assert_eq!(validator.validate(&json!({ "id": 1, "name": "a" })).unwrap(), json!({ "id": 1, "name": "a" }));
        assert_eq!(
            validator.validate(&json!({ "id": 1, "name": "a", "admin": null })).unwrap(),
            json!({ "id": 1, "name": "a", "admin": null })
        );
    }

    #[test]
    fn test_list_accepts_single_scalar() {
        let validator = Validator::non_strict(Schema::list(Schema::Int));
        assert_eq!(validator.validate(&json!("7")).unwrap(), json!([7]));
        assert_eq!(validator.validate(&json!(["1", 2])).unwrap(), json!([1, 2]));

        let error = validator.validate(&json!([1, "x"])).unwrap_err();
        assert_eq!(error.path(), ["1"]);
    }

    #[test]
    fn test_tuple_length() {
        let validator = Validator::non_strict(Schema::tuple([Schema::String, Schema::Int]));
        assert_eq!(validator.validate(&json!(["a", "1"])).unwrap(), json!(["a", 1]));
        assert!(validator.validate(&json!(["a"])).is_err());
    }

    #[test]
    fn test_record() {
        let validator = Validator::non_strict(Schema::record(Schema::Number));
        assert_eq!(validator.validate(&json!({ "a": "1", "b": 2 })).unwrap(), json!({ "a": 1, "b": 2 }));
        assert_eq!(validator.validate(&json!({ "a": "x" })).unwrap_err().path(), ["a"]);
    }

    #[test]
    fn test_literal_and_union() {
        let validator = Validator::non_strict(Schema::union([Schema::literal("asc"), Schema::literal(1)]));
        assert_eq!(validator.validate(&json!("asc")).unwrap(), json!("asc"));
        assert_eq!(validator.validate(&json!("1")).unwrap(), json!(1));
        assert_eq!(validator.validate(&json!("desc")).unwrap_err().to_string(), r#"no union variant matched "desc""#);
    }

    #[test]
    fn test_same_schema_same_verdicts() {
        let first = Validator::strict(user());
        let second = Validator::strict(user());
        for input in [json!({ "id": 1, "name": "a" }), json!({ "id": "x" }), json!({ "id": 1, "name": "a", "z": 0 })] {
            assert_eq!(first.validate(&input), second.validate(&input));
        }
    }
}
