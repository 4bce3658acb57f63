use crate::schema::{RequestSchema, build_request_schema};
use micro_schema::{Mode, SchemaError, ValidationError, Validator};
use serde_json::Value;

/// Validates the candidate value of a request, returning the value handlers will see.
#[cfg_attr(test, mockall::automock)]
pub trait ValidateRequest: Send + Sync {
    fn validate(&self, candidate: &Value) -> Result<Value, ValidationError>;
}

impl ValidateRequest for Validator {
    fn validate(&self, candidate: &Value) -> Result<Value, ValidationError> {
        Validator::validate(self, candidate)
    }
}

pub fn create_request_validator(schema: &RequestSchema, strict: bool) -> Result<Validator, SchemaError> {
    let mode = if strict { Mode::Strict } else { Mode::NonStrict };
    Ok(Validator::new(build_request_schema(schema)?, mode))
}
