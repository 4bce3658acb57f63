//! Declarative field descriptors and the validators built from them.
//!
//! A [`Schema`] is data only: it describes the shape a value must have. A [`Validator`]
//! pairs a schema with a [`Mode`] and turns a candidate [`serde_json::Value`] into either
//! the validated (pruned and coerced) value or a [`ValidationError`].
//!
//! # Example
//! ```
//! use micro_schema::{fields, Schema, Validator};
//! use serde_json::json;
//!
//! let user = Schema::from(fields! {
//!     "id" => Schema::Int,
//!     "name" => Schema::String,
//! });
//!
//! let validator = Validator::non_strict(user);
//! let value = validator.validate(&json!({ "id": "42", "name": "foo", "extra": true })).unwrap();
//! assert_eq!(value, json!({ "id": 42, "name": "foo" }));
//! ```

mod error;
mod schema;
mod validator;

pub use error::SchemaError;
pub use error::ValidationError;
pub use schema::Fields;
pub use schema::Schema;
pub use validator::Mode;
pub use validator::Validator;

/// Builds a [`Fields`] set from `name => schema` pairs.
///
/// ```
/// use micro_schema::{fields, Schema};
///
/// let fields = fields! { "q" => Schema::String, "page" => Schema::nullable(Schema::Int) };
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($name:expr => $schema:expr),+ $(,)?) => {
        $crate::Fields::new()$(.field($name, $schema))+
    };
}
