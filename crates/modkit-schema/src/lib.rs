//! Argument specification, coercion, normalization, and validation for modkit modules.
//!
//! This crate defines the schema layer: declarative field specifications
//! (`FieldSpec`, `Schema`), scalar coercion, single-field validation with
//! nested recursion (`validate_field`), the full-mapping validator with
//! cross-field constraints (`validate_all`, `ConstraintSet`), and the
//! normalizer that turns raw input into a `ParameterSet`.

pub mod coerce;
pub mod constraints;
pub mod error;
pub mod field;
pub mod kind;
pub mod normalize;
pub mod params;
pub mod spec;
pub mod validate;

pub use coerce::{coerce_boolean, parse_float, parse_integer, InvalidBoolean};
pub use constraints::{ConstraintSet, RequiredIf};
pub use error::ValidationError;
pub use field::validate_field;
pub use kind::{canonical_string, Kind};
pub use normalize::{normalize, CONTROL_PREFIX};
pub use params::ParameterSet;
pub use spec::{FieldSpec, Schema};
pub use validate::validate_all;
