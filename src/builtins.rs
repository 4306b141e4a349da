//! Native functions every template can call without capturing them.
//!
//! They form the last lookup tier, after the globals, so a captured binding
//! with the same name shadows a builtin.

use std::sync::OnceLock;

use log::debug;

use crate::error::BoxError;
use crate::scope::Bindings;
use crate::value::Value;

static BUILTINS: OnceLock<Bindings> = OnceLock::new();

/// The shared builtin tier.
pub fn builtins() -> &'static Bindings {
    BUILTINS.get_or_init(|| {
        debug!("Defining builtin natives");

        Bindings::new()
            .with("len", Value::native("len", Some(1), len))
            .with("str", Value::native("str", Some(1), |args| {
                Ok(Value::from(args[0].to_text()?))
            }))
            .with("repr", Value::native("repr", Some(1), |args| {
                Ok(Value::from(args[0].to_repr()?))
            }))
            .with("upper", Value::native("upper", Some(1), |args| {
                Ok(Value::from(args[0].to_text()?.to_uppercase()))
            }))
            .with("lower", Value::native("lower", Some(1), |args| {
                Ok(Value::from(args[0].to_text()?.to_lowercase()))
            }))
    })
}

fn len(args: &[Value]) -> Result<Value, BoxError> {
    match &args[0] {
        Value::Str(s) => Ok(Value::from(s.chars().count())),
        Value::List(items) => Ok(Value::from(items.len())),
        other => Err(format!("object of type '{}' has no len()", other.type_name()).into()),
    }
}
