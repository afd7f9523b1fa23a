use serde_json::Value;

use crate::error::OpError;
use crate::refs::ReferenceTable;
use crate::value::RefValue;

/// A parameter of exactly this form is replaced by the referenced value.
pub const REF_PREFIX: &str = "#ref:";
/// A parameter of exactly this form is replaced by the elements of the
/// referenced sequence, spliced in at its position.
pub const SPREAD_PREFIX: &str = "#spreadRef:";

enum Placeholder<'a> {
    Ref(&'a str),
    Spread(&'a str),
}

fn placeholder(value: &Value) -> Option<Placeholder<'_>> {
    let text = value.as_str()?;
    if let Some(id) = text.strip_prefix(SPREAD_PREFIX) {
        Some(Placeholder::Spread(id))
    } else {
        text.strip_prefix(REF_PREFIX).map(Placeholder::Ref)
    }
}

/// Rewrites an operation's parameters against `table`.
///
/// Only top-level string parameters are inspected; nested arrays and objects
/// pass through untouched.
pub fn resolve_params(params: &[Value], table: &ReferenceTable) -> Result<Vec<RefValue>, OpError> {
    let mut resolved = Vec::with_capacity(params.len());
    for param in params {
        match placeholder(param) {
            None => resolved.push(RefValue::Json(param.clone())),
            Some(Placeholder::Ref(id)) => {
                let value = table
                    .get(id)
                    .ok_or_else(|| OpError::Resolution(id.to_string()))?;
                resolved.push(value.clone());
            }
            Some(Placeholder::Spread(id)) => {
                let value = table
                    .get(id)
                    .ok_or_else(|| OpError::Resolution(id.to_string()))?;
                let Some(Value::Array(items)) = value.as_json() else {
                    return Err(OpError::TypeMismatch(id.to_string()));
                };
                resolved.extend(items.iter().cloned().map(RefValue::Json));
            }
        }
    }
    Ok(resolved)
}
