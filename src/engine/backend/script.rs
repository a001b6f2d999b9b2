//! Local script backend: evaluates one element through a resolved callable.

use uuid::Uuid;

use crate::error::EngineError;
use crate::model::document::{EvaluatableElement, function_key};
use crate::model::value::{IoValue, ValueMap};
use crate::script::FunctionMap;

/// Call the element's script function and zip its returned values against the
/// declared outputs by position.
///
/// Returns the `(output id, value)` pairs that were populated. The zip stops
/// at the shorter side: excess returned values are ignored, missing ones
/// leave their outputs unset.
pub fn evaluate(
    element: &EvaluatableElement,
    functions: &FunctionMap,
    working: &ValueMap,
) -> Result<Vec<(Uuid, IoValue)>, EngineError> {
    let Some(function_name) = element.function_name.as_deref() else {
        return Err(EngineError::script(format!(
            "Element '{}' references a script asset but declares no function name",
            element.name
        )));
    };

    let key = function_key(element.asset_id, function_name);
    let Some(function) = functions.get(&key) else {
        return Err(EngineError::script(format!(
            "Element '{}': no resolved function for key '{}'",
            element.name, key
        )));
    };

    // Readiness should already guarantee every input is known; tolerate gaps
    // by passing Null rather than failing.
    let args: Vec<IoValue> = element
        .inputs
        .iter()
        .map(|id| working.get(id).cloned().unwrap_or(IoValue::Null))
        .collect();

    let returned = function.call(&args).map_err(|e| {
        EngineError::script(format!(
            "Element '{}' (function '{}') failed: {}",
            element.name, function_name, e
        ))
    })?;

    Ok(element
        .outputs
        .iter()
        .zip(returned)
        .map(|(id, value)| (*id, value))
        .collect())
}
