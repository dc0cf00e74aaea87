//! Conversion between serde_json::Value and rquickjs Value
//!
//! Records go into the sandbox as plain JSON data (no host objects); template
//! results come back out as display text.

use crate::error::JsError;
use rquickjs::{CatchResultExt, Ctx, Function, Value};

/// Convert a serde_json::Value into a rquickjs Value by round-tripping through JSON.parse()
pub fn json_to_js<'js>(
    ctx: &Ctx<'js>,
    value: &serde_json::Value,
) -> std::result::Result<Value<'js>, JsError> {
    let json_str =
        serde_json::to_string(value).map_err(|e| JsError::type_conversion(e.to_string()))?;

    ctx.json_parse(json_str)
        .map_err(|e| JsError::type_conversion(format!("JSON.parse failed: {}", e)))
}

/// Convert a template's return value into display text.
///
/// - undefined and null become the empty string
/// - strings pass through unchanged
/// - everything else goes through the JS `String()` conversion
pub fn js_to_text<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> std::result::Result<String, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(String::new());
    }

    if let Some(js_string) = value.as_string() {
        return js_string
            .to_string()
            .map_err(|e| JsError::type_conversion(format!("String conversion failed: {}", e)));
    }

    let string_fn: Function = ctx
        .globals()
        .get("String")
        .map_err(|e| JsError::runtime(format!("String() unavailable: {}", e)))?;
    string_fn
        .call::<_, String>((value,))
        .catch(ctx)
        .map_err(|e| JsError::type_conversion(format!("String() failed: {}", e)))
}
