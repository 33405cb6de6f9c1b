//! JSON-LD vocabulary for protocol version 2025-1.

use serde_json::Value;

/// DSP namespace IRI.
pub const DSPACE_NAMESPACE: &str = "https://w3id.org/dspace/2025/1/";

/// Remote context every message must reference.
pub const DSPACE_CONTEXT: &str = "https://w3id.org/dspace/2025/1/context.jsonld";

/// ODRL namespace IRI.
pub const ODRL_NAMESPACE: &str = "http://www.w3.org/ns/odrl/2/";

/// Context emitted on outbound messages.
pub fn default_context() -> Value {
    Value::Array(vec![Value::String(DSPACE_CONTEXT.to_string())])
}

/// Whether an `@context` value references the DSP context.
pub fn references_dspace_context(context: &Value) -> bool {
    match context {
        Value::String(s) => s == DSPACE_CONTEXT,
        Value::Array(items) => items
            .iter()
            .any(|item| matches!(item, Value::String(s) if s == DSPACE_CONTEXT)),
        _ => false,
    }
}
