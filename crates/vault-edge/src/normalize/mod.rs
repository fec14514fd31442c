use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{client::FetchError, models::NavigationData};

#[derive(Debug, serde::Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

/// Unwraps a `{ "success": true, "data": ... }` navigation payload.
pub fn navigation_envelope(value: Value) -> Result<NavigationData, FetchError> {
    let envelope: Envelope = serde_json::from_value(value)?;
    match (envelope.success, envelope.data) {
        (true, Some(data)) => Ok(serde_json::from_value(data)?),
        _ => Err(FetchError::Rejected),
    }
}

/// Lists that come back as anything but an array are treated as empty.
pub fn array_or_empty<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, FetchError> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        _ => Ok(Vec::new()),
    }
}
