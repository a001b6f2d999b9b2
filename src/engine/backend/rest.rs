//! Remote-call backend: evaluates one element through an HTTP round trip.
//!
//! By convention a remote call populates a single output: the parsed response
//! body lands in `outputs[0]`. The first input (if known) overrides the
//! asset's default payload, the second overrides its default path suffix.

use async_trait::async_trait;
use log::debug;
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::document::{EvaluatableElement, HttpMethod, RestAsset};
use crate::model::value::{IoValue, ValueMap};

/// Transport seam for remote calls, so tests can stand in for the network.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, EngineError>;
}

/// Production transport backed by a shared reqwest client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, EngineError> {
        let mut request = match method {
            HttpMethod::Get => self.client.get(uri),
            HttpMethod::Post => self.client.post(uri),
            HttpMethod::Put => self.client.put(uri),
            HttpMethod::Patch => self.client.patch(uri),
            HttpMethod::Delete => self.client.delete(uri),
        };
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::http(format!(
                "{} {} returned status {}",
                method, uri, status
            )));
        }
        Ok(response.json().await?)
    }
}

/// Perform the element's remote call and populate its first declared output
/// with the parsed response.
pub async fn evaluate(
    element: &EvaluatableElement,
    asset: &RestAsset,
    working: &ValueMap,
    transport: &dyn HttpTransport,
) -> Result<Vec<(Uuid, IoValue)>, EngineError> {
    let input_value = |index: usize| {
        element
            .inputs
            .get(index)
            .and_then(|id| working.get(id))
            .filter(|v| !v.is_null())
    };

    let suffix = match input_value(1) {
        Some(IoValue::String(s)) => s.clone(),
        Some(other) => serde_json::Value::from(other).to_string(),
        None => asset.default_path_suffix.clone().unwrap_or_default(),
    };
    let uri = format!("{}{}", asset.endpoint, suffix);

    let body = if asset.method.has_body() {
        let payload = match input_value(0) {
            Some(value) => serde_json::Value::from(value),
            None if !asset.default_payload.is_null() => {
                serde_json::Value::from(&asset.default_payload)
            }
            None => serde_json::json!({}),
        };
        Some(payload)
    } else {
        None
    };

    debug!(
        "Element '{}': {} {} (payload: {})",
        element.name,
        asset.method,
        uri,
        body.as_ref()
            .map(|b| b.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let response = transport
        .send(asset.method, &uri, body.clone())
        .await
        .map_err(|e| {
            EngineError::http(format!(
                "Element '{}': {} {} failed (payload: {}): {}",
                element.name,
                asset.method,
                uri,
                body.map(|b| b.to_string()).unwrap_or_else(|| "none".to_string()),
                e
            ))
        })?;

    let Some(output_id) = element.outputs.first() else {
        // Nothing to populate; the call itself still counts as a success.
        return Ok(Vec::new());
    };
    Ok(vec![(*output_id, IoValue::from(response))])
}
