//! HTTP client with lenient envelope decoding
//!
//! Every response is expected to be the `ApiResponse` envelope. Some
//! deployments have been observed returning the `data` field serialized
//! twice (a JSON string containing JSON); [`decode_envelope`] normalizes
//! that once, here at the transport boundary, with a secondary parse and a
//! fall-back to the unparsed value.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::ApiResponse;

use crate::{ClientConfig, ClientError, ClientResult};

/// HTTP client for the Comanda server API
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| ClientError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the bearer credential
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) => request.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", t)),
            None => request,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.auth(self.client.get(self.url(path))).send().await?;
        Self::handle_response(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .auth(self.client.post(self.url(path)).json(body))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .auth(self.client.put(self.url(path)).json(body))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .auth(self.client.patch(self.url(path)).json(body))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn delete<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .auth(self.client.delete(self.url(path)).json(body))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Error envelopes still carry code + message
            if let Ok(envelope) = serde_json::from_str::<ApiResponse<Value>>(&text) {
                return Err(ClientError::from_code(&envelope.code, envelope.message));
            }
            return Err(match status {
                StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
                StatusCode::FORBIDDEN => ClientError::Forbidden(text),
                StatusCode::NOT_FOUND => ClientError::NotFound(text),
                StatusCode::BAD_REQUEST => ClientError::Validation(text),
                StatusCode::CONFLICT => ClientError::Conflict(text),
                StatusCode::UNPROCESSABLE_ENTITY => ClientError::InvalidTransition(text),
                _ => ClientError::Internal(text),
            });
        }

        decode_envelope(&text)
    }
}

/// Decode a success envelope, tolerating double-encoded payloads.
///
/// If `data` arrives as a JSON string where a structured value is expected,
/// a secondary parse of the string is attempted; if that also fails, the
/// string is handed to the target type as-is (the fall-back covers
/// genuinely string-typed payloads).
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> ClientResult<T> {
    let envelope: ApiResponse<Value> = serde_json::from_str(body)
        .map_err(|e| ClientError::MalformedResponse(format!("invalid envelope: {e}")))?;

    if !envelope.is_success() {
        return Err(ClientError::from_code(&envelope.code, envelope.message));
    }

    let value = envelope
        .data
        .ok_or_else(|| ClientError::MalformedResponse("missing data field".to_string()))?;

    normalize_value(value)
}

fn normalize_value<T: DeserializeOwned>(value: Value) -> ClientResult<T> {
    match value {
        Value::String(s) => {
            // Double-encoded payload: try a secondary parse first
            if let Ok(inner) = serde_json::from_str::<Value>(&s)
                && let Ok(decoded) = serde_json::from_value::<T>(inner)
            {
                return Ok(decoded);
            }
            // Fall back to the unparsed string value
            serde_json::from_value(Value::String(s))
                .map_err(|e| ClientError::MalformedResponse(format!("unparseable data: {e}")))
        }
        other => serde_json::from_value(other)
            .map_err(|e| ClientError::MalformedResponse(format!("unexpected shape: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{OrderSnapshot, OrderType};

    fn sample_order() -> OrderSnapshot {
        OrderSnapshot::new(
            "order-1".to_string(),
            "ORD-20260808-0001".to_string(),
            OrderType::DineIn,
        )
    }

    #[test]
    fn decodes_plain_envelope() {
        let body = serde_json::to_string(&ApiResponse::success(sample_order())).unwrap();
        let order: OrderSnapshot = decode_envelope(&body).unwrap();
        assert_eq!(order.order_id, "order-1");
    }

    #[test]
    fn decodes_double_encoded_payload() {
        // data is a JSON string containing the JSON-serialized order
        let inner = serde_json::to_string(&sample_order()).unwrap();
        let body = serde_json::to_string(&ApiResponse::success(inner)).unwrap();

        let order: OrderSnapshot = decode_envelope(&body).unwrap();
        assert_eq!(order.order_id, "order-1");
        assert_eq!(order.order_number, "ORD-20260808-0001");
    }

    #[test]
    fn string_payload_falls_back_to_plain_string() {
        let body = serde_json::to_string(&ApiResponse::success("just text")).unwrap();
        let text: String = decode_envelope(&body).unwrap();
        assert_eq!(text, "just text");
    }

    #[test]
    fn garbage_data_is_malformed() {
        let body = serde_json::to_string(&ApiResponse::success("not an order")).unwrap();
        let result: ClientResult<OrderSnapshot> = decode_envelope(&body);
        assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
    }

    #[test]
    fn invalid_envelope_is_malformed() {
        let result: ClientResult<OrderSnapshot> = decode_envelope("<html>504</html>");
        assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
    }

    #[test]
    fn error_envelope_maps_to_typed_error() {
        let body =
            serde_json::to_string(&ApiResponse::<()>::error("E0003", "Order x not found")).unwrap();
        let result: ClientResult<OrderSnapshot> = decode_envelope(&body);
        assert!(matches!(result, Err(ClientError::NotFound(_))));
    }
}
