use log::*;
use pay_common::{MinorUnits, UserId};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use super::data_objects::{AccountResult, BalanceResult, NewAccount, NewOrder, Order, OrderCreated, TopUpRequest};
use crate::{
    config::ClientConfig,
    errors::{DecodeError, SessionError, ValidationError},
};

/// The service rejects order descriptions longer than this.
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// Issues account, balance and order requests against the service.
///
/// The gateway holds no session state. It wraps a pooled HTTP client, so clones are cheap and can be used from
/// several tasks at once.
#[derive(Clone)]
pub struct RequestGateway {
    client: Client,
    api_url: Url,
}

impl RequestGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, SessionError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let mut builder = Client::builder().user_agent("Payment Demo Session Client").default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client =
            builder.build().map_err(|e| SessionError::Configuration(format!("Failed to create HTTP client. {e}")))?;
        Ok(Self { client, api_url: config.api_url.clone() })
    }

    pub fn server(&self) -> &str {
        self.api_url.as_str()
    }

    pub fn url(&self, path: &str) -> Result<Url, SessionError> {
        Ok(self.api_url.join(path)?)
    }

    pub async fn create_account(&self, user_id: UserId) -> Result<AccountResult, SessionError> {
        let url = self.url("/api/accounts")?;
        let request = self.client.post(url).json(&NewAccount { user_id });
        self.send(request, "create account").await
    }

    pub async fn top_up(&self, user_id: UserId, amount: MinorUnits) -> Result<BalanceResult, SessionError> {
        check_amount(amount)?;
        let url = self.url("/api/accounts/topup")?;
        let request = self.client.post(url).json(&TopUpRequest { user_id, amount });
        self.send(request, "top up").await
    }

    pub async fn get_balance(&self, user_id: UserId) -> Result<BalanceResult, SessionError> {
        let url = self.url("/api/accounts/balance")?;
        let request = self.client.get(url).query(&[("user_id", user_id.value())]);
        self.send(request, "balance").await
    }

    pub async fn create_order(
        &self,
        user_id: UserId,
        amount: MinorUnits,
        description: &str,
    ) -> Result<OrderCreated, SessionError> {
        check_amount(amount)?;
        let len = description.chars().count();
        if len == 0 || len > MAX_DESCRIPTION_LENGTH {
            return Err(ValidationError::InvalidDescription { len, max: MAX_DESCRIPTION_LENGTH }.into());
        }
        let url = self.url("/api/orders")?;
        let order = NewOrder { user_id, amount, description: description.to_string() };
        let request = self.client.post(url).json(&order);
        self.send(request, "create order").await
    }

    /// The user's orders, in the order the service returns them (newest first).
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, SessionError> {
        let url = self.url("/api/orders")?;
        let request = self.client.get(url).query(&[("user_id", user_id.value())]);
        self.send(request, "list orders").await
    }

    /// Sends the request and normalises the outcome.
    ///
    /// A body that is not valid JSON is treated as an empty object. Non-success status codes become
    /// [`SessionError::Remote`] regardless of what the body contained.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, operation: &str) -> Result<T, SessionError> {
        let res = request.send().await.map_err(|e| {
            warn!("💳️ {operation} request did not complete. {e}");
            SessionError::Transport(e.to_string())
        })?;
        let status = res.status();
        let bytes = res.bytes().await?;
        let body = serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|e| {
            debug!("💳️ {operation} response body is not JSON ({e}). Treating it as an empty object.");
            Value::Object(Map::new())
        });
        if !status.is_success() {
            let detail = failure_detail(&body);
            debug!("💳️ {operation} failed with {status}: {detail}");
            return Err(SessionError::remote(status.as_u16(), detail));
        }
        trace!("💳️ {operation} -> {body}");
        serde_json::from_value(body).map_err(|e| DecodeError::Shape(format!("{operation} response. {e}")).into())
    }
}

fn check_amount(amount: MinorUnits) -> Result<(), ValidationError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveAmount(amount))
    }
}

/// Extracts a human-readable failure description from an error body.
///
/// A string `detail` is used as is, any other non-empty `detail` is rendered as JSON, and without a usable `detail`
/// the whole body is rendered.
pub fn failure_detail(body: &Value) -> String {
    match body.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | Some(Value::String(_)) | None => body.to_string(),
        Some(detail) => detail.to_string(),
    }
}
