use pay_common::{MinorUnits, OrderId, OrderStatus, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

//--------------------------------------      Requests       ----------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopUpRequest {
    pub user_id: UserId,
    pub amount: MinorUnits,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub amount: MinorUnits,
    pub description: String,
}

//--------------------------------------      Responses      ----------------------------------------------------------
/// An account's balance as reported by the service.
///
/// Both fields are optional: an undecodable success body is treated as `{}`, and the caller decides what a missing
/// balance means (the session shows it as unknown).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<MinorUnits>,
    /// Any other fields the service chose to send.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The service answers account creation with the new account's balance.
pub type AccountResult = BalanceResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<MinorUnits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// The service answers order creation with the full order record.
pub type OrderCreated = Order;
