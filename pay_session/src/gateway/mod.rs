//! The request/response side of the service: accounts, balances and orders.
mod client;
mod data_objects;

pub use client::{failure_detail, RequestGateway, MAX_DESCRIPTION_LENGTH};
pub use data_objects::{AccountResult, BalanceResult, NewAccount, NewOrder, Order, OrderCreated, TopUpRequest};
