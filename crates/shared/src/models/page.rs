use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque continuation token handed back by the order book API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor(pub String);

/// One published order as listed in the order book: the signed order plus
/// its marketplace metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Published<T> {
    pub order: T,
    pub order_hash: String,
    pub signer: Address,
    pub publication_timestamp: DateTime<Utc>,
    pub remaining: u32,
}

/// A bounded slice of an order book. `count` is the server-reported total
/// across all pages; `next_cursor` is `None` once the book is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage<T> {
    pub orders: Vec<Published<T>>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<PageCursor>,
}
