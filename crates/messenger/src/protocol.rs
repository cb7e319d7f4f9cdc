use std::collections::BTreeMap;

use alloy::primitives::Address;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{
    AppOrder, DatasetOrder, OrderPage, PageCursor, RequestOrder, Tag, WorkerpoolOrder,
};
use shared::validation::AddressOrEns;

/// Which dataset addresses a dataset order book query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetScope {
    /// Any dataset (the marketplace's `any` sentinel).
    #[default]
    Any,
    Dataset(Address),
}

#[derive(Debug, Clone, Default)]
pub struct DatasetOrderFilter {
    pub dataset: DatasetScope,
    /// App address or ENS name the orders must authorize.
    pub app: Option<String>,
    pub requester: Option<Address>,
    /// Only match orders restricted to exactly this app, not a whitelist
    /// the app belongs to.
    pub app_strict: bool,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AppOrderFilter {
    /// App address or ENS name whose orders to list.
    pub app: String,
    pub workerpool: Option<String>,
    pub min_tag: Option<Tag>,
    pub max_tag: Option<Tag>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkerpoolOrderFilter {
    pub workerpool: Option<String>,
    pub app: Option<String>,
    pub dataset: Option<Address>,
    pub min_tag: Option<Tag>,
    pub max_tag: Option<Tag>,
    pub category: Option<u32>,
    pub page_size: Option<usize>,
}

/// Execution parameters embedded in a request order. The protocol SDK
/// serializes them into the order's `params` string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParams {
    #[serde(rename = "iexec_developer_logger")]
    pub developer_logger: bool,
    #[serde(rename = "iexec_secrets")]
    pub requester_secrets: BTreeMap<u32, String>,
    #[serde(rename = "iexec_args", skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
}

/// Inputs for building a request order around already-selected dataset,
/// app, and workerpool orders.
#[derive(Debug, Clone)]
pub struct RequestOrderParams {
    pub app: AddressOrEns,
    pub category: u32,
    pub dataset: Address,
    pub dataset_max_price: u64,
    pub app_max_price: u64,
    pub workerpool_max_price: u64,
    pub tag: Tag,
    pub workerpool: AddressOrEns,
    pub params: TaskParams,
}

/// The four order sides handed to the protocol for matching.
#[derive(Debug, Clone, Copy)]
pub struct MatchableOrders<'a> {
    pub app_order: &'a AppOrder,
    pub dataset_order: &'a DatasetOrder,
    pub workerpool_order: &'a WorkerpoolOrder,
    pub request_order: &'a RequestOrder,
}

/// The slice of the blockchain protocol SDK this layer consumes, injected
/// as a capability object. No retries and no timeouts here: failures
/// surface once and callers decide what to do with them.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Address of the requester wallet behind this client.
    async fn wallet_address(&self) -> Result<Address>;

    /// Resolve an ENS name to its registered address.
    async fn resolve_ens(&self, name: &str) -> Result<Address>;

    async fn fetch_dataset_orderbook(
        &self,
        filter: &DatasetOrderFilter,
        cursor: Option<PageCursor>,
    ) -> Result<OrderPage<DatasetOrder>>;

    async fn fetch_app_orderbook(
        &self,
        filter: &AppOrderFilter,
        cursor: Option<PageCursor>,
    ) -> Result<OrderPage<AppOrder>>;

    async fn fetch_workerpool_orderbook(
        &self,
        filter: &WorkerpoolOrderFilter,
        cursor: Option<PageCursor>,
    ) -> Result<OrderPage<WorkerpoolOrder>>;

    async fn check_storage_token_exists(&self, requester: Address) -> Result<bool>;

    async fn default_storage_login(&self) -> Result<String>;

    async fn push_storage_token(&self, token: &str) -> Result<()>;

    async fn push_requester_secret(&self, name: &str, value: &str) -> Result<()>;

    /// Generate a fresh symmetric key for content encryption.
    fn generate_encryption_key(&self) -> String;

    async fn encrypt(&self, content: &[u8], encryption_key: &str) -> Result<Vec<u8>>;

    async fn create_request_order(&self, params: &RequestOrderParams) -> Result<RequestOrder>;

    async fn sign_request_order(&self, order: RequestOrder) -> Result<RequestOrder>;

    /// Match the four order sides on chain, returning the deal id.
    async fn match_orders(&self, orders: &MatchableOrders<'_>) -> Result<String>;

    /// Deterministic task id for `task_index` within a deal.
    async fn compute_task_id(&self, deal_id: &str, task_index: u32) -> Result<String>;
}
