//! Hand-rolled fakes and fixtures shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use alloy::primitives::Address;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use shared::models::{
    AppOrder, Contact, DatasetOrder, OrderPage, PageCursor, Published, RequestOrder, Tag,
    WorkerpoolOrder,
};
use shared::validation::AddressOrEns;

use crate::ipfs::ContentStore;
use crate::protocol::{
    AppOrderFilter, DatasetOrderFilter, MatchableOrders, ProtocolClient, RequestOrderParams,
    WorkerpoolOrderFilter,
};
use crate::subgraph::GraphClient;

pub(crate) fn timestamp(value: &str) -> DateTime<Utc> {
    value.parse().unwrap()
}

/// Address whose last two bytes carry `index`, for large fixture sets.
pub(crate) fn indexed_address(index: u16) -> Address {
    let mut bytes = [0u8; 20];
    bytes[18..].copy_from_slice(&index.to_be_bytes());
    Address::from(bytes)
}

pub(crate) fn contact(address_byte: u8, owner_byte: u8, ts: &str) -> Contact {
    Contact {
        address: Address::repeat_byte(address_byte),
        owner: Address::repeat_byte(owner_byte),
        access_grant_timestamp: timestamp(ts),
    }
}

pub(crate) fn published_dataset_order(price: u64, hash: &str) -> Published<DatasetOrder> {
    Published {
        order: DatasetOrder {
            dataset: Address::repeat_byte(0xa1),
            dataset_price: price,
            volume: 1,
            tag: Tag::default(),
            app_restrict: Address::ZERO,
            workerpool_restrict: Address::ZERO,
            requester_restrict: Address::ZERO,
            salt: None,
            sign: None,
        },
        order_hash: hash.to_string(),
        signer: Address::repeat_byte(0x51),
        publication_timestamp: timestamp("2023-06-08T09:32:29.761Z"),
        remaining: 1,
    }
}

/// Dataset order granting access to `dataset`, restricted to `app`.
pub(crate) fn dataset_order_granting(
    dataset_byte: u8,
    app_restrict: Address,
    ts: &str,
) -> Published<DatasetOrder> {
    let mut published = published_dataset_order(0, &format!("0x{dataset_byte:064x}"));
    published.order.dataset = Address::repeat_byte(dataset_byte);
    published.order.app_restrict = app_restrict;
    published.signer = Address::repeat_byte(dataset_byte.wrapping_add(1));
    published.publication_timestamp = timestamp(ts);
    published
}

pub(crate) fn published_app_order(price: u64, hash: &str) -> Published<AppOrder> {
    Published {
        order: AppOrder {
            app: Address::repeat_byte(0xd0),
            app_price: price,
            volume: 1,
            tag: Tag::tee_scone(),
            dataset_restrict: Address::ZERO,
            workerpool_restrict: Address::ZERO,
            requester_restrict: Address::ZERO,
            salt: None,
            sign: None,
        },
        order_hash: hash.to_string(),
        signer: Address::repeat_byte(0x52),
        publication_timestamp: timestamp("2023-06-08T09:32:29.761Z"),
        remaining: 1,
    }
}

pub(crate) fn published_workerpool_order(price: u64, hash: &str) -> Published<WorkerpoolOrder> {
    Published {
        order: WorkerpoolOrder {
            workerpool: Address::repeat_byte(0xb0),
            workerpool_price: price,
            volume: 1,
            tag: Tag::tee_scone(),
            category: 0,
            trust: 0,
            app_restrict: Address::ZERO,
            dataset_restrict: Address::ZERO,
            requester_restrict: Address::ZERO,
            salt: None,
            sign: None,
        },
        order_hash: hash.to_string(),
        signer: Address::repeat_byte(0x53),
        publication_timestamp: timestamp("2023-06-08T09:32:29.761Z"),
        remaining: 1,
    }
}

/// In-memory `GraphClient` answering every query with a fixed confirmed-id
/// set, or a fixed error.
pub(crate) struct FakeGraphClient {
    confirmed: Vec<Address>,
    error: Option<String>,
    recorded: Mutex<Vec<(String, Value)>>,
}

impl FakeGraphClient {
    pub(crate) fn confirming(ids: &[Address]) -> Self {
        Self {
            confirmed: ids.to_vec(),
            error: None,
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            confirmed: Vec::new(),
            error: Some(message.to_string()),
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn recorded_queries(&self) -> Vec<(String, Value)> {
        self.recorded.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphClient for FakeGraphClient {
    async fn query(&self, query: &str, variables: Value) -> Result<Value> {
        self.recorded
            .lock()
            .unwrap()
            .push((query.to_string(), variables));
        if let Some(message) = &self.error {
            return Err(anyhow!("{message}"));
        }
        let records: Vec<Value> = self
            .confirmed
            .iter()
            .map(|id| json!({ "id": format!("{id:#x}") }))
            .collect();
        Ok(json!({ "protectedDatas": records }))
    }
}

/// In-memory `ProtocolClient` with scripted order books and recorders for
/// every write operation.
pub(crate) struct FakeProtocolClient {
    wallet: Address,
    deal_id: String,
    encryption_key: String,
    ens: Mutex<HashMap<String, Address>>,
    dataset_books: Mutex<HashMap<String, VecDeque<OrderPage<DatasetOrder>>>>,
    dataset_orderbook_error: Mutex<Option<String>>,
    app_pages: Mutex<VecDeque<OrderPage<AppOrder>>>,
    workerpool_pages: Mutex<VecDeque<OrderPage<WorkerpoolOrder>>>,
    storage_token_exists: AtomicBool,
    pushed_storage_tokens: Mutex<Vec<String>>,
    pushed_secrets: Mutex<Vec<(String, String)>>,
    created_request_orders: Mutex<Vec<RequestOrderParams>>,
    matched_request_orders: Mutex<Vec<RequestOrder>>,
}

impl FakeProtocolClient {
    pub(crate) fn new() -> Self {
        Self {
            wallet: Address::repeat_byte(0x07),
            deal_id: "0xdeal".to_string(),
            encryption_key: "ZmFrZS1lbmNyeXB0aW9uLWtleQ==".to_string(),
            ens: Mutex::new(HashMap::new()),
            dataset_books: Mutex::new(HashMap::new()),
            dataset_orderbook_error: Mutex::new(None),
            app_pages: Mutex::new(VecDeque::new()),
            workerpool_pages: Mutex::new(VecDeque::new()),
            storage_token_exists: AtomicBool::new(true),
            pushed_storage_tokens: Mutex::new(Vec::new()),
            pushed_secrets: Mutex::new(Vec::new()),
            created_request_orders: Mutex::new(Vec::new()),
            matched_request_orders: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn register_ens(&self, name: &str, address: Address) {
        self.ens.lock().unwrap().insert(name.to_string(), address);
    }

    pub(crate) fn add_dataset_page(&self, app: &str, page: OrderPage<DatasetOrder>) {
        self.dataset_books
            .lock()
            .unwrap()
            .entry(app.to_lowercase())
            .or_default()
            .push_back(page);
    }

    pub(crate) fn clear_dataset_pages(&self) {
        self.dataset_books.lock().unwrap().clear();
    }

    pub(crate) fn fail_dataset_orderbook(&self, message: &str) {
        *self.dataset_orderbook_error.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn add_app_page(&self, page: OrderPage<AppOrder>) {
        self.app_pages.lock().unwrap().push_back(page);
    }

    pub(crate) fn add_workerpool_page(&self, page: OrderPage<WorkerpoolOrder>) {
        self.workerpool_pages.lock().unwrap().push_back(page);
    }

    pub(crate) fn set_storage_token_exists(&self, exists: bool) {
        self.storage_token_exists.store(exists, Ordering::SeqCst);
    }

    pub(crate) fn pushed_storage_tokens(&self) -> Vec<String> {
        self.pushed_storage_tokens.lock().unwrap().clone()
    }

    pub(crate) fn pushed_secrets(&self) -> Vec<(String, String)> {
        self.pushed_secrets.lock().unwrap().clone()
    }

    pub(crate) fn created_request_orders(&self) -> Vec<RequestOrderParams> {
        self.created_request_orders.lock().unwrap().clone()
    }

    fn resolve(&self, value: &AddressOrEns) -> Address {
        match value {
            AddressOrEns::Address(address) => *address,
            AddressOrEns::Ens(name) => self
                .ens
                .lock()
                .unwrap()
                .get(name)
                .copied()
                .unwrap_or(Address::ZERO),
        }
    }

    fn empty_page<T>() -> OrderPage<T> {
        OrderPage {
            orders: Vec::new(),
            count: 0,
            next_cursor: None,
        }
    }
}

#[async_trait]
impl ProtocolClient for FakeProtocolClient {
    async fn wallet_address(&self) -> Result<Address> {
        Ok(self.wallet)
    }

    async fn resolve_ens(&self, name: &str) -> Result<Address> {
        self.ens
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown ens name {name}"))
    }

    async fn fetch_dataset_orderbook(
        &self,
        filter: &DatasetOrderFilter,
        _cursor: Option<PageCursor>,
    ) -> Result<OrderPage<DatasetOrder>> {
        if let Some(message) = self.dataset_orderbook_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{message}"));
        }
        let key = filter.app.as_deref().unwrap_or_default().to_lowercase();
        let page = self
            .dataset_books
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        Ok(page.unwrap_or_else(Self::empty_page))
    }

    async fn fetch_app_orderbook(
        &self,
        _filter: &AppOrderFilter,
        _cursor: Option<PageCursor>,
    ) -> Result<OrderPage<AppOrder>> {
        let page = self.app_pages.lock().unwrap().pop_front();
        Ok(page.unwrap_or_else(Self::empty_page))
    }

    async fn fetch_workerpool_orderbook(
        &self,
        _filter: &WorkerpoolOrderFilter,
        _cursor: Option<PageCursor>,
    ) -> Result<OrderPage<WorkerpoolOrder>> {
        let page = self.workerpool_pages.lock().unwrap().pop_front();
        Ok(page.unwrap_or_else(Self::empty_page))
    }

    async fn check_storage_token_exists(&self, _requester: Address) -> Result<bool> {
        Ok(self.storage_token_exists.load(Ordering::SeqCst))
    }

    async fn default_storage_login(&self) -> Result<String> {
        Ok("storage-token".to_string())
    }

    async fn push_storage_token(&self, token: &str) -> Result<()> {
        self.pushed_storage_tokens
            .lock()
            .unwrap()
            .push(token.to_string());
        Ok(())
    }

    async fn push_requester_secret(&self, name: &str, value: &str) -> Result<()> {
        self.pushed_secrets
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn generate_encryption_key(&self) -> String {
        self.encryption_key.clone()
    }

    async fn encrypt(&self, content: &[u8], _encryption_key: &str) -> Result<Vec<u8>> {
        Ok([b"enc:", content].concat())
    }

    async fn create_request_order(&self, params: &RequestOrderParams) -> Result<RequestOrder> {
        self.created_request_orders
            .lock()
            .unwrap()
            .push(params.clone());
        Ok(RequestOrder {
            app: self.resolve(&params.app),
            app_max_price: params.app_max_price,
            dataset: params.dataset,
            dataset_max_price: params.dataset_max_price,
            workerpool: self.resolve(&params.workerpool),
            workerpool_max_price: params.workerpool_max_price,
            requester: self.wallet,
            beneficiary: Address::ZERO,
            callback: Address::ZERO,
            volume: 1,
            tag: params.tag.clone(),
            category: params.category,
            trust: 0,
            params: serde_json::to_string(&params.params)?,
            salt: None,
            sign: None,
        })
    }

    async fn sign_request_order(&self, mut order: RequestOrder) -> Result<RequestOrder> {
        order.sign = Some("0xsigned".to_string());
        Ok(order)
    }

    async fn match_orders(&self, orders: &MatchableOrders<'_>) -> Result<String> {
        self.matched_request_orders
            .lock()
            .unwrap()
            .push(orders.request_order.clone());
        Ok(self.deal_id.clone())
    }

    async fn compute_task_id(&self, deal_id: &str, task_index: u32) -> Result<String> {
        Ok(format!("{deal_id}-{task_index}"))
    }
}

/// In-memory `ContentStore` returning a fixed content id.
pub(crate) struct FakeContentStore {
    cid: String,
    uploads: Mutex<Vec<Vec<u8>>>,
}

impl FakeContentStore {
    pub(crate) fn new(cid: &str) -> Self {
        Self {
            cid: cid.to_string(),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn uploads(&self) -> Vec<Vec<u8>> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentStore for FakeContentStore {
    async fn add(&self, content: Vec<u8>) -> Result<String> {
        self.uploads.lock().unwrap().push(content);
        Ok(self.cid.clone())
    }
}
