use std::collections::BTreeMap;

use alloy::primitives::Address;
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use rand::rngs::OsRng;
use rand::RngCore;
use shared::models::{
    AppOrder, DatasetOrder, Published, RequesterSecretPayload, Tag, WorkerpoolOrder,
};
use shared::validation::{self, AddressOrEns, FieldChecks, ValidationErrors};

use crate::error::WorkflowError;
use crate::ipfs::ContentStore;
use crate::orderbook::{
    first_app_order_under, first_dataset_order_under, random_workerpool_order_under,
    OrderSelectionError,
};
use crate::protocol::{
    AppOrderFilter, DatasetOrderFilter, DatasetScope, MatchableOrders, ProtocolClient,
    RequestOrderParams, TaskParams, WorkerpoolOrderFilter,
};
use crate::subgraph::{check_protected_data_validity, GraphClient};

/// Byte length of requester secret identifiers. 16 random bytes keep
/// collisions out of reach over the secret namespace.
const SECRET_ID_BYTES: usize = 16;

/// Requester secret slot the task reads the content locator from.
const CONTENT_SECRET_INDEX: u32 = 1;

const SEND_TELEGRAM_CONTEXT: &str = "failed to send telegram";

/// Inputs for [`send_telegram`]. Capability objects are passed explicitly;
/// there is no ambient client state.
pub struct SendTelegramParams<'a> {
    pub graph_client: &'a dyn GraphClient,
    pub protocol: &'a dyn ProtocolClient,
    pub content_store: &'a dyn ContentStore,
    /// Protected data holding the recipient's chat id.
    pub protected_data: &'a str,
    pub telegram_content: &'a str,
    /// Short tag forwarded to the task as its argument.
    pub label: Option<&'a str>,
    pub dapp_address_or_ens: &'a str,
    pub dapp_whitelist_address: &'a str,
    pub workerpool_address_or_ens: &'a str,
    pub data_max_price: u64,
    pub app_max_price: u64,
    pub workerpool_max_price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTelegramResponse {
    pub task_id: String,
}

struct ValidatedSendParams {
    protected_data: Address,
    content: String,
    label: Option<String>,
    dapp: AddressOrEns,
    whitelist: Address,
    workerpool: AddressOrEns,
}

/// Runs the full delivery workflow: validate inputs, confirm the protected
/// data, ensure requester storage, discover eligible orders, encrypt and
/// upload the content, push the requester secret, and match the deal.
/// Returns the id of the single task the deal contains.
pub async fn send_telegram(
    params: SendTelegramParams<'_>,
) -> Result<SendTelegramResponse, WorkflowError> {
    let validated = validate(&params)
        .map_err(|errors| WorkflowError::wrap(SEND_TELEGRAM_CONTEXT, errors.into()))?;
    run_workflow(&params, validated)
        .await
        .map_err(|e| WorkflowError::wrap(SEND_TELEGRAM_CONTEXT, e))
}

fn validate(params: &SendTelegramParams<'_>) -> Result<ValidatedSendParams, ValidationErrors> {
    let mut checks = FieldChecks::new();
    let protected_data = checks.check(validation::checked_address(
        "protectedData",
        params.protected_data,
    ));
    let content = checks.check(validation::checked_telegram_content(
        "telegramContent",
        params.telegram_content,
    ));
    let label = match params.label {
        Some(label) => checks
            .check(validation::checked_label("label", label))
            .map(Some),
        None => Some(None),
    };
    let dapp = checks.check(validation::checked_address_or_ens(
        "dappAddressOrENS",
        params.dapp_address_or_ens,
    ));
    let whitelist = checks.check(validation::checked_address(
        "dappWhitelistAddress",
        params.dapp_whitelist_address,
    ));
    let workerpool = checks.check(validation::checked_address_or_ens(
        "workerpoolAddressOrEns",
        params.workerpool_address_or_ens,
    ));
    checks.finish()?;

    let (
        Some(protected_data),
        Some(content),
        Some(label),
        Some(dapp),
        Some(whitelist),
        Some(workerpool),
    ) = (protected_data, content, label, dapp, whitelist, workerpool)
    else {
        unreachable!("all checks passed");
    };
    Ok(ValidatedSendParams {
        protected_data,
        content,
        label,
        dapp,
        whitelist,
        workerpool,
    })
}

async fn run_workflow(
    params: &SendTelegramParams<'_>,
    validated: ValidatedSendParams,
) -> Result<SendTelegramResponse> {
    let protocol = params.protocol;

    if !check_protected_data_validity(params.graph_client, validated.protected_data).await? {
        return Err(anyhow!(
            "protected data {} is not valid: missing telegram field",
            validated.protected_data
        ));
    }

    let requester = protocol.wallet_address().await?;

    if !protocol.check_storage_token_exists(requester).await? {
        info!("no storage token for {requester}, provisioning default storage");
        let token = protocol.default_storage_login().await?;
        protocol.push_storage_token(&token).await?;
    }

    let tag = Tag::tee_scone();
    let (dataset_order_for_app, dataset_order_for_whitelist, app_order, workerpool_order) = tokio::try_join!(
        pick_dataset_order(
            protocol,
            validated.protected_data,
            validated.dapp.to_string(),
            requester,
            params.data_max_price,
        ),
        pick_dataset_order(
            protocol,
            validated.protected_data,
            validated.whitelist.to_string(),
            requester,
            params.data_max_price,
        ),
        pick_app_order(protocol, &validated, &tag, params.app_max_price),
        pick_workerpool_order(protocol, &validated, &tag, params.workerpool_max_price),
    )?;

    // Orders published for the app directly take precedence over orders
    // published for its whitelist.
    let dataset_order = dataset_order_for_app
        .or(dataset_order_for_whitelist)
        .ok_or(OrderSelectionError::NoDatasetOrder)?;
    debug!(
        "selected orders: dataset at {}, app at {}, workerpool at {}",
        dataset_order.order.dataset_price,
        app_order.order.app_price,
        workerpool_order.order.workerpool_price
    );

    let encryption_key = protocol.generate_encryption_key();
    let encrypted = protocol
        .encrypt(validated.content.as_bytes(), &encryption_key)
        .await
        .context("failed to encrypt telegram content")?;
    let cid = params
        .content_store
        .add(encrypted)
        .await
        .context("failed to upload encrypted telegram content")?;
    let multiaddr = format!("/ipfs/{cid}");

    let secret_id = generate_secure_unique_id(SECRET_ID_BYTES);
    let payload = RequesterSecretPayload::content_locator(multiaddr, encryption_key);
    protocol
        .push_requester_secret(&secret_id, &serde_json::to_string(&payload)?)
        .await
        .context("failed to push requester secret")?;

    let request_params = RequestOrderParams {
        app: validated.dapp.clone(),
        category: workerpool_order.order.category,
        dataset: validated.protected_data,
        dataset_max_price: dataset_order.order.dataset_price,
        app_max_price: app_order.order.app_price,
        workerpool_max_price: workerpool_order.order.workerpool_price,
        tag: tag.clone(),
        workerpool: validated.workerpool.clone(),
        params: TaskParams {
            developer_logger: true,
            requester_secrets: BTreeMap::from([(CONTENT_SECRET_INDEX, secret_id)]),
            args: validated.label.clone(),
        },
    };
    let request_order = protocol.create_request_order(&request_params).await?;
    let request_order = protocol.sign_request_order(request_order).await?;

    let deal_id = protocol
        .match_orders(&MatchableOrders {
            app_order: &app_order.order,
            dataset_order: &dataset_order.order,
            workerpool_order: &workerpool_order.order,
            request_order: &request_order,
        })
        .await?;
    // Each deal in this workflow contains exactly one task.
    let task_id = protocol.compute_task_id(&deal_id, 0).await?;
    info!("submitted delivery task {task_id}");

    Ok(SendTelegramResponse { task_id })
}

async fn pick_dataset_order(
    protocol: &dyn ProtocolClient,
    dataset: Address,
    app: String,
    requester: Address,
    max_price: u64,
) -> Result<Option<Published<DatasetOrder>>> {
    let filter = DatasetOrderFilter {
        dataset: DatasetScope::Dataset(dataset),
        app: Some(app),
        requester: Some(requester),
        app_strict: false,
        page_size: None,
    };
    let page = protocol.fetch_dataset_orderbook(&filter, None).await?;
    Ok(first_dataset_order_under(page.orders, max_price))
}

async fn pick_app_order(
    protocol: &dyn ProtocolClient,
    validated: &ValidatedSendParams,
    tag: &Tag,
    max_price: u64,
) -> Result<Published<AppOrder>> {
    let filter = AppOrderFilter {
        app: validated.dapp.to_string(),
        workerpool: Some(validated.workerpool.to_string()),
        min_tag: Some(tag.clone()),
        max_tag: Some(tag.clone()),
        page_size: None,
    };
    let page = protocol.fetch_app_orderbook(&filter, None).await?;
    Ok(first_app_order_under(page.orders, max_price)?)
}

async fn pick_workerpool_order(
    protocol: &dyn ProtocolClient,
    validated: &ValidatedSendParams,
    tag: &Tag,
    max_price: u64,
) -> Result<Published<WorkerpoolOrder>> {
    let filter = WorkerpoolOrderFilter {
        workerpool: Some(validated.workerpool.to_string()),
        app: Some(validated.dapp.to_string()),
        dataset: Some(validated.protected_data),
        min_tag: Some(tag.clone()),
        max_tag: Some(tag.clone()),
        category: Some(0),
        page_size: None,
    };
    let page = protocol.fetch_workerpool_orderbook(&filter, None).await?;
    Ok(random_workerpool_order_under(
        page.orders,
        max_price,
        &mut rand::thread_rng(),
    )?)
}

/// Locally generated, collision-resistant identifier for a requester
/// secret. Never issued by the secret store and never sequential.
fn generate_secure_unique_id(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use shared::models::OrderPage;

    use super::*;
    use crate::testing::{
        published_app_order, published_dataset_order, published_workerpool_order,
        FakeContentStore, FakeGraphClient, FakeProtocolClient,
    };

    fn protected_data_address() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn dapp_address() -> Address {
        Address::repeat_byte(0xd0)
    }

    fn whitelist_address() -> Address {
        Address::repeat_byte(0xee)
    }

    struct Harness {
        graph_client: FakeGraphClient,
        protocol: FakeProtocolClient,
        content_store: FakeContentStore,
    }

    impl Harness {
        fn new() -> Self {
            let protocol = FakeProtocolClient::new();
            protocol.add_dataset_page(
                &dapp_address().to_string(),
                OrderPage {
                    orders: vec![published_dataset_order(2, "0xda")],
                    count: 1,
                    next_cursor: None,
                },
            );
            protocol.add_app_page(OrderPage {
                orders: vec![published_app_order(3, "0xaa")],
                count: 1,
                next_cursor: None,
            });
            protocol.add_workerpool_page(OrderPage {
                orders: vec![published_workerpool_order(4, "0xca")],
                count: 1,
                next_cursor: None,
            });
            Self {
                graph_client: FakeGraphClient::confirming(&[protected_data_address()]),
                protocol,
                content_store: FakeContentStore::new("QmCid"),
            }
        }

        fn params(&self) -> SendTelegramParams<'_> {
            SendTelegramParams {
                graph_client: &self.graph_client,
                protocol: &self.protocol,
                content_store: &self.content_store,
                protected_data: "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1",
                telegram_content: "hello from the chain",
                label: Some("greeting"),
                dapp_address_or_ens: "0xd0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0",
                dapp_whitelist_address: "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
                workerpool_address_or_ens: "0xb0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0",
                data_max_price: 5,
                app_max_price: 5,
                workerpool_max_price: 5,
            }
        }
    }

    #[tokio::test]
    async fn test_send_returns_task_id_and_pushes_secret() {
        let harness = Harness::new();

        let response = send_telegram(harness.params()).await.unwrap();
        assert_eq!(response.task_id, "0xdeal-0");

        let secrets = harness.protocol.pushed_secrets();
        assert_eq!(secrets.len(), 1);
        let (secret_id, secret_value) = &secrets[0];
        // 16 random bytes, hex encoded.
        assert_eq!(secret_id.len(), 32);
        assert!(secret_id.chars().all(|c| c.is_ascii_hexdigit()));
        let payload: RequesterSecretPayload = serde_json::from_str(secret_value).unwrap();
        assert_eq!(
            payload.telegram_content_multi_addr.as_deref(),
            Some("/ipfs/QmCid")
        );
        assert!(payload.telegram_content_encryption_key.is_some());

        let uploads = harness.content_store.uploads();
        assert_eq!(uploads.len(), 1);
    }

    #[tokio::test]
    async fn test_send_builds_request_order_from_selected_orders() {
        let harness = Harness::new();

        send_telegram(harness.params()).await.unwrap();

        let created = harness.protocol.created_request_orders();
        assert_eq!(created.len(), 1);
        let request = &created[0];
        assert_eq!(request.category, 0);
        assert_eq!(request.dataset, protected_data_address());
        assert_eq!(request.dataset_max_price, 2);
        assert_eq!(request.app_max_price, 3);
        assert_eq!(request.workerpool_max_price, 4);
        assert_eq!(request.tag, Tag::tee_scone());
        assert!(request.params.developer_logger);
        assert_eq!(request.params.args.as_deref(), Some("greeting"));

        let secrets = harness.protocol.pushed_secrets();
        assert_eq!(
            request.params.requester_secrets.get(&1),
            Some(&secrets[0].0)
        );
    }

    #[tokio::test]
    async fn test_send_falls_back_to_whitelist_dataset_order() {
        let harness = Harness::new();
        harness.protocol.clear_dataset_pages();
        harness.protocol.add_dataset_page(
            &whitelist_address().to_string(),
            OrderPage {
                orders: vec![published_dataset_order(1, "0xdb")],
                count: 1,
                next_cursor: None,
            },
        );

        send_telegram(harness.params()).await.unwrap();

        let created = harness.protocol.created_request_orders();
        assert_eq!(created[0].dataset_max_price, 1);
    }

    #[tokio::test]
    async fn test_send_fails_when_no_dataset_order_from_either_source() {
        let harness = Harness::new();
        harness.protocol.clear_dataset_pages();

        let err = send_telegram(harness.params()).await.unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("failed to send telegram"));
        assert!(rendered.contains("no dataset order found for the desired price"));
    }

    #[tokio::test]
    async fn test_send_fails_when_protected_data_is_invalid() {
        let mut harness = Harness::new();
        harness.graph_client = FakeGraphClient::confirming(&[]);

        let err = send_telegram(harness.params()).await.unwrap_err();
        assert!(err.to_string().contains("missing telegram field"));
        // Validation of the resource happens before any order discovery.
        assert!(harness.protocol.pushed_secrets().is_empty());
    }

    #[tokio::test]
    async fn test_send_aggregates_validation_errors_before_any_call() {
        let harness = Harness::new();
        let mut params = harness.params();
        params.protected_data = "garbage";
        params.telegram_content = "";

        let err = send_telegram(params).await.unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("protectedData"));
        assert!(rendered.contains("telegramContent"));
        assert!(harness.graph_client.recorded_queries().is_empty());
    }

    #[tokio::test]
    async fn test_send_provisions_storage_when_token_missing() {
        let harness = Harness::new();
        harness.protocol.set_storage_token_exists(false);

        send_telegram(harness.params()).await.unwrap();

        assert_eq!(harness.protocol.pushed_storage_tokens().len(), 1);
    }

    #[tokio::test]
    async fn test_send_skips_storage_provisioning_when_token_exists() {
        let harness = Harness::new();

        send_telegram(harness.params()).await.unwrap();

        assert!(harness.protocol.pushed_storage_tokens().is_empty());
    }
}
