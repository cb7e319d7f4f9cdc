use alloy::primitives::Address;
use anyhow::{Context, Result};
use log::{debug, info};
use shared::models::{Contact, DatasetOrder, Published};
use shared::validation::{self, AddressOrEns, FieldChecks};

use crate::error::WorkflowError;
use crate::orderbook::fetch_all_pages;
use crate::protocol::{DatasetOrderFilter, DatasetScope, ProtocolClient};
use crate::subgraph::{get_valid_contacts, GraphClient};

/// Page size for draining order books: one round-trip covers most books.
const FULL_PAGE_SIZE: usize = 1000;

const FETCH_CONTACTS_CONTEXT: &str = "failed to fetch user contacts";

/// Inputs for [`fetch_user_contacts`]. Capability objects are passed
/// explicitly; there is no ambient client state.
pub struct FetchUserContactsParams<'a> {
    pub graph_client: &'a dyn GraphClient,
    pub protocol: &'a dyn ProtocolClient,
    /// Address or ENS name of the delivery app users granted access to.
    pub dapp_address_or_ens: &'a str,
    /// Whitelist contract grouping successive versions of the app.
    pub dapp_whitelist_address: &'a str,
    /// The requester whose access grants to look up.
    pub user_address: &'a str,
}

struct ValidatedContactParams {
    dapp: AddressOrEns,
    whitelist: Address,
    user: Address,
}

/// Lists every contact who granted `user_address` access to a protected
/// dataset usable with the delivery app, deduplicated by dataset address
/// (latest grant wins) and validated against the subgraph.
pub async fn fetch_user_contacts(
    params: FetchUserContactsParams<'_>,
) -> Result<Vec<Contact>, WorkflowError> {
    let validated = validate(&params)
        .map_err(|errors| WorkflowError::wrap(FETCH_CONTACTS_CONTEXT, errors.into()))?;
    collect_contacts(params.graph_client, params.protocol, validated)
        .await
        .map_err(|e| WorkflowError::wrap(FETCH_CONTACTS_CONTEXT, e))
}

fn validate(
    params: &FetchUserContactsParams<'_>,
) -> Result<ValidatedContactParams, validation::ValidationErrors> {
    let mut checks = FieldChecks::new();
    let dapp = checks.check(validation::checked_address_or_ens(
        "dappAddressOrENS",
        params.dapp_address_or_ens,
    ));
    let whitelist = checks.check(validation::checked_address(
        "dappWhitelistAddress",
        params.dapp_whitelist_address,
    ));
    let user = checks.check(validation::checked_address(
        "userAddress",
        params.user_address,
    ));
    checks.finish()?;

    let (Some(dapp), Some(whitelist), Some(user)) = (dapp, whitelist, user) else {
        unreachable!("all checks passed");
    };
    Ok(ValidatedContactParams {
        dapp,
        whitelist,
        user,
    })
}

async fn collect_contacts(
    graph_client: &dyn GraphClient,
    protocol: &dyn ProtocolClient,
    params: ValidatedContactParams,
) -> Result<Vec<Contact>> {
    let (dapp_orders, whitelist_orders) = tokio::try_join!(
        fetch_all_orders_by_app(protocol, params.dapp.to_string(), params.user),
        fetch_all_orders_by_app(protocol, params.whitelist.to_string(), params.user),
    )?;
    info!(
        "fetched {} dataset orders for the app and {} for the whitelist",
        dapp_orders.len(),
        whitelist_orders.len()
    );

    let resolved_dapp = match &params.dapp {
        AddressOrEns::Address(address) => *address,
        AddressOrEns::Ens(name) => protocol
            .resolve_ens(name)
            .await
            .with_context(|| format!("failed to resolve ENS name {name}"))?,
    };

    let candidates: Vec<Contact> = dapp_orders
        .into_iter()
        .chain(whitelist_orders)
        .filter(|order| {
            order.order.app_restrict == resolved_dapp
                || order.order.app_restrict == params.whitelist
        })
        .map(|order| Contact {
            address: order.order.dataset,
            owner: order.signer,
            access_grant_timestamp: order.publication_timestamp,
        })
        .collect();
    debug!(
        "{} candidate contacts before dedup and validation",
        candidates.len()
    );

    Ok(get_valid_contacts(graph_client, &candidates).await?)
}

async fn fetch_all_orders_by_app(
    protocol: &dyn ProtocolClient,
    app: String,
    requester: Address,
) -> Result<Vec<Published<DatasetOrder>>> {
    let filter = DatasetOrderFilter {
        dataset: DatasetScope::Any,
        app: Some(app),
        requester: Some(requester),
        app_strict: true,
        page_size: Some(FULL_PAGE_SIZE),
    };
    let first_page = protocol.fetch_dataset_orderbook(&filter, None).await?;
    fetch_all_pages(first_page, |cursor| {
        protocol.fetch_dataset_orderbook(&filter, Some(cursor))
    })
    .await
}
