use std::collections::{HashMap, HashSet};

use alloy::primitives::Address;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};
use shared::models::Contact;

/// Schema field a protected dataset must carry to receive deliveries.
const REQUIRED_SCHEMA_FIELD: &str = "telegram:string";

/// Ids per index query when validating contact batches.
const CONTACTS_QUERY_RANGE: usize = 1000;

const PROTECTED_DATA_VALIDITY_QUERY: &str = r#"
query ($requiredSchema: [String!]!, $id: [String!]!) {
  protectedDatas(where: { id_in: $id, schema_contains: $requiredSchema }) {
    id
  }
}"#;

const PROTECTED_DATA_BY_ID_QUERY: &str = r#"
query ($requiredSchema: [String!]!, $id: [String!]!, $start: Int!, $range: Int!) {
  protectedDatas(
    where: { id_in: $id, schema_contains: $requiredSchema }
    skip: $start
    first: $range
  ) {
    id
  }
}"#;

/// Graph-index query capability. Implementations run one GraphQL request
/// and return its `data` payload.
#[async_trait]
pub trait GraphClient: Send + Sync {
    async fn query(&self, query: &str, variables: Value) -> Result<Value>;
}

/// Transport or query failure while talking to the protected-data index.
#[derive(Debug, thiserror::Error)]
#[error("failed to query subgraph: {source}")]
pub struct SubgraphError {
    #[source]
    source: anyhow::Error,
}

impl SubgraphError {
    fn new(source: anyhow::Error) -> Self {
        Self { source }
    }
}

/// Whether `protected_data` is registered in the index with the schema
/// this workflow needs. Valid iff the id comes back in the result set.
pub async fn check_protected_data_validity(
    client: &dyn GraphClient,
    protected_data: Address,
) -> Result<bool, SubgraphError> {
    let variables = json!({
        "requiredSchema": [REQUIRED_SCHEMA_FIELD],
        "id": [subgraph_id(protected_data)],
    });
    let data = client
        .query(PROTECTED_DATA_VALIDITY_QUERY, variables)
        .await
        .map_err(SubgraphError::new)?;
    let ids = protected_data_ids(&data).map_err(SubgraphError::new)?;
    Ok(!ids.is_empty())
}

/// Deduplicates candidate contacts (the latest grant per dataset address
/// wins) and keeps only those the index confirms as protected data with
/// the required schema. Ordering of the returned list is unspecified.
pub async fn get_valid_contacts(
    client: &dyn GraphClient,
    contacts: &[Contact],
) -> Result<Vec<Contact>, SubgraphError> {
    let mut latest_by_address: HashMap<Address, Contact> = HashMap::new();
    for contact in contacts {
        latest_by_address
            .entry(contact.address)
            .and_modify(|kept| {
                if kept.access_grant_timestamp < contact.access_grant_timestamp {
                    *kept = contact.clone();
                }
            })
            .or_insert_with(|| contact.clone());
    }

    let candidate_ids: Vec<String> = contacts.iter().map(|c| subgraph_id(c.address)).collect();
    let mut confirmed_ids: HashSet<String> = HashSet::new();
    let mut start = 0;
    while start < candidate_ids.len() {
        let variables = json!({
            "requiredSchema": [REQUIRED_SCHEMA_FIELD],
            "id": candidate_ids,
            "start": start,
            "range": CONTACTS_QUERY_RANGE,
        });
        let data = client
            .query(PROTECTED_DATA_BY_ID_QUERY, variables)
            .await
            .map_err(SubgraphError::new)?;
        confirmed_ids.extend(protected_data_ids(&data).map_err(SubgraphError::new)?);
        start += CONTACTS_QUERY_RANGE;
    }

    debug!(
        "index confirmed {} of {} deduplicated contacts",
        confirmed_ids.len(),
        latest_by_address.len()
    );

    Ok(latest_by_address
        .into_values()
        .filter(|contact| confirmed_ids.contains(&subgraph_id(contact.address)))
        .collect())
}

/// Protected data ids are lowercase hex in the index.
fn subgraph_id(address: Address) -> String {
    format!("{address:#x}")
}

fn protected_data_ids(data: &Value) -> Result<Vec<String>> {
    let records = data
        .get("protectedDatas")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("malformed response: missing protectedDatas"))?;
    Ok(records
        .iter()
        .filter_map(|record| record.get("id").and_then(Value::as_str))
        .map(str::to_lowercase)
        .collect())
}

/// Reference `GraphClient` over HTTP: POST `{query, variables}`, unwrap
/// the `data` envelope, and treat GraphQL-level errors as failures.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphQlClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl GraphClient for GraphQlClient {
    async fn query(&self, query: &str, variables: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .context("subgraph request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "subgraph returned status {}",
                response.status()
            ));
        }
        let body: Value = response
            .json()
            .await
            .context("subgraph response was not json")?;
        if let Some(errors) = body.get("errors").filter(|errors| !errors.is_null()) {
            return Err(anyhow!("subgraph query errors: {errors}"));
        }
        body.get("data")
            .cloned()
            .ok_or_else(|| anyhow!("subgraph response missing data"))
    }
}
