use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use super::tag::Tag;

/// Signed offer to rent out a protected dataset. Restriction fields bind
/// the order to a specific app, workerpool, or requester; the zero address
/// means unrestricted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetOrder {
    pub dataset: Address,
    #[serde(rename = "datasetprice")]
    pub dataset_price: u64,
    pub volume: u32,
    #[serde(default)]
    pub tag: Tag,
    #[serde(rename = "apprestrict")]
    pub app_restrict: Address,
    #[serde(rename = "workerpoolrestrict")]
    pub workerpool_restrict: Address,
    #[serde(rename = "requesterrestrict")]
    pub requester_restrict: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
}

/// Signed offer to run an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppOrder {
    pub app: Address,
    #[serde(rename = "appprice")]
    pub app_price: u64,
    pub volume: u32,
    #[serde(default)]
    pub tag: Tag,
    #[serde(rename = "datasetrestrict")]
    pub dataset_restrict: Address,
    #[serde(rename = "workerpoolrestrict")]
    pub workerpool_restrict: Address,
    #[serde(rename = "requesterrestrict")]
    pub requester_restrict: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
}

/// Signed offer of compute capacity in a given category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerpoolOrder {
    pub workerpool: Address,
    #[serde(rename = "workerpoolprice")]
    pub workerpool_price: u64,
    pub volume: u32,
    #[serde(default)]
    pub tag: Tag,
    pub category: u32,
    pub trust: u32,
    #[serde(rename = "apprestrict")]
    pub app_restrict: Address,
    #[serde(rename = "datasetrestrict")]
    pub dataset_restrict: Address,
    #[serde(rename = "requesterrestrict")]
    pub requester_restrict: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
}

/// The requester side of a match: which app/dataset/workerpool to pair,
/// the price ceilings the requester accepts, and the execution params
/// (JSON-encoded, as the protocol stores them on chain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrder {
    pub app: Address,
    #[serde(rename = "appmaxprice")]
    pub app_max_price: u64,
    pub dataset: Address,
    #[serde(rename = "datasetmaxprice")]
    pub dataset_max_price: u64,
    pub workerpool: Address,
    #[serde(rename = "workerpoolmaxprice")]
    pub workerpool_max_price: u64,
    pub requester: Address,
    pub beneficiary: Address,
    pub callback: Address,
    pub volume: u32,
    #[serde(default)]
    pub tag: Tag,
    pub category: u32,
    pub trust: u32,
    pub params: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
}
