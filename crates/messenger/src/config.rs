//! Network defaults for the Bellecour sidechain deployment.

/// Production workerpool running the confidential delivery tasks.
pub const PROD_WORKERPOOL_ADDRESS: &str = "prod-v8-bellecour.main.pools.iexec.eth";

/// Price ceilings (in nRLC) applied when the caller does not override them.
pub const MAX_DESIRED_DATA_ORDER_PRICE: u64 = 0;
pub const MAX_DESIRED_APP_ORDER_PRICE: u64 = 0;
pub const MAX_DESIRED_WORKERPOOL_ORDER_PRICE: u64 = 0;

pub const DEFAULT_IPFS_UPLOAD_URL: &str = "https://ipfs-upload.v8-bellecour.iex.ec";
pub const DEFAULT_IPFS_GATEWAY_URL: &str = "https://ipfs-gateway.v8-bellecour.iex.ec";
pub const DATAPROTECTOR_SUBGRAPH_URL: &str =
    "https://thegraph-product.iex.ec/subgraphs/name/bellecour/dataprotector";
