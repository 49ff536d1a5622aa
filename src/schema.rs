use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

// ------------------------------------------------------------
// Primitive-safe scalar
// ------------------------------------------------------------
//
// Hyperparameters arrive from the chain as SDK-internal types
// (SCALE-encoded integers, balances, flags). They are normalized
// at the source boundary into this closed variant set so the
// persisted JSON never depends on any chain-ecosystem type.
//
// Serialized untagged: a Scalar is just a bare JSON value.
//
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Uint(u64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Uint(n) => write!(f, "{n}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => write!(f, "{s}"),
        }
    }
}

// ------------------------------------------------------------
// Subnet record
// ------------------------------------------------------------
//
// One row per registered subnet identifier, normalized across
// all metadata sources.
//
// INVARIANT:
// - A record with `error` set carries no success data: every
//   other optional field is None. Use the constructors below
//   rather than building records by hand.
//
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubnetRecord {
    /// Subnet identifier (netuid), unique within a collection run
    pub id: u16,

    /// Whether the identifier is currently registered on-chain.
    /// None only on a failed fetch.
    pub exists: Option<bool>,

    /// Whether the subnet has started emitting.
    /// Meaningful only when `exists` is true.
    pub is_active: Option<bool>,

    /// Owner hotkey as an SS58 address, when available
    pub owner_hotkey: Option<String>,

    /// Current alpha token price in TAO, when available
    pub price: Option<f64>,

    /// Normalized hyperparameter map, when available
    pub hyperparameters: Option<BTreeMap<String, Scalar>>,

    /// Unix timestamp of the retrieval (not of any on-chain event)
    pub last_update: i64,

    /// Failure cause for this identifier. When present the run
    /// continued past this subnet; the record holds no other data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubnetRecord {
    /// Record for a successfully fetched subnet.
    pub fn success(
        id: u16,
        last_update: i64,
        exists: bool,
        is_active: Option<bool>,
        owner_hotkey: Option<String>,
        price: Option<f64>,
        hyperparameters: Option<BTreeMap<String, Scalar>>,
    ) -> Self {
        Self {
            id,
            exists: Some(exists),
            is_active,
            owner_hotkey,
            price,
            hyperparameters,
            last_update,
            error: None,
        }
    }

    /// Record for a per-item fetch failure. All data fields are
    /// null; only the cause is kept.
    pub fn failure(id: u16, last_update: i64, cause: impl Into<String>) -> Self {
        Self {
            id,
            exists: None,
            is_active: None,
            owner_hotkey: None,
            price: None,
            hyperparameters: None,
            last_update,
            error: Some(cause.into()),
        }
    }
}

// ------------------------------------------------------------
// Collection
// ------------------------------------------------------------
//
// The top-level persisted artifact: every record from one
// collector run plus run metadata. Created fresh each run,
// never merged with prior runs, immutable once written.
//
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Collection {
    /// Records in ascending identifier order
    pub subnets: Vec<SubnetRecord>,

    /// Always equal to `subnets.len()`; derived at construction
    pub total_count: usize,

    /// Unix timestamp of collection start
    pub timestamp: i64,

    /// Which remote network was queried (e.g. "finney")
    pub network: String,

    /// Data-origin tag for provenance (e.g. "subtensor_onchain"),
    /// distinguishing direct-chain collection from any future
    /// third-party source
    pub source: String,
}

impl Collection {
    pub fn new(
        subnets: Vec<SubnetRecord>,
        timestamp: i64,
        network: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let total_count = subnets.len();
        Self {
            subnets,
            total_count,
            timestamp,
            network: network.into(),
            source: source.into(),
        }
    }

    /// Number of records that ended in a per-item failure.
    pub fn error_count(&self) -> usize {
        self.subnets.iter().filter(|s| s.error.is_some()).count()
    }
}
