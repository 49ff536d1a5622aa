use std::collections::BTreeMap;

use crate::schema::Scalar;

/// Raw per-subnet payload as fetched from a source, before the
/// collector stamps it into a `SubnetRecord`.
///
/// CONTRACT:
/// - Every value is already primitive-safe: nothing here may hold
///   an SDK-internal type. Normalization happens inside the source.
/// - `exists == false` implies every other field is None.
///
#[derive(Debug, Clone, Default)]
pub struct SubnetSnapshot {
    /// Whether the identifier is registered on-chain
    pub exists: bool,

    /// Whether the subnet has started emitting
    pub is_active: Option<bool>,

    /// Owner hotkey, SS58-rendered
    pub owner_hotkey: Option<String>,

    /// Current alpha price in TAO
    pub price: Option<f64>,

    /// Hyperparameters flattened to a scalar map
    pub hyperparameters: Option<BTreeMap<String, Scalar>>,
}

/// MetadataSource is the abstraction layer between:
/// - The generic collector loop
/// - A concrete remote metadata origin (today: the subtensor chain)
///
/// Each source implementation must:
/// - Enumerate the currently registered subnet identifiers
/// - Fetch and normalize per-subnet metadata
///
/// DESIGN GOALS:
/// - Zero chain-specific logic outside sources
/// - Uniform snapshot format across all sources
/// - Per-item failures surface as `Err` from `fetch_subnet`; the
///   collector records them and continues. A source must never
///   panic on a bad identifier.
///
/// THREAD SAFETY:
/// - Must be Send + Sync (trait objects cross await points)
///
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Canonical provenance tag recorded in the Collection.
    ///
    /// EXAMPLES:
    /// - "subtensor_onchain"
    ///
    fn name(&self) -> &'static str;

    /// Enumerate all currently registered subnet identifiers in
    /// ascending order.
    ///
    /// The set is authoritative and may change between runs; no
    /// assumption of contiguity or fixed count is made. An empty
    /// result is valid.
    ///
    /// A failure here aborts the whole run: without an identifier
    /// list there is nothing meaningful to collect.
    ///
    async fn list_subnets(&self) -> anyhow::Result<Vec<u16>>;

    /// Fetch metadata for a single subnet identifier.
    ///
    /// Errors are per-item: the collector converts them into an
    /// error record and proceeds with the next identifier.
    ///
    async fn fetch_subnet(&self, netuid: u16) -> anyhow::Result<SubnetSnapshot>;
}
