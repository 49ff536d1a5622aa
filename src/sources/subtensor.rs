use std::collections::BTreeMap;

use anyhow::Context;
use log::warn;
use subxt::dynamic::{self, DecodedValueThunk, Value};
use subxt::ext::scale_value::{Primitive, ValueDef};
use subxt::utils::AccountId32;
use subxt::{OnlineClient, PolkadotConfig};

use crate::schema::Scalar;
use crate::sources::adapter::{MetadataSource, SubnetSnapshot};

/// All subnet state lives in this pallet.
const SUBTENSOR_MODULE: &str = "SubtensorModule";

/// Rao is the chain's base unit; 1 TAO = 10^9 rao.
const RAO_PER_TAO: f64 = 1_000_000_000.0;

// ------------------------------------------------------------
// Subtensor source
// ------------------------------------------------------------
//
// Reads public chain state over a single subxt client session.
// Only storage reads, no extrinsics, no keys.
//
// The session is constructed explicitly via `connect` and closed
// on drop, including the fatal-connection-error path: a failed
// `connect` never leaks a half-open session.
//
pub struct SubtensorSource {
    client: OnlineClient<PolkadotConfig>,
}

impl SubtensorSource {
    /// Open one session to the configured chain endpoint.
    ///
    /// FATAL:
    /// - A failure here aborts the whole run; no partial
    ///   Collection is ever emitted.
    ///
    pub async fn connect(endpoint: &str) -> anyhow::Result<Self> {
        let client = OnlineClient::<PolkadotConfig>::from_url(endpoint)
            .await
            .with_context(|| format!("failed to connect to chain endpoint {endpoint}"))?;
        Ok(Self { client })
    }

    /// Fetch a single dynamic storage value from the subtensor
    /// pallet at the latest block.
    async fn fetch_value(
        &self,
        entry: &str,
        keys: Vec<Value>,
    ) -> anyhow::Result<Option<DecodedValueThunk>> {
        let query = dynamic::storage(SUBTENSOR_MODULE, entry, keys);
        let val = self
            .client
            .storage()
            .at_latest()
            .await?
            .fetch(&query)
            .await
            .with_context(|| format!("storage query {SUBTENSOR_MODULE}.{entry} failed"))?;
        Ok(val)
    }

    /// Fetch a per-subnet u64 entry, falling back to `default`
    /// when the chain holds no value for this netuid.
    async fn fetch_u64(&self, entry: &str, netuid: u16, default: u64) -> anyhow::Result<u64> {
        let val = self
            .fetch_value(entry, vec![Value::u128(netuid as u128)])
            .await?;
        Ok(val.as_ref().and_then(decode_u64).unwrap_or(default))
    }

    async fn fetch_u16(&self, entry: &str, netuid: u16, default: u16) -> anyhow::Result<u16> {
        let val = self
            .fetch_value(entry, vec![Value::u128(netuid as u128)])
            .await?;
        Ok(u16_or_default(
            entry,
            netuid,
            val.as_ref().and_then(decode_u64),
            default,
        ))
    }

    async fn fetch_bool(&self, entry: &str, netuid: u16, default: bool) -> anyhow::Result<bool> {
        let val = self
            .fetch_value(entry, vec![Value::u128(netuid as u128)])
            .await?;
        Ok(val.as_ref().and_then(decode_bool).unwrap_or(default))
    }

    /// Whether the subnet has started emitting. The chain records
    /// the first emission block once the subnet's start call has
    /// been made; its presence is the activity signal.
    async fn is_subnet_active(&self, netuid: u16) -> anyhow::Result<bool> {
        let val = self
            .fetch_value("FirstEmissionBlockNumber", vec![Value::u128(netuid as u128)])
            .await?;
        Ok(val.is_some())
    }

    /// Owner hotkey rendered as an SS58 address, when set.
    async fn owner_hotkey(&self, netuid: u16) -> anyhow::Result<Option<String>> {
        let val = self
            .fetch_value("SubnetOwnerHotkey", vec![Value::u128(netuid as u128)])
            .await?;
        match val {
            Some(thunk) => {
                let account: AccountId32 = thunk
                    .as_type()
                    .context("failed to decode SubnetOwnerHotkey as AccountId32")?;
                Ok(Some(account.to_string()))
            }
            None => Ok(None),
        }
    }

    /// Alpha token price in TAO, derived from the subnet's AMM
    /// reserves (TAO-in over alpha-in). The root subnet has no
    /// alpha pool and is fixed at 1.0 by convention; an empty
    /// alpha reserve means the price is unavailable, not an error.
    async fn subnet_price(&self, netuid: u16) -> anyhow::Result<Option<f64>> {
        if netuid == 0 {
            return Ok(Some(1.0));
        }
        let tao_in = self.fetch_u64("SubnetTAO", netuid, 0).await?;
        let alpha_in = self.fetch_u64("SubnetAlphaIn", netuid, 0).await?;
        if alpha_in == 0 {
            return Ok(None);
        }
        Ok(Some(tao_in as f64 / alpha_in as f64))
    }

    /// Fetch the per-subnet hyperparameter entries and flatten
    /// them into a primitive-safe scalar map. Missing entries
    /// degrade to the chain's documented defaults rather than
    /// failing the item.
    async fn hyperparameters(&self, netuid: u16) -> anyhow::Result<BTreeMap<String, Scalar>> {
        let mut map = BTreeMap::new();

        map.insert(
            "tempo".to_string(),
            Scalar::Uint(self.fetch_u16("Tempo", netuid, 360).await? as u64),
        );
        map.insert(
            "rho".to_string(),
            Scalar::Uint(self.fetch_u16("Rho", netuid, 10).await? as u64),
        );
        map.insert(
            "kappa".to_string(),
            Scalar::Uint(self.fetch_u16("Kappa", netuid, 32_767).await? as u64),
        );
        map.insert(
            "immunity_period".to_string(),
            Scalar::Uint(self.fetch_u16("ImmunityPeriod", netuid, 4096).await? as u64),
        );
        map.insert(
            "min_allowed_weights".to_string(),
            Scalar::Uint(self.fetch_u16("MinAllowedWeights", netuid, 1).await? as u64),
        );
        map.insert(
            "max_weights_limit".to_string(),
            Scalar::Uint(self.fetch_u16("MaxWeightsLimit", netuid, 1000).await? as u64),
        );
        map.insert(
            "activity_cutoff".to_string(),
            Scalar::Uint(self.fetch_u16("ActivityCutoff", netuid, 5000).await? as u64),
        );
        map.insert(
            "max_validators".to_string(),
            Scalar::Uint(self.fetch_u16("MaxAllowedValidators", netuid, 64).await? as u64),
        );
        map.insert(
            "adjustment_interval".to_string(),
            Scalar::Uint(self.fetch_u16("AdjustmentInterval", netuid, 112).await? as u64),
        );
        map.insert(
            "weights_rate_limit".to_string(),
            Scalar::Uint(self.fetch_u64("WeightsSetRateLimit", netuid, 100).await?),
        );
        map.insert(
            "weights_version".to_string(),
            Scalar::Uint(self.fetch_u64("WeightsVersionKey", netuid, 0).await?),
        );
        map.insert(
            "serving_rate_limit".to_string(),
            Scalar::Uint(self.fetch_u64("ServingRateLimit", netuid, 50).await?),
        );
        map.insert(
            "difficulty".to_string(),
            Scalar::Uint(self.fetch_u64("Difficulty", netuid, 10_000_000).await?),
        );
        map.insert(
            "registration_allowed".to_string(),
            Scalar::Bool(
                self.fetch_bool("NetworkRegistrationAllowed", netuid, true)
                    .await?,
            ),
        );
        map.insert(
            "commit_reveal_weights_enabled".to_string(),
            Scalar::Bool(
                self.fetch_bool("CommitRevealWeightsEnabled", netuid, false)
                    .await?,
            ),
        );

        // Burn is a balance in rao; expose it in TAO.
        let burn_rao = self.fetch_u64("Burn", netuid, 1_000_000_000).await?;
        map.insert(
            "burn".to_string(),
            Scalar::Float(burn_rao as f64 / RAO_PER_TAO),
        );

        Ok(map)
    }
}

#[async_trait::async_trait]
impl MetadataSource for SubtensorSource {
    fn name(&self) -> &'static str {
        "subtensor_onchain"
    }

    /// Iterate the NetworksAdded storage map. The netuid is the
    /// trailing two little-endian bytes of each storage key.
    async fn list_subnets(&self) -> anyhow::Result<Vec<u16>> {
        let query = dynamic::storage(SUBTENSOR_MODULE, "NetworksAdded", Vec::<Value>::new());
        let mut results = self
            .client
            .storage()
            .at_latest()
            .await?
            .iter(query)
            .await
            .context("failed to enumerate registered subnets")?;

        let mut entries = Vec::new();
        while let Some(item) = results.next().await {
            entries.push(
                item.map(|kv| {
                    let registered = decode_bool(&kv.value).unwrap_or(false);
                    (kv.key_bytes, registered)
                })
                .map_err(anyhow::Error::from),
            );
        }

        collect_registered_netuids(entries)
    }

    async fn fetch_subnet(&self, netuid: u16) -> anyhow::Result<SubnetSnapshot> {
        let exists = self.fetch_bool("NetworksAdded", netuid, false).await?;
        if !exists {
            // Deregistered between enumeration and fetch.
            return Ok(SubnetSnapshot::default());
        }

        let is_active = self.is_subnet_active(netuid).await?;
        let owner_hotkey = self.owner_hotkey(netuid).await?;
        let price = self.subnet_price(netuid).await?;
        let hyperparameters = self.hyperparameters(netuid).await?;

        Ok(SubnetSnapshot {
            exists: true,
            is_active: Some(is_active),
            owner_hotkey,
            price,
            hyperparameters: Some(hyperparameters),
        })
    }
}

/// Fold the enumerated NetworksAdded entries into a sorted netuid
/// list. The netuid is the trailing two little-endian bytes of
/// each storage key; entries whose value is false (or undecodable)
/// are skipped.
///
/// FATAL:
/// - Any failed entry aborts the enumeration. A truncated list
///   would otherwise be persisted as a complete run.
///
fn collect_registered_netuids(
    entries: Vec<anyhow::Result<(Vec<u8>, bool)>>,
) -> anyhow::Result<Vec<u16>> {
    let mut netuids = Vec::new();
    for entry in entries {
        let (key, registered) = entry.context("subnet enumeration stream failed")?;
        if registered && key.len() >= 2 {
            netuids.push(u16::from_le_bytes([key[key.len() - 2], key[key.len() - 1]]));
        }
    }
    netuids.sort_unstable();
    Ok(netuids)
}

/// Clamp a decoded storage value into u16, falling back to the
/// chain default. An out-of-range value means a corrupt read, not
/// a missing entry, so it is logged before the fallback.
fn u16_or_default(entry: &str, netuid: u16, value: Option<u64>, default: u16) -> u16 {
    match value {
        Some(n) => match u16::try_from(n) {
            Ok(v) => v,
            Err(_) => {
                warn!("{entry} for netuid {netuid} out of u16 range ({n}); using {default}");
                default
            }
        },
        None => default,
    }
}

// ------------------------------------------------------------
// SCALE value decoding
// ------------------------------------------------------------
//
// Dynamic storage values come back as scale_value trees; the
// entries this source reads are all primitives.
//
fn decode_u64(thunk: &DecodedValueThunk) -> Option<u64> {
    let value = thunk.to_value().ok()?;
    match value.value {
        ValueDef::Primitive(Primitive::U128(n)) => u64::try_from(n).ok(),
        _ => None,
    }
}

fn decode_bool(thunk: &DecodedValueThunk) -> Option<bool> {
    let value = thunk.to_value().ok()?;
    match value.value {
        ValueDef::Primitive(Primitive::Bool(b)) => Some(b),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Storage key ending in the little-endian netuid.
    fn key_for(netuid: u16) -> Vec<u8> {
        let mut key = vec![0xaa; 32];
        key.extend_from_slice(&netuid.to_le_bytes());
        key
    }

    #[test]
    fn enumeration_collects_and_sorts_registered_netuids() {
        let entries = vec![
            Ok((key_for(3), true)),
            Ok((key_for(1), true)),
            Ok((key_for(2), false)),
            Ok((key_for(64), true)),
        ];
        let netuids = collect_registered_netuids(entries).unwrap();
        assert_eq!(netuids, vec![1, 3, 64]);
    }

    #[test]
    fn enumeration_fails_on_a_mid_stream_error() {
        // A transient RPC failure after the first page must abort
        // the run, never return a truncated list as success.
        let entries = vec![
            Ok((key_for(1), true)),
            Err(anyhow::anyhow!("connection reset")),
            Ok((key_for(2), true)),
        ];
        let result = collect_registered_netuids(entries);
        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("subnet enumeration stream failed"));
        assert!(err.contains("connection reset"));
    }

    #[test]
    fn enumeration_skips_short_keys() {
        let entries = vec![Ok((vec![0x01], true)), Ok((key_for(5), true))];
        assert_eq!(collect_registered_netuids(entries).unwrap(), vec![5]);
    }

    #[test]
    fn out_of_range_u16_falls_back_to_default() {
        assert_eq!(u16_or_default("Tempo", 1, Some(100_000), 360), 360);
        assert_eq!(u16_or_default("Tempo", 1, Some(99), 360), 99);
        assert_eq!(u16_or_default("Tempo", 1, None, 360), 360);
    }
}
