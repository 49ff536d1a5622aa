use std::path::Path;

use anyhow::Context;
use log::{info, warn};

use crate::schema::{Collection, SubnetRecord};
use crate::sources::adapter::MetadataSource;
use crate::util::now_secs;

/// Collect metadata for every registered subnet from `source`.
///
/// This function is responsible for:
/// - Enumerating the registered identifier set
/// - Fetching each subnet independently
/// - Capturing per-item failures as error records
/// - Assembling the final Collection
///
/// GUARANTEES:
/// - A per-item failure never aborts the run; it becomes a
///   record with `error` set and null data fields.
/// - Enumeration failure aborts the run with no Collection.
/// - An empty identifier set yields a valid empty Collection.
///
/// This function does NOT:
/// - Open or close the source session (caller responsibility)
/// - Touch the filesystem (see `collect_and_persist`)
///
pub async fn collect(
    source: &dyn MetadataSource,
    network: &str,
    timestamp: i64,
) -> anyhow::Result<Collection> {
    let netuids = source
        .list_subnets()
        .await
        .context("subnet enumeration failed")?;
    info!("found {} registered subnets", netuids.len());

    let mut records = Vec::with_capacity(netuids.len());
    for (i, netuid) in netuids.iter().copied().enumerate() {
        info!("fetching subnet {} ({}/{})", netuid, i + 1, netuids.len());

        let fetched_at = now_secs();
        let record = match source.fetch_subnet(netuid).await {
            Ok(snap) => SubnetRecord::success(
                netuid,
                fetched_at,
                snap.exists,
                snap.is_active,
                snap.owner_hotkey,
                snap.price,
                snap.hyperparameters,
            ),
            Err(e) => {
                // Skip-and-continue: one bad subnet must not cost
                // the whole run.
                warn!("subnet {netuid} fetch failed: {e:#}");
                SubnetRecord::failure(netuid, fetched_at, format!("{e:#}"))
            }
        };
        records.push(record);
    }

    Ok(Collection::new(records, timestamp, network, source.name()))
}

/// Persist a Collection as pretty-printed JSON, fully replacing
/// any prior document at `path`. The parent directory is created
/// if missing.
pub fn write_collection(collection: &Collection, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(collection)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write collection to {}", path.display()))?;
    Ok(())
}

/// Full collector pass: collect from `source`, then write the
/// Collection to `path`. The file is only touched after the whole
/// collection succeeded, so a fatal failure leaves any prior
/// document exactly as it was.
pub async fn collect_and_persist(
    source: &dyn MetadataSource,
    network: &str,
    path: &Path,
) -> anyhow::Result<Collection> {
    let started = now_secs();
    let collection = collect(source, network, started).await?;
    write_collection(&collection, path)?;

    info!(
        "collected {} subnets ({} errors) to {}",
        collection.total_count,
        collection.error_count(),
        path.display()
    );
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Scalar;
    use crate::sources::adapter::{MetadataSource, SubnetSnapshot};
    use std::collections::BTreeMap;

    /// In-memory source with a configurable failing identifier.
    struct MockSource {
        netuids: Vec<u16>,
        failing: Option<u16>,
        list_fails: bool,
    }

    #[async_trait::async_trait]
    impl MetadataSource for MockSource {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn list_subnets(&self) -> anyhow::Result<Vec<u16>> {
            if self.list_fails {
                anyhow::bail!("connection refused");
            }
            Ok(self.netuids.clone())
        }

        async fn fetch_subnet(&self, netuid: u16) -> anyhow::Result<SubnetSnapshot> {
            if self.failing == Some(netuid) {
                anyhow::bail!("storage query timed out");
            }
            let mut hp = BTreeMap::new();
            hp.insert("tempo".to_string(), Scalar::Uint(360));
            Ok(SubnetSnapshot {
                exists: true,
                is_active: Some(true),
                owner_hotkey: Some(format!("5HCF{netuid}")),
                price: Some(0.009940307),
                hyperparameters: Some(hp),
            })
        }
    }

    #[tokio::test]
    async fn collects_all_subnets_in_order() {
        let source = MockSource {
            netuids: vec![1, 2, 3],
            failing: None,
            list_fails: false,
        };
        let coll = collect(&source, "finney", 1_700_000_000).await.unwrap();

        assert_eq!(coll.total_count, 3);
        assert_eq!(coll.total_count, coll.subnets.len());
        assert_eq!(
            coll.subnets.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(coll.network, "finney");
        assert_eq!(coll.source, "mock");
        assert_eq!(coll.timestamp, 1_700_000_000);
    }

    #[tokio::test]
    async fn per_item_failure_becomes_error_record() {
        let source = MockSource {
            netuids: vec![1, 42, 99],
            failing: Some(42),
            list_fails: false,
        };
        let coll = collect(&source, "finney", 0).await.unwrap();

        assert_eq!(coll.total_count, 3);
        let bad = &coll.subnets[1];
        assert_eq!(bad.id, 42);
        assert!(bad.error.as_deref().unwrap().contains("timed out"));
        assert!(bad.exists.is_none());
        assert!(bad.price.is_none());
        assert!(bad.owner_hotkey.is_none());
        assert!(bad.hyperparameters.is_none());

        // The neighbors are untouched.
        assert_eq!(coll.subnets[0].exists, Some(true));
        assert_eq!(coll.subnets[2].exists, Some(true));
        assert_eq!(coll.error_count(), 1);
    }

    #[tokio::test]
    async fn empty_enumeration_is_a_valid_collection() {
        let source = MockSource {
            netuids: vec![],
            failing: None,
            list_fails: false,
        };
        let coll = collect(&source, "finney", 0).await.unwrap();
        assert_eq!(coll.total_count, 0);
        assert!(coll.subnets.is_empty());
    }

    #[tokio::test]
    async fn enumeration_failure_leaves_prior_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subnets.json");
        std::fs::write(&path, "{\"prior\": true}").unwrap();

        let source = MockSource {
            netuids: vec![],
            failing: None,
            list_fails: true,
        };
        let result = collect_and_persist(&source, "finney", &path).await;

        assert!(result.is_err());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\"prior\": true}"
        );
    }

    #[tokio::test]
    async fn persisted_collection_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/subnets.json");

        let source = MockSource {
            netuids: vec![7],
            failing: None,
            list_fails: false,
        };
        collect_and_persist(&source, "finney", &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: Collection = serde_json::from_str(&text).unwrap();
        assert_eq!(back.total_count, 1);
        assert_eq!(back.subnets[0].id, 7);
        assert_eq!(back.subnets[0].price, Some(0.009940307));
    }
}
