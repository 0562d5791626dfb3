//! C1: Block-Type Registry.
//!
//! Group-partitioned, lazily-loaded catalog of [`BlockType`]s. Concurrent
//! callers asking for the same group coalesce onto a single in-flight
//! fetch, mirroring the donor's promise-dedup pattern (a
//! `map<Key, SharedFuture<T>>` that returns the existing future when a key
//! is in flight and clears the entry on completion).

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{self, Shared};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::block::{BlockType, BlockTypeId};
use crate::error::{EngineError, EngineResult};
use crate::network::rest::RestClient;

type FetchResult = Result<Vec<BlockType>, String>;
type GroupFuture = Shared<future::BoxFuture<'static, FetchResult>>;

struct RegistryState {
    groups: HashMap<String, HashMap<String, BlockType>>,
    in_flight: HashMap<String, GroupFuture>,
}

impl RegistryState {
    fn new() -> Self {
        RegistryState {
            groups: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }
}

pub struct BlockTypeRegistry {
    state: Mutex<RegistryState>,
    rest: Arc<RestClient>,
}

impl BlockTypeRegistry {
    pub fn new(rest: Arc<RestClient>) -> Self {
        BlockTypeRegistry {
            state: Mutex::new(RegistryState::new()),
            rest,
        }
    }

    /// Idempotent. Coalesces concurrent callers for the same group onto a
    /// single in-flight fetch; rewrites any returned type whose embedded
    /// group id disagrees with `group`.
    pub async fn ensure_group_loaded(&self, group: &str) -> EngineResult<()> {
        let fut = {
            let mut state = self.state.lock();
            if state.groups.contains_key(group) {
                return Ok(());
            }
            if let Some(existing) = state.in_flight.get(group) {
                existing.clone()
            } else {
                let rest = self.rest.clone();
                let group_owned = group.to_string();
                let boxed: future::BoxFuture<'static, FetchResult> =
                    Box::pin(async move { rest.fetch_block_types(&group_owned).await });
                let shared = boxed.shared();
                state.in_flight.insert(group.to_string(), shared.clone());
                shared
            }
        };

        let result = fut.await;

        {
            let mut state = self.state.lock();
            state.in_flight.remove(group);
        }

        match result {
            Ok(types) => {
                self.install_group(group, types);
                Ok(())
            }
            Err(message) => {
                warn!("block-type group '{group}' failed to load: {message}");
                Err(EngineError::NetworkError { message })
            }
        }
    }

    /// Normalizes every fetched type's embedded id onto `group` and makes
    /// the group visible to `get_sync`. No partial-group state is ever
    /// observable: a failed fetch never reaches this point.
    fn install_group(&self, group: &str, types: Vec<BlockType>) {
        let mut by_name = HashMap::with_capacity(types.len());
        for bt in types {
            let name = bt
                .id
                .0
                .split_once(':')
                .map(|(_, n)| n.to_string())
                .unwrap_or_else(|| bt.id.0.clone());
            let id = BlockTypeId(format!("{group}:{name}"));
            by_name.insert(name, BlockType { id, ..bt });
        }
        debug!("loaded block-type group '{group}' ({} types)", by_name.len());
        self.state.lock().groups.insert(group.to_string(), by_name);
    }

    /// Returns a resolved type only if its owning group is already loaded.
    pub fn get_sync(&self, id: &BlockTypeId) -> Option<BlockType> {
        if id.is_air() {
            return Some(BlockType::air());
        }
        let state = self.state.lock();
        let name = id.0.split_once(':').map(|(_, n)| n)?;
        state.groups.get(id.group())?.get(name).cloned()
    }

    /// Ensures the owning group is loaded, then resolves `id`.
    pub async fn get(&self, id: &BlockTypeId) -> EngineResult<Option<BlockType>> {
        if id.is_air() {
            return Ok(Some(BlockType::air()));
        }
        self.ensure_group_loaded(id.group()).await?;
        Ok(self.get_sync(id))
    }

    /// Loads every unique group referenced by `ids` in parallel.
    pub async fn preload(&self, ids: &[BlockTypeId]) -> EngineResult<()> {
        let mut groups: Vec<String> = ids.iter().map(|id| id.group().to_string()).collect();
        groups.sort();
        groups.dedup();
        let futures = groups.iter().map(|g| self.ensure_group_loaded(g));
        for result in future::join_all(futures).await {
            result?;
        }
        Ok(())
    }

    /// Drops every loaded group; the AIR sentinel is not stored in
    /// `groups` so it survives a clear.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.groups.clear();
        state.in_flight.clear();
    }

    #[cfg(test)]
    fn install_group_for_test(&self, group: &str, types: Vec<BlockType>) {
        self.install_group(group, types);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_resolves_without_any_group_loaded() {
        let rest = Arc::new(RestClient::new_for_tests());
        let registry = BlockTypeRegistry::new(rest);
        assert!(registry.get_sync(&BlockTypeId::air()).is_some());
    }

    #[test]
    fn insert_rewrites_mismatched_group_prefix() {
        let rest = Arc::new(RestClient::new_for_tests());
        let registry = BlockTypeRegistry::new(rest);
        let bt = BlockType {
            id: BlockTypeId("other:stone".to_string()),
            modifiers: HashMap::new(),
        };
        registry.install_group_for_test("core", vec![bt]);
        let resolved = registry.get_sync(&BlockTypeId("core:stone".to_string()));
        assert!(resolved.is_some());
        assert_eq!(resolved.unwrap().id.group(), "core");
    }
}
