use crate::client::{ControlAction, XmrigClient};
use crate::config::{ManagerConfig, MinerEndpoint};
use crate::database::SnapshotStore;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// A named collection of miner clients sharing one snapshot store.
///
/// Clients are handed out as `Arc` so callers can hold one across a
/// remove without invalidating it.
pub struct MinerManager {
    miners: RwLock<HashMap<String, Arc<XmrigClient>>>,
    store: Option<Arc<SnapshotStore>>,
}

impl MinerManager {
    pub fn new() -> Self {
        Self {
            miners: RwLock::new(HashMap::new()),
            store: None,
        }
    }

    pub fn with_store(store: Arc<SnapshotStore>) -> Self {
        Self {
            miners: RwLock::new(HashMap::new()),
            store: Some(store),
        }
    }

    /// Build a manager from a loaded configuration, connecting the
    /// snapshot store when one is configured
    pub async fn from_config(config: &ManagerConfig) -> Result<Self> {
        let store = match &config.database {
            Some(db) => Some(Arc::new(SnapshotStore::connect(db).await?)),
            None => None,
        };

        let manager = Self {
            miners: RwLock::new(HashMap::new()),
            store,
        };
        for endpoint in &config.miners {
            manager.add_miner(endpoint.clone()).await?;
        }
        Ok(manager)
    }

    pub fn store(&self) -> Option<&Arc<SnapshotStore>> {
        self.store.as_ref()
    }

    /// Register a miner. Names must be unique across the manager.
    pub async fn add_miner(&self, endpoint: MinerEndpoint) -> Result<Arc<XmrigClient>> {
        let mut miners = self.miners.write().await;
        if miners.contains_key(&endpoint.name) {
            return Err(Error::Manager(format!(
                "Miner '{}' is already registered",
                endpoint.name
            )));
        }

        let name = endpoint.name.clone();
        let mut client = XmrigClient::new(endpoint)?;
        if let Some(store) = &self.store {
            client = client.with_store(Arc::clone(store));
        }
        let client = Arc::new(client);
        miners.insert(name.clone(), Arc::clone(&client));
        info!(miner = %name, "Registered miner");
        Ok(client)
    }

    /// Remove a miner and purge its stored snapshots
    pub async fn remove_miner(&self, name: &str) -> Result<()> {
        let removed = self.miners.write().await.remove(name);
        if removed.is_none() {
            return Err(Error::Manager(format!("Unknown miner '{}'", name)));
        }

        if let Some(store) = &self.store {
            store.purge_miner(name).await?;
        }
        info!(miner = %name, "Removed miner");
        Ok(())
    }

    /// Look up a miner by name
    pub async fn miner(&self, name: &str) -> Result<Arc<XmrigClient>> {
        self.miners
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Manager(format!("Unknown miner '{}'", name)))
    }

    /// Registered miner names, sorted
    pub async fn list_miners(&self) -> Vec<String> {
        let mut names: Vec<String> = self.miners.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn miner_count(&self) -> usize {
        self.miners.read().await.len()
    }

    fn clients_snapshot_sorted(
        miners: &HashMap<String, Arc<XmrigClient>>,
    ) -> Vec<(String, Arc<XmrigClient>)> {
        let mut clients: Vec<_> = miners
            .iter()
            .map(|(name, client)| (name.clone(), Arc::clone(client)))
            .collect();
        clients.sort_by(|a, b| a.0.cmp(&b.0));
        clients
    }

    /// Refresh every miner's endpoints. Failures are collected per miner
    /// rather than aborting the sweep.
    pub async fn refresh_all(&self) -> Vec<(String, Result<()>)> {
        let clients = Self::clients_snapshot_sorted(&*self.miners.read().await);

        let mut results = Vec::with_capacity(clients.len());
        for (name, client) in clients {
            let result = client.refresh_all().await;
            if let Err(e) = &result {
                warn!(miner = %name, category = e.category(), error = %e, "Refresh failed");
            }
            results.push((name, result));
        }
        results
    }

    /// Run a control action against every miner, collecting per-miner results
    pub async fn control_all(&self, action: ControlAction) -> Vec<(String, Result<()>)> {
        let clients = Self::clients_snapshot_sorted(&*self.miners.read().await);

        let mut results = Vec::with_capacity(clients.len());
        for (name, client) in clients {
            let result = client.control(action).await;
            if let Err(e) = &result {
                warn!(
                    miner = %name,
                    action = action.as_str(),
                    error = %e,
                    "Control action failed"
                );
            }
            results.push((name, result));
        }
        results
    }
}

impl Default for MinerManager {
    fn default() -> Self {
        Self::new()
    }
}
