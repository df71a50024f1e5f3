use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use xmrig_api::{MinerConfig, MinerManager};

use super::{print_error, print_success};

/// Print each selected miner's configuration as pretty JSON
pub async fn handle_config_show(manager: &Arc<MinerManager>, targets: &[String]) -> Result<()> {
    let mut failures = 0;

    for name in targets {
        let client = manager.miner(name).await?;
        match client.fetch_config().await {
            Ok(config) => {
                println!("# {}", name);
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Err(e) => {
                print_error(&format!("{}: {}", name, e));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} miner(s) unreachable", failures, targets.len());
    }
    Ok(())
}

/// Push a configuration file to each selected miner
pub async fn handle_config_apply(
    manager: &Arc<MinerManager>,
    targets: &[String],
    file: &Path,
) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let config: MinerConfig = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a valid miner config", file.display()))?;

    let mut failures = 0;
    for name in targets {
        let client = manager.miner(name).await?;
        match client.post_config(&config).await {
            Ok(()) => print_success(&format!("{}: config applied", name)),
            Err(e) => {
                print_error(&format!("{}: config update failed: {}", name, e));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} miner(s) failed", failures, targets.len());
    }
    Ok(())
}
