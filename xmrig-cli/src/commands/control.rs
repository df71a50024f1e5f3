use anyhow::Result;
use std::sync::Arc;
use xmrig_api::{ControlAction, MinerManager};

use super::{print_error, print_success};

/// Run a control action against each selected miner
pub async fn handle_control(
    manager: &Arc<MinerManager>,
    targets: &[String],
    action: ControlAction,
) -> Result<()> {
    let mut failures = 0;

    for name in targets {
        let client = manager.miner(name).await?;
        match client.control(action).await {
            Ok(()) => print_success(&format!("{}: {} sent", name, action.as_str())),
            Err(e) => {
                print_error(&format!("{}: {} failed: {}", name, action.as_str(), e));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} miner(s) failed", failures, targets.len());
    }
    Ok(())
}
