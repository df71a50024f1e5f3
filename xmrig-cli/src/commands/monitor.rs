use anyhow::Result;
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};
use tokio::time::interval;
use xmrig_api::models::format_duration;
use xmrig_api::MinerManager;

use super::{format_hashrate, print_info};

#[derive(Tabled)]
struct FleetRow {
    #[tabled(rename = "Miner")]
    miner: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Hashrate (10s)")]
    hashrate: String,
    #[tabled(rename = "Accepted")]
    accepted: String,
    #[tabled(rename = "Rejected")]
    rejected: String,
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
}

/// Live fleet view, refreshed on a fixed interval until interrupted
pub async fn handle_monitor(
    manager: &Arc<MinerManager>,
    targets: &[String],
    refresh_secs: u64,
) -> Result<()> {
    print_info("Starting fleet monitor...");
    print_info("Press Ctrl+C to exit");

    let mut ticker = interval(Duration::from_secs(refresh_secs));
    let mut iteration: u64 = 0;

    loop {
        ticker.tick().await;

        // Clear screen and move cursor to top
        print!("\x1B[2J\x1B[1;1H");
        println!("{}", "⛏  XMRig Fleet Monitor".bold().blue());
        println!("{}", "─".repeat(60));
        println!(
            "Refresh: {}s | Iteration: {} | Time: {}",
            refresh_secs,
            iteration,
            chrono::Utc::now().format("%H:%M:%S UTC")
        );
        println!();

        let mut rows = Vec::with_capacity(targets.len());
        let mut total_hashrate = 0.0;

        for name in targets {
            let client = manager.miner(name).await?;
            match client.fetch_summary().await {
                Ok(summary) => {
                    let status = if summary.paused { "⏸" } else { "🟢" };
                    let hashrate = summary.hashrate_10s();
                    total_hashrate += hashrate.unwrap_or(0.0);
                    let (accepted, rejected, pool) = match &summary.connection {
                        Some(c) => (c.accepted.to_string(), c.rejected.to_string(), c.pool.clone()),
                        None => ("-".to_string(), "-".to_string(), "-".to_string()),
                    };
                    rows.push(FleetRow {
                        miner: name.clone(),
                        status: status.to_string(),
                        hashrate: hashrate
                            .map(format_hashrate)
                            .unwrap_or_else(|| "n/a".to_string()),
                        accepted,
                        rejected,
                        pool,
                        uptime: format_duration(summary.uptime),
                    });
                }
                Err(_) => rows.push(FleetRow {
                    miner: name.clone(),
                    status: "🔴".to_string(),
                    hashrate: "-".to_string(),
                    accepted: "-".to_string(),
                    rejected: "-".to_string(),
                    pool: "-".to_string(),
                    uptime: "-".to_string(),
                }),
            }
        }

        println!("{}", Table::new(rows));
        println!();
        println!("Fleet hashrate: {}", format_hashrate(total_hashrate).bold());

        iteration += 1;
    }
}
