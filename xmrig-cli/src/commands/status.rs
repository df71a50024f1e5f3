use anyhow::Result;
use colored::*;
use std::sync::Arc;
use tabled::{Table, Tabled};
use xmrig_api::models::format_duration;
use xmrig_api::MinerManager;

use super::{format_hashrate, print_error};

/// Show a summary block for each selected miner
pub async fn handle_summary(manager: &Arc<MinerManager>, targets: &[String]) -> Result<()> {
    let mut failures = 0;

    for name in targets {
        let client = manager.miner(name).await?;
        println!("{}", format!("⛏  {}", name).bold());
        println!("{:-<60}", "");

        let summary = match client.fetch_summary().await {
            Ok(summary) => summary,
            Err(e) => {
                print_error(&format!("{}: {}", name, e));
                failures += 1;
                println!();
                continue;
            }
        };

        let state = if summary.paused {
            "⏸  Paused".yellow()
        } else {
            "✅ Mining".green()
        };
        println!("Status: {}", state);
        println!("Version: {}", summary.version);
        if let Some(worker_id) = &summary.worker_id {
            println!("Worker: {}", worker_id);
        }
        println!("Uptime: {}", summary.uptime_readable());
        if let Some(algo) = &summary.algo {
            println!("Algorithm: {}", algo);
        }

        println!(
            "Hashrate: {} (10s) | {} (1m) | {} (15m)",
            summary
                .hashrate_10s()
                .map(format_hashrate)
                .unwrap_or_else(|| "n/a".to_string()),
            summary
                .hashrate_1m()
                .map(format_hashrate)
                .unwrap_or_else(|| "n/a".to_string()),
            summary
                .hashrate_15m()
                .map(format_hashrate)
                .unwrap_or_else(|| "n/a".to_string()),
        );
        if let Some(highest) = summary.hashrate.highest {
            println!("Highest: {}", format_hashrate(highest));
        }

        if let Some(connection) = &summary.connection {
            println!("Pool: {}", connection.pool);
            println!(
                "Shares: {} accepted | {} rejected | ping {}ms",
                connection.accepted, connection.rejected, connection.ping
            );
        }

        if let Some(results) = &summary.results {
            println!(
                "Results: {}/{} good shares | difficulty {}",
                results.shares_good, results.shares_total, results.diff_current
            );
        }

        println!(
            "CPU: {} ({} cores, {} threads)",
            summary.cpu.brand, summary.cpu.cores, summary.cpu.threads
        );
        println!();
    }

    if failures > 0 {
        anyhow::bail!("{} of {} miner(s) unreachable", failures, targets.len());
    }
    Ok(())
}

#[derive(Tabled)]
struct BackendRow {
    #[tabled(rename = "Backend")]
    backend: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Algo")]
    algo: String,
    #[tabled(rename = "Threads")]
    threads: String,
    #[tabled(rename = "Hashrate (10s)")]
    hashrate: String,
}

/// Show backend and thread details for each selected miner
pub async fn handle_backends(manager: &Arc<MinerManager>, targets: &[String]) -> Result<()> {
    let mut failures = 0;

    for name in targets {
        let client = manager.miner(name).await?;
        println!("{}", format!("🔧 {} backends", name).bold());

        let backends = match client.fetch_backends().await {
            Ok(backends) => backends,
            Err(e) => {
                print_error(&format!("{}: {}", name, e));
                failures += 1;
                continue;
            }
        };

        let rows: Vec<BackendRow> = backends
            .iter()
            .map(|b| BackendRow {
                backend: b.kind.clone(),
                enabled: if b.enabled { "✅".to_string() } else { "❌".to_string() },
                algo: b.algo.clone().unwrap_or_else(|| "-".to_string()),
                threads: b.thread_count().to_string(),
                hashrate: b
                    .hashrate_10s()
                    .map(format_hashrate)
                    .unwrap_or_else(|| "n/a".to_string()),
            })
            .collect();
        println!("{}", Table::new(rows));

        for backend in backends.iter() {
            if let Some(threads) = &backend.threads {
                for thread in threads {
                    if let (Some(board), Some(health)) = (&thread.board, &thread.health) {
                        let temp = health
                            .temperature
                            .map(|t| format!("{}°C", t))
                            .unwrap_or_else(|| "n/a".to_string());
                        let power = health
                            .power
                            .map(|w| format!("{}W", w))
                            .unwrap_or_else(|| "n/a".to_string());
                        println!("   {} - {} | {}", board, temp, power);
                    }
                }
            }
        }
        println!();
    }

    if failures > 0 {
        anyhow::bail!("{} of {} miner(s) unreachable", failures, targets.len());
    }
    Ok(())
}

#[derive(Tabled)]
struct MinerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Auth")]
    auth: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Hashrate (10s)")]
    hashrate: String,
}

/// List the miners the manager knows about, probing each one
pub async fn handle_miners(manager: &Arc<MinerManager>) -> Result<()> {
    let names = manager.list_miners().await;
    if names.is_empty() {
        println!("No miners configured");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(names.len());
    for name in &names {
        let client = manager.miner(name).await?;
        let endpoint = client.endpoint();
        let (status, hashrate) = match client.fetch_summary().await {
            Ok(summary) => (
                if summary.paused { "⏸  paused" } else { "🟢 mining" }.to_string(),
                summary
                    .hashrate_10s()
                    .map(format_hashrate)
                    .unwrap_or_else(|| "n/a".to_string()),
            ),
            Err(_) => ("🔴 offline".to_string(), "-".to_string()),
        };
        rows.push(MinerRow {
            name: name.clone(),
            url: endpoint.base_url(),
            auth: if endpoint.access_token.is_some() {
                "token".to_string()
            } else {
                "none".to_string()
            },
            status,
            hashrate,
        });
    }
    println!("{}", Table::new(rows));
    Ok(())
}
