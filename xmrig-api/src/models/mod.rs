//! Typed models of the XMRig HTTP API payloads.
//!
//! The daemon reports slightly different field sets depending on version,
//! restricted mode and which backends are compiled in, so optional fields are
//! widespread and every struct keeps unknown keys in a flattened map. That
//! also lets a fetched config be edited and posted back without dropping
//! settings the models do not know about.

pub mod backends;
pub mod miner_config;
pub mod summary;

pub use backends::{Backend, BackendThread, Backends, CudaVersions, GpuHealth, OpenClPlatform};
pub use miner_config::{
    ApiSection, CpuSection, HttpSection, MinerConfig, PoolEntry, RandomxSection,
};
pub use summary::{Cpu, Hashrate, Memory, PoolConnection, Resources, Results, Summary};

/// Format a seconds count the way the CLI status output does
pub fn format_duration(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(3700), "1h 1m");
        assert_eq!(format_duration(90061), "1d 1h 1m");
    }
}
