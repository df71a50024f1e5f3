use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::format_duration;

/// Response from the `/2/summary` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
    pub uptime: u64,
    pub restricted: bool,
    pub resources: Resources,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Results>,
    /// Currently mined algorithm; null while the miner is idle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<PoolConnection>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ua: Option<String>,
    pub cpu: Cpu,
    #[serde(default)]
    pub donate_level: u32,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub algorithms: Vec<String>,
    pub hashrate: Hashrate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hugepages: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Summary {
    /// Total hashrate over the last 10 seconds, if the window has data
    pub fn hashrate_10s(&self) -> Option<f64> {
        self.hashrate.window(0)
    }

    /// Total hashrate over the last minute
    pub fn hashrate_1m(&self) -> Option<f64> {
        self.hashrate.window(1)
    }

    /// Total hashrate over the last 15 minutes
    pub fn hashrate_15m(&self) -> Option<f64> {
        self.hashrate.window(2)
    }

    /// Uptime as "1d 2h 3m" style text
    pub fn uptime_readable(&self) -> String {
        format_duration(self.uptime)
    }
}

/// Host resource usage reported by the miner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resources {
    pub memory: Memory,
    #[serde(default)]
    pub load_average: Vec<f64>,
    #[serde(default)]
    pub hardware_concurrency: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub free: u64,
    pub total: u64,
    pub resident_set_memory: u64,
}

/// Share results since the miner started
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Results {
    pub diff_current: u64,
    pub shares_good: u64,
    pub shares_total: u64,
    pub avg_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_time_ms: Option<u64>,
    pub hashes_total: u64,
    #[serde(default)]
    pub best: Vec<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Upstream pool connection state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConnection {
    pub pool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub uptime: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_ms: Option<u64>,
    #[serde(default)]
    pub ping: u32,
    #[serde(default)]
    pub failures: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Value>,
    #[serde(rename = "tls-fingerprint", default, skip_serializing_if = "Option::is_none")]
    pub tls_fingerprint: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algo: Option<String>,
    #[serde(default)]
    pub diff: u64,
    #[serde(default)]
    pub accepted: u64,
    #[serde(default)]
    pub rejected: u64,
    #[serde(default)]
    pub avg_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_time_ms: Option<u64>,
    #[serde(default)]
    pub hashes_total: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Processor details reported by the miner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepping: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proc_info: Option<u64>,
    pub aes: bool,
    #[serde(default)]
    pub avx2: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x64: Option<bool>,
    #[serde(rename = "64_bit", default, skip_serializing_if = "Option::is_none")]
    pub bit_64: Option<bool>,
    #[serde(default)]
    pub l2: u64,
    #[serde(default)]
    pub l3: u64,
    pub cores: u32,
    pub threads: u32,
    #[serde(default)]
    pub packages: u32,
    #[serde(default)]
    pub nodes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Hashrate windows: total is [10s, 1m, 15m], entries are null until the
/// window has accumulated samples
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hashrate {
    #[serde(default)]
    pub total: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest: Option<f64>,
}

impl Hashrate {
    pub fn window(&self, index: usize) -> Option<f64> {
        self.total.get(index).copied().flatten()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SUMMARY_FIXTURE: &str = r#"{
        "id": "a1b2c3d4e5f6",
        "worker_id": "rig-1",
        "uptime": 3701,
        "restricted": false,
        "resources": {
            "memory": {
                "free": 4525260800,
                "total": 16723518864,
                "resident_set_memory": 2269451264
            },
            "load_average": [0.92, 0.85, 0.81],
            "hardware_concurrency": 12
        },
        "features": ["api", "asm", "http", "hwloc", "tls"],
        "results": {
            "diff_current": 124012,
            "shares_good": 18,
            "shares_total": 19,
            "avg_time": 194,
            "avg_time_ms": 194837,
            "hashes_total": 2359296,
            "best": [1468638, 520387, 395067, 257823, 199424, 152391, 136187, 111873, 104286, 100788]
        },
        "algo": "rx/0",
        "connection": {
            "pool": "pool.example.org:4444",
            "ip": "203.0.113.7",
            "uptime": 3698,
            "uptime_ms": 3698211,
            "ping": 42,
            "failures": 0,
            "tls": null,
            "tls-fingerprint": null,
            "algo": "rx/0",
            "diff": 124012,
            "accepted": 18,
            "rejected": 1,
            "avg_time": 194,
            "avg_time_ms": 194837,
            "hashes_total": 2359296
        },
        "version": "6.21.0",
        "kind": "miner",
        "ua": "XMRig/6.21.0 (Linux x86_64) libuv/1.44.2 gcc/11.4.0",
        "cpu": {
            "brand": "AMD Ryzen 5 5600X 6-Core Processor",
            "family": 25,
            "model": 33,
            "stepping": 0,
            "proc_info": 2162178,
            "aes": true,
            "avx2": true,
            "x64": true,
            "64_bit": true,
            "l2": 3145728,
            "l3": 33554432,
            "cores": 6,
            "threads": 12,
            "packages": 1,
            "nodes": 1,
            "backend": "hwloc/2.9.0",
            "msr": "ryzen_19h",
            "assembly": "ryzen",
            "arch": "x86_64",
            "flags": ["aes", "vaes", "avx2", "bmi2", "osxsave", "pdpe1gb", "sse2", "ssse3", "sse4.1", "popcnt", "cat_l3"]
        },
        "donate_level": 1,
        "paused": false,
        "algorithms": ["cn/1", "cn/2", "cn/r", "rx/0", "rx/wow", "rx/arq"],
        "hashrate": {
            "total": [4521.03, 4489.67, null],
            "highest": 4684.11
        },
        "hugepages": [1168, 1168]
    }"#;

    #[test]
    fn test_deserialize_summary() {
        let summary: Summary = serde_json::from_str(SUMMARY_FIXTURE).unwrap();

        assert_eq!(summary.worker_id.as_deref(), Some("rig-1"));
        assert_eq!(summary.uptime, 3701);
        assert!(!summary.restricted);
        assert_eq!(summary.algo.as_deref(), Some("rx/0"));
        assert_eq!(summary.version, "6.21.0");
        assert_eq!(summary.donate_level, 1);
        assert!(!summary.paused);
        assert_eq!(summary.resources.memory.total, 16723518864);
        assert_eq!(summary.resources.hardware_concurrency, 12);
        assert_eq!(summary.cpu.cores, 6);
        assert!(summary.cpu.aes);
        assert_eq!(summary.cpu.flags.len(), 11);

        let results = summary.results.as_ref().unwrap();
        assert_eq!(results.shares_good, 18);
        assert_eq!(results.best.first(), Some(&1468638));

        let connection = summary.connection.as_ref().unwrap();
        assert_eq!(connection.pool, "pool.example.org:4444");
        assert_eq!(connection.accepted, 18);
        assert_eq!(connection.rejected, 1);
    }

    #[test]
    fn test_hashrate_windows() {
        let summary: Summary = serde_json::from_str(SUMMARY_FIXTURE).unwrap();

        assert_eq!(summary.hashrate_10s(), Some(4521.03));
        assert_eq!(summary.hashrate_1m(), Some(4489.67));
        // 15m window has not filled yet
        assert_eq!(summary.hashrate_15m(), None);
        assert_eq!(summary.hashrate.highest, Some(4684.11));
    }

    #[test]
    fn test_uptime_readable() {
        let summary: Summary = serde_json::from_str(SUMMARY_FIXTURE).unwrap();
        assert_eq!(summary.uptime_readable(), "1h 1m");
    }

    #[test]
    fn test_restricted_summary_omits_identity() {
        // Restricted mode withholds id/worker_id and the results block
        let json = r#"{
            "uptime": 10,
            "restricted": true,
            "resources": {
                "memory": {"free": 1, "total": 2, "resident_set_memory": 1},
                "load_average": [0.1],
                "hardware_concurrency": 4
            },
            "version": "6.21.0",
            "cpu": {
                "brand": "test cpu",
                "aes": false,
                "cores": 2,
                "threads": 4
            },
            "hashrate": {"total": [null, null, null], "highest": null}
        }"#;

        let summary: Summary = serde_json::from_str(json).unwrap();
        assert!(summary.restricted);
        assert!(summary.id.is_none());
        assert!(summary.results.is_none());
        assert_eq!(summary.hashrate_10s(), None);
    }

    #[test]
    fn test_unknown_keys_are_preserved() {
        let json = r#"{
            "uptime": 10,
            "restricted": true,
            "resources": {
                "memory": {"free": 1, "total": 2, "resident_set_memory": 1}
            },
            "version": "7.0.0",
            "cpu": {"brand": "test cpu", "aes": false, "cores": 2, "threads": 4},
            "hashrate": {"total": []},
            "some_future_field": {"nested": true}
        }"#;

        let summary: Summary = serde_json::from_str(json).unwrap();
        assert!(summary.extra.contains_key("some_future_field"));
    }
}
