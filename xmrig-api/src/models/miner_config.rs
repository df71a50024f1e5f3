use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Miner configuration as returned by `GET /2/config`.
///
/// Only the sections a client commonly edits are typed; everything else
/// rides along in the flattened map so the full document can be posted
/// back unchanged. Options stay unset rather than serializing as null,
/// which would otherwise reset settings on the miner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosave: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub randomx: Option<RandomxSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuSection>,
    #[serde(rename = "donate-level", default, skip_serializing_if = "Option::is_none")]
    pub donate_level: Option<u32>,
    #[serde(
        rename = "donate-over-proxy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub donate_over_proxy: Option<u32>,
    #[serde(rename = "log-file", default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pools: Option<Vec<PoolEntry>>,
    #[serde(rename = "print-time", default, skip_serializing_if = "Option::is_none")]
    pub print_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(rename = "retry-pause", default, skip_serializing_if = "Option::is_none")]
    pub retry_pause: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<bool>,
    #[serde(rename = "pause-on-battery", default, skip_serializing_if = "Option::is_none")]
    pub pause_on_battery: Option<bool>,
    #[serde(rename = "pause-on-active", default, skip_serializing_if = "Option::is_none")]
    pub pause_on_active: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MinerConfig {
    /// First configured pool, if any
    pub fn primary_pool(&self) -> Option<&PoolEntry> {
        self.pools.as_ref()?.first()
    }
}

/// The `api` section: miner identity on the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "worker-id", default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `http` section: embedded API server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(rename = "access-token", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restricted: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `randomx` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomxSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<i32>,
    #[serde(rename = "init-avx2", default, skip_serializing_if = "Option::is_none")]
    pub init_avx2: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(rename = "1gb-pages", default, skip_serializing_if = "Option::is_none")]
    pub one_gb_pages: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdmsr: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrmsr: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_qos: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numa: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratchpad_prefetch_mode: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `cpu` section. Per-algorithm thread layouts vary in shape, so they
/// land in the flattened map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "huge-pages", default, skip_serializing_if = "Option::is_none")]
    pub huge_pages: Option<bool>,
    #[serde(rename = "huge-pages-jit", default, skip_serializing_if = "Option::is_none")]
    pub huge_pages_jit: Option<bool>,
    #[serde(rename = "hw-aes", default, skip_serializing_if = "Option::is_none")]
    pub hw_aes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(rename = "memory-pool", default, skip_serializing_if = "Option::is_none")]
    pub memory_pool: Option<Value>,
    #[serde(rename = "yield", default, skip_serializing_if = "Option::is_none")]
    pub yield_: Option<bool>,
    #[serde(rename = "max-threads-hint", default, skip_serializing_if = "Option::is_none")]
    pub max_threads_hint: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asm: Option<Value>,
    #[serde(rename = "argon2-impl", default, skip_serializing_if = "Option::is_none")]
    pub argon2_impl: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry from the `pools` array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    #[serde(rename = "rig-id", default, skip_serializing_if = "Option::is_none")]
    pub rig_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nicehash: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepalive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(rename = "tls-fingerprint", default, skip_serializing_if = "Option::is_none")]
    pub tls_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const CONFIG_FIXTURE: &str = r#"{
        "api": {
            "id": null,
            "worker-id": "rig-1"
        },
        "http": {
            "enabled": true,
            "host": "0.0.0.0",
            "port": 37841,
            "access-token": "SECRET",
            "restricted": false
        },
        "autosave": true,
        "background": false,
        "colors": true,
        "randomx": {
            "init": -1,
            "init-avx2": -1,
            "mode": "auto",
            "1gb-pages": false,
            "rdmsr": true,
            "wrmsr": true,
            "cache_qos": false,
            "numa": true,
            "scratchpad_prefetch_mode": 1
        },
        "cpu": {
            "enabled": true,
            "huge-pages": true,
            "huge-pages-jit": false,
            "hw-aes": null,
            "priority": null,
            "memory-pool": false,
            "yield": true,
            "max-threads-hint": 100,
            "asm": true,
            "argon2-impl": null,
            "rx/0": [0, 2, 4, 6, 8, 10]
        },
        "donate-level": 1,
        "donate-over-proxy": 1,
        "log-file": null,
        "pools": [
            {
                "algo": null,
                "coin": "monero",
                "url": "pool.example.org:4444",
                "user": "48edfHu7V9Z84YzzMa6fUueoELZ9ZRXq9VetWzYGzKt52XU5xvqgzYnDK9URnRoJMk1j8nLwEVsaSWJ4fhdUyZijBGUicoD",
                "pass": "x",
                "rig-id": "rig-1",
                "nicehash": false,
                "keepalive": true,
                "enabled": true,
                "tls": false,
                "tls-fingerprint": null,
                "daemon": false
            }
        ],
        "print-time": 60,
        "retries": 5,
        "retry-pause": 5,
        "syslog": false,
        "verbose": 0,
        "watch": true,
        "pause-on-battery": false,
        "pause-on-active": false,
        "opencl": {
            "enabled": false,
            "cache": true,
            "loader": null,
            "platform": "AMD"
        }
    }"#;

    #[test]
    fn test_deserialize_config() {
        let config: MinerConfig = serde_json::from_str(CONFIG_FIXTURE).unwrap();

        let http = config.http.as_ref().unwrap();
        assert_eq!(http.port, Some(37841));
        assert_eq!(http.access_token.as_deref(), Some("SECRET"));
        assert_eq!(http.restricted, Some(false));

        let api = config.api.as_ref().unwrap();
        assert_eq!(api.worker_id.as_deref(), Some("rig-1"));
        assert!(api.id.is_none());

        let randomx = config.randomx.as_ref().unwrap();
        assert_eq!(randomx.one_gb_pages, Some(false));
        assert_eq!(randomx.scratchpad_prefetch_mode, Some(1));

        let cpu = config.cpu.as_ref().unwrap();
        assert_eq!(cpu.huge_pages, Some(true));
        assert_eq!(cpu.max_threads_hint, Some(100));
        // per-algorithm thread list is an unknown key
        assert!(cpu.extra.contains_key("rx/0"));

        assert_eq!(config.donate_level, Some(1));
        let pool = config.primary_pool().unwrap();
        assert_eq!(pool.url, "pool.example.org:4444");
        assert_eq!(pool.coin.as_deref(), Some("monero"));
        assert_eq!(pool.keepalive, Some(true));
    }

    #[test]
    fn test_unknown_sections_survive_roundtrip() {
        let config: MinerConfig = serde_json::from_str(CONFIG_FIXTURE).unwrap();
        assert!(config.extra.contains_key("opencl"));

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["opencl"]["platform"], "AMD");
        assert_eq!(back["cpu"]["rx/0"], serde_json::json!([0, 2, 4, 6, 8, 10]));
        assert_eq!(back["http"]["access-token"], "SECRET");
    }

    #[test]
    fn test_unset_options_are_not_serialized() {
        let config: MinerConfig = serde_json::from_str(r#"{"donate-level": 1}"#).unwrap();
        let back = serde_json::to_value(&config).unwrap();

        let obj = back.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(!obj.contains_key("pools"));
        assert!(!obj.contains_key("http"));
    }

    #[test]
    fn test_edit_and_serialize() {
        let mut config: MinerConfig = serde_json::from_str(CONFIG_FIXTURE).unwrap();
        config.pools.as_mut().unwrap()[0].user = Some("new-wallet-address".to_string());

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["pools"][0]["user"], "new-wallet-address");
        // untouched settings still present
        assert_eq!(back["randomx"]["mode"], "auto");
    }
}
