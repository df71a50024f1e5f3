use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response from the `/2/backends` endpoint: one entry per compiled-in
/// backend (cpu, opencl, cuda)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Backends(pub Vec<Backend>);

impl Backends {
    pub fn cpu(&self) -> Option<&Backend> {
        self.find("cpu")
    }

    pub fn opencl(&self) -> Option<&Backend> {
        self.find("opencl")
    }

    pub fn cuda(&self) -> Option<&Backend> {
        self.find("cuda")
    }

    fn find(&self, kind: &str) -> Option<&Backend> {
        self.0.iter().find(|b| b.kind == kind)
    }

    /// Names of backends currently enabled on the miner
    pub fn enabled_kinds(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|b| b.enabled)
            .map(|b| b.kind.as_str())
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Backend> {
        self.0.iter()
    }
}

/// A single mining backend. CPU and GPU backends share most fields; the
/// GPU-only pieces (platform, versions, per-thread board info) stay None
/// for the cpu entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backend {
    #[serde(rename = "type")]
    pub kind: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(rename = "hw-aes", default, skip_serializing_if = "Option::is_none")]
    pub hw_aes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msr: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asm: Option<Value>,
    #[serde(rename = "argon2-impl", default, skip_serializing_if = "Option::is_none")]
    pub argon2_impl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hugepages: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    /// Backend hashrate windows [10s, 1m, 15m], mirrors the summary layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashrate: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<OpenClPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<CudaVersions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<Vec<BackendThread>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Backend {
    pub fn hashrate_10s(&self) -> Option<f64> {
        self.hashrate.as_ref()?.first().copied().flatten()
    }

    pub fn thread_count(&self) -> usize {
        self.threads.as_ref().map(Vec::len).unwrap_or(0)
    }
}

/// OpenCL platform details for the opencl backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenClPlatform {
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// CUDA toolchain versions for the cuda backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CudaVersions {
    #[serde(rename = "cuda-runtime", default, skip_serializing_if = "Option::is_none")]
    pub cuda_runtime: Option<String>,
    #[serde(rename = "cuda-driver", default, skip_serializing_if = "Option::is_none")]
    pub cuda_driver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single worker thread. CPU threads report intensity/affinity, GPU
/// threads report board and clock details; everything is optional so one
/// struct covers both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendThread {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub av: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worksize: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unroll: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bfactor: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bsleep: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_host: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashrate: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smx: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_mem: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_clock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<GpuHealth>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// GPU sensor readings reported per thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuHealth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_clock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
