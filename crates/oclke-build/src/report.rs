//! Summary of a finished build.

use std::fmt;

use oclke_runtime::{CapabilityTier, DetectionStrategy};
use serde::Serialize;

use crate::introspect::KernelSignature;
use crate::resolve::{DeviceSummary, PlatformSummary};

/// One binary written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenBinary {
    pub device_index: usize,
    pub device_name: String,
    pub path: String,
    pub size: usize,
}

/// Everything a run decided and produced.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub tier: CapabilityTier,
    pub detect: DetectionStrategy,
    pub platform: PlatformSummary,
    pub devices: Vec<DeviceSummary>,
    pub library: bool,
    /// Non-fatal notices, in the order they were raised.
    pub notices: Vec<String>,
    pub outputs: Vec<WrittenBinary>,
    /// Present when introspection was requested and supported.
    pub kernels: Option<Vec<KernelSignature>>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Build Report ===")?;
        writeln!(
            f,
            "Platform: {} ({})",
            self.platform.name, self.platform.version
        )?;
        writeln!(f, "Tier: {} (detected by {})", self.tier, self.detect)?;
        writeln!(f, "Library: {}", if self.library { "yes" } else { "no" })?;

        writeln!(f)?;
        writeln!(f, "--- Outputs ({}) ---", self.outputs.len())?;
        for out in &self.outputs {
            writeln!(
                f,
                "  [{}] {:<25} {} ({} bytes)",
                out.device_index, out.device_name, out.path, out.size
            )?;
        }

        if let Some(kernels) = &self.kernels {
            writeln!(f)?;
            writeln!(f, "--- Kernels ({}) ---", kernels.len())?;
            for kernel in kernels {
                writeln!(f, "  {kernel}")?;
            }
        }

        if !self.notices.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Notices ---")?;
            for notice in &self.notices {
                writeln!(f, "  {notice}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oclke_runtime::{DeviceId, PlatformId};

    fn report() -> BuildReport {
        BuildReport {
            tier: CapabilityTier::Extended,
            detect: DetectionStrategy::Symbols,
            platform: PlatformSummary {
                index: 1,
                id: PlatformId(1),
                name: "Portable Computing Language".into(),
                vendor: "The pocl project".into(),
                version: "OpenCL 1.2 pocl".into(),
                extensions: String::new(),
            },
            devices: vec![DeviceSummary {
                index: 1,
                id: DeviceId(0x101),
                name: "cpu-haswell".into(),
                vendor: "GenuineIntel".into(),
                version: "OpenCL 1.2".into(),
            }],
            library: false,
            notices: vec!["kernel introspection skipped".into()],
            outputs: vec![WrittenBinary {
                device_index: 1,
                device_name: "cpu-haswell".into(),
                path: "vadd.bin".into(),
                size: 4096,
            }],
            kernels: None,
        }
    }

    #[test]
    fn report_display() {
        let text = report().to_string();
        assert!(text.contains("Build Report"));
        assert!(text.contains("Portable Computing Language"));
        assert!(text.contains("vadd.bin (4096 bytes)"));
        assert!(text.contains("introspection skipped"));
    }

    #[test]
    fn report_json_omits_handles() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["tier"], "extended");
        assert_eq!(json["platform"]["name"], "Portable Computing Language");
        assert!(json["platform"].get("id").is_none());
        assert_eq!(json["outputs"][0]["size"], 4096);
    }
}
