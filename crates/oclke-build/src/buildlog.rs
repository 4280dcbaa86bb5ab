//! Per-device compiler and linker logs.

use std::fmt;

use oclke_runtime::Program;
use serde::Serialize;

use crate::error::Result;
use crate::resolve::DeviceSummary;

/// The log one device produced for one program.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceLog {
    pub device_index: usize,
    pub device_name: String,
    pub text: String,
}

/// Logs of every selected device, in selection order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildLogs(pub Vec<DeviceLog>);

impl fmt::Display for BuildLogs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for log in &self.0 {
            writeln!(f, "--- device {} ({}) ---", log.device_index, log.device_name)?;
            let text = log.text.trim_end();
            if text.is_empty() {
                writeln!(f, "(empty log)")?;
            } else {
                writeln!(f, "{text}")?;
            }
        }
        Ok(())
    }
}

/// Read the log of `program` for every device, not just the first that failed.
pub fn collect_logs(program: &Program<'_>, devices: &[DeviceSummary]) -> Result<BuildLogs> {
    let mut logs = Vec::with_capacity(devices.len());
    for device in devices {
        logs.push(DeviceLog {
            device_index: device.index,
            device_name: device.name.clone(),
            text: program.build_log(device.id)?,
        });
    }
    Ok(BuildLogs(logs))
}
