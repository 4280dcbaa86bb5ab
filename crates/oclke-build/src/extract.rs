//! Per-device binary extraction.

use std::path::Path;

use oclke_runtime::Program;

use crate::error::{BuildError, Result};
use crate::module::write_file;
use crate::naming::colliding_names;
use crate::report::WrittenBinary;
use crate::resolve::DeviceSummary;

/// One binary per device, in device order.
///
/// Fails before returning anything if a device got no binary, so a partial
/// set of outputs is never written.
pub fn extract_binaries(program: &Program<'_>, devices: &[DeviceSummary]) -> Result<Vec<Vec<u8>>> {
    let empty = |position: usize| BuildError::EmptyBinary {
        index: devices.get(position).map_or(position + 1, |d| d.index),
    };

    let sizes = program.binary_sizes(devices.len())?;
    if let Some(position) = sizes.iter().position(|&size| size == 0) {
        return Err(empty(position));
    }
    let binaries = program.binaries(&sizes)?;
    if let Some(position) = binaries.iter().position(Vec::is_empty) {
        return Err(empty(position));
    }
    log::debug!("extracted {} binaries", binaries.len());
    Ok(binaries)
}

/// Write `binaries[i]` to `names[i]` unchanged.
pub fn write_binaries(
    names: &[String],
    binaries: &[Vec<u8>],
    devices: &[DeviceSummary],
) -> Result<Vec<WrittenBinary>> {
    if names.len() != binaries.len() || names.len() != devices.len() {
        return Err(BuildError::Internal(format!(
            "{} output names for {} binaries and {} devices",
            names.len(),
            binaries.len(),
            devices.len()
        )));
    }
    for name in colliding_names(names) {
        log::warn!("several devices share the output name '{name}'; the last one written wins");
    }
    let mut written = Vec::with_capacity(names.len());
    for ((name, binary), device) in names.iter().zip(binaries).zip(devices) {
        write_file(Path::new(name), binary)?;
        written.push(WrittenBinary {
            device_index: device.index,
            device_name: device.name.clone(),
            path: name.clone(),
            size: binary.len(),
        });
    }
    Ok(written)
}
