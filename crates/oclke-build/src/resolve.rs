//! Platform and device resolution.
//!
//! Indices are positional over the order the runtime reports; nothing here
//! reorders platforms or devices.

use oclke_runtime::{ClApi, DeviceId, DeviceInfo, PlatformId, PlatformInfo};
use serde::Serialize;

use crate::error::{BuildError, Result};
use crate::request::{first_repeated, Selection};

/// One enumerated platform.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformSummary {
    /// 1-based position in the runtime's platform list.
    pub index: usize,
    #[serde(skip)]
    pub id: PlatformId,
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub extensions: String,
}

impl PlatformSummary {
    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.split_whitespace().any(|ext| ext == name)
    }
}

/// One device of the selected platform.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    /// 1-based position in the platform's device list.
    pub index: usize,
    #[serde(skip)]
    pub id: DeviceId,
    pub name: String,
    pub vendor: String,
    pub version: String,
}

/// Every platform with its names, whether or not they get printed.
pub fn list_platforms(api: &dyn ClApi) -> Result<Vec<PlatformSummary>> {
    let ids = api.platform_ids()?;
    let mut platforms = Vec::with_capacity(ids.len());
    for (i, id) in ids.into_iter().enumerate() {
        platforms.push(PlatformSummary {
            index: i + 1,
            id,
            name: api.platform_info(id, PlatformInfo::Name)?,
            vendor: api.platform_info(id, PlatformInfo::Vendor)?,
            version: api.platform_info(id, PlatformInfo::Version)?,
            extensions: api.platform_info(id, PlatformInfo::Extensions)?,
        });
    }
    log::debug!("{} platform(s) available", platforms.len());
    Ok(platforms)
}

/// Name, vendor and version of `devices`, numbered in the order given.
pub fn describe_devices(api: &dyn ClApi, devices: &[DeviceId]) -> Result<Vec<DeviceSummary>> {
    devices
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            Ok(DeviceSummary {
                index: i + 1,
                id,
                name: api.device_info(id, DeviceInfo::Name)?,
                vendor: api.device_info(id, DeviceInfo::Vendor)?,
                version: api.device_info(id, DeviceInfo::Version)?,
            })
        })
        .collect()
}

/// The `selection`-th platform (1-based, default 1).
pub fn resolve_platform<T>(platforms: &[T], selection: Option<usize>) -> Result<&T> {
    if platforms.is_empty() {
        return Err(BuildError::NoPlatform);
    }
    let index = selection.unwrap_or(1);
    index
        .checked_sub(1)
        .and_then(|i| platforms.get(i))
        .ok_or_else(|| BuildError::invalid_platform(index, platforms.len()))
}

/// Devices picked by `selection`, in selection order.
pub fn resolve_devices<T: Clone>(selection: &Selection, all: &[T]) -> Result<Vec<T>> {
    match selection {
        Selection::All => Ok(all.to_vec()),
        Selection::Indices(indices) => {
            if let Some(index) = first_repeated(indices) {
                return Err(BuildError::duplicate_device(index));
            }
            indices
                .iter()
                .map(|&index| {
                    index
                        .checked_sub(1)
                        .and_then(|i| all.get(i))
                        .cloned()
                        .ok_or_else(|| BuildError::invalid_device(index, all.len()))
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_by_position() {
        let platforms = ["amd", "intel", "pocl"];
        for p in 1..=platforms.len() {
            assert_eq!(*resolve_platform(&platforms, Some(p)).unwrap(), platforms[p - 1]);
        }
        assert_eq!(*resolve_platform(&platforms, None).unwrap(), "amd");
    }

    #[test]
    fn platform_out_of_range() {
        let platforms = ["amd"];
        for p in [0, 2, 99] {
            assert!(matches!(
                resolve_platform(&platforms, Some(p)),
                Err(BuildError::InvalidSelection { .. })
            ));
        }
    }

    #[test]
    fn no_platforms() {
        let platforms: [&str; 0] = [];
        assert!(matches!(
            resolve_platform(&platforms, None),
            Err(BuildError::NoPlatform)
        ));
    }

    #[test]
    fn all_keeps_order() {
        let devices = vec!["gpu1", "cpu", "gpu0"];
        assert_eq!(resolve_devices(&Selection::All, &devices[..]).unwrap(), devices);
    }

    #[test]
    fn explicit_indices_in_given_order() {
        let devices = ["a", "b", "c"];
        let picked = resolve_devices(&Selection::Indices(vec![3, 1]), &devices).unwrap();
        assert_eq!(picked, vec!["c", "a"]);
    }

    #[test]
    fn out_of_range_indices() {
        let devices = ["a", "b"];
        for k in [0, 3, 100] {
            assert!(matches!(
                resolve_devices(&Selection::Indices(vec![k]), &devices),
                Err(BuildError::InvalidSelection { .. })
            ));
        }
    }

    #[test]
    fn repeated_indices_rejected() {
        let devices = ["a", "b"];
        for indices in [vec![1, 1], vec![2, 1, 2]] {
            let err = resolve_devices(&Selection::Indices(indices), &devices).unwrap_err();
            assert!(err.to_string().contains("more than once"));
        }
    }

    #[test]
    fn extension_lookup_is_exact() {
        let platform = PlatformSummary {
            index: 1,
            id: PlatformId(1),
            name: "AMD".into(),
            vendor: "AMD".into(),
            version: "OpenCL 1.2".into(),
            extensions: "cl_khr_icd cl_amd_offline_devices".into(),
        };
        assert!(platform.has_extension("cl_amd_offline_devices"));
        assert!(!platform.has_extension("cl_amd_offline"));
    }
}
