//! Broad and narrow contexts.
//!
//! Devices can only be listed through a context, and a context's device set
//! is fixed at creation. A run therefore opens a context over every device
//! of the platform, resolves the selection against it, then swaps it for a
//! context bound to exactly the selected devices.

use oclke_runtime::{ClApi, Context, ContextProperties};

use crate::error::Result;
use crate::resolve::{describe_devices, DeviceSummary, PlatformSummary};

/// Platform extension that exposes devices not physically installed.
pub const AMD_OFFLINE_DEVICES: &str = "cl_amd_offline_devices";

/// Context properties for `platform`.
///
/// Offline devices are requested only when the platform advertises them;
/// otherwise the request is dropped without error.
pub fn context_properties(platform: &PlatformSummary, offline_devices: bool) -> ContextProperties {
    let offline = offline_devices && platform.has_extension(AMD_OFFLINE_DEVICES);
    if offline_devices && !offline {
        log::debug!(
            "platform {} lacks {AMD_OFFLINE_DEVICES}, offline devices not requested",
            platform.index
        );
    }
    ContextProperties {
        platform: platform.id,
        offline_devices: offline,
    }
}

/// Context over every device type of the platform, with its devices.
pub fn open_broad<'a>(
    api: &'a dyn ClApi,
    props: ContextProperties,
) -> Result<(Context<'a>, Vec<DeviceSummary>)> {
    let context = Context::from_type(api, props)?;
    let ids = context.devices()?;
    let devices = describe_devices(api, &ids)?;
    log::debug!("broad context holds {} device(s)", devices.len());
    Ok((context, devices))
}

/// Release `broad` and open a context bound to exactly `selected`.
pub fn narrow<'a>(broad: Context<'a>, selected: &[DeviceSummary]) -> Result<Context<'a>> {
    let api = broad.api();
    let props = broad.properties();
    drop(broad);
    let ids: Vec<_> = selected.iter().map(|d| d.id).collect();
    Ok(Context::with_devices(api, props, &ids)?)
}
