//! Run orchestration: platform, tier, contexts, pipeline, outputs.
//!
//! A run goes through two stages. [`PlatformSession`] holds the resolved
//! platform, the detected tier and the broad context with every device;
//! [`PlatformSession::select`] trades it for a [`BuildTarget`] whose narrow
//! context holds exactly the selected devices.

use oclke_runtime::capability::{detect_from_symbols, tier_from_version};
use oclke_runtime::{CapabilityTier, ClApi, Context, DetectionStrategy};

use crate::context::{context_properties, narrow, open_broad};
use crate::error::{BuildError, Result};
use crate::extract::{extract_binaries, write_binaries};
use crate::introspect::introspect;
use crate::naming::output_names;
use crate::pipeline::{BuildInputs, Built, Pipeline};
use crate::report::BuildReport;
use crate::request::{BuildRequest, Selection};
use crate::resolve::{
    list_platforms, resolve_devices, resolve_platform, DeviceSummary, PlatformSummary,
};

const INTROSPECTION_SKIPPED: &str =
    "kernel introspection needs the extended tier and was skipped";

/// Tier of the runtime, using one strategy. `None` when the version string
/// names no known OpenCL version.
pub fn detect_tier(
    api: &dyn ClApi,
    strategy: DetectionStrategy,
    platform: &PlatformSummary,
) -> Option<CapabilityTier> {
    let tier = match strategy {
        DetectionStrategy::Symbols => Some(detect_from_symbols(api)),
        DetectionStrategy::Version => tier_from_version(&platform.version),
    };
    match tier {
        Some(tier) => log::info!("capability tier: {tier} (by {strategy})"),
        None => log::warn!("unrecognised platform version '{}'", platform.version),
    }
    tier
}

/// A platform with its broad context open.
pub struct PlatformSession<'a> {
    platform: PlatformSummary,
    tier: Option<CapabilityTier>,
    detect: DetectionStrategy,
    broad: Context<'a>,
    devices: Vec<DeviceSummary>,
}

impl<'a> PlatformSession<'a> {
    pub fn open(api: &'a dyn ClApi, request: &BuildRequest) -> Result<Self> {
        let platforms = list_platforms(api)?;
        let platform = resolve_platform(&platforms, request.platform)?.clone();
        log::info!("platform {} selected: {}", platform.index, platform.name);

        let tier = detect_tier(api, request.detect, &platform);
        let props = context_properties(&platform, request.offline_devices);
        let (broad, devices) = open_broad(api, props)?;
        Ok(Self {
            platform,
            tier,
            detect: request.detect,
            broad,
            devices,
        })
    }

    pub fn platform(&self) -> &PlatformSummary {
        &self.platform
    }

    /// Every device of the platform, in runtime order.
    pub fn devices(&self) -> &[DeviceSummary] {
        &self.devices
    }

    pub fn tier(&self) -> Option<CapabilityTier> {
        self.tier
    }

    /// Resolve `selection` and replace the broad context with a narrow one.
    pub fn select(self, selection: &Selection) -> Result<BuildTarget<'a>> {
        let PlatformSession {
            platform,
            tier,
            detect,
            broad,
            devices,
        } = self;
        let selected = resolve_devices(selection, &devices)?;
        for device in &selected {
            log::info!("device {} selected: {}", device.index, device.name);
        }
        let context = narrow(broad, &selected)?;
        Ok(BuildTarget {
            platform,
            tier,
            detect,
            context,
            devices: selected,
        })
    }
}

/// Selected devices bound to their narrow context.
pub struct BuildTarget<'a> {
    platform: PlatformSummary,
    tier: Option<CapabilityTier>,
    detect: DetectionStrategy,
    context: Context<'a>,
    devices: Vec<DeviceSummary>,
}

impl BuildTarget<'_> {
    pub fn platform(&self) -> &PlatformSummary {
        &self.platform
    }

    /// Selected devices, in selection order.
    pub fn devices(&self) -> &[DeviceSummary] {
        &self.devices
    }

    /// Build `request` and write one binary per selected device.
    pub fn build(&self, request: &BuildRequest) -> Result<BuildReport> {
        let tier = self.tier.ok_or_else(|| BuildError::CapabilityUnknown {
            version: self.platform.version.clone(),
        })?;
        let pipeline = Pipeline::for_tier(tier);
        pipeline.check(request)?;

        let inputs = BuildInputs::load(request)?;
        let Built {
            program,
            executable,
            mut notices,
        } = pipeline.run(&self.context, &self.devices, &inputs)?;
        drop(inputs);

        let kernels = match (request.introspect, pipeline) {
            (false, _) => None,
            (true, Pipeline::Extended) => {
                Some(introspect(executable.as_ref().unwrap_or(&program))?)
            }
            (true, Pipeline::Basic) => {
                log::warn!("{INTROSPECTION_SKIPPED}");
                notices.push(INTROSPECTION_SKIPPED.to_string());
                None
            }
        };

        drop(executable);
        let binaries = extract_binaries(&program, &self.devices)?;
        drop(program);

        let input = request
            .kernel
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        let explicit = request
            .output
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        let device_names: Vec<String> = self.devices.iter().map(|d| d.name.clone()).collect();
        let names = output_names(input.as_deref(), explicit.as_deref(), &device_names)?;
        let outputs = write_binaries(&names, &binaries, &self.devices)?;

        Ok(BuildReport {
            tier,
            detect: self.detect,
            platform: self.platform.clone(),
            devices: self.devices.clone(),
            library: request.create_library,
            notices,
            outputs,
            kernels,
        })
    }
}

/// Full run for `request`. Exit status is 0 for `Ok` and 1 for `Err`.
pub fn run(api: &dyn ClApi, request: &BuildRequest) -> Result<BuildReport> {
    if !request.has_work() {
        return Err(BuildError::NothingToBuild);
    }
    PlatformSession::open(api, request)?
        .select(&request.devices)?
        .build(request)
}
