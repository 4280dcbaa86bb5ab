use oclke_runtime::{Context, DeviceId, Program};

use super::{BuildInputs, Built};
use crate::buildlog::collect_logs;
use crate::error::{BuildError, Result};
use crate::resolve::DeviceSummary;

const INCLUDE_NOTICE: &str = "source and binary includes need OpenCL 1.2 \
     compile/link support and are ignored; pass include directories through the compiler \
     options (-I <dir>) instead";

pub(super) fn build<'a>(
    context: &Context<'a>,
    devices: &[DeviceSummary],
    inputs: &BuildInputs,
) -> Result<Built<'a>> {
    let mut notices = Vec::new();
    if inputs.has_includes() {
        log::warn!("{INCLUDE_NOTICE}");
        notices.push(INCLUDE_NOTICE.to_string());
    }

    let primary = inputs.primary.as_ref().ok_or(BuildError::NothingToBuild)?;
    let ids: Vec<DeviceId> = devices.iter().map(|d| d.id).collect();
    let program = Program::with_source(context, &primary.text)?;
    if let Err(err) = program.build(&ids, &inputs.compiler_options) {
        return Err(BuildError::BuildFailed {
            module: primary.name(),
            options: inputs.compiler_options.clone(),
            status: err.to_string(),
            logs: collect_logs(&program, devices)?,
        });
    }
    Ok(Built {
        program,
        executable: None,
        notices,
    })
}
