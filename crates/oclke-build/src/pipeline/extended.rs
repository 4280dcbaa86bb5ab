use oclke_runtime::{status_text, Context, DeviceId, LinkFailure, Program};

use super::{BuildInputs, Built};
use crate::buildlog::collect_logs;
use crate::error::{BuildError, Result};
use crate::module::SourceModule;
use crate::resolve::DeviceSummary;

/// Link option that turns the link output into a kernel library.
pub const CREATE_LIBRARY: &str = "-create-library";

pub(super) fn build<'a>(
    context: &Context<'a>,
    devices: &[DeviceSummary],
    inputs: &BuildInputs,
) -> Result<Built<'a>> {
    let ids: Vec<DeviceId> = devices.iter().map(|d| d.id).collect();
    let options = inputs.compiler_options.as_str();

    let includes = inputs
        .source_includes
        .iter()
        .map(|m| Program::with_source(context, &m.text))
        .collect::<oclke_runtime::Result<Vec<_>>>()?;
    let names: Vec<String> = inputs.source_includes.iter().map(SourceModule::name).collect();

    for (i, (program, module)) in includes.iter().zip(&inputs.source_includes).enumerate() {
        let headers: Vec<(&Program<'a>, &str)> = includes
            .iter()
            .zip(&names)
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, (p, n))| (p, n.as_str()))
            .collect();
        compile(program, module, &ids, devices, options, &headers)?;
    }

    let primary = match &inputs.primary {
        Some(module) => {
            let program = Program::with_source(context, &module.text)?;
            let headers: Vec<(&Program<'a>, &str)> =
                includes.iter().zip(names.iter().map(String::as_str)).collect();
            compile(&program, module, &ids, devices, options, &headers)?;
            Some(program)
        }
        None => None,
    };

    let binaries = inputs
        .binary_includes
        .iter()
        .map(|m| {
            log::debug!("loading binary include {}", m.path.display());
            Program::with_binary(context, &ids, &m.bytes)
        })
        .collect::<oclke_runtime::Result<Vec<_>>>()?;

    let linked = inputs.create_library || !includes.is_empty() || !binaries.is_empty();
    let program = if linked {
        let flags = link_options(inputs.create_library, &inputs.link_options);
        let link_set: Vec<&Program<'a>> =
            includes.iter().chain(&binaries).chain(&primary).collect();
        link(context, &ids, devices, flags, &link_set)?
    } else {
        primary.ok_or(BuildError::NothingToBuild)?
    };

    // A compiled object or a library has no kernels of its own; introspect an
    // executable linked from it and keep `program` as the written artifact.
    let executable = if inputs.introspect && (!linked || inputs.create_library) {
        let flags = link_options(false, &inputs.link_options);
        log::debug!("linking an executable for introspection");
        Some(link(context, &ids, devices, flags, &[&program])?)
    } else {
        None
    };

    Ok(Built {
        program,
        executable,
        notices: Vec::new(),
    })
}

fn link<'a>(
    context: &Context<'a>,
    ids: &[DeviceId],
    devices: &[DeviceSummary],
    flags: String,
    inputs: &[&Program<'a>],
) -> Result<Program<'a>> {
    log::debug!("linking {} program(s) with \"{flags}\"", inputs.len());
    match Program::link(context, ids, &flags, inputs)? {
        Ok(program) => Ok(program),
        Err(LinkFailure::Rejected { program, code }) => Err(BuildError::LinkFailed {
            options: flags,
            status: status_text(code).into_owned(),
            logs: collect_logs(&program, devices)?,
        }),
        Err(LinkFailure::NoProgram { code }) => Err(BuildError::LinkMismatch {
            status: status_text(code).into_owned(),
        }),
    }
}

fn compile<'a>(
    program: &Program<'a>,
    module: &SourceModule,
    ids: &[DeviceId],
    devices: &[DeviceSummary],
    options: &str,
    headers: &[(&Program<'a>, &str)],
) -> Result<()> {
    log::debug!("compiling {} with {} header(s)", module.path.display(), headers.len());
    if let Err(err) = program.compile(ids, options, headers) {
        return Err(BuildError::BuildFailed {
            module: module.name(),
            options: options.to_string(),
            status: err.to_string(),
            logs: collect_logs(program, devices)?,
        });
    }
    Ok(())
}

/// `-create-library` goes first when a library is requested.
pub(crate) fn link_options(create_library: bool, user: &str) -> String {
    let user = user.trim();
    match (create_library, user.is_empty()) {
        (true, true) => CREATE_LIBRARY.to_string(),
        (true, false) => format!("{CREATE_LIBRARY} {user}"),
        (false, _) => user.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_flag_prefixes_user_options() {
        assert_eq!(link_options(true, ""), "-create-library");
        assert_eq!(
            link_options(true, "-enable-link-options"),
            "-create-library -enable-link-options"
        );
        assert_eq!(link_options(false, " -cl-denorms-are-zero "), "-cl-denorms-are-zero");
    }
}
