//! Scoped OpenCL handles.
//!
//! Each guard owns exactly one reference to its runtime object and releases
//! it when dropped, so every exit path (errors included) gives the object
//! back to the runtime.

use crate::api::{
    ClApi, ContextId, ContextProperties, DeviceId, KernelArgInfo, KernelId, KernelInfo,
    LinkOutcome, ProgramId,
};
use crate::error::Result;

/// An OpenCL context.
pub struct Context<'a> {
    api: &'a dyn ClApi,
    id: ContextId,
    props: ContextProperties,
}

impl<'a> Context<'a> {
    /// Context over every device type of `props.platform`.
    pub fn from_type(api: &'a dyn ClApi, props: ContextProperties) -> Result<Self> {
        let id = api.create_context_from_type(&props)?;
        log::debug!("created context {:#x} from type", id.0);
        Ok(Self { api, id, props })
    }

    /// Context bound to exactly `devices`.
    pub fn with_devices(
        api: &'a dyn ClApi,
        props: ContextProperties,
        devices: &[DeviceId],
    ) -> Result<Self> {
        let id = api.create_context(&props, devices)?;
        log::debug!("created context {:#x} for {} device(s)", id.0, devices.len());
        Ok(Self { api, id, props })
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn properties(&self) -> ContextProperties {
        self.props
    }

    pub fn api(&self) -> &'a dyn ClApi {
        self.api
    }

    /// Devices the context was created with, in runtime order.
    pub fn devices(&self) -> Result<Vec<DeviceId>> {
        self.api.context_devices(self.id)
    }
}

impl Drop for Context<'_> {
    fn drop(&mut self) {
        log::debug!("releasing context {:#x}", self.id.0);
        self.api.release_context(self.id);
    }
}

/// Why a link step produced no usable program.
pub enum LinkFailure<'a> {
    /// The linker rejected the inputs; the program carries the link log.
    Rejected { program: Program<'a>, code: i32 },
    /// No program object came back at all.
    NoProgram { code: i32 },
}

/// An OpenCL program object.
pub struct Program<'a> {
    api: &'a dyn ClApi,
    id: ProgramId,
}

impl<'a> Program<'a> {
    pub fn with_source(context: &Context<'a>, source: &[u8]) -> Result<Self> {
        let api = context.api();
        let id = api.create_program_with_source(context.id(), source)?;
        Ok(Self { api, id })
    }

    pub fn with_binary(context: &Context<'a>, devices: &[DeviceId], binary: &[u8]) -> Result<Self> {
        let api = context.api();
        let id = api.create_program_with_binary(context.id(), devices, binary)?;
        Ok(Self { api, id })
    }

    /// Link `inputs` into a new program. The inputs stay owned by the caller.
    pub fn link(
        context: &Context<'a>,
        devices: &[DeviceId],
        options: &str,
        inputs: &[&Program<'a>],
    ) -> Result<std::result::Result<Self, LinkFailure<'a>>> {
        let api = context.api();
        let ids: Vec<ProgramId> = inputs.iter().map(|p| p.id).collect();
        Ok(match api.link_program(context.id(), devices, options, &ids)? {
            LinkOutcome::Linked(id) => Ok(Self { api, id }),
            LinkOutcome::Failed { program, code } => Err(LinkFailure::Rejected {
                program: Self { api, id: program },
                code,
            }),
            LinkOutcome::NoProgram { code } => Err(LinkFailure::NoProgram { code }),
        })
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn build(&self, devices: &[DeviceId], options: &str) -> Result<()> {
        self.api.build_program(self.id, devices, options)
    }

    /// Compile with `headers` embedded under their include names.
    pub fn compile(
        &self,
        devices: &[DeviceId],
        options: &str,
        headers: &[(&Program<'a>, &str)],
    ) -> Result<()> {
        let headers: Vec<(ProgramId, &str)> = headers.iter().map(|(p, n)| (p.id, *n)).collect();
        self.api.compile_program(self.id, devices, options, &headers)
    }

    pub fn build_log(&self, device: DeviceId) -> Result<String> {
        self.api.program_build_log(self.id, device)
    }

    pub fn binary_sizes(&self, n_devices: usize) -> Result<Vec<usize>> {
        self.api.program_binary_sizes(self.id, n_devices)
    }

    pub fn binaries(&self, sizes: &[usize]) -> Result<Vec<Vec<u8>>> {
        self.api.program_binaries(self.id, sizes)
    }

    pub fn kernels(&self) -> Result<Vec<Kernel<'a>>> {
        let api = self.api;
        Ok(api
            .create_kernels(self.id)?
            .into_iter()
            .map(|id| Kernel { api, id })
            .collect())
    }
}

impl Drop for Program<'_> {
    fn drop(&mut self) {
        self.api.release_program(self.id);
    }
}

/// A kernel object created from a program.
pub struct Kernel<'a> {
    api: &'a dyn ClApi,
    id: KernelId,
}

impl Kernel<'_> {
    pub fn name(&self) -> Result<String> {
        self.api.kernel_info(self.id, KernelInfo::FunctionName)
    }

    pub fn attributes(&self) -> Result<String> {
        self.api.kernel_info(self.id, KernelInfo::Attributes)
    }

    pub fn num_args(&self) -> Result<u32> {
        self.api.kernel_num_args(self.id)
    }

    pub fn arg_info(&self, index: u32) -> Result<Option<KernelArgInfo>> {
        self.api.kernel_arg_info(self.id, index)
    }
}

impl Drop for Kernel<'_> {
    fn drop(&mut self) {
        self.api.release_kernel(self.id);
    }
}

#[cfg(all(test, feature = "fake"))]
mod tests {
    use super::*;
    use crate::fake::{FakeDevice, FakePlatform, FakeRuntime};

    fn runtime() -> FakeRuntime {
        FakeRuntime::new(vec![FakePlatform::new(
            "Fake",
            "OpenCL 1.2 fake",
            vec![FakeDevice::new("GPU 0"), FakeDevice::new("GPU 1")],
        )])
    }

    #[test]
    fn guards_release_on_drop() {
        let rt = runtime();
        let platform = rt.platform_ids().unwrap()[0];
        let props = ContextProperties {
            platform,
            offline_devices: false,
        };
        {
            let ctx = Context::from_type(&rt, props).unwrap();
            let devices = ctx.devices().unwrap();
            assert_eq!(devices.len(), 2);
            let _program = Program::with_source(&ctx, b"__kernel void k() {}").unwrap();
            assert_eq!(rt.live_programs(), 1);
            assert_eq!(rt.live_contexts(), 1);
        }
        assert_eq!(rt.live_programs(), 0);
        assert_eq!(rt.live_contexts(), 0);
    }

    #[test]
    fn kernels_need_an_executable() {
        let rt = runtime();
        let platform = rt.platform_ids().unwrap()[0];
        let props = ContextProperties {
            platform,
            offline_devices: false,
        };
        let ctx = Context::from_type(&rt, props).unwrap();
        let devices = ctx.devices().unwrap();
        let object = Program::with_source(&ctx, b"__kernel void k() {}").unwrap();
        object.compile(&devices, "", &[]).unwrap();
        assert!(matches!(
            object.kernels(),
            Err(crate::error::ClError::Api { code: -45, .. })
        ));

        let library = match Program::link(&ctx, &devices, "-create-library", &[&object]).unwrap() {
            Ok(program) => program,
            Err(_) => panic!("library link failed"),
        };
        assert!(library.kernels().is_err());

        let executable = match Program::link(&ctx, &devices, "", &[&library]).unwrap() {
            Ok(program) => program,
            Err(_) => panic!("executable link failed"),
        };
        assert!(executable.kernels().is_ok());
    }

    #[test]
    fn rejected_link_keeps_program_for_log() {
        let rt = runtime().with_link_failure("undefined symbol helper");
        let platform = rt.platform_ids().unwrap()[0];
        let props = ContextProperties {
            platform,
            offline_devices: false,
        };
        let ctx = Context::from_type(&rt, props).unwrap();
        let devices = ctx.devices().unwrap();
        let object = Program::with_source(&ctx, b"void helper();").unwrap();
        object.compile(&devices, "", &[]).unwrap();

        match Program::link(&ctx, &devices, "", &[&object]).unwrap() {
            Err(LinkFailure::Rejected { program, code }) => {
                assert_eq!(code, -17);
                assert_eq!(
                    program.build_log(devices[0]).unwrap(),
                    "undefined symbol helper"
                );
            }
            _ => panic!("expected a rejected link"),
        }
        drop(object);
        assert_eq!(rt.live_programs(), 0);
    }
}
