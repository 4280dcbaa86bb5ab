//! In-memory OpenCL runtime for tests.
//!
//! Platforms and devices are declared up front; programs, contexts and
//! kernels are tracked so tests can check call order and that every handle
//! was released. Binaries are deterministic per device (see
//! [`FakeRuntime::binary_for`]).

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use crate::api::{
    ClApi, ContextId, ContextProperties, DeviceId, DeviceInfo, KernelArgInfo, KernelId,
    KernelInfo, LinkOutcome, PlatformId, PlatformInfo, ProgramId,
};
use crate::capability::EXTENDED_ENTRY_POINTS;
use crate::error::{ClError, Result};

const CORE_ENTRY_POINTS: [&str; 8] = [
    "clGetPlatformIDs",
    "clGetPlatformInfo",
    "clCreateContext",
    "clCreateContextFromType",
    "clBuildProgram",
    "clGetProgramInfo",
    "clGetProgramBuildInfo",
    "clCreateKernelsInProgram",
];

/// A device exposed by a [`FakePlatform`].
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub name: String,
    pub vendor: String,
}

impl FakeDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vendor: "Fake Vendor".into(),
        }
    }
}

/// A platform with its devices.
#[derive(Debug, Clone)]
pub struct FakePlatform {
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub extensions: String,
    pub devices: Vec<FakeDevice>,
}

impl FakePlatform {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        devices: Vec<FakeDevice>,
    ) -> Self {
        Self {
            name: name.into(),
            vendor: "Fake Vendor".into(),
            version: version.into(),
            extensions: "cl_khr_icd".into(),
            devices,
        }
    }

    pub fn with_extensions(mut self, extensions: impl Into<String>) -> Self {
        self.extensions = extensions.into();
        self
    }
}

/// A kernel reported for every program.
#[derive(Debug, Clone)]
pub struct FakeKernel {
    pub name: String,
    pub attributes: String,
    pub num_args: u32,
    /// `None` simulates `CL_KERNEL_ARG_INFO_NOT_AVAILABLE`.
    pub args: Option<Vec<KernelArgInfo>>,
}

/// A recorded runtime call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    CreateContextFromType {
        platform: PlatformId,
        offline_devices: bool,
    },
    CreateContext {
        devices: Vec<DeviceId>,
        offline_devices: bool,
    },
    ReleaseContext(ContextId),
    CreateProgramWithSource(ProgramId),
    CreateProgramWithBinary {
        program: ProgramId,
        devices: Vec<DeviceId>,
    },
    Build {
        program: ProgramId,
        devices: Vec<DeviceId>,
        options: String,
    },
    Compile {
        program: ProgramId,
        options: String,
        headers: Vec<String>,
    },
    Link {
        inputs: Vec<ProgramId>,
        options: String,
    },
    BuildLog {
        program: ProgramId,
        device: DeviceId,
    },
    ReleaseProgram(ProgramId),
}

#[derive(Debug, Clone)]
enum LinkMode {
    Succeed,
    Reject(String),
    NoProgram,
}

#[derive(Debug, Clone)]
enum Origin {
    Source(String),
    Binary(Vec<u8>),
    Linked,
}

#[derive(Debug)]
struct ProgramState {
    origin: Origin,
    devices: Vec<DeviceId>,
    log: String,
    /// Set by a successful build or link; kernels exist only then.
    executable: bool,
    live: bool,
}

#[derive(Debug, Default)]
struct State {
    next_handle: usize,
    calls: Vec<FakeCall>,
    contexts: HashMap<ContextId, (Vec<DeviceId>, bool)>,
    programs: HashMap<ProgramId, ProgramState>,
    kernels: HashMap<KernelId, usize>,
}

impl State {
    fn handle(&mut self) -> usize {
        self.next_handle += 1;
        0x1_0000 + self.next_handle
    }
}

/// Scriptable stand-in for a vendor runtime.
pub struct FakeRuntime {
    platforms: Vec<FakePlatform>,
    symbols: BTreeSet<String>,
    kernels: Vec<FakeKernel>,
    build_failure: Option<String>,
    compile_failure: Option<(String, String)>,
    link_mode: LinkMode,
    empty_binary_device: Option<usize>,
    short_binary_sizes: bool,
    state: RefCell<State>,
}

impl FakeRuntime {
    /// A runtime exporting every OpenCL 1.2 entry point.
    pub fn new(platforms: Vec<FakePlatform>) -> Self {
        let symbols = CORE_ENTRY_POINTS
            .iter()
            .chain(EXTENDED_ENTRY_POINTS.iter())
            .map(|s| s.to_string())
            .collect();
        Self {
            platforms,
            symbols,
            kernels: Vec::new(),
            build_failure: None,
            compile_failure: None,
            link_mode: LinkMode::Succeed,
            empty_binary_device: None,
            short_binary_sizes: false,
            state: RefCell::new(State::default()),
        }
    }

    /// Single platform with the given device names.
    pub fn single_platform(version: &str, device_names: &[&str]) -> Self {
        Self::new(vec![FakePlatform::new(
            "Fake Platform",
            version,
            device_names.iter().map(|n| FakeDevice::new(*n)).collect(),
        )])
    }

    pub fn without_symbol(mut self, name: &str) -> Self {
        self.symbols.remove(name);
        self
    }

    /// Drop the OpenCL 1.2 compile/link/introspection entry points.
    pub fn basic(mut self) -> Self {
        for name in EXTENDED_ENTRY_POINTS {
            self.symbols.remove(name);
        }
        self
    }

    pub fn with_kernels(mut self, kernels: Vec<FakeKernel>) -> Self {
        self.kernels = kernels;
        self
    }

    /// `clBuildProgram` fails and every device reports `log`.
    pub fn with_build_failure(mut self, log: impl Into<String>) -> Self {
        self.build_failure = Some(log.into());
        self
    }

    /// `clCompileProgram` fails for sources containing `marker`.
    pub fn with_compile_failure(
        mut self,
        marker: impl Into<String>,
        log: impl Into<String>,
    ) -> Self {
        self.compile_failure = Some((marker.into(), log.into()));
        self
    }

    /// `clLinkProgram` returns a program carrying `log` and `CL_LINK_PROGRAM_FAILURE`.
    pub fn with_link_failure(mut self, log: impl Into<String>) -> Self {
        self.link_mode = LinkMode::Reject(log.into());
        self
    }

    /// `clLinkProgram` returns a null program.
    pub fn with_link_no_program(mut self) -> Self {
        self.link_mode = LinkMode::NoProgram;
        self
    }

    /// The device at `position` of every program gets an empty binary.
    pub fn with_empty_binary(mut self, position: usize) -> Self {
        self.empty_binary_device = Some(position);
        self
    }

    /// `CL_PROGRAM_BINARY_SIZES` writes one entry too few.
    pub fn with_short_binary_sizes(mut self) -> Self {
        self.short_binary_sizes = true;
        self
    }

    /// Binary the fake produces for a device.
    pub fn binary_for(device_name: &str) -> Vec<u8> {
        format!("FAKEBIN:{device_name}").into_bytes()
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.state.borrow().calls.clone()
    }

    /// Inputs of every `clLinkProgram` call, in call order.
    pub fn link_inputs(&self) -> Vec<Vec<ProgramId>> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                FakeCall::Link { inputs, .. } => Some(inputs.clone()),
                _ => None,
            })
            .collect()
    }

    /// Source text a program was created from.
    pub fn program_source(&self, program: ProgramId) -> Option<String> {
        match &self.state.borrow().programs.get(&program)?.origin {
            Origin::Source(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// Binary a program was created from.
    pub fn program_binary(&self, program: ProgramId) -> Option<Vec<u8>> {
        match &self.state.borrow().programs.get(&program)?.origin {
            Origin::Binary(bytes) => Some(bytes.clone()),
            _ => None,
        }
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.values().filter(|p| p.live).count()
    }

    pub fn live_contexts(&self) -> usize {
        self.state.borrow().contexts.values().filter(|(_, live)| *live).count()
    }

    pub fn live_kernels(&self) -> usize {
        self.state.borrow().kernels.len()
    }

    fn device(&self, id: DeviceId) -> Option<&FakeDevice> {
        let platform = (id.0 / 0x100).checked_sub(1)?;
        let device = (id.0 % 0x100).checked_sub(1)?;
        self.platforms.get(platform)?.devices.get(device)
    }

    fn platform(&self, id: PlatformId) -> Result<&FakePlatform> {
        id.0.checked_sub(1)
            .and_then(|i| self.platforms.get(i))
            .ok_or(ClError::Api {
                op: "clGetPlatformInfo",
                code: -32,
            })
    }

    fn platform_devices(&self, id: PlatformId) -> Vec<DeviceId> {
        let count = id
            .0
            .checked_sub(1)
            .and_then(|i| self.platforms.get(i))
            .map_or(0, |p| p.devices.len());
        (0..count).map(|d| DeviceId(id.0 * 0x100 + d + 1)).collect()
    }

    fn new_program(&self, origin: Origin, devices: Vec<DeviceId>) -> ProgramId {
        let mut state = self.state.borrow_mut();
        let id = ProgramId(state.handle());
        state.programs.insert(
            id,
            ProgramState {
                origin,
                devices,
                log: String::new(),
                executable: false,
                live: true,
            },
        );
        id
    }

    fn live_context_devices(&self, context: ContextId, op: &'static str) -> Result<Vec<DeviceId>> {
        match self.state.borrow().contexts.get(&context) {
            Some((devices, true)) => Ok(devices.clone()),
            _ => Err(ClError::Api { op, code: -34 }),
        }
    }

    fn with_program<T>(
        &self,
        program: ProgramId,
        op: &'static str,
        f: impl FnOnce(&mut ProgramState) -> T,
    ) -> Result<T> {
        let mut state = self.state.borrow_mut();
        match state.programs.get_mut(&program) {
            Some(p) if p.live => Ok(f(p)),
            _ => Err(ClError::Api { op, code: -44 }),
        }
    }

    fn binary_sizes_of(&self, program: ProgramId) -> Result<Vec<usize>> {
        let devices = self.with_program(program, "clGetProgramInfo", |p| p.devices.clone())?;
        Ok(devices
            .iter()
            .enumerate()
            .map(|(i, d)| {
                if self.empty_binary_device == Some(i) {
                    0
                } else {
                    let name = self.device(*d).map_or("", |dev| dev.name.as_str());
                    Self::binary_for(name).len()
                }
            })
            .collect())
    }
}

impl ClApi for FakeRuntime {
    fn has_symbol(&self, name: &str) -> bool {
        self.symbols.contains(name)
    }

    fn platform_ids(&self) -> Result<Vec<PlatformId>> {
        Ok((1..=self.platforms.len()).map(PlatformId).collect())
    }

    fn platform_info(&self, platform: PlatformId, param: PlatformInfo) -> Result<String> {
        let p = self.platform(platform)?;
        Ok(match param {
            PlatformInfo::Version => p.version.clone(),
            PlatformInfo::Name => p.name.clone(),
            PlatformInfo::Vendor => p.vendor.clone(),
            PlatformInfo::Extensions => p.extensions.clone(),
        })
    }

    fn create_context_from_type(&self, props: &ContextProperties) -> Result<ContextId> {
        self.platform(props.platform).map_err(|_| ClError::Api {
            op: "clCreateContextFromType",
            code: -32,
        })?;
        let devices = self.platform_devices(props.platform);
        let mut state = self.state.borrow_mut();
        let id = ContextId(state.handle());
        state.calls.push(FakeCall::CreateContextFromType {
            platform: props.platform,
            offline_devices: props.offline_devices,
        });
        state.contexts.insert(id, (devices, true));
        Ok(id)
    }

    fn create_context(&self, props: &ContextProperties, devices: &[DeviceId]) -> Result<ContextId> {
        let owned = self.platform_devices(props.platform);
        if devices.is_empty() || devices.iter().any(|d| !owned.contains(d)) {
            return Err(ClError::Api {
                op: "clCreateContext",
                code: -33,
            });
        }
        let mut state = self.state.borrow_mut();
        let id = ContextId(state.handle());
        state.calls.push(FakeCall::CreateContext {
            devices: devices.to_vec(),
            offline_devices: props.offline_devices,
        });
        state.contexts.insert(id, (devices.to_vec(), true));
        Ok(id)
    }

    fn context_devices(&self, context: ContextId) -> Result<Vec<DeviceId>> {
        self.live_context_devices(context, "clGetContextInfo")
    }

    fn release_context(&self, context: ContextId) {
        let mut state = self.state.borrow_mut();
        state.calls.push(FakeCall::ReleaseContext(context));
        if let Some((_, live)) = state.contexts.get_mut(&context) {
            assert!(*live, "context {context:?} released twice");
            *live = false;
        }
    }

    fn device_info(&self, device: DeviceId, param: DeviceInfo) -> Result<String> {
        let dev = self.device(device).ok_or(ClError::Api {
            op: "clGetDeviceInfo",
            code: -33,
        })?;
        Ok(match param {
            DeviceInfo::Name => dev.name.clone(),
            DeviceInfo::Vendor => dev.vendor.clone(),
            DeviceInfo::Version => "OpenCL 1.2 fake".into(),
        })
    }

    fn create_program_with_source(&self, context: ContextId, source: &[u8]) -> Result<ProgramId> {
        let devices = self.live_context_devices(context, "clCreateProgramWithSource")?;
        let text = String::from_utf8_lossy(source).into_owned();
        let id = self.new_program(Origin::Source(text), devices);
        self.state
            .borrow_mut()
            .calls
            .push(FakeCall::CreateProgramWithSource(id));
        Ok(id)
    }

    fn create_program_with_binary(
        &self,
        context: ContextId,
        devices: &[DeviceId],
        binary: &[u8],
    ) -> Result<ProgramId> {
        let owned = self.live_context_devices(context, "clCreateProgramWithBinary")?;
        if devices.is_empty() || devices.iter().any(|d| !owned.contains(d)) {
            return Err(ClError::Api {
                op: "clCreateProgramWithBinary",
                code: -33,
            });
        }
        if binary.is_empty() {
            return Err(ClError::Api {
                op: "clCreateProgramWithBinary",
                code: -42,
            });
        }
        let id = self.new_program(Origin::Binary(binary.to_vec()), devices.to_vec());
        self.state
            .borrow_mut()
            .calls
            .push(FakeCall::CreateProgramWithBinary {
                program: id,
                devices: devices.to_vec(),
            });
        Ok(id)
    }

    fn build_program(&self, program: ProgramId, devices: &[DeviceId], options: &str) -> Result<()> {
        let failure = self.build_failure.clone();
        self.with_program(program, "clBuildProgram", |p| {
            p.log = failure.clone().unwrap_or_default();
            p.executable = failure.is_none();
        })?;
        self.state.borrow_mut().calls.push(FakeCall::Build {
            program,
            devices: devices.to_vec(),
            options: options.to_string(),
        });
        match failure {
            Some(_) => Err(ClError::Api {
                op: "clBuildProgram",
                code: -11,
            }),
            None => Ok(()),
        }
    }

    fn compile_program(
        &self,
        program: ProgramId,
        _devices: &[DeviceId],
        options: &str,
        headers: &[(ProgramId, &str)],
    ) -> Result<()> {
        let failure = self.compile_failure.clone();
        let failed = self.with_program(program, "clCompileProgram", |p| {
            let failed = match (&p.origin, &failure) {
                (Origin::Source(text), Some((marker, _))) => text.contains(marker.as_str()),
                _ => false,
            };
            p.log = match (&failure, failed) {
                (Some((_, log)), true) => log.clone(),
                _ => String::new(),
            };
            failed
        })?;
        self.state.borrow_mut().calls.push(FakeCall::Compile {
            program,
            options: options.to_string(),
            headers: headers.iter().map(|(_, n)| n.to_string()).collect(),
        });
        if failed {
            Err(ClError::Api {
                op: "clCompileProgram",
                code: -15,
            })
        } else {
            Ok(())
        }
    }

    fn link_program(
        &self,
        context: ContextId,
        devices: &[DeviceId],
        options: &str,
        inputs: &[ProgramId],
    ) -> Result<LinkOutcome> {
        self.live_context_devices(context, "clLinkProgram")?;
        for input in inputs {
            self.with_program(*input, "clLinkProgram", |_| ())?;
        }
        self.state.borrow_mut().calls.push(FakeCall::Link {
            inputs: inputs.to_vec(),
            options: options.to_string(),
        });
        Ok(match &self.link_mode {
            LinkMode::Succeed => {
                let program = self.new_program(Origin::Linked, devices.to_vec());
                let library = options.split_whitespace().any(|o| o == "-create-library");
                self.with_program(program, "clLinkProgram", |p| p.executable = !library)?;
                LinkOutcome::Linked(program)
            }
            LinkMode::Reject(log) => {
                let program = self.new_program(Origin::Linked, devices.to_vec());
                self.with_program(program, "clLinkProgram", |p| p.log = log.clone())?;
                LinkOutcome::Failed { program, code: -17 }
            }
            LinkMode::NoProgram => LinkOutcome::NoProgram { code: -17 },
        })
    }

    fn program_build_log(&self, program: ProgramId, device: DeviceId) -> Result<String> {
        let log = self.with_program(program, "clGetProgramBuildInfo", |p| p.log.clone())?;
        self.state
            .borrow_mut()
            .calls
            .push(FakeCall::BuildLog { program, device });
        Ok(log)
    }

    fn program_binary_sizes(&self, program: ProgramId, n_devices: usize) -> Result<Vec<usize>> {
        let sizes = self.binary_sizes_of(program)?;
        let word = std::mem::size_of::<usize>();
        let actual = if self.short_binary_sizes {
            word * sizes.len().saturating_sub(1)
        } else {
            word * sizes.len()
        };
        if actual != word * n_devices {
            return Err(ClError::SizeMismatch {
                op: "clGetProgramInfo(CL_PROGRAM_BINARY_SIZES)",
                expected: word * n_devices,
                actual,
            });
        }
        Ok(sizes)
    }

    fn program_binaries(&self, program: ProgramId, sizes: &[usize]) -> Result<Vec<Vec<u8>>> {
        let devices = self.with_program(program, "clGetProgramInfo", |p| p.devices.clone())?;
        if devices.len() != sizes.len() {
            let word = std::mem::size_of::<*mut u8>();
            return Err(ClError::SizeMismatch {
                op: "clGetProgramInfo(CL_PROGRAM_BINARIES)",
                expected: word * sizes.len(),
                actual: word * devices.len(),
            });
        }
        Ok(devices
            .iter()
            .zip(sizes)
            .map(|(d, &size)| {
                let name = self.device(*d).map_or("", |dev| dev.name.as_str());
                let mut bytes = Self::binary_for(name);
                bytes.truncate(size);
                bytes
            })
            .collect())
    }

    fn release_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.calls.push(FakeCall::ReleaseProgram(program));
        if let Some(p) = state.programs.get_mut(&program) {
            assert!(p.live, "program {program:?} released twice");
            p.live = false;
        }
    }

    fn create_kernels(&self, program: ProgramId) -> Result<Vec<KernelId>> {
        let executable =
            self.with_program(program, "clCreateKernelsInProgram", |p| p.executable)?;
        if !executable {
            return Err(ClError::Api {
                op: "clCreateKernelsInProgram",
                code: -45,
            });
        }
        let mut state = self.state.borrow_mut();
        let mut ids = Vec::with_capacity(self.kernels.len());
        for index in 0..self.kernels.len() {
            let id = KernelId(state.handle());
            state.kernels.insert(id, index);
            ids.push(id);
        }
        Ok(ids)
    }

    fn kernel_info(&self, kernel: KernelId, param: KernelInfo) -> Result<String> {
        let k = self.kernel(kernel)?;
        Ok(match param {
            KernelInfo::FunctionName => k.name.clone(),
            KernelInfo::Attributes => k.attributes.clone(),
        })
    }

    fn kernel_num_args(&self, kernel: KernelId) -> Result<u32> {
        Ok(self.kernel(kernel)?.num_args)
    }

    fn kernel_arg_info(&self, kernel: KernelId, index: u32) -> Result<Option<KernelArgInfo>> {
        let k = self.kernel(kernel)?;
        match &k.args {
            None => Ok(None),
            Some(args) => args
                .get(index as usize)
                .cloned()
                .map(Some)
                .ok_or(ClError::Api {
                    op: "clGetKernelArgInfo",
                    code: -49,
                }),
        }
    }

    fn release_kernel(&self, kernel: KernelId) {
        let removed = self.state.borrow_mut().kernels.remove(&kernel);
        assert!(removed.is_some(), "kernel {kernel:?} released twice");
    }
}

impl FakeRuntime {
    fn kernel(&self, kernel: KernelId) -> Result<&FakeKernel> {
        let index = self
            .state
            .borrow()
            .kernels
            .get(&kernel)
            .copied()
            .ok_or(ClError::Api {
                op: "clGetKernelInfo",
                code: -48,
            })?;
        Ok(&self.kernels[index])
    }
}
