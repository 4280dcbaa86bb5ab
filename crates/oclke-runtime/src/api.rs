//! The runtime seam: every OpenCL call the build driver makes goes through
//! [`ClApi`].
//!
//! Handles are plain opaque integers so that the trait can be implemented by
//! both the dynamically loaded runtime and the in-memory fake. Ownership of
//! handles is expressed one level up, by the guards in [`crate::guard`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ffi;

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub usize);
    };
}

opaque_handle!(
    /// A `cl_platform_id`.
    PlatformId
);
opaque_handle!(
    /// A `cl_device_id`.
    DeviceId
);
opaque_handle!(
    /// A `cl_context`.
    ContextId
);
opaque_handle!(
    /// A `cl_program`.
    ProgramId
);
opaque_handle!(
    /// A `cl_kernel`.
    KernelId
);

/// String-valued platform queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformInfo {
    Version,
    Name,
    Vendor,
    Extensions,
}

impl PlatformInfo {
    pub(crate) fn raw(self) -> ffi::cl_uint {
        match self {
            PlatformInfo::Version => ffi::CL_PLATFORM_VERSION,
            PlatformInfo::Name => ffi::CL_PLATFORM_NAME,
            PlatformInfo::Vendor => ffi::CL_PLATFORM_VENDOR,
            PlatformInfo::Extensions => ffi::CL_PLATFORM_EXTENSIONS,
        }
    }
}

/// String-valued device queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceInfo {
    Name,
    Vendor,
    Version,
}

impl DeviceInfo {
    pub(crate) fn raw(self) -> ffi::cl_uint {
        match self {
            DeviceInfo::Name => ffi::CL_DEVICE_NAME,
            DeviceInfo::Vendor => ffi::CL_DEVICE_VENDOR,
            DeviceInfo::Version => ffi::CL_DEVICE_VERSION,
        }
    }
}

/// String-valued kernel queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelInfo {
    FunctionName,
    Attributes,
}

impl KernelInfo {
    pub(crate) fn raw(self) -> ffi::cl_uint {
        match self {
            KernelInfo::FunctionName => ffi::CL_KERNEL_FUNCTION_NAME,
            KernelInfo::Attributes => ffi::CL_KERNEL_ATTRIBUTES,
        }
    }
}

/// Properties shared by the broad and the narrow context of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextProperties {
    /// Platform the context is created on.
    pub platform: PlatformId,
    /// Request `CL_CONTEXT_OFFLINE_DEVICES_AMD`.
    pub offline_devices: bool,
}

impl ContextProperties {
    /// Zero-terminated `cl_context_properties` list.
    pub(crate) fn to_raw(self) -> Vec<ffi::cl_context_properties> {
        let mut props = vec![ffi::CL_CONTEXT_PLATFORM, self.platform.0 as ffi::cl_context_properties];
        if self.offline_devices {
            props.push(ffi::CL_CONTEXT_OFFLINE_DEVICES_AMD);
            props.push(1);
        }
        props.push(0);
        props
    }
}

/// Address space of a kernel parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressQualifier {
    Global,
    Local,
    Constant,
    Private,
}

impl AddressQualifier {
    /// Decode a `cl_kernel_arg_address_qualifier`.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            ffi::CL_KERNEL_ARG_ADDRESS_GLOBAL => Some(Self::Global),
            ffi::CL_KERNEL_ARG_ADDRESS_LOCAL => Some(Self::Local),
            ffi::CL_KERNEL_ARG_ADDRESS_CONSTANT => Some(Self::Constant),
            ffi::CL_KERNEL_ARG_ADDRESS_PRIVATE => Some(Self::Private),
            _ => None,
        }
    }

    /// Kernel-language keyword; private parameters carry none.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Global => Some("__global"),
            Self::Local => Some("__local"),
            Self::Constant => Some("__constant"),
            Self::Private => None,
        }
    }
}

/// Image access qualifier of a kernel parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessQualifier {
    ReadOnly,
    WriteOnly,
    ReadWrite,
    None,
}

impl AccessQualifier {
    /// Decode a `cl_kernel_arg_access_qualifier`.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            ffi::CL_KERNEL_ARG_ACCESS_READ_ONLY => Some(Self::ReadOnly),
            ffi::CL_KERNEL_ARG_ACCESS_WRITE_ONLY => Some(Self::WriteOnly),
            ffi::CL_KERNEL_ARG_ACCESS_READ_WRITE => Some(Self::ReadWrite),
            ffi::CL_KERNEL_ARG_ACCESS_NONE => Some(Self::None),
            _ => None,
        }
    }

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::ReadOnly => Some("__read_only"),
            Self::WriteOnly => Some("__write_only"),
            Self::ReadWrite => Some("__read_write"),
            Self::None => None,
        }
    }
}

/// `cl_kernel_arg_type_qualifier` bitfield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeQualifiers(pub u64);

impl TypeQualifiers {
    pub const CONST: Self = Self(ffi::CL_KERNEL_ARG_TYPE_CONST);
    pub const RESTRICT: Self = Self(ffi::CL_KERNEL_ARG_TYPE_RESTRICT);
    pub const VOLATILE: Self = Self(ffi::CL_KERNEL_ARG_TYPE_VOLATILE);
    pub const PIPE: Self = Self(ffi::CL_KERNEL_ARG_TYPE_PIPE);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Keywords in declaration order.
    pub fn keywords(self) -> Vec<&'static str> {
        [
            (Self::CONST, "const"),
            (Self::VOLATILE, "volatile"),
            (Self::PIPE, "pipe"),
        ]
        .into_iter()
        .filter(|(q, _)| self.contains(*q))
        .map(|(_, kw)| kw)
        .collect()
    }
}

impl std::ops::BitOr for TypeQualifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Metadata of one kernel parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelArgInfo {
    pub address: AddressQualifier,
    pub access: AccessQualifier,
    pub type_qualifiers: TypeQualifiers,
    /// Type name as reported, e.g. `float*` or `image2d_t`.
    pub type_name: String,
    pub name: String,
}

impl fmt::Display for KernelArgInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<&str> = Vec::new();
        words.extend(self.address.keyword());
        words.extend(self.access.keyword());
        words.extend(self.type_qualifiers.keywords());
        words.push(&self.type_name);
        if self.type_qualifiers.contains(TypeQualifiers::RESTRICT) {
            words.push("restrict");
        }
        words.push(&self.name);
        write!(f, "{}", words.join(" "))
    }
}

/// Result of `clLinkProgram`, which reports failure in two different ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Link succeeded.
    Linked(ProgramId),
    /// Link failed but a program object exists and carries a link log.
    Failed { program: ProgramId, code: i32 },
    /// No program object was returned at all.
    NoProgram { code: i32 },
}

/// Every OpenCL operation the build driver uses.
///
/// Calls are blocking. Implementations translate status codes into
/// [`ClError`](crate::ClError) values and never panic on runtime failures.
pub trait ClApi {
    /// Whether the runtime library exports `name`.
    fn has_symbol(&self, name: &str) -> bool;

    fn platform_ids(&self) -> Result<Vec<PlatformId>>;
    fn platform_info(&self, platform: PlatformId, param: PlatformInfo) -> Result<String>;

    /// `clCreateContextFromType` over every device type.
    fn create_context_from_type(&self, props: &ContextProperties) -> Result<ContextId>;
    /// `clCreateContext` bound to exactly `devices`.
    fn create_context(&self, props: &ContextProperties, devices: &[DeviceId]) -> Result<ContextId>;
    fn context_devices(&self, context: ContextId) -> Result<Vec<DeviceId>>;
    fn release_context(&self, context: ContextId);

    fn device_info(&self, device: DeviceId, param: DeviceInfo) -> Result<String>;

    fn create_program_with_source(&self, context: ContextId, source: &[u8]) -> Result<ProgramId>;
    /// `clCreateProgramWithBinary` with the same blob for every device.
    fn create_program_with_binary(
        &self,
        context: ContextId,
        devices: &[DeviceId],
        binary: &[u8],
    ) -> Result<ProgramId>;
    fn build_program(&self, program: ProgramId, devices: &[DeviceId], options: &str) -> Result<()>;
    /// `clCompileProgram`; `headers` pairs an embedded header program with its include name.
    fn compile_program(
        &self,
        program: ProgramId,
        devices: &[DeviceId],
        options: &str,
        headers: &[(ProgramId, &str)],
    ) -> Result<()>;
    fn link_program(
        &self,
        context: ContextId,
        devices: &[DeviceId],
        options: &str,
        inputs: &[ProgramId],
    ) -> Result<LinkOutcome>;
    fn program_build_log(&self, program: ProgramId, device: DeviceId) -> Result<String>;
    /// `CL_PROGRAM_BINARY_SIZES`, read in one call sized for `n_devices`.
    fn program_binary_sizes(&self, program: ProgramId, n_devices: usize) -> Result<Vec<usize>>;
    /// `CL_PROGRAM_BINARIES`, one buffer per entry of `sizes`.
    fn program_binaries(&self, program: ProgramId, sizes: &[usize]) -> Result<Vec<Vec<u8>>>;
    fn release_program(&self, program: ProgramId);

    fn create_kernels(&self, program: ProgramId) -> Result<Vec<KernelId>>;
    fn kernel_info(&self, kernel: KernelId, param: KernelInfo) -> Result<String>;
    fn kernel_num_args(&self, kernel: KernelId) -> Result<u32>;
    /// `None` when the runtime reports `CL_KERNEL_ARG_INFO_NOT_AVAILABLE`.
    fn kernel_arg_info(&self, kernel: KernelId, index: u32) -> Result<Option<KernelArgInfo>>;
    fn release_kernel(&self, kernel: KernelId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_properties_layout() {
        let props = ContextProperties {
            platform: PlatformId(0x10),
            offline_devices: false,
        };
        assert_eq!(props.to_raw(), vec![0x1084, 0x10, 0]);

        let props = ContextProperties {
            offline_devices: true,
            ..props
        };
        assert_eq!(props.to_raw(), vec![0x1084, 0x10, 0x403F, 1, 0]);
    }

    #[test]
    fn qualifier_decoding() {
        assert_eq!(AddressQualifier::from_raw(0x119B), Some(AddressQualifier::Global));
        assert_eq!(AddressQualifier::from_raw(0x1234), None);
        assert_eq!(AccessQualifier::from_raw(0x11A3), Some(AccessQualifier::None));
    }

    #[test]
    fn arg_declaration() {
        let arg = KernelArgInfo {
            address: AddressQualifier::Global,
            access: AccessQualifier::None,
            type_qualifiers: TypeQualifiers::CONST | TypeQualifiers::RESTRICT,
            type_name: "float*".into(),
            name: "input".into(),
        };
        assert_eq!(arg.to_string(), "__global const float* restrict input");

        let image = KernelArgInfo {
            address: AddressQualifier::Global,
            access: AccessQualifier::ReadOnly,
            type_qualifiers: TypeQualifiers::default(),
            type_name: "image2d_t".into(),
            name: "src".into(),
        };
        assert_eq!(image.to_string(), "__global __read_only image2d_t src");

        let scalar = KernelArgInfo {
            address: AddressQualifier::Private,
            access: AccessQualifier::None,
            type_qualifiers: TypeQualifiers::default(),
            type_name: "uint".into(),
            name: "n".into(),
        };
        assert_eq!(scalar.to_string(), "uint n");
    }
}
