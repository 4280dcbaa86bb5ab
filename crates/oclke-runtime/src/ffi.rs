//! Raw OpenCL 1.2 declarations used by [`DynamicRuntime`](crate::DynamicRuntime).
//!
//! Only the entry points and constants the build driver needs are declared.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_void};

pub type cl_int = i32;
pub type cl_uint = u32;
pub type cl_bitfield = u64;
pub type cl_context_properties = isize;

pub type cl_platform_id = *mut c_void;
pub type cl_device_id = *mut c_void;
pub type cl_context = *mut c_void;
pub type cl_program = *mut c_void;
pub type cl_kernel = *mut c_void;

pub const CL_SUCCESS: cl_int = 0;
pub const CL_KERNEL_ARG_INFO_NOT_AVAILABLE: cl_int = -19;
pub const CL_INVALID_VALUE: cl_int = -30;

// cl_platform_info
pub const CL_PLATFORM_VERSION: cl_uint = 0x0901;
pub const CL_PLATFORM_NAME: cl_uint = 0x0902;
pub const CL_PLATFORM_VENDOR: cl_uint = 0x0903;
pub const CL_PLATFORM_EXTENSIONS: cl_uint = 0x0904;

// cl_device_type
pub const CL_DEVICE_TYPE_ALL: cl_bitfield = 0xFFFF_FFFF;

// cl_device_info
pub const CL_DEVICE_NAME: cl_uint = 0x102B;
pub const CL_DEVICE_VENDOR: cl_uint = 0x102C;
pub const CL_DEVICE_VERSION: cl_uint = 0x102F;

// cl_context_info / cl_context_properties
pub const CL_CONTEXT_DEVICES: cl_uint = 0x1081;
pub const CL_CONTEXT_NUM_DEVICES: cl_uint = 0x1083;
pub const CL_CONTEXT_PLATFORM: cl_context_properties = 0x1084;
pub const CL_CONTEXT_OFFLINE_DEVICES_AMD: cl_context_properties = 0x403F;

// cl_program_info / cl_program_build_info
pub const CL_PROGRAM_BINARY_SIZES: cl_uint = 0x1165;
pub const CL_PROGRAM_BINARIES: cl_uint = 0x1166;
pub const CL_PROGRAM_BUILD_LOG: cl_uint = 0x1183;

// cl_kernel_info
pub const CL_KERNEL_FUNCTION_NAME: cl_uint = 0x1190;
pub const CL_KERNEL_NUM_ARGS: cl_uint = 0x1191;
pub const CL_KERNEL_ATTRIBUTES: cl_uint = 0x1195;

// cl_kernel_arg_info
pub const CL_KERNEL_ARG_ADDRESS_QUALIFIER: cl_uint = 0x1196;
pub const CL_KERNEL_ARG_ACCESS_QUALIFIER: cl_uint = 0x1197;
pub const CL_KERNEL_ARG_TYPE_NAME: cl_uint = 0x1198;
pub const CL_KERNEL_ARG_TYPE_QUALIFIER: cl_uint = 0x1199;
pub const CL_KERNEL_ARG_NAME: cl_uint = 0x119A;

pub const CL_KERNEL_ARG_ADDRESS_GLOBAL: cl_uint = 0x119B;
pub const CL_KERNEL_ARG_ADDRESS_LOCAL: cl_uint = 0x119C;
pub const CL_KERNEL_ARG_ADDRESS_CONSTANT: cl_uint = 0x119D;
pub const CL_KERNEL_ARG_ADDRESS_PRIVATE: cl_uint = 0x119E;

pub const CL_KERNEL_ARG_ACCESS_READ_ONLY: cl_uint = 0x11A0;
pub const CL_KERNEL_ARG_ACCESS_WRITE_ONLY: cl_uint = 0x11A1;
pub const CL_KERNEL_ARG_ACCESS_READ_WRITE: cl_uint = 0x11A2;
pub const CL_KERNEL_ARG_ACCESS_NONE: cl_uint = 0x11A3;

pub const CL_KERNEL_ARG_TYPE_CONST: cl_bitfield = 1 << 0;
pub const CL_KERNEL_ARG_TYPE_RESTRICT: cl_bitfield = 1 << 1;
pub const CL_KERNEL_ARG_TYPE_VOLATILE: cl_bitfield = 1 << 2;
pub const CL_KERNEL_ARG_TYPE_PIPE: cl_bitfield = 1 << 3;

pub type ContextNotify =
    Option<unsafe extern "C" fn(*const c_char, *const c_void, usize, *mut c_void)>;
pub type ProgramNotify = Option<unsafe extern "C" fn(cl_program, *mut c_void)>;

pub type GetPlatformIDs = unsafe extern "C" fn(cl_uint, *mut cl_platform_id, *mut cl_uint) -> cl_int;
pub type GetPlatformInfo =
    unsafe extern "C" fn(cl_platform_id, cl_uint, usize, *mut c_void, *mut usize) -> cl_int;
pub type GetDeviceInfo =
    unsafe extern "C" fn(cl_device_id, cl_uint, usize, *mut c_void, *mut usize) -> cl_int;

pub type CreateContextFromType = unsafe extern "C" fn(
    *const cl_context_properties,
    cl_bitfield,
    ContextNotify,
    *mut c_void,
    *mut cl_int,
) -> cl_context;
pub type CreateContext = unsafe extern "C" fn(
    *const cl_context_properties,
    cl_uint,
    *const cl_device_id,
    ContextNotify,
    *mut c_void,
    *mut cl_int,
) -> cl_context;
pub type GetContextInfo =
    unsafe extern "C" fn(cl_context, cl_uint, usize, *mut c_void, *mut usize) -> cl_int;
pub type ReleaseContext = unsafe extern "C" fn(cl_context) -> cl_int;

pub type CreateProgramWithSource = unsafe extern "C" fn(
    cl_context,
    cl_uint,
    *const *const c_char,
    *const usize,
    *mut cl_int,
) -> cl_program;
pub type CreateProgramWithBinary = unsafe extern "C" fn(
    cl_context,
    cl_uint,
    *const cl_device_id,
    *const usize,
    *const *const u8,
    *mut cl_int,
    *mut cl_int,
) -> cl_program;
pub type BuildProgram = unsafe extern "C" fn(
    cl_program,
    cl_uint,
    *const cl_device_id,
    *const c_char,
    ProgramNotify,
    *mut c_void,
) -> cl_int;
pub type CompileProgram = unsafe extern "C" fn(
    cl_program,
    cl_uint,
    *const cl_device_id,
    *const c_char,
    cl_uint,
    *const cl_program,
    *const *const c_char,
    ProgramNotify,
    *mut c_void,
) -> cl_int;
pub type LinkProgram = unsafe extern "C" fn(
    cl_context,
    cl_uint,
    *const cl_device_id,
    *const c_char,
    cl_uint,
    *const cl_program,
    ProgramNotify,
    *mut c_void,
    *mut cl_int,
) -> cl_program;
pub type GetProgramInfo =
    unsafe extern "C" fn(cl_program, cl_uint, usize, *mut c_void, *mut usize) -> cl_int;
pub type GetProgramBuildInfo = unsafe extern "C" fn(
    cl_program,
    cl_device_id,
    cl_uint,
    usize,
    *mut c_void,
    *mut usize,
) -> cl_int;
pub type ReleaseProgram = unsafe extern "C" fn(cl_program) -> cl_int;

pub type CreateKernelsInProgram =
    unsafe extern "C" fn(cl_program, cl_uint, *mut cl_kernel, *mut cl_uint) -> cl_int;
pub type GetKernelInfo =
    unsafe extern "C" fn(cl_kernel, cl_uint, usize, *mut c_void, *mut usize) -> cl_int;
pub type GetKernelArgInfo =
    unsafe extern "C" fn(cl_kernel, cl_uint, cl_uint, usize, *mut c_void, *mut usize) -> cl_int;
pub type ReleaseKernel = unsafe extern "C" fn(cl_kernel) -> cl_int;
