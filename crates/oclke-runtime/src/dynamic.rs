//! OpenCL runtime loaded at run time through `libloading`.
//!
//! Entry points are resolved on every call rather than cached up front, so a
//! runtime without the OpenCL 1.2 compile/link API still serves every Basic
//! tier operation.

use std::ffi::{c_void, CString};
use std::mem::size_of;
use std::path::{Path, PathBuf};
use std::ptr;

use libloading::Library;

use crate::api::{
    AccessQualifier, AddressQualifier, ClApi, ContextId, ContextProperties, DeviceId, DeviceInfo,
    KernelArgInfo, KernelId, KernelInfo, LinkOutcome, PlatformId, PlatformInfo, ProgramId,
    TypeQualifiers,
};
use crate::error::{ClError, Result};
use crate::ffi::{self, cl_int};

/// Library names tried when no explicit path is configured.
pub const DEFAULT_LIBRARY_CANDIDATES: &[&str] = &[
    "libOpenCL.so.1",
    "libOpenCL.so",
    "OpenCL.dll",
    "/System/Library/Frameworks/OpenCL.framework/OpenCL",
];

/// The system OpenCL runtime (normally the ICD loader).
pub struct DynamicRuntime {
    lib: Library,
    path: PathBuf,
}

impl DynamicRuntime {
    /// Load the runtime from `path`, or from the first default candidate that loads.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidates: Vec<PathBuf> = match path {
            Some(p) => vec![p.to_path_buf()],
            None => DEFAULT_LIBRARY_CANDIDATES.iter().map(PathBuf::from).collect(),
        };

        let mut failures = Vec::new();
        for candidate in candidates {
            // SAFETY: loading the OpenCL ICD loader runs only its own initialisers.
            match unsafe { Library::new(&candidate) } {
                Ok(lib) => {
                    log::debug!("loaded OpenCL runtime from {}", candidate.display());
                    return Ok(Self {
                        lib,
                        path: candidate,
                    });
                }
                Err(e) => failures.push(format!("{}: {e}", candidate.display())),
            }
        }

        Err(ClError::Load {
            detail: failures.join("; "),
        })
    }

    /// Path the runtime was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve an entry point. `name` must be NUL-terminated.
    fn entry<T: Copy>(&self, name: &'static [u8]) -> Result<T> {
        // SAFETY: every `T` used below is the documented OpenCL 1.2 signature of `name`.
        unsafe {
            self.lib.get::<T>(name).map(|symbol| *symbol).map_err(|_| {
                ClError::MissingSymbol {
                    name: symbol_name(name),
                }
            })
        }
    }
}

fn symbol_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name)).into_owned()
}

fn check(op: &'static str, code: cl_int) -> Result<()> {
    if code == ffi::CL_SUCCESS {
        Ok(())
    } else {
        Err(ClError::Api { op, code })
    }
}

fn c_string(value: &str, what: &'static str) -> Result<CString> {
    CString::new(value).map_err(|_| ClError::InteriorNul { what })
}

/// Two-step size-then-fill query.
///
/// `query(size, value, size_ret)` is called once with a null buffer to learn
/// the size, then once more with a buffer of exactly that size.
pub(crate) fn query_sized<F>(op: &'static str, mut query: F) -> Result<Vec<u8>>
where
    F: FnMut(usize, *mut c_void, *mut usize) -> cl_int,
{
    let mut size = 0usize;
    check(op, query(0, ptr::null_mut(), &mut size))?;
    let mut buf = vec![0u8; size];
    if size > 0 {
        check(op, query(size, buf.as_mut_ptr().cast(), ptr::null_mut()))?;
    }
    Ok(buf)
}

/// [`query_sized`] decoded as a C string.
pub(crate) fn query_string<F>(op: &'static str, query: F) -> Result<String>
where
    F: FnMut(usize, *mut c_void, *mut usize) -> cl_int,
{
    let bytes = query_sized(op, query)?;
    Ok(c_bytes_to_string(&bytes))
}

fn c_bytes_to_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Fixed-size scalar query.
fn query_value<T: Copy + Default, F>(op: &'static str, mut query: F) -> Result<T>
where
    F: FnMut(usize, *mut c_void, *mut usize) -> cl_int,
{
    let mut value = T::default();
    check(
        op,
        query(
            size_of::<T>(),
            (&mut value as *mut T).cast(),
            ptr::null_mut(),
        ),
    )?;
    Ok(value)
}

fn raw_devices(devices: &[DeviceId]) -> Vec<ffi::cl_device_id> {
    devices.iter().map(|d| d.0 as ffi::cl_device_id).collect()
}

impl ClApi for DynamicRuntime {
    fn has_symbol(&self, name: &str) -> bool {
        let mut bytes = name.as_bytes().to_vec();
        bytes.push(0);
        // SAFETY: the symbol is only looked up, never called.
        unsafe { self.lib.get::<*const c_void>(&bytes).is_ok() }
    }

    fn platform_ids(&self) -> Result<Vec<PlatformId>> {
        let get: ffi::GetPlatformIDs = self.entry(b"clGetPlatformIDs\0")?;
        let mut count: ffi::cl_uint = 0;
        // SAFETY: count query with a null output array.
        let code = unsafe { get(0, ptr::null_mut(), &mut count) };
        // ICD loaders report an empty platform list as CL_PLATFORM_NOT_FOUND_KHR.
        if code == -1001 {
            return Ok(Vec::new());
        }
        check("clGetPlatformIDs", code)?;

        let mut ids: Vec<ffi::cl_platform_id> = vec![ptr::null_mut(); count as usize];
        if count > 0 {
            // SAFETY: `ids` holds exactly `count` entries.
            check("clGetPlatformIDs", unsafe {
                get(count, ids.as_mut_ptr(), ptr::null_mut())
            })?;
        }
        Ok(ids.into_iter().map(|p| PlatformId(p as usize)).collect())
    }

    fn platform_info(&self, platform: PlatformId, param: PlatformInfo) -> Result<String> {
        let get: ffi::GetPlatformInfo = self.entry(b"clGetPlatformInfo\0")?;
        let raw = platform.0 as ffi::cl_platform_id;
        query_string("clGetPlatformInfo", |size, value, size_ret| {
            // SAFETY: `value` is null or points to `size` writable bytes.
            unsafe { get(raw, param.raw(), size, value, size_ret) }
        })
    }

    fn create_context_from_type(&self, props: &ContextProperties) -> Result<ContextId> {
        let create: ffi::CreateContextFromType = self.entry(b"clCreateContextFromType\0")?;
        let raw_props = props.to_raw();
        let mut err: cl_int = 0;
        // SAFETY: `raw_props` is zero-terminated and outlives the call.
        let context = unsafe {
            create(
                raw_props.as_ptr(),
                ffi::CL_DEVICE_TYPE_ALL,
                None,
                ptr::null_mut(),
                &mut err,
            )
        };
        check("clCreateContextFromType", err)?;
        Ok(ContextId(context as usize))
    }

    fn create_context(&self, props: &ContextProperties, devices: &[DeviceId]) -> Result<ContextId> {
        let create: ffi::CreateContext = self.entry(b"clCreateContext\0")?;
        let raw_props = props.to_raw();
        let raw = raw_devices(devices);
        let mut err: cl_int = 0;
        // SAFETY: both arrays outlive the call.
        let context = unsafe {
            create(
                raw_props.as_ptr(),
                raw.len() as ffi::cl_uint,
                raw.as_ptr(),
                None,
                ptr::null_mut(),
                &mut err,
            )
        };
        check("clCreateContext", err)?;
        Ok(ContextId(context as usize))
    }

    fn context_devices(&self, context: ContextId) -> Result<Vec<DeviceId>> {
        let get: ffi::GetContextInfo = self.entry(b"clGetContextInfo\0")?;
        let raw = context.0 as ffi::cl_context;
        let count: ffi::cl_uint = query_value("clGetContextInfo", |size, value, size_ret| {
            // SAFETY: `value` points to a `cl_uint`.
            unsafe { get(raw, ffi::CL_CONTEXT_NUM_DEVICES, size, value, size_ret) }
        })?;

        let mut devices: Vec<ffi::cl_device_id> = vec![ptr::null_mut(); count as usize];
        let expected = size_of::<ffi::cl_device_id>() * devices.len();
        let mut written = 0usize;
        // SAFETY: `devices` holds exactly `count` entries.
        check("clGetContextInfo", unsafe {
            get(
                raw,
                ffi::CL_CONTEXT_DEVICES,
                expected,
                devices.as_mut_ptr().cast(),
                &mut written,
            )
        })?;
        if written != expected {
            return Err(ClError::SizeMismatch {
                op: "clGetContextInfo",
                expected,
                actual: written,
            });
        }
        Ok(devices.into_iter().map(|d| DeviceId(d as usize)).collect())
    }

    fn release_context(&self, context: ContextId) {
        match self.entry::<ffi::ReleaseContext>(b"clReleaseContext\0") {
            // SAFETY: the guard releases each context exactly once.
            Ok(release) => {
                let code = unsafe { release(context.0 as ffi::cl_context) };
                if code != ffi::CL_SUCCESS {
                    log::warn!("clReleaseContext returned {code}");
                }
            }
            Err(e) => log::warn!("{e}"),
        }
    }

    fn device_info(&self, device: DeviceId, param: DeviceInfo) -> Result<String> {
        let get: ffi::GetDeviceInfo = self.entry(b"clGetDeviceInfo\0")?;
        let raw = device.0 as ffi::cl_device_id;
        query_string("clGetDeviceInfo", |size, value, size_ret| {
            // SAFETY: `value` is null or points to `size` writable bytes.
            unsafe { get(raw, param.raw(), size, value, size_ret) }
        })
    }

    fn create_program_with_source(&self, context: ContextId, source: &[u8]) -> Result<ProgramId> {
        let create: ffi::CreateProgramWithSource = self.entry(b"clCreateProgramWithSource\0")?;
        let strings = [source.as_ptr().cast::<std::ffi::c_char>()];
        let lengths = [source.len()];
        let mut err: cl_int = 0;
        // SAFETY: one string with an explicit length; no NUL terminator required.
        let program = unsafe {
            create(
                context.0 as ffi::cl_context,
                1,
                strings.as_ptr(),
                lengths.as_ptr(),
                &mut err,
            )
        };
        check("clCreateProgramWithSource", err)?;
        Ok(ProgramId(program as usize))
    }

    fn create_program_with_binary(
        &self,
        context: ContextId,
        devices: &[DeviceId],
        binary: &[u8],
    ) -> Result<ProgramId> {
        let create: ffi::CreateProgramWithBinary = self.entry(b"clCreateProgramWithBinary\0")?;
        let raw = raw_devices(devices);
        let lengths = vec![binary.len(); raw.len()];
        let binaries = vec![binary.as_ptr(); raw.len()];
        let mut binary_status: Vec<cl_int> = vec![0; raw.len()];
        let mut err: cl_int = 0;
        // SAFETY: every array holds one entry per device and outlives the call.
        let program = unsafe {
            create(
                context.0 as ffi::cl_context,
                raw.len() as ffi::cl_uint,
                raw.as_ptr(),
                lengths.as_ptr(),
                binaries.as_ptr(),
                binary_status.as_mut_ptr(),
                &mut err,
            )
        };
        check("clCreateProgramWithBinary", err)?;
        for status in binary_status {
            check("clCreateProgramWithBinary", status)?;
        }
        Ok(ProgramId(program as usize))
    }

    fn build_program(&self, program: ProgramId, devices: &[DeviceId], options: &str) -> Result<()> {
        let build: ffi::BuildProgram = self.entry(b"clBuildProgram\0")?;
        let raw = raw_devices(devices);
        let options = c_string(options, "compiler options")?;
        // SAFETY: blocking build, no callback.
        check("clBuildProgram", unsafe {
            build(
                program.0 as ffi::cl_program,
                raw.len() as ffi::cl_uint,
                raw.as_ptr(),
                options.as_ptr(),
                None,
                ptr::null_mut(),
            )
        })
    }

    fn compile_program(
        &self,
        program: ProgramId,
        devices: &[DeviceId],
        options: &str,
        headers: &[(ProgramId, &str)],
    ) -> Result<()> {
        let compile: ffi::CompileProgram = self.entry(b"clCompileProgram\0")?;
        let raw = raw_devices(devices);
        let options = c_string(options, "compiler options")?;
        let header_programs: Vec<ffi::cl_program> =
            headers.iter().map(|(p, _)| p.0 as ffi::cl_program).collect();
        let header_names = headers
            .iter()
            .map(|(_, name)| c_string(name, "header include name"))
            .collect::<Result<Vec<_>>>()?;
        let header_name_ptrs: Vec<*const std::ffi::c_char> =
            header_names.iter().map(|n| n.as_ptr()).collect();
        let (programs_ptr, names_ptr) = if headers.is_empty() {
            (ptr::null(), ptr::null())
        } else {
            (header_programs.as_ptr(), header_name_ptrs.as_ptr())
        };
        // SAFETY: header arrays are parallel and outlive the blocking call.
        check("clCompileProgram", unsafe {
            compile(
                program.0 as ffi::cl_program,
                raw.len() as ffi::cl_uint,
                raw.as_ptr(),
                options.as_ptr(),
                headers.len() as ffi::cl_uint,
                programs_ptr,
                names_ptr,
                None,
                ptr::null_mut(),
            )
        })
    }

    fn link_program(
        &self,
        context: ContextId,
        devices: &[DeviceId],
        options: &str,
        inputs: &[ProgramId],
    ) -> Result<LinkOutcome> {
        let link: ffi::LinkProgram = self.entry(b"clLinkProgram\0")?;
        let raw = raw_devices(devices);
        let options = c_string(options, "link options")?;
        let raw_inputs: Vec<ffi::cl_program> =
            inputs.iter().map(|p| p.0 as ffi::cl_program).collect();
        let mut err: cl_int = 0;
        // SAFETY: blocking link, no callback.
        let program = unsafe {
            link(
                context.0 as ffi::cl_context,
                raw.len() as ffi::cl_uint,
                raw.as_ptr(),
                options.as_ptr(),
                raw_inputs.len() as ffi::cl_uint,
                raw_inputs.as_ptr(),
                None,
                ptr::null_mut(),
                &mut err,
            )
        };
        Ok(if program.is_null() {
            LinkOutcome::NoProgram { code: err }
        } else if err != ffi::CL_SUCCESS {
            LinkOutcome::Failed {
                program: ProgramId(program as usize),
                code: err,
            }
        } else {
            LinkOutcome::Linked(ProgramId(program as usize))
        })
    }

    fn program_build_log(&self, program: ProgramId, device: DeviceId) -> Result<String> {
        let get: ffi::GetProgramBuildInfo = self.entry(b"clGetProgramBuildInfo\0")?;
        let raw_program = program.0 as ffi::cl_program;
        let raw_device = device.0 as ffi::cl_device_id;
        query_string("clGetProgramBuildInfo", |size, value, size_ret| {
            // SAFETY: `value` is null or points to `size` writable bytes.
            unsafe {
                get(
                    raw_program,
                    raw_device,
                    ffi::CL_PROGRAM_BUILD_LOG,
                    size,
                    value,
                    size_ret,
                )
            }
        })
    }

    fn program_binary_sizes(&self, program: ProgramId, n_devices: usize) -> Result<Vec<usize>> {
        let get: ffi::GetProgramInfo = self.entry(b"clGetProgramInfo\0")?;
        let mut sizes = vec![0usize; n_devices];
        let expected = size_of::<usize>() * n_devices;
        let mut written = 0usize;
        // SAFETY: `sizes` holds `expected` bytes.
        check("clGetProgramInfo", unsafe {
            get(
                program.0 as ffi::cl_program,
                ffi::CL_PROGRAM_BINARY_SIZES,
                expected,
                sizes.as_mut_ptr().cast(),
                &mut written,
            )
        })?;
        if written != expected {
            return Err(ClError::SizeMismatch {
                op: "clGetProgramInfo(CL_PROGRAM_BINARY_SIZES)",
                expected,
                actual: written,
            });
        }
        Ok(sizes)
    }

    fn program_binaries(&self, program: ProgramId, sizes: &[usize]) -> Result<Vec<Vec<u8>>> {
        let get: ffi::GetProgramInfo = self.entry(b"clGetProgramInfo\0")?;
        let mut binaries: Vec<Vec<u8>> = sizes.iter().map(|&n| vec![0u8; n]).collect();
        let mut pointers: Vec<*mut u8> = binaries.iter_mut().map(|b| b.as_mut_ptr()).collect();
        let expected = size_of::<*mut u8>() * pointers.len();
        let mut written = 0usize;
        // SAFETY: each pointer addresses a buffer of the size the runtime reported.
        check("clGetProgramInfo", unsafe {
            get(
                program.0 as ffi::cl_program,
                ffi::CL_PROGRAM_BINARIES,
                expected,
                pointers.as_mut_ptr().cast(),
                &mut written,
            )
        })?;
        if written != expected {
            return Err(ClError::SizeMismatch {
                op: "clGetProgramInfo(CL_PROGRAM_BINARIES)",
                expected,
                actual: written,
            });
        }
        Ok(binaries)
    }

    fn release_program(&self, program: ProgramId) {
        match self.entry::<ffi::ReleaseProgram>(b"clReleaseProgram\0") {
            Ok(release) => {
                // SAFETY: the guard releases each program exactly once.
                let code = unsafe { release(program.0 as ffi::cl_program) };
                if code != ffi::CL_SUCCESS {
                    log::warn!("clReleaseProgram returned {code}");
                }
            }
            Err(e) => log::warn!("{e}"),
        }
    }

    fn create_kernels(&self, program: ProgramId) -> Result<Vec<KernelId>> {
        let create: ffi::CreateKernelsInProgram = self.entry(b"clCreateKernelsInProgram\0")?;
        let raw = program.0 as ffi::cl_program;
        let mut count: ffi::cl_uint = 0;
        // SAFETY: count query with a null output array.
        check("clCreateKernelsInProgram", unsafe {
            create(raw, 0, ptr::null_mut(), &mut count)
        })?;
        let mut kernels: Vec<ffi::cl_kernel> = vec![ptr::null_mut(); count as usize];
        if count > 0 {
            // SAFETY: `kernels` holds exactly `count` entries.
            check("clCreateKernelsInProgram", unsafe {
                create(raw, count, kernels.as_mut_ptr(), ptr::null_mut())
            })?;
        }
        Ok(kernels.into_iter().map(|k| KernelId(k as usize)).collect())
    }

    fn kernel_info(&self, kernel: KernelId, param: KernelInfo) -> Result<String> {
        let get: ffi::GetKernelInfo = self.entry(b"clGetKernelInfo\0")?;
        let raw = kernel.0 as ffi::cl_kernel;
        query_string("clGetKernelInfo", |size, value, size_ret| {
            // SAFETY: `value` is null or points to `size` writable bytes.
            unsafe { get(raw, param.raw(), size, value, size_ret) }
        })
    }

    fn kernel_num_args(&self, kernel: KernelId) -> Result<u32> {
        let get: ffi::GetKernelInfo = self.entry(b"clGetKernelInfo\0")?;
        let raw = kernel.0 as ffi::cl_kernel;
        query_value("clGetKernelInfo", |size, value, size_ret| {
            // SAFETY: `value` points to a `cl_uint`.
            unsafe { get(raw, ffi::CL_KERNEL_NUM_ARGS, size, value, size_ret) }
        })
    }

    fn kernel_arg_info(&self, kernel: KernelId, index: u32) -> Result<Option<KernelArgInfo>> {
        let get: ffi::GetKernelArgInfo = self.entry(b"clGetKernelArgInfo\0")?;
        let raw = kernel.0 as ffi::cl_kernel;
        let op = "clGetKernelArgInfo";
        let query = move |param: ffi::cl_uint| {
            move |size: usize, value: *mut c_void, size_ret: *mut usize| {
                // SAFETY: `value` is null or points to `size` writable bytes.
                unsafe { get(raw, index, param, size, value, size_ret) }
            }
        };

        let address: ffi::cl_uint =
            match query_value(op, query(ffi::CL_KERNEL_ARG_ADDRESS_QUALIFIER)) {
                Ok(v) => v,
                Err(ClError::Api { code, .. })
                    if code == ffi::CL_KERNEL_ARG_INFO_NOT_AVAILABLE =>
                {
                    return Ok(None)
                }
                Err(e) => return Err(e),
            };
        let access: ffi::cl_uint = query_value(op, query(ffi::CL_KERNEL_ARG_ACCESS_QUALIFIER))?;
        let type_qualifiers: ffi::cl_bitfield =
            query_value(op, query(ffi::CL_KERNEL_ARG_TYPE_QUALIFIER))?;
        let type_name = query_string(op, query(ffi::CL_KERNEL_ARG_TYPE_NAME))?;
        let name = query_string(op, query(ffi::CL_KERNEL_ARG_NAME))?;

        let (address, access) = decode_qualifiers(op, address, access)?;
        Ok(Some(KernelArgInfo {
            address,
            access,
            type_qualifiers: TypeQualifiers(type_qualifiers),
            type_name,
            name,
        }))
    }

    fn release_kernel(&self, kernel: KernelId) {
        match self.entry::<ffi::ReleaseKernel>(b"clReleaseKernel\0") {
            Ok(release) => {
                // SAFETY: the guard releases each kernel exactly once.
                let code = unsafe { release(kernel.0 as ffi::cl_kernel) };
                if code != ffi::CL_SUCCESS {
                    log::warn!("clReleaseKernel returned {code}");
                }
            }
            Err(e) => log::warn!("{e}"),
        }
    }
}

/// Qualifier values outside the OpenCL 1.2 set are reported as
/// `CL_INVALID_VALUE` rather than rendered as some other qualifier.
fn decode_qualifiers(
    op: &'static str,
    address: ffi::cl_uint,
    access: ffi::cl_uint,
) -> Result<(AddressQualifier, AccessQualifier)> {
    let invalid = || ClError::Api {
        op,
        code: ffi::CL_INVALID_VALUE,
    };
    let address = AddressQualifier::from_raw(address).ok_or_else(invalid)?;
    let access = AccessQualifier::from_raw(access).ok_or_else(invalid)?;
    Ok((address, access))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_sized_reads_exact_size() {
        let payload = b"cl_khr_fp64 cl_amd_offline_devices\0";
        let mut calls = 0;
        let bytes = query_sized("test", |size, value, size_ret| {
            calls += 1;
            if value.is_null() {
                // SAFETY: test closure, `size_ret` is valid on the size call.
                unsafe { *size_ret = payload.len() };
            } else {
                assert_eq!(size, payload.len());
                // SAFETY: `value` points to `size` bytes.
                unsafe { ptr::copy_nonoverlapping(payload.as_ptr(), value.cast(), size) };
            }
            0
        })
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(bytes, payload);
    }

    #[test]
    fn query_sized_skips_fill_for_empty_result() {
        let mut calls = 0;
        let bytes = query_sized("test", |_, _, size_ret| {
            calls += 1;
            // SAFETY: only the size call happens.
            unsafe { *size_ret = 0 };
            0
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert!(bytes.is_empty());
    }

    #[test]
    fn query_sized_propagates_status() {
        let err = query_sized("clGetPlatformInfo", |_, _, _| -30).unwrap_err();
        assert!(matches!(err, ClError::Api { code: -30, .. }));
    }

    #[test]
    fn known_qualifiers_decode() {
        let decoded = decode_qualifiers(
            "clGetKernelArgInfo",
            ffi::CL_KERNEL_ARG_ADDRESS_GLOBAL,
            ffi::CL_KERNEL_ARG_ACCESS_READ_ONLY,
        )
        .unwrap();
        assert_eq!(decoded, (AddressQualifier::Global, AccessQualifier::ReadOnly));
    }

    #[test]
    fn unknown_qualifiers_are_invalid_values() {
        let bad_address = decode_qualifiers(
            "clGetKernelArgInfo",
            0x7777,
            ffi::CL_KERNEL_ARG_ACCESS_NONE,
        )
        .unwrap_err();
        assert!(matches!(bad_address, ClError::Api { code: -30, .. }));

        let bad_access = decode_qualifiers(
            "clGetKernelArgInfo",
            ffi::CL_KERNEL_ARG_ADDRESS_PRIVATE,
            0x7777,
        )
        .unwrap_err();
        assert!(bad_access.to_string().contains("CL_INVALID_VALUE"));
    }

    #[test]
    fn c_strings_stop_at_nul() {
        assert_eq!(c_bytes_to_string(b"OpenCL 1.2\0\0"), "OpenCL 1.2");
        assert_eq!(c_bytes_to_string(b"no terminator"), "no terminator");
    }

    #[test]
    fn symbol_names_drop_terminator() {
        assert_eq!(symbol_name(b"clLinkProgram\0"), "clLinkProgram");
    }

    #[test]
    fn missing_library_reports_candidate() {
        let err = match DynamicRuntime::load(Some(Path::new("/nonexistent/libOpenCL.so"))) {
            Ok(_) => panic!("loading a missing library must fail"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("/nonexistent/libOpenCL.so"));
    }
}
