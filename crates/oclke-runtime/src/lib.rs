//! OpenCL runtime access for the oclke kernel build driver.
//!
//! The vendor runtime is reached through the [`ClApi`] trait. The production
//! implementation, [`DynamicRuntime`], loads the OpenCL ICD loader at run time
//! with `libloading`, so the driver can probe which entry points exist instead
//! of failing to link against an older runtime.
//!
//! ## Modules
//!
//! - [`api`] - the [`ClApi`] seam, opaque handle types and query parameters
//! - [`dynamic`] - `libloading`-backed runtime and the size-then-fill query helper
//! - [`guard`] - scoped context/program/kernel handles released on drop
//! - [`capability`] - capability tier detection (symbol probe or version string)
//! - [`status`] - OpenCL status code names
//! - [`ffi`] - raw C declarations
//! - `fake` - in-memory runtime for tests (feature `fake`)

pub mod api;
pub mod capability;
pub mod dynamic;
pub mod error;
pub mod ffi;
pub mod guard;
pub mod status;

#[cfg(feature = "fake")]
pub mod fake;

pub use api::{
    AccessQualifier, AddressQualifier, ClApi, ContextId, ContextProperties, DeviceId, DeviceInfo,
    KernelArgInfo, KernelId, KernelInfo, LinkOutcome, PlatformId, PlatformInfo, ProgramId,
    TypeQualifiers,
};
pub use capability::{CapabilityTier, DetectionStrategy};
pub use dynamic::DynamicRuntime;
pub use error::{ClError, Result};
pub use guard::{Context, Kernel, LinkFailure, Program};
pub use status::status_text;
