//! Kernel build orchestrator.
//!
//! Turns kernel source and binary modules into per-device binaries through an
//! OpenCL runtime: resolve the platform and devices, open a broad context to
//! enumerate devices and narrow it to the selection, run the compile/link
//! pipeline matching the runtime's capability tier, then extract and name
//! one binary per device.

pub mod buildlog;
pub mod context;
pub mod driver;
pub mod error;
pub mod extract;
pub mod introspect;
pub mod module;
pub mod naming;
pub mod pipeline;
pub mod report;
pub mod request;
pub mod resolve;

pub use buildlog::{collect_logs, BuildLogs, DeviceLog};
pub use driver::{detect_tier, run, BuildTarget, PlatformSession};
pub use error::{BuildError, Result};
pub use extract::{extract_binaries, write_binaries};
pub use introspect::{introspect, KernelSignature};
pub use module::{BinaryModule, SourceModule};
pub use naming::output_names;
pub use pipeline::{BuildInputs, Built, Pipeline};
pub use report::{BuildReport, WrittenBinary};
pub use request::{BuildRequest, Selection};
pub use resolve::{
    describe_devices, list_platforms, resolve_devices, resolve_platform, DeviceSummary,
    PlatformSummary,
};
