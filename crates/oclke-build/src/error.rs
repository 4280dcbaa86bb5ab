//! Build errors.

use std::io;
use std::path::PathBuf;

use oclke_runtime::{CapabilityTier, ClError};
use thiserror::Error;

use crate::buildlog::BuildLogs;

/// Everything that can stop a build.
///
/// User-input problems, runtime failures, compiler diagnostics and internal
/// consistency failures are separate variants so callers can tell a rejected
/// kernel from a misbehaving runtime.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid selection: {reason}")]
    InvalidSelection { reason: String },

    #[error("no OpenCL platform found")]
    NoPlatform,

    #[error("could not detect capability from platform version '{version}'")]
    CapabilityUnknown { version: String },

    #[error(transparent)]
    Runtime(ClError),

    #[error("{module}: build failed with {status}\ncompiler options: \"{options}\"\n{logs}")]
    BuildFailed {
        module: String,
        options: String,
        status: String,
        logs: BuildLogs,
    },

    #[error("link failed with {status}\nlink options: \"{options}\"\n{logs}")]
    LinkFailed {
        options: String,
        status: String,
        logs: BuildLogs,
    },

    #[error(
        "link returned no program ({status}): binaries are probably incompatible with the \
         selected device"
    )]
    LinkMismatch { status: String },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("cannot read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("no binary returned for device {index}")]
    EmptyBinary { index: usize },

    #[error("an output name (-o) is required when no kernel source is given")]
    MissingOutputName,

    #[error("no kernel to compile")]
    NothingToBuild,

    #[error("kernel libraries need the extended tier, the runtime offers {tier}")]
    LibraryUnsupported { tier: CapabilityTier },
}

impl BuildError {
    pub fn invalid_platform(index: usize, count: usize) -> Self {
        BuildError::InvalidSelection {
            reason: format!(
                "platform {index} does not exist ({count} available, use -L to list platforms)"
            ),
        }
    }

    pub fn invalid_device(index: usize, count: usize) -> Self {
        BuildError::InvalidSelection {
            reason: format!(
                "device {index} does not exist ({count} available, use -l to list devices)"
            ),
        }
    }

    pub fn duplicate_device(index: usize) -> Self {
        BuildError::InvalidSelection {
            reason: format!("device {index} is selected more than once (use -l to list devices)"),
        }
    }

    pub fn mixed_all() -> Self {
        BuildError::InvalidSelection {
            reason: "device 0 selects all devices and cannot be combined with other device \
                     indices (use -l to list devices)"
                .into(),
        }
    }
}

impl From<ClError> for BuildError {
    fn from(err: ClError) -> Self {
        match err {
            ClError::SizeMismatch { .. } => BuildError::Internal(err.to_string()),
            other => BuildError::Runtime(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_is_internal() {
        let err: BuildError = ClError::SizeMismatch {
            op: "clGetProgramInfo(CL_PROGRAM_BINARY_SIZES)",
            expected: 16,
            actual: 8,
        }
        .into();
        assert!(matches!(err, BuildError::Internal(_)));
        assert!(err.to_string().starts_with("internal error:"));
    }

    #[test]
    fn api_failure_stays_runtime() {
        let err: BuildError = ClError::Api {
            op: "clCreateContext",
            code: -33,
        }
        .into();
        assert!(matches!(err, BuildError::Runtime(_)));
        assert!(err.to_string().contains("CL_INVALID_DEVICE"));
    }

    #[test]
    fn selection_messages_name_listing_flags() {
        assert!(BuildError::invalid_platform(3, 1).to_string().contains("-L"));
        assert!(BuildError::invalid_device(0, 2).to_string().contains("-l"));
        assert!(BuildError::mixed_all().to_string().contains("device 0"));
        assert!(BuildError::duplicate_device(2).to_string().contains("-l"));
    }
}
