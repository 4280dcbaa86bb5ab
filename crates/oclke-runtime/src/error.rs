//! Error types for runtime operations.

use crate::status::status_text;

/// Errors raised while talking to the OpenCL runtime.
#[derive(Debug, thiserror::Error)]
pub enum ClError {
    /// An API call returned a non-success status.
    #[error("{op} failed: {}", status_text(*code))]
    Api {
        /// Name of the OpenCL entry point.
        op: &'static str,
        /// Raw status code.
        code: i32,
    },

    /// The OpenCL library could not be loaded.
    #[error("cannot load OpenCL library: {detail}")]
    Load {
        /// Loader diagnostic for every candidate that was tried.
        detail: String,
    },

    /// A required entry point is missing from the loaded library.
    #[error("OpenCL entry point {name} not found")]
    MissingSymbol {
        /// Symbol name.
        name: String,
    },

    /// A query wrote a different number of bytes than the device count implies.
    #[error("{op}: expected {expected} bytes, runtime reported {actual}")]
    SizeMismatch {
        /// Name of the OpenCL entry point.
        op: &'static str,
        /// Bytes implied by the device count.
        expected: usize,
        /// Bytes reported by the runtime.
        actual: usize,
    },

    /// A string argument cannot cross the C boundary.
    #[error("{what} contains an interior NUL byte")]
    InteriorNul {
        /// What the string was (e.g. "compiler options").
        what: &'static str,
    },
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, ClError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_names_status() {
        let err = ClError::Api {
            op: "clBuildProgram",
            code: -11,
        };
        assert_eq!(
            err.to_string(),
            "clBuildProgram failed: CL_BUILD_PROGRAM_FAILURE (-11)"
        );
    }
}
