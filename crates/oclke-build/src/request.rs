//! The immutable build request threaded through a run.

use std::path::PathBuf;

use oclke_runtime::DetectionStrategy;
use serde::Serialize;

use crate::error::{BuildError, Result};

/// Which devices of the selected platform to build for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    /// Every device, in runtime order (index 0 on the command line).
    All,
    /// 1-based device indices, in the order given.
    Indices(Vec<usize>),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Indices(vec![1])
    }
}

impl Selection {
    /// Interpret raw device indices where 0 means "all".
    ///
    /// An empty list selects the first device. Index 0 together with any
    /// other index is rejected, whatever the order, and so is an index
    /// given twice.
    pub fn from_indices(indices: &[usize]) -> Result<Self> {
        match indices {
            [] => Ok(Selection::default()),
            [0] => Ok(Selection::All),
            _ if indices.contains(&0) => Err(BuildError::mixed_all()),
            _ => match first_repeated(indices) {
                Some(index) => Err(BuildError::duplicate_device(index)),
                None => Ok(Selection::Indices(indices.to_vec())),
            },
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

/// The first index that also appears earlier in `indices`.
pub(crate) fn first_repeated(indices: &[usize]) -> Option<usize> {
    indices
        .iter()
        .enumerate()
        .find(|(i, index)| indices[..*i].contains(index))
        .map(|(_, &index)| index)
}

/// Everything one run needs to know, fixed before any runtime call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildRequest {
    /// 1-based platform index; `None` means the first platform.
    pub platform: Option<usize>,
    pub devices: Selection,
    /// Primary kernel source.
    pub kernel: Option<PathBuf>,
    pub source_includes: Vec<PathBuf>,
    pub binary_includes: Vec<PathBuf>,
    pub compiler_options: String,
    pub link_options: String,
    /// Explicit output name (or output base for several devices).
    pub output: Option<PathBuf>,
    pub create_library: bool,
    pub introspect: bool,
    /// Request AMD offline devices when the platform supports them.
    pub offline_devices: bool,
    pub detect: DetectionStrategy,
}

impl BuildRequest {
    /// Whether there is any module to build.
    pub fn has_work(&self) -> bool {
        self.kernel.is_some()
            || !self.source_includes.is_empty()
            || !self.binary_includes.is_empty()
    }
}
