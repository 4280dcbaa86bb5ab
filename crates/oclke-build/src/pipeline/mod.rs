//! Compile and link pipelines.
//!
//! One strategy per capability tier, chosen once with [`Pipeline::for_tier`].
//! Both take the loaded modules and hand back the program binaries are
//! extracted from.

mod basic;
mod extended;

use oclke_runtime::{CapabilityTier, Context, Program};

use crate::error::{BuildError, Result};
use crate::module::{BinaryModule, SourceModule};
use crate::request::BuildRequest;
use crate::resolve::DeviceSummary;

/// Modules and options for one build, loaded from a [`BuildRequest`].
#[derive(Debug, Clone, Default)]
pub struct BuildInputs {
    pub primary: Option<SourceModule>,
    pub source_includes: Vec<SourceModule>,
    pub binary_includes: Vec<BinaryModule>,
    pub compiler_options: String,
    pub link_options: String,
    pub create_library: bool,
    pub introspect: bool,
}

impl BuildInputs {
    pub fn load(request: &BuildRequest) -> Result<Self> {
        Ok(Self {
            primary: request.kernel.as_deref().map(SourceModule::load).transpose()?,
            source_includes: request
                .source_includes
                .iter()
                .map(|p| SourceModule::load(p))
                .collect::<Result<_>>()?,
            binary_includes: request
                .binary_includes
                .iter()
                .map(|p| BinaryModule::load(p))
                .collect::<Result<_>>()?,
            compiler_options: request.compiler_options.clone(),
            link_options: request.link_options.clone(),
            create_library: request.create_library,
            introspect: request.introspect,
        })
    }

    pub fn has_includes(&self) -> bool {
        !self.source_includes.is_empty() || !self.binary_includes.is_empty()
    }
}

/// A finished program and the notices raised while producing it.
pub struct Built<'a> {
    /// The program binaries are extracted from.
    pub program: Program<'a>,
    /// Executable linked only to enumerate kernels, when `program` is a
    /// compiled object or a library.
    pub executable: Option<Program<'a>>,
    pub notices: Vec<String>,
}

/// Build strategy for a capability tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// `clBuildProgram` on the primary module.
    Basic,
    /// `clCompileProgram` per module, then `clLinkProgram` when needed.
    Extended,
}

impl Pipeline {
    pub fn for_tier(tier: CapabilityTier) -> Self {
        match tier {
            CapabilityTier::Basic => Pipeline::Basic,
            CapabilityTier::Extended => Pipeline::Extended,
        }
    }

    pub fn tier(self) -> CapabilityTier {
        match self {
            Pipeline::Basic => CapabilityTier::Basic,
            Pipeline::Extended => CapabilityTier::Extended,
        }
    }

    /// Reject requests this strategy cannot serve, before any file is read.
    pub fn check(self, request: &BuildRequest) -> Result<()> {
        if !request.has_work() {
            return Err(BuildError::NothingToBuild);
        }
        if request.kernel.is_none() && request.output.is_none() {
            return Err(BuildError::MissingOutputName);
        }
        if self == Pipeline::Basic {
            if request.create_library {
                return Err(BuildError::LibraryUnsupported { tier: self.tier() });
            }
            if request.kernel.is_none() {
                return Err(BuildError::NothingToBuild);
            }
        }
        Ok(())
    }

    /// Compile, and link where the strategy calls for it, for `devices`.
    pub fn run<'a>(
        self,
        context: &Context<'a>,
        devices: &[DeviceSummary],
        inputs: &BuildInputs,
    ) -> Result<Built<'a>> {
        log::debug!("running {:?} pipeline for {} device(s)", self, devices.len());
        match self {
            Pipeline::Basic => basic::build(context, devices, inputs),
            Pipeline::Extended => extended::build(context, devices, inputs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BuildRequest {
        BuildRequest {
            kernel: Some("k.cl".into()),
            ..Default::default()
        }
    }

    #[test]
    fn strategy_follows_tier() {
        assert_eq!(Pipeline::for_tier(CapabilityTier::Basic), Pipeline::Basic);
        assert_eq!(Pipeline::for_tier(CapabilityTier::Extended).tier(), CapabilityTier::Extended);
    }

    #[test]
    fn basic_rejects_library() {
        let request = BuildRequest {
            create_library: true,
            ..request()
        };
        assert!(matches!(
            Pipeline::Basic.check(&request),
            Err(BuildError::LibraryUnsupported { .. })
        ));
        assert!(Pipeline::Extended.check(&request).is_ok());
    }

    #[test]
    fn basic_accepts_includes() {
        let request = BuildRequest {
            source_includes: vec!["common.cl".into()],
            ..request()
        };
        assert!(Pipeline::Basic.check(&request).is_ok());
    }

    #[test]
    fn library_without_kernel_needs_output() {
        let request = BuildRequest {
            source_includes: vec!["a.cl".into()],
            create_library: true,
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::Extended.check(&request),
            Err(BuildError::MissingOutputName)
        ));
        let named = BuildRequest {
            output: Some("lib.bin".into()),
            ..request
        };
        assert!(Pipeline::Extended.check(&named).is_ok());
    }

    #[test]
    fn nothing_to_build() {
        assert!(matches!(
            Pipeline::Extended.check(&BuildRequest::default()),
            Err(BuildError::NothingToBuild)
        ));
    }
}
