//! Capability tier detection.
//!
//! The tier decides which build pipeline runs: a single `clBuildProgram`
//! call, or separate compile and link steps with library and argument
//! introspection support.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::ClApi;

/// Entry points that must all be present for the Extended tier.
pub const EXTENDED_ENTRY_POINTS: [&str; 3] =
    ["clCompileProgram", "clLinkProgram", "clGetKernelArgInfo"];

/// Build operations supported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityTier {
    /// Single-call build only.
    Basic,
    /// Separate compile and link, kernel libraries, argument metadata.
    Extended,
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityTier::Basic => write!(f, "basic (OpenCL 1.0/1.1 build)"),
            CapabilityTier::Extended => write!(f, "extended (OpenCL 1.2 compile/link)"),
        }
    }
}

/// How the tier is detected. One strategy is active per build configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionStrategy {
    /// Probe the loaded library for [`EXTENDED_ENTRY_POINTS`].
    #[default]
    Symbols,
    /// Parse the platform version string.
    Version,
}

impl FromStr for DetectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "symbols" => Ok(Self::Symbols),
            "version" => Ok(Self::Version),
            other => Err(format!(
                "unknown detection strategy '{other}'. Choose: symbols, version"
            )),
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbols => write!(f, "symbols"),
            Self::Version => write!(f, "version"),
        }
    }
}

/// Extended only when every entry point in [`EXTENDED_ENTRY_POINTS`] is exported.
pub fn detect_from_symbols(api: &dyn ClApi) -> CapabilityTier {
    let missing: Vec<&str> = EXTENDED_ENTRY_POINTS
        .iter()
        .copied()
        .filter(|name| !api.has_symbol(name))
        .collect();
    if missing.is_empty() {
        CapabilityTier::Extended
    } else {
        log::debug!("runtime lacks {}", missing.join(", "));
        CapabilityTier::Basic
    }
}

/// First `<major>.<minor>` token of a version string such as
/// `"OpenCL 1.2 AMD-APP (3180.7)"`.
pub fn parse_version(text: &str) -> Option<(u32, u32)> {
    text.split_whitespace().find_map(|token| {
        let (major, minor) = token.split_once('.')?;
        Some((major.parse().ok()?, minor.parse().ok()?))
    })
}

/// Tier implied by a platform version string.
///
/// A string without a version token fails closed to Basic. A token that is
/// not an OpenCL version (major 0) gives `None`, i.e. undetectable.
pub fn tier_from_version(text: &str) -> Option<CapabilityTier> {
    match parse_version(text) {
        None => Some(CapabilityTier::Basic),
        Some((0, _)) => None,
        Some((1, 0)) | Some((1, 1)) => Some(CapabilityTier::Basic),
        Some(_) => Some(CapabilityTier::Extended),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_tokens() {
        assert_eq!(parse_version("OpenCL 1.2 AMD-APP (3180.7)"), Some((1, 2)));
        assert_eq!(parse_version("OpenCL 3.0 CUDA 12.2.148"), Some((3, 0)));
        assert_eq!(parse_version("OpenCL"), None);
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn tiers_from_version() {
        assert_eq!(tier_from_version("OpenCL 1.1 Mesa"), Some(CapabilityTier::Basic));
        assert_eq!(tier_from_version("OpenCL 1.0"), Some(CapabilityTier::Basic));
        assert_eq!(tier_from_version("OpenCL 1.2 pocl"), Some(CapabilityTier::Extended));
        assert_eq!(tier_from_version("OpenCL 2.1"), Some(CapabilityTier::Extended));
        assert_eq!(tier_from_version("garbage"), Some(CapabilityTier::Basic));
        assert_eq!(tier_from_version("OpenCL 0.9 prototype"), None);
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(CapabilityTier::Basic < CapabilityTier::Extended);
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("symbols".parse::<DetectionStrategy>(), Ok(DetectionStrategy::Symbols));
        assert_eq!("version".parse::<DetectionStrategy>(), Ok(DetectionStrategy::Version));
        assert!("guess".parse::<DetectionStrategy>().is_err());
        assert_eq!(DetectionStrategy::default(), DetectionStrategy::Symbols);
    }

    #[cfg(feature = "fake")]
    #[test]
    fn symbol_probe() {
        use crate::fake::{FakeDevice, FakePlatform, FakeRuntime};

        let platforms = || {
            vec![FakePlatform::new(
                "Fake",
                "OpenCL 1.2",
                vec![FakeDevice::new("GPU")],
            )]
        };
        let extended = FakeRuntime::new(platforms());
        assert_eq!(detect_from_symbols(&extended), CapabilityTier::Extended);

        let basic = FakeRuntime::new(platforms()).without_symbol("clGetKernelArgInfo");
        assert_eq!(detect_from_symbols(&basic), CapabilityTier::Basic);
    }
}
