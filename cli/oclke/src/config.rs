//! `oclke.toml` build defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use oclke_runtime::DetectionStrategy;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "oclke.toml";

/// The top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OclkeConfig {
    /// Defaults for the build request.
    #[serde(default)]
    pub build: BuildConfig,
    /// Runtime library selection.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// `[build]` section. Every key is optional; command-line flags win.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildConfig {
    #[serde(default)]
    pub platform: Option<usize>,
    #[serde(default)]
    pub devices: Vec<usize>,
    #[serde(default)]
    pub compiler_options: Option<String>,
    #[serde(default)]
    pub link_options: Option<String>,
    #[serde(default)]
    pub source_includes: Vec<PathBuf>,
    #[serde(default)]
    pub binary_includes: Vec<PathBuf>,
    #[serde(default)]
    pub offline_devices: bool,
    #[serde(default)]
    pub detect: Option<DetectionStrategy>,
}

/// `[runtime]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Path of the OpenCL library to load instead of the default search.
    #[serde(default)]
    pub library: Option<PathBuf>,
}

impl OclkeConfig {
    /// Search upward from `start_dir` for an `oclke.toml` file, parse it and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let config = Self::load(&candidate)?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse the file at `path`. Relative paths inside it are taken relative
    /// to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: OclkeConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.rebased(base))
    }

    /// Parse a configuration from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing oclke.toml")
    }

    fn rebased(mut self, base: &Path) -> Self {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.build.source_includes.iter_mut().for_each(rebase);
        self.build.binary_includes.iter_mut().for_each(rebase);
        if let Some(lib) = self.runtime.library.as_mut() {
            // bare library names go through the loader's own search
            if lib.components().count() > 1 {
                rebase(lib);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = OclkeConfig::from_str(
            r#"
[build]
platform = 2
devices = [1, 2]
compiler-options = "-cl-std=CL1.2"
link-options = "-cl-fast-relaxed-math"
source-includes = ["common.cl"]
binary-includes = ["prebuilt.bin"]
offline-devices = true
detect = "version"

[runtime]
library = "/opt/vendor/lib/libOpenCL.so"
"#,
        )
        .unwrap();
        assert_eq!(config.build.platform, Some(2));
        assert_eq!(config.build.devices, vec![1, 2]);
        assert_eq!(config.build.compiler_options.as_deref(), Some("-cl-std=CL1.2"));
        assert_eq!(config.build.source_includes, vec![PathBuf::from("common.cl")]);
        assert!(config.build.offline_devices);
        assert_eq!(config.build.detect, Some(DetectionStrategy::Version));
        assert_eq!(
            config.runtime.library,
            Some(PathBuf::from("/opt/vendor/lib/libOpenCL.so"))
        );
    }

    #[test]
    fn empty_config_is_default() {
        let config = OclkeConfig::from_str("").unwrap();
        assert!(config.build.platform.is_none());
        assert!(config.build.devices.is_empty());
        assert!(config.runtime.library.is_none());
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(OclkeConfig::from_str("[build]\nplatfrom = 1\n").is_err());
    }

    #[test]
    fn unknown_detect_rejected() {
        assert!(OclkeConfig::from_str("[build]\ndetect = \"guess\"\n").is_err());
    }

    #[test]
    fn find_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[build]\nsource-includes = [\"inc/common.cl\"]\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, found) = OclkeConfig::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(found, dir.path());
        assert_eq!(
            config.build.source_includes,
            vec![dir.path().join("inc/common.cl")]
        );
    }

    #[test]
    fn bare_library_name_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[runtime]\nlibrary = \"libOpenCL.so.1\"\n").unwrap();
        let config = OclkeConfig::load(&path).unwrap();
        assert_eq!(config.runtime.library, Some(PathBuf::from("libOpenCL.so.1")));
    }

    #[test]
    fn absent_config() {
        let dir = tempfile::tempdir().unwrap();
        // tempdirs may live under a directory holding an oclke.toml; only
        // check that the search itself succeeds
        assert!(OclkeConfig::find_and_load(dir.path()).is_ok());
    }
}
