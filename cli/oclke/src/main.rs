use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{ArgAction, Parser};
use oclke_build::{BuildRequest, Selection};
use oclke_runtime::{DetectionStrategy, DynamicRuntime};

mod commands;
mod config;

use commands::build::{Listing, ReportFormat};
use config::{BuildConfig, OclkeConfig, CONFIG_FILE};

#[derive(Parser)]
#[command(
    name = "oclke",
    version,
    about = "Compile OpenCL kernels ahead of time into device binaries"
)]
struct Cli {
    /// Primary kernel source file
    kernel: Option<PathBuf>,

    /// List available platforms
    #[arg(short = 'L', long = "list-platforms")]
    list_platforms: bool,

    /// List devices of the selected platform
    #[arg(short = 'l', long = "list-devices")]
    list_devices: bool,

    /// Show the extensions of the selected platform
    #[arg(short = 'e', long = "extensions")]
    extensions: bool,

    /// Activate AMD offline devices when the platform supports them
    #[arg(short = 'a', long = "amd-offline")]
    amd_offline: bool,

    /// Platform index (1-based, default 1)
    #[arg(short = 'p', long = "platform")]
    platform: Option<usize>,

    /// Device index (1-based, repeatable, 0 selects all devices)
    #[arg(short = 'd', long = "device", action = ArgAction::Append, value_delimiter = ',')]
    devices: Vec<usize>,

    /// Source module compiled and linked with the kernel (repeatable)
    #[arg(short = 's', long = "source-include", action = ArgAction::Append)]
    source_includes: Vec<PathBuf>,

    /// Binary module linked with the kernel (repeatable)
    #[arg(short = 'b', long = "binary-include", action = ArgAction::Append)]
    binary_includes: Vec<PathBuf>,

    /// Create a kernel library instead of an executable
    #[arg(short = 'k', long = "library")]
    library: bool,

    /// Options passed to the compiler
    #[arg(short = 'B', long = "build-options", allow_hyphen_values = true)]
    compiler_options: Option<String>,

    /// Options passed to the linker
    #[arg(short = 'c', long = "link-options", allow_hyphen_values = true)]
    link_options: Option<String>,

    /// Output file name (base name when building for several devices)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Print kernel signatures after the build
    #[arg(short = 'i', long = "introspect")]
    introspect: bool,

    /// Configuration file (default: nearest oclke.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// OpenCL library to load
    #[arg(long = "opencl-lib")]
    opencl_lib: Option<PathBuf>,

    /// Capability detection strategy: symbols, version
    #[arg(long)]
    detect: Option<DetectionStrategy>,

    /// Print a build report after a successful build
    #[arg(long, value_enum)]
    report: Option<ReportFormat>,

    /// More log output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn listing(&self) -> Listing {
        Listing {
            platforms: self.list_platforms,
            devices: self.list_devices,
            extensions: self.extensions,
        }
    }

    /// Merge the command line over the configuration file defaults.
    fn request(&self, config: &BuildConfig) -> Result<BuildRequest> {
        let devices = if self.devices.is_empty() {
            &config.devices
        } else {
            &self.devices
        };
        let pick = |cli: &Option<String>, file: &Option<String>| {
            cli.as_ref().or(file.as_ref()).cloned().unwrap_or_default()
        };
        Ok(BuildRequest {
            platform: self.platform.or(config.platform),
            devices: Selection::from_indices(devices)?,
            kernel: self.kernel.clone(),
            source_includes: concat(&config.source_includes, &self.source_includes),
            binary_includes: concat(&config.binary_includes, &self.binary_includes),
            compiler_options: pick(&self.compiler_options, &config.compiler_options),
            link_options: pick(&self.link_options, &config.link_options),
            output: self.output.clone(),
            create_library: self.library,
            introspect: self.introspect,
            offline_devices: self.amd_offline || config.offline_devices,
            detect: self
                .detect
                .or(config.detect)
                .unwrap_or(DetectionStrategy::default()),
        })
    }
}

fn concat(first: &[PathBuf], second: &[PathBuf]) -> Vec<PathBuf> {
    first.iter().chain(second).cloned().collect()
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => OclkeConfig::load(path)?,
        None => {
            let cwd = std::env::current_dir()?;
            match OclkeConfig::find_and_load(&cwd)? {
                Some((config, dir)) => {
                    log::debug!("using {}", dir.join(CONFIG_FILE).display());
                    config
                }
                None => OclkeConfig::default(),
            }
        }
    };

    let request = cli.request(&config.build)?;
    let library = cli.opencl_lib.as_ref().or(config.runtime.library.as_ref());
    let runtime = DynamicRuntime::load(library.map(PathBuf::as_path))?;
    log::info!("loaded OpenCL runtime from {}", runtime.path().display());

    let mut stdout = std::io::stdout().lock();
    commands::build::run(&runtime, &request, cli.listing(), cli.report, &mut stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("oclke").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let request = parse(&["foo.cl"]).request(&BuildConfig::default()).unwrap();
        assert_eq!(request.kernel, Some(PathBuf::from("foo.cl")));
        assert_eq!(request.devices, Selection::Indices(vec![1]));
        assert_eq!(request.platform, None);
        assert_eq!(request.detect, DetectionStrategy::Symbols);
        assert!(request.compiler_options.is_empty());
    }

    #[test]
    fn device_zero_selects_all() {
        let request = parse(&["-d", "0", "foo.cl"])
            .request(&BuildConfig::default())
            .unwrap();
        assert!(request.devices.is_all());
    }

    #[test]
    fn device_zero_mixed_rejected() {
        for args in [["-d", "0", "-d", "2"], ["-d", "2", "-d", "0"]] {
            let err = parse(&args).request(&BuildConfig::default()).unwrap_err();
            assert!(err.to_string().contains("device 0"));
        }
    }

    #[test]
    fn repeated_device_rejected() {
        let err = parse(&["-d", "1", "-d", "1", "foo.cl"])
            .request(&BuildConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn unparsable_index_rejected() {
        assert!(Cli::try_parse_from(["oclke", "-p", "first", "foo.cl"]).is_err());
    }

    #[test]
    fn options_taken_verbatim() {
        let request = parse(&["-B", "-cl-std=CL1.2 -DN=4", "-c", "-cl-fast-relaxed-math", "k.cl"])
            .request(&BuildConfig::default())
            .unwrap();
        assert_eq!(request.compiler_options, "-cl-std=CL1.2 -DN=4");
        assert_eq!(request.link_options, "-cl-fast-relaxed-math");
    }

    #[test]
    fn command_line_overrides_config() {
        let config = BuildConfig {
            platform: Some(2),
            devices: vec![1, 2],
            compiler_options: Some("-DFROM_FILE".into()),
            source_includes: vec!["file.cl".into()],
            detect: Some(DetectionStrategy::Version),
            ..Default::default()
        };
        let request = parse(&["-p", "1", "-d", "3", "-s", "cli.cl", "k.cl"])
            .request(&config)
            .unwrap();
        assert_eq!(request.platform, Some(1));
        assert_eq!(request.devices, Selection::Indices(vec![3]));
        assert_eq!(request.compiler_options, "-DFROM_FILE");
        assert_eq!(
            request.source_includes,
            vec![PathBuf::from("file.cl"), PathBuf::from("cli.cl")]
        );
        assert_eq!(request.detect, DetectionStrategy::Version);
    }

    #[test]
    fn listing_flags() {
        let cli = parse(&["-L", "-l", "-e"]);
        let listing = cli.listing();
        assert!(listing.platforms && listing.devices && listing.extensions);
        assert!(!cli.request(&BuildConfig::default()).unwrap().has_work());
    }

    #[test]
    fn report_and_detect_values() {
        let cli = parse(&["--report", "json", "--detect", "version", "-vv", "k.cl"]);
        assert_eq!(cli.report, Some(ReportFormat::Json));
        assert_eq!(cli.detect, Some(DetectionStrategy::Version));
        assert_eq!(cli.verbose, 2);
        assert!(Cli::try_parse_from(["oclke", "--detect", "guess"]).is_err());
    }
}
