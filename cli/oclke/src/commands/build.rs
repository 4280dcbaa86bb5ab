//! The build run: listings, platform and device selection, compile, write.

use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;
use oclke_build::{list_platforms, BuildError, BuildReport, BuildRequest, PlatformSession};
use oclke_runtime::ClApi;

use super::list;

/// Which listings were asked for on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Listing {
    pub platforms: bool,
    pub devices: bool,
    pub extensions: bool,
}

impl Listing {
    fn needs_platform(self) -> bool {
        self.devices || self.extensions
    }
}

/// Format of the report printed after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Run the listings and the build described by `request`.
///
/// Listings alone are a complete run. Without a listing and without any
/// module to build the run fails with "no kernel to compile".
pub fn run(
    api: &dyn ClApi,
    request: &BuildRequest,
    listing: Listing,
    report: Option<ReportFormat>,
    out: &mut impl Write,
) -> Result<()> {
    if listing.platforms {
        list::platforms(out, &list_platforms(api)?)?;
    }
    if !request.has_work() && !listing.needs_platform() {
        if listing.platforms {
            return Ok(());
        }
        return Err(BuildError::NothingToBuild.into());
    }

    let session = PlatformSession::open(api, request)?;
    let platform = session.platform();
    writeln!(out, "\nPlatform {} selected: {}", platform.index, platform.name)?;
    if listing.extensions {
        list::extensions(out, platform)?;
    }
    if listing.devices {
        list::devices(out, session.devices())?;
    }
    if !request.has_work() {
        return Ok(());
    }

    let target = session.select(&request.devices)?;
    for device in target.devices() {
        writeln!(out, "Device {} selected: {}", device.index, device.name)?;
    }

    let module = request
        .kernel
        .as_ref()
        .or(request.output.as_ref())
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    writeln!(out, "Compiling '{module}'...")?;
    let built = target
        .build(request)
        .with_context(|| format!("building '{module}'"))?;

    for output in &built.outputs {
        writeln!(out, "{}: kernel binary created", output.path)?;
    }
    match report {
        Some(format) => print_report(out, &built, format)?,
        None => {
            for kernel in built.kernels.iter().flatten() {
                writeln!(out, "{kernel}")?;
            }
        }
    }
    Ok(())
}

fn print_report(out: &mut impl Write, report: &BuildReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Text => {
            writeln!(out)?;
            write!(out, "{report}")?;
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report).context("serializing build report")?;
            writeln!(out, "{json}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oclke_build::Selection;
    use oclke_runtime::fake::{FakeKernel, FakeRuntime};
    use std::path::Path;

    const KERNEL: &str = "__kernel void fill(__global int* p) { p[0] = 1; }";

    fn kernel_request(dir: &Path) -> BuildRequest {
        let path = dir.join("fill.cl");
        std::fs::write(&path, KERNEL).unwrap();
        BuildRequest {
            kernel: Some(path),
            ..Default::default()
        }
    }

    fn capture(
        rt: &FakeRuntime,
        request: &BuildRequest,
        listing: Listing,
        report: Option<ReportFormat>,
    ) -> (Result<()>, String) {
        let mut buf = Vec::new();
        let result = run(rt, request, listing, report, &mut buf);
        (result, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn nothing_to_do_fails() {
        let rt = FakeRuntime::single_platform("OpenCL 1.2 fake", &["GPU"]);
        let (result, _) = capture(&rt, &BuildRequest::default(), Listing::default(), None);
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "no kernel to compile");
        assert!(rt.calls().is_empty());
    }

    #[test]
    fn platform_listing_alone_succeeds() {
        let rt = FakeRuntime::single_platform("OpenCL 1.2 fake", &["GPU"]);
        let listing = Listing {
            platforms: true,
            ..Default::default()
        };
        let (result, text) = capture(&rt, &BuildRequest::default(), listing, None);
        assert!(result.is_ok());
        assert!(text.contains("1    Fake Platform, Fake Vendor"));
        assert!(!text.contains("selected"));
        assert_eq!(rt.live_contexts(), 0);
    }

    #[test]
    fn device_listing_opens_platform() {
        let rt = FakeRuntime::single_platform("OpenCL 1.2 fake", &["GPU", "CPU"]);
        let listing = Listing {
            devices: true,
            extensions: true,
            ..Default::default()
        };
        let (result, text) = capture(&rt, &BuildRequest::default(), listing, None);
        assert!(result.is_ok());
        assert!(text.contains("Platform 1 selected: Fake Platform"));
        assert!(text.contains("Extensions: cl_khr_icd"));
        assert!(text.contains("  2    CPU, Fake Vendor"));
        assert!(text.contains("\t2 devices available"));
        assert_eq!(rt.live_contexts(), 0);
    }

    #[test]
    fn build_prints_progress() {
        let dir = tempfile::tempdir().unwrap();
        let rt = FakeRuntime::single_platform("OpenCL 1.2 fake", &["GPU", "CPU"]);
        let request = BuildRequest {
            devices: Selection::All,
            ..kernel_request(dir.path())
        };
        let (result, text) = capture(&rt, &request, Listing::default(), None);
        result.unwrap();

        assert!(text.contains("Device 1 selected: GPU"));
        assert!(text.contains("Device 2 selected: CPU"));
        assert!(text.contains("Compiling '"));
        let gpu = dir.path().join("fill_GPU.bin");
        assert!(text.contains(&format!("{}: kernel binary created", gpu.display())));
        assert_eq!(std::fs::read(&gpu).unwrap(), FakeRuntime::binary_for("GPU"));
    }

    #[test]
    fn json_report() {
        let dir = tempfile::tempdir().unwrap();
        let rt = FakeRuntime::single_platform("OpenCL 1.2 fake", &["GPU"]);
        let request = kernel_request(dir.path());
        let (result, text) = capture(&rt, &request, Listing::default(), Some(ReportFormat::Json));
        result.unwrap();

        let start = text.find('{').unwrap();
        let value: serde_json::Value = serde_json::from_str(&text[start..]).unwrap();
        assert_eq!(value["tier"], "extended");
        assert_eq!(value["outputs"][0]["device_name"], "GPU");
    }

    #[test]
    fn text_report() {
        let dir = tempfile::tempdir().unwrap();
        let rt = FakeRuntime::single_platform("OpenCL 1.1 fake", &["GPU"]).basic();
        let request = kernel_request(dir.path());
        let (result, text) = capture(&rt, &request, Listing::default(), Some(ReportFormat::Text));
        result.unwrap();
        assert!(text.contains("=== Build Report ==="));
    }

    #[test]
    fn introspection_prints_signatures() {
        let dir = tempfile::tempdir().unwrap();
        let rt = FakeRuntime::single_platform("OpenCL 1.2 fake", &["GPU"]).with_kernels(vec![
            FakeKernel {
                name: "fill".into(),
                attributes: String::new(),
                num_args: 1,
                args: None,
            },
        ]);
        let request = BuildRequest {
            introspect: true,
            ..kernel_request(dir.path())
        };
        let (result, text) = capture(&rt, &request, Listing::default(), None);
        result.unwrap();
        assert!(text.contains("__kernel void fill(...)"));
    }

    #[test]
    fn build_failure_names_module() {
        let dir = tempfile::tempdir().unwrap();
        let rt = FakeRuntime::single_platform("OpenCL 1.1 fake", &["GPU"])
            .basic()
            .with_build_failure("error: expected ';'");
        let request = kernel_request(dir.path());
        let (result, _) = capture(&rt, &request, Listing::default(), None);
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.starts_with("building '"));
        assert!(message.contains("expected ';'"));
    }
}
