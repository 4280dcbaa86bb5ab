//! `-L`, `-l` and `-e` listings.

use std::io::{self, Write};

use oclke_build::{DeviceSummary, PlatformSummary};

/// Print the platform table.
pub fn platforms(out: &mut impl Write, platforms: &[PlatformSummary]) -> io::Result<()> {
    let rows: Vec<_> = platforms
        .iter()
        .map(|p| (p.index, p.name.as_str(), p.vendor.as_str()))
        .collect();
    table(out, &rows, "platforms")
}

/// Print the device table of the selected platform.
pub fn devices(out: &mut impl Write, devices: &[DeviceSummary]) -> io::Result<()> {
    let rows: Vec<_> = devices
        .iter()
        .map(|d| (d.index, d.name.as_str(), d.vendor.as_str()))
        .collect();
    table(out, &rows, "devices")
}

/// Print the extension string of the selected platform.
pub fn extensions(out: &mut impl Write, platform: &PlatformSummary) -> io::Result<()> {
    writeln!(out, "Extensions: {}", platform.extensions.trim())
}

fn table(out: &mut impl Write, rows: &[(usize, &str, &str)], what: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, " ID    Name, Vendor")?;
    writeln!(out, "----  {}", "-".repeat(40))?;
    for (index, name, vendor) in rows {
        writeln!(out, " {index:>2}    {name}, {vendor}")?;
    }
    writeln!(out, "\t{} {what} available", rows.len())?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oclke_build::list_platforms;
    use oclke_runtime::fake::{FakeDevice, FakePlatform, FakeRuntime};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn platform_table_rows() {
        let rt = FakeRuntime::new(vec![
            FakePlatform::new("Alpha", "OpenCL 1.2 a", vec![FakeDevice::new("GPU")]),
            FakePlatform::new("Beta", "OpenCL 1.1 b", vec![FakeDevice::new("CPU")]),
        ]);
        let found = list_platforms(&rt).unwrap();
        let text = render(|out| platforms(out, &found));

        assert!(text.contains(" ID    Name, Vendor"));
        assert!(text.contains("  1    Alpha, Fake Vendor"));
        assert!(text.contains("  2    Beta, Fake Vendor"));
        assert!(text.contains("\t2 platforms available"));
    }

    #[test]
    fn empty_device_table() {
        let text = render(|out| devices(out, &[]));
        assert!(text.contains("\t0 devices available"));
    }

    #[test]
    fn extension_line() {
        let rt = FakeRuntime::new(vec![FakePlatform::new("Alpha", "OpenCL 1.2 a", vec![])
            .with_extensions("cl_khr_icd cl_amd_offline_devices ")]);
        let found = list_platforms(&rt).unwrap();
        let text = render(|out| extensions(out, &found[0]));
        assert_eq!(text, "Extensions: cl_khr_icd cl_amd_offline_devices\n");
    }
}
