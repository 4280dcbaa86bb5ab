//! Output file names.

use crate::error::{BuildError, Result};

/// Suffix stripped from a kernel source name for single-device output.
pub const SOURCE_SUFFIX: &str = ".cl";

/// One output name per device.
///
/// With one device an explicit name is used verbatim; otherwise a `.cl`
/// input becomes `.bin` and anything else gets `.bin` appended. With several
/// devices the base (explicit name or input) is cut at its last `.` and the
/// device name, spaces turned into `_`, is appended.
pub fn output_names(
    input: Option<&str>,
    explicit: Option<&str>,
    devices: &[String],
) -> Result<Vec<String>> {
    let base = explicit.or(input).ok_or(BuildError::MissingOutputName)?;
    if let [_] = devices {
        return Ok(vec![match explicit {
            Some(name) => name.to_string(),
            None => single_device_name(base),
        }]);
    }
    let stem = strip_extension(base);
    Ok(devices
        .iter()
        .map(|device| format!("{stem}_{}.bin", device.replace(' ', "_")))
        .collect())
}

/// Names that occur more than once, each reported once, in first-seen order.
pub(crate) fn colliding_names(names: &[String]) -> Vec<&str> {
    let mut repeated: Vec<&str> = Vec::new();
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) && !repeated.contains(&name.as_str()) {
            repeated.push(name);
        }
    }
    repeated
}

fn single_device_name(input: &str) -> String {
    match input.strip_suffix(SOURCE_SUFFIX) {
        Some(stem) if !stem.is_empty() => format!("{stem}.bin"),
        _ => format!("{input}.bin"),
    }
}

/// `name` up to its last `.`, looked for in the final path component only.
fn strip_extension(name: &str) -> &str {
    let start = name.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match name[start..].rfind('.') {
        Some(dot) if dot > 0 => &name[..start + dot],
        _ => name,
    }
}
