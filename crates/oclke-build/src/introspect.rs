//! Kernel signatures of a finished program.

use std::fmt;

use oclke_runtime::{KernelArgInfo, Program};
use serde::Serialize;

use crate::error::Result;

/// One kernel as the runtime describes it.
#[derive(Debug, Clone, Serialize)]
pub struct KernelSignature {
    pub name: String,
    /// Attribute string as reported, e.g. `reqd_work_group_size(64,1,1)`.
    pub attributes: String,
    pub num_args: u32,
    /// `None` when the runtime keeps no argument metadata.
    pub args: Option<Vec<KernelArgInfo>>,
}

impl fmt::Display for KernelSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__kernel ")?;
        if !self.attributes.trim().is_empty() {
            write!(f, "__attribute__(({})) ", self.attributes.trim())?;
        }
        write!(f, "void {}(", self.name)?;
        match &self.args {
            Some(args) => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{}", args.join(", "))?;
            }
            None => write!(f, "...")?,
        }
        write!(f, ")")
    }
}

/// Describe every kernel in `program`.
pub fn introspect(program: &Program<'_>) -> Result<Vec<KernelSignature>> {
    let mut signatures = Vec::new();
    for kernel in program.kernels()? {
        let num_args = kernel.num_args()?;
        let mut args = Vec::with_capacity(num_args as usize);
        let mut available = true;
        for index in 0..num_args {
            match kernel.arg_info(index)? {
                Some(info) => args.push(info),
                None => {
                    available = false;
                    break;
                }
            }
        }
        signatures.push(KernelSignature {
            name: kernel.name()?,
            attributes: kernel.attributes()?,
            num_args,
            args: available.then_some(args),
        });
    }
    Ok(signatures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oclke_runtime::{AccessQualifier, AddressQualifier, TypeQualifiers};

    #[test]
    fn signature_display() {
        let sig = KernelSignature {
            name: "scale".into(),
            attributes: "reqd_work_group_size(64,1,1)".into(),
            num_args: 2,
            args: Some(vec![
                KernelArgInfo {
                    address: AddressQualifier::Global,
                    access: AccessQualifier::None,
                    type_qualifiers: TypeQualifiers::default(),
                    type_name: "float*".into(),
                    name: "data".into(),
                },
                KernelArgInfo {
                    address: AddressQualifier::Private,
                    access: AccessQualifier::None,
                    type_qualifiers: TypeQualifiers::CONST,
                    type_name: "float".into(),
                    name: "factor".into(),
                },
            ]),
        };
        assert_eq!(
            sig.to_string(),
            "__kernel __attribute__((reqd_work_group_size(64,1,1))) void scale(__global float* data, const float factor)"
        );
    }

    #[test]
    fn missing_metadata_elides_arguments() {
        let sig = KernelSignature {
            name: "k".into(),
            attributes: String::new(),
            num_args: 3,
            args: None,
        };
        assert_eq!(sig.to_string(), "__kernel void k(...)");
    }
}
