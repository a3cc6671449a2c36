//! Source generation for specialized op routines.
//!
//! The specializer lowers an op into a [`Routine`] and this module renders it
//! as C-like source text: `#define`s substituted from the canonical enum
//! mapping, a `switch` with one `case` per enumerated name, and a `default`
//! arm holding the failure continuation. External toolchains consume the
//! text; the portable toolchain assembles the structured routine directly.
pub mod routine;

pub use routine::{BinaryOp, DispatchCase, Kernel, Routine};

use thiserror::Error;

use crate::params::ParamDescriptor;
use crate::specialize::Signature;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("op defines no kernel for case `{case}`")]
    MissingKernel { case: String },

    #[error("op defines no unparametrized kernel")]
    MissingBody,
}

/// Rendering knobs for generated source.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Statement block substituted into the `default` arm of a dispatch
    /// switch, mirroring a caller-supplied failure continuation.
    pub fail_block: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            fail_block: "return SPECFORGE_UNKNOWN_PARAM;".to_string(),
        }
    }
}

/// Everything the renderer needs for one specialization.
pub struct EmitInput<'a> {
    pub symbol: &'a str,
    pub signature: &'a Signature,
    pub params: &'a ParamDescriptor,
    pub support: &'a str,
    pub routine: Routine,
}

/// A generated compilation unit: rendered text plus the structured routine
/// it was rendered from.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub symbol: String,
    pub text: String,
    pub support: String,
    pub signature: Signature,
    pub routine: Routine,
}

pub fn emit(input: EmitInput<'_>, options: &EmitOptions) -> SourceUnit {
    let mut text = String::new();
    text.push_str("/* generated by specforge; do not edit */\n");
    if !input.support.is_empty() {
        text.push_str(input.support);
        if !input.support.ends_with('\n') {
            text.push('\n');
        }
    }
    text.push_str("#define SPECFORGE_UNKNOWN_PARAM 1\n");

    if let (Routine::Dispatch { .. }, Some(e)) = (&input.routine, input.params.as_enum()) {
        for (name, value) in e.entries() {
            text.push_str(&format!("#define {name} {value}\n"));
        }
    }

    match &input.routine {
        Routine::Dispatch { cases } => {
            text.push_str(&format!(
                "static int {}(const specforge_value *in, specforge_value *out, int selector) {{\n",
                input.symbol
            ));
            text.push_str("    switch (selector) {\n");
            for case in cases {
                text.push_str(&format!("    case {}:\n", case.name));
                for line in kernel_lines(&case.kernel, input.params) {
                    text.push_str(&format!("        {line}\n"));
                }
                text.push_str("        break;\n");
            }
            text.push_str("    default:\n");
            text.push_str(&format!("        {{ {} }}\n", options.fail_block));
            text.push_str("        break;\n");
            text.push_str("    }\n");
            text.push_str("    return 0;\n");
            text.push_str("}\n");
        }
        Routine::Straight { kernel } => {
            text.push_str(&format!(
                "static int {}(const specforge_value *in, specforge_value *out) {{\n",
                input.symbol
            ));
            for line in kernel_lines(kernel, input.params) {
                text.push_str(&format!("    {line}\n"));
            }
            text.push_str("    return 0;\n");
            text.push_str("}\n");
        }
    }

    SourceUnit {
        symbol: input.symbol.to_string(),
        text,
        support: input.support.to_string(),
        signature: input.signature.clone(),
        routine: input.routine,
    }
}

fn kernel_lines(kernel: &Kernel, params: &ParamDescriptor) -> Vec<String> {
    match kernel {
        Kernel::Binary { op, lhs, rhs } => {
            vec![format!("out[0] = in[{lhs}] {} in[{rhs}];", op.symbol())]
        }
        Kernel::WrapHandle { input } => {
            // new reference taken before the old occupant is released, so a
            // slot overwritten with itself never transits a zero count
            let release = params
                .as_handle()
                .and_then(|h| h.release_hook())
                .unwrap_or("specforge_release");
            vec![
                format!("specforge_retain((void *)in[{input}]);"),
                format!("if (out[0] != NULL) {{ {release}(out[0]); }}"),
                format!("out[0] = (void *)in[{input}];"),
            ]
        }
        Kernel::UnwrapHandle { input } => vec![
            format!("specforge_retain(in[{input}]);"),
            "if (out[0] != NULL) { specforge_release(out[0]); }".to_string(),
            format!("out[0] = in[{input}];"),
        ],
    }
}
