//! Assembler rendering of the directive program.

use super::model::{Directive, Value};
use std::fmt::Write as _;

/// Target assembler dialect.
pub trait Syntax {
    /// Render one directive as a line of source, without the newline.
    fn line(&self, directive: &Directive) -> String;

    /// Render a full program. Output always ends in a newline.
    fn render(&self, program: &[Directive]) -> String {
        let mut out = String::new();
        for d in program {
            out.push_str(&self.line(d));
            out.push('\n');
        }
        out
    }
}

/// GNU `as` syntax, as consumed by `global_asm!(include_str!(..))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GnuAs;

impl Syntax for GnuAs {
    fn line(&self, directive: &Directive) -> String {
        match directive {
            Directive::Section(name) => format!("    .section {name}"),
            Directive::Global(sym) => format!("    .globl {sym}"),
            Directive::Align(log2) => format!("    .p2align {log2}"),
            Directive::Label(sym) => format!("{sym}:"),
            Directive::Quad(Value::Literal(v)) => format!("    .quad {v}"),
            Directive::Quad(Value::Symbol(sym)) => format!("    .quad {sym}"),
            Directive::Str(s) => format!("    .string \"{}\"", escape(s.as_bytes())),
            Directive::IncBin(path) => format!(
                "    .incbin \"{}\"",
                escape(path.as_os_str().as_encoded_bytes())
            ),
        }
    }
}

/// Escape a byte string for a GNU `as` string literal.
pub fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out
}
