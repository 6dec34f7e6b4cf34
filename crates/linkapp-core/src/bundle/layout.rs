//! Bundle layout.
//!
//! Lowers discovered entries into the fixed directive sequence the kernel
//! loader parses:
//!
//! ```text
//! <count>:  .quad N
//!           .quad <prefix>_0_start ... <prefix>_{N-1}_start
//!           .quad <prefix>_{N-1}_end          (only when N > 0)
//! <names>:  .string "name_0" ... "name_{N-1}"
//!           for each i, 8-byte aligned:
//! <prefix>_i_start: .incbin "<binary_dir>/name_i"
//! <prefix>_i_end:
//! ```

use super::model::{ApplicationEntry, Bundle, Directive, Payload, Value};
use super::symbols::SymbolScheme;
use std::path::{Path, PathBuf};

/// Section every part of the bundle lives in.
pub const DATA_SECTION: &str = ".data";

/// log2 of the alignment applied to the header and to every payload.
pub const PAYLOAD_ALIGN_LOG2: u32 = 3;

/// Location of the compiled binary for an application name.
///
/// Separators are normalized so that `dir`, `dir/` and `dir//` all resolve
/// to the same path.
pub fn resolve_binary_path(binary_dir: &Path, name: &str) -> PathBuf {
    let dir: PathBuf = binary_dir.components().collect();
    dir.join(name)
}

impl Bundle {
    /// Assemble the bundle description for `entries` (already in index order).
    pub fn build(entries: &[ApplicationEntry], binary_dir: &Path, scheme: &SymbolScheme) -> Self {
        let payloads: Vec<Payload> = entries
            .iter()
            .map(|e| Payload {
                start: scheme.payload_start(e.index),
                end: scheme.payload_end(e.index),
                binary: resolve_binary_path(binary_dir, &e.name),
            })
            .collect();

        Self {
            count_symbol: scheme.count_symbol(),
            names_symbol: scheme.names_symbol(),
            starts: payloads.iter().map(|p| p.start.clone()).collect(),
            end_of_last: payloads.last().map(|p| p.end.clone()),
            names: entries.iter().map(|e| e.name.clone()).collect(),
            payloads,
        }
    }

    /// Directive program in emission order.
    pub fn directives(&self) -> Vec<Directive> {
        let mut out = Vec::with_capacity(8 + self.count() * 8);

        out.push(Directive::Section(DATA_SECTION.to_string()));
        out.push(Directive::Align(PAYLOAD_ALIGN_LOG2));
        out.push(Directive::Global(self.count_symbol.clone()));
        out.push(Directive::Label(self.count_symbol.clone()));
        out.push(Directive::Quad(Value::Literal(self.count() as u64)));
        for start in &self.starts {
            out.push(Directive::Quad(Value::Symbol(start.clone())));
        }
        if let Some(end) = &self.end_of_last {
            out.push(Directive::Quad(Value::Symbol(end.clone())));
        }

        out.push(Directive::Global(self.names_symbol.clone()));
        out.push(Directive::Label(self.names_symbol.clone()));
        for name in &self.names {
            out.push(Directive::Str(name.clone()));
        }

        for payload in &self.payloads {
            out.push(Directive::Section(DATA_SECTION.to_string()));
            out.push(Directive::Global(payload.start.clone()));
            out.push(Directive::Global(payload.end.clone()));
            out.push(Directive::Align(PAYLOAD_ALIGN_LOG2));
            out.push(Directive::Label(payload.start.clone()));
            out.push(Directive::IncBin(payload.binary.clone()));
            out.push(Directive::Label(payload.end.clone()));
        }

        out
    }
}
