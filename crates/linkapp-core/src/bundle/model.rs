//! Bundle data model.

use super::symbols::SymbolRef;
use serde::Serialize;
use std::path::PathBuf;

/// One discovered application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationEntry {
    /// Dense 0-based rank after sorting.
    pub index: usize,
    /// File name with its final extension removed.
    pub name: String,
    /// File the name was derived from.
    pub source_path: PathBuf,
}

/// A 64-bit slot: either a literal or an address the linker fills in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Literal(u64),
    Symbol(SymbolRef),
}

/// One embedded payload and its bracket labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub start: SymbolRef,
    pub end: SymbolRef,
    /// Compiled binary whose bytes are embedded verbatim.
    pub binary: PathBuf,
}

/// The generated artifact, before rendering.
///
/// `starts.len() == names.len() == payloads.len() == count`, and
/// `end_of_last` is present exactly when `count > 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub count_symbol: SymbolRef,
    pub names_symbol: SymbolRef,
    pub starts: Vec<SymbolRef>,
    pub end_of_last: Option<SymbolRef>,
    pub names: Vec<String>,
    pub payloads: Vec<Payload>,
}

impl Bundle {
    pub fn count(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// Syntax-neutral assembler directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Switch to a named section.
    Section(String),
    /// Export a label.
    Global(SymbolRef),
    /// Pad to a `1 << n` byte boundary.
    Align(u32),
    /// Define a label at the current location.
    Label(SymbolRef),
    /// Eight-byte value.
    Quad(Value),
    /// NUL-terminated string.
    Str(String),
    /// Verbatim file contents.
    IncBin(PathBuf),
}
