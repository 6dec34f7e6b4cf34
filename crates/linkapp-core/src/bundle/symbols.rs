//! Named, linker-resolved references.
//!
//! The generator never writes a numeric address into the bundle. Every
//! address slot holds a [`SymbolRef`], and every payload boundary is a label
//! with the same name, so the header and the payload brackets agree by
//! construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to an address that the assembler/linker resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SymbolRef(String);

impl SymbolRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Naming rule for the bundle's exported symbols.
///
/// The defaults are the names the kernel loader links against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymbolScheme {
    /// Header symbol holding the application count.
    pub count: String,
    /// Start of the name table.
    pub names: String,
    /// Prefix of the per-payload bracket labels (`<prefix>_<i>_start`).
    pub payload_prefix: String,
}

/// The kernel loader's names: `_num_app`, `_app_names`, `app_<i>_start`.
/// A `payload_prefix` of `payload` gives `payload_<i>_start` / `payload_<i>_end`.
impl Default for SymbolScheme {
    fn default() -> Self {
        Self {
            count: "_num_app".to_string(),
            names: "_app_names".to_string(),
            payload_prefix: "app".to_string(),
        }
    }
}

impl SymbolScheme {
    pub fn count_symbol(&self) -> SymbolRef {
        SymbolRef::new(self.count.as_str())
    }

    pub fn names_symbol(&self) -> SymbolRef {
        SymbolRef::new(self.names.as_str())
    }

    pub fn payload_start(&self, index: usize) -> SymbolRef {
        SymbolRef::new(format!("{}_{}_start", self.payload_prefix, index))
    }

    pub fn payload_end(&self, index: usize) -> SymbolRef {
        SymbolRef::new(format!("{}_{}_end", self.payload_prefix, index))
    }

    /// Reject names the assembler would not accept as a plain label.
    pub fn validate(&self) -> crate::BundleResult<()> {
        for (field, value) in [
            ("count", &self.count),
            ("names", &self.names),
            ("payload_prefix", &self.payload_prefix),
        ] {
            if !is_symbol_name(value) {
                return Err(crate::BundleError::config(format!(
                    "symbols.{field}: '{value}' is not a valid symbol name"
                )));
            }
        }
        if self.count == self.names {
            return Err(crate::BundleError::config(
                "symbols.count and symbols.names must differ",
            ));
        }
        Ok(())
    }
}

fn is_symbol_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '$')
}
