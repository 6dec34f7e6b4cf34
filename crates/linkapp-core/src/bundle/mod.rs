//! Application bundle: the linkable data section the kernel walks at boot.
//!
//! - [`model`]: entries, the bundle description and the directive program.
//! - [`layout`]: the fixed header / name table / payload layout.
//! - [`asm`]: rendering to assembler source.
//! - [`emit`]: verification and atomic output.

pub mod asm;
pub mod emit;
pub mod layout;
pub mod model;
pub mod symbols;

pub use asm::{GnuAs, Syntax};
pub use emit::{emit, verify_binaries, write_atomic, Emitter};
pub use layout::{resolve_binary_path, DATA_SECTION, PAYLOAD_ALIGN_LOG2};
pub use model::{ApplicationEntry, Bundle, Directive, Payload, Value};
pub use symbols::{SymbolRef, SymbolScheme};
