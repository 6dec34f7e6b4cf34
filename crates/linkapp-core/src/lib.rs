//! Embedded application bundle generator.
//!
//! Discovers standalone application binaries and emits a single linkable
//! data section holding an application directory, a name table and the raw
//! binaries, each bracketed by symbols the kernel resolves at boot.
//!
//! ```no_run
//! use linkapp_core::{discover, emit};
//! use std::path::Path;
//!
//! # fn example() -> linkapp_core::BundleResult<()> {
//! let apps = discover(Path::new("../user/src/bin"))?;
//! emit(
//!     &apps,
//!     Path::new("../user/target/riscv64gc-unknown-none-elf/release"),
//!     Path::new("src/link_app.S"),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod image;
pub mod pipeline;

pub use bundle::{emit, ApplicationEntry, Bundle, Emitter, SymbolRef, SymbolScheme};
pub use config::{Config, PathOverrides};
pub use discovery::{app_name, discover};
pub use errors::{BundleError, BundleResult};
pub use image::{AppTable, LinkMap, LinkedImage};

/// Discover applications and emit the bundle described by `config`.
///
/// Returns the entries that were written.
pub fn generate(config: &Config) -> BundleResult<Vec<ApplicationEntry>> {
    let entries = discover(&config.source_dir)?;
    Emitter::new(config.symbols.clone()).emit(&entries, &config.binary_dir, &config.output)?;
    Ok(entries)
}
