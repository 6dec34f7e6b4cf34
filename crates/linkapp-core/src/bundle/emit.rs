//! Bundle emission.
//!
//! Every referenced binary is checked before anything touches the output
//! path, and the artifact is written to a temp file next to the target and
//! renamed into place, so a failed run leaves the previous file (or no file).

use super::asm::{GnuAs, Syntax};
use super::model::{ApplicationEntry, Bundle};
use super::symbols::SymbolScheme;
use crate::errors::{BundleError, BundleResult};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Emit the bundle for `entries` to `output_path` with the default symbol
/// scheme and GNU `as` syntax.
pub fn emit(entries: &[ApplicationEntry], binary_dir: &Path, output_path: &Path) -> BundleResult<()> {
    Emitter::new(SymbolScheme::default()).emit(entries, binary_dir, output_path)
}

/// Configurable emitter.
pub struct Emitter<S: Syntax = GnuAs> {
    scheme: SymbolScheme,
    syntax: S,
}

impl Emitter<GnuAs> {
    pub fn new(scheme: SymbolScheme) -> Self {
        Self {
            scheme,
            syntax: GnuAs,
        }
    }
}

impl<S: Syntax> Emitter<S> {
    pub fn with_syntax<T: Syntax>(self, syntax: T) -> Emitter<T> {
        Emitter {
            scheme: self.scheme,
            syntax,
        }
    }

    /// Build and verify the bundle, then render it to a string.
    pub fn render(&self, entries: &[ApplicationEntry], binary_dir: &Path) -> BundleResult<String> {
        let bundle = Bundle::build(entries, binary_dir, &self.scheme);
        verify_binaries(&bundle)?;
        Ok(self.syntax.render(&bundle.directives()))
    }

    pub fn emit(
        &self,
        entries: &[ApplicationEntry],
        binary_dir: &Path,
        output_path: &Path,
    ) -> BundleResult<()> {
        let text = self.render(entries, binary_dir)?;
        write_atomic(output_path, text.as_bytes())?;
        info!(
            apps = entries.len(),
            output = %output_path.display(),
            "bundle written"
        );
        Ok(())
    }
}

/// Confirm every payload's binary exists and can be opened.
pub fn verify_binaries(bundle: &Bundle) -> BundleResult<()> {
    for (payload, name) in bundle.payloads.iter().zip(&bundle.names) {
        let missing = || BundleError::SourceBinaryMissing {
            name: name.clone(),
            path: payload.binary.clone(),
        };
        let file = File::open(&payload.binary).map_err(|_| missing())?;
        let meta = file.metadata().map_err(|_| missing())?;
        if !meta.is_file() {
            return Err(missing());
        }
        debug!(app = %name, binary = %payload.binary.display(), size = meta.len(), "payload verified");
    }
    Ok(())
}

/// Write `bytes` to `path` via a sibling temp file and rename.
/// Missing parent directories are created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> BundleResult<()> {
    let out_err = |source| BundleError::OutputWriteError {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(out_err)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".linkapp-")
        .suffix(".tmp")
        .tempfile_in(&parent)
        .map_err(out_err)?;
    tmp.write_all(bytes).map_err(out_err)?;
    tmp.as_file().sync_all().map_err(out_err)?;
    tmp.persist(path).map_err(|e| out_err(e.error))?;
    Ok(())
}
