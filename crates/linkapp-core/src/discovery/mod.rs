//! Application discovery.
//!
//! Lists the regular files directly inside the source directory, derives a
//! logical application name from each and ranks the names lexicographically.
//! The resulting order is a pure function of the directory's file names.

use crate::bundle::ApplicationEntry;
use crate::errors::{BundleError, BundleResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};


/// Logical application name: `filename` with its final extension removed.
///
/// `hello.elf` -> `hello`, `a.b.c` -> `a.b`, `init` -> `init`,
/// `.hidden` -> `.hidden`. Leading dots never start an extension.
pub fn app_name(filename: &str) -> &str {
    let lead = filename.len() - filename.trim_start_matches('.').len();
    match filename[lead..].rfind('.') {
        Some(dot) => &filename[..lead + dot],
        None => filename,
    }
}

/// Discover the applications in `source_dir`, in index order.
///
/// Several files deriving the same name (`a.bin`, `a.elf`) yield a single
/// entry whose `source_path` is the file that sorts first by full file name;
/// the rest are reported and skipped.
pub fn discover(source_dir: &Path) -> BundleResult<Vec<ApplicationEntry>> {
    let dir_err = |source| BundleError::DirectoryNotFound {
        path: source_dir.to_path_buf(),
        source,
    };

    // name -> (full file name -> path); both levels ordered
    let mut by_name: BTreeMap<String, BTreeMap<String, PathBuf>> = BTreeMap::new();

    for ent in std::fs::read_dir(source_dir).map_err(dir_err)? {
        let ent = ent.map_err(dir_err)?;
        let path = ent.path();

        // Follows symlinks; dangling links and subdirectories are skipped.
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            _ => {
                debug!(path = %path.display(), "skipping non-file entry");
                continue;
            }
        }

        let Some(file_name) = ent.file_name().to_str().map(str::to_owned) else {
            warn!(path = %path.display(), "skipping file with non UTF-8 name");
            continue;
        };

        by_name
            .entry(app_name(&file_name).to_string())
            .or_default()
            .insert(file_name, path);
    }

    let mut entries = Vec::with_capacity(by_name.len());
    for (name, candidates) in by_name {
        let index = entries.len();
        let mut candidates = candidates.into_iter();
        let Some((_, source_path)) = candidates.next() else {
            continue;
        };
        for (shadowed, _) in candidates {
            warn!(
                app = %name,
                chosen = %source_path.display(),
                shadowed = %shadowed,
                "several source files map to one application name"
            );
        }
        debug!(index, app = %name, "discovered application");
        entries.push(ApplicationEntry {
            index,
            name,
            source_path,
        });
    }

    Ok(entries)
}
