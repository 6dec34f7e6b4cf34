//! Configuration file (`linkapp.yaml`).
//!
//! | Key | Default |
//! |-----|---------|
//! | `source_dir` | `../user/src/bin` |
//! | `binary_dir` | `../user/target/riscv64gc-unknown-none-elf/release/` |
//! | `output` | `src/link_app.S` |
//! | `symbols` | see [`SymbolScheme`] |
//! | `pipeline` | see [`PipelineConfig`] |
//!
//! Command-line flags and `LINKAPP_*` environment variables override the
//! three generator paths.

use crate::bundle::SymbolScheme;
use crate::errors::{BundleError, BundleResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "linkapp.yaml";

pub const DEFAULT_TARGET: &str = "riscv64gc-unknown-none-elf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory listing one source file per application.
    pub source_dir: PathBuf,
    /// Directory holding the compiled application binaries.
    pub binary_dir: PathBuf,
    /// Generated assembly file.
    pub output: PathBuf,
    pub symbols: SymbolScheme,
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("../user/src/bin"),
            binary_dir: PathBuf::from(format!("../user/target/{DEFAULT_TARGET}/release/")),
            output: PathBuf::from("src/link_app.S"),
            symbols: SymbolScheme::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// External toolchain settings for `linkapp run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Kernel crate root; `cargo build` runs here.
    pub kernel_dir: PathBuf,
    pub cargo: String,
    pub target: String,
    /// Kernel binary name under `target/<target>/release/`.
    pub kernel_name: String,
    pub objcopy: String,
    pub qemu: String,
    pub machine: String,
    /// Firmware passed as `-bios`.
    pub bios: PathBuf,
    /// Physical load address of the flattened kernel, passed through verbatim.
    pub load_address: String,
    /// Optional raw disk attached as virtio-blk.
    pub disk_image: Option<PathBuf>,
    /// Extra arguments appended to the emulator command line.
    pub qemu_args: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            kernel_dir: PathBuf::from("."),
            cargo: "cargo".to_string(),
            target: DEFAULT_TARGET.to_string(),
            kernel_name: "kernel".to_string(),
            objcopy: "rust-objcopy".to_string(),
            qemu: "qemu-system-riscv64".to_string(),
            machine: "virt".to_string(),
            bios: PathBuf::from("../bootloader/rustsbi-qemu.bin"),
            load_address: "0x80200000".to_string(),
            disk_image: None,
            qemu_args: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Linked kernel ELF produced by the build step.
    pub fn kernel_elf(&self) -> PathBuf {
        self.kernel_dir
            .join("target")
            .join(&self.target)
            .join("release")
            .join(&self.kernel_name)
    }

    /// Flattened image produced by the flatten step.
    pub fn kernel_bin(&self) -> PathBuf {
        self.kernel_elf().with_extension("bin")
    }
}

/// Per-invocation overrides for the generator paths.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub source_dir: Option<PathBuf>,
    pub binary_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read if present, otherwise built-in defaults are used.
    pub fn load(path: Option<&Path>) -> BundleResult<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            BundleError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml(&content)
            .map_err(|e| BundleError::config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> BundleResult<Self> {
        // An empty document means "all defaults".
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| BundleError::config(e.to_string()))?;
        config.symbols.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: PathOverrides) -> Self {
        if let Some(p) = overrides.source_dir {
            self.source_dir = p;
        }
        if let Some(p) = overrides.binary_dir {
            self.binary_dir = p;
        }
        if let Some(p) = overrides.output {
            self.output = p;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_user_tree() {
        let c = Config::default();
        assert_eq!(c.source_dir, PathBuf::from("../user/src/bin"));
        assert_eq!(
            c.binary_dir,
            PathBuf::from("../user/target/riscv64gc-unknown-none-elf/release/")
        );
        assert_eq!(c.output, PathBuf::from("src/link_app.S"));
        assert_eq!(
            c.pipeline.kernel_elf(),
            PathBuf::from("./target/riscv64gc-unknown-none-elf/release/kernel")
        );
        assert_eq!(
            c.pipeline.kernel_bin(),
            PathBuf::from("./target/riscv64gc-unknown-none-elf/release/kernel.bin")
        );
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let c = Config::from_yaml(
            "source_dir: apps/bin\nsymbols:\n  payload_prefix: payload\npipeline:\n  machine: sifive_u\n",
        )
        .unwrap();
        assert_eq!(c.source_dir, PathBuf::from("apps/bin"));
        assert_eq!(c.output, Config::default().output);
        assert_eq!(c.symbols.payload_prefix, "payload");
        assert_eq!(c.symbols.count, "_num_app");
        assert_eq!(c.pipeline.machine, "sifive_u");
        assert_eq!(c.pipeline.qemu, "qemu-system-riscv64");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_yaml("sourcedir: typo\n").unwrap_err();
        assert!(matches!(err, BundleError::Config { .. }));
        assert!(err.to_string().contains("sourcedir"));
    }

    #[test]
    fn invalid_symbol_is_rejected() {
        assert!(Config::from_yaml("symbols:\n  count: \"9lives\"\n").is_err());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_yaml("\n").unwrap(), Config::default());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, BundleError::Config { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("linkapp.yaml");
        std::fs::write(&path, "output: gen/apps.S\npipeline:\n  disk_image: fs.img\n").unwrap();
        let c = Config::load(Some(&path)).unwrap();
        assert_eq!(c.output, PathBuf::from("gen/apps.S"));
        assert_eq!(c.pipeline.disk_image, Some(PathBuf::from("fs.img")));
    }

    #[test]
    fn overrides_win() {
        let c = Config::default().with_overrides(PathOverrides {
            source_dir: None,
            binary_dir: Some(PathBuf::from("out/release")),
            output: Some(PathBuf::from("x.S")),
        });
        assert_eq!(c.source_dir, Config::default().source_dir);
        assert_eq!(c.binary_dir, PathBuf::from("out/release"));
        assert_eq!(c.output, PathBuf::from("x.S"));
    }
}
