//! Kernel build pipeline: generate -> build -> flatten -> launch.
//!
//! Each external step is described as a [`CommandSpec`] and executed by a
//! [`CommandRunner`]. Steps run in order and the first failure stops the
//! pipeline.

use crate::config::Config;
use crate::errors::{BundleError, BundleResult};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Build,
    Flatten,
    Launch,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Build => "build",
            Step::Flatten => "flatten",
            Step::Launch => "launch",
        })
    }
}

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub step: Step,
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    fn new(step: Step, program: &str) -> Self {
        Self {
            step,
            program: program.to_string(),
            args: Vec::new(),
            cwd: None,
        }
    }

    fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Shell-like rendering for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for a in &self.args {
            line.push(' ');
            line.push_str(&a.to_string_lossy());
        }
        line
    }
}

/// Executes external commands.
pub trait CommandRunner {
    fn run(&mut self, spec: &CommandSpec) -> BundleResult<()>;
}

/// Runs commands as child processes, inheriting stdio.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> BundleResult<()> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }

        let status = cmd.status().map_err(|source| BundleError::StepSpawn {
            step: spec.step.to_string(),
            source,
        })?;
        if !status.success() {
            return Err(BundleError::StepFailed {
                step: spec.step.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Which optional stages to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub generate: bool,
    pub launch: bool,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            generate: true,
            launch: true,
        }
    }
}

pub struct Pipeline<'a> {
    config: &'a Config,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// `cargo build --release --target <target>` in the kernel directory.
    pub fn build_command(&self) -> CommandSpec {
        let p = &self.config.pipeline;
        let mut spec = CommandSpec::new(Step::Build, &p.cargo)
            .arg("build")
            .arg("--release")
            .arg("--target")
            .arg(&p.target);
        spec.cwd = Some(p.kernel_dir.clone());
        spec
    }

    /// `<objcopy> --strip-all <elf> -O binary <bin>`.
    pub fn flatten_command(&self) -> CommandSpec {
        let p = &self.config.pipeline;
        CommandSpec::new(Step::Flatten, &p.objcopy)
            .arg("--strip-all")
            .arg(p.kernel_elf())
            .arg("-O")
            .arg("binary")
            .arg(p.kernel_bin())
    }

    /// Emulator invocation loading the flat kernel at its load address.
    pub fn launch_command(&self) -> CommandSpec {
        let p = &self.config.pipeline;

        let mut loader = OsString::from("loader,file=");
        loader.push(p.kernel_bin());
        loader.push(",addr=");
        loader.push(&p.load_address);

        let mut spec = CommandSpec::new(Step::Launch, &p.qemu)
            .arg("-machine")
            .arg(&p.machine)
            .arg("-nographic")
            .arg("-bios")
            .arg(&p.bios)
            .arg("-device")
            .arg(loader);

        if let Some(disk) = &p.disk_image {
            let mut drive = OsString::from("file=");
            drive.push(disk);
            drive.push(",if=none,format=raw,id=x0");
            spec = spec
                .arg("-drive")
                .arg(drive)
                .arg("-device")
                .arg("virtio-blk-device,drive=x0,bus=virtio-mmio-bus.0");
        }

        for extra in &p.qemu_args {
            spec = spec.arg(extra);
        }
        spec
    }

    /// Run the plan. Generation happens before any external tool starts.
    pub fn run<R: CommandRunner>(&self, runner: &mut R, plan: Plan) -> BundleResult<()> {
        if plan.generate {
            crate::generate(self.config)?;
        }

        let mut steps = vec![self.build_command(), self.flatten_command()];
        if plan.launch {
            steps.push(self.launch_command());
        }

        for spec in &steps {
            info!(step = %spec.step, command = %spec.command_line(), "running");
            runner.run(spec)?;
        }
        Ok(())
    }
}
