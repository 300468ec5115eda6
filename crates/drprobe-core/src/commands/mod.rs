//! Argument builders for the Dr. Probe executables and the process runner.

pub mod cellmuncher;
pub mod celslc;
pub mod msa;
pub mod precedence;
pub mod runner;
pub mod toolchain;
pub mod wavimg;

pub use cellmuncher::{Axis, CellMuncherOptions};
pub use celslc::CelslcOptions;
pub use msa::{MsaOptions, MsaSwitch};
pub use precedence::{CELSLC_OVERRIDES, Override, suppressed_options};
pub use runner::{OutputMode, ToolInvocation, ToolOutput, ToolRunner};
pub use toolchain::{BIN_DIR_ENV, ToolchainConfig};
pub use wavimg::{WavimgOptions, WavimgSwitch};

use std::fmt::Display;
use std::path::Path;

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Parent directory of an output path, `None` for bare file names.
pub(crate) fn output_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

pub(crate) fn push_value(args: &mut Vec<String>, flag: &str, value: Option<impl Display>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

pub(crate) fn push_flag(args: &mut Vec<String>, flag: &str, enabled: bool) {
    if enabled {
        args.push(flag.to_string());
    }
}

pub(crate) fn join_values<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
