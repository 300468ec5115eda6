use super::CliError;
use anyhow::Context;
use drprobe_core::commands::{OutputMode, ToolRunner, ToolchainConfig};
use drprobe_core::prm::{PrmKind, SliceSampling};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(super) enum KindArg {
    Msa,
    Wavimg,
}

impl From<KindArg> for PrmKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Msa => PrmKind::Msa,
            KindArg::Wavimg => PrmKind::Wavimg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(super) enum SliceModeArg {
    Cyclic,
    Stored,
    Random,
}

pub(super) fn slice_sampling(mode: SliceModeArg, seed: Option<u64>) -> SliceSampling {
    match mode {
        SliceModeArg::Cyclic => SliceSampling::Cyclic,
        SliceModeArg::Stored => SliceSampling::Stored,
        SliceModeArg::Random => SliceSampling::Randomized { seed },
    }
}

/// An explicit `--kind` wins; otherwise the first line of the file decides.
pub(super) fn resolve_kind(path: &Path, explicit: Option<KindArg>) -> Result<PrmKind, CliError> {
    if let Some(kind) = explicit {
        return Ok(kind.into());
    }
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read parameter file '{}'", path.display()))?;
    let kind = PrmKind::detect(&source);
    tracing::debug!(path = %path.display(), %kind, "detected parameter file kind");
    Ok(kind)
}

pub(super) fn load_toolchain(path: Option<&Path>) -> Result<ToolchainConfig, CliError> {
    match path {
        Some(path) => Ok(ToolchainConfig::from_json_file(path)?),
        None => Ok(ToolchainConfig::from_env()),
    }
}

pub(super) fn tool_runner(toolchain: ToolchainConfig, capture: bool) -> ToolRunner {
    let output_mode = if capture {
        OutputMode::Capture
    } else {
        OutputMode::Inherit
    };
    ToolRunner::new(toolchain).with_output_mode(output_mode)
}

pub(super) fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).context("failed to serialize JSON summary")?;
    println!("{}", rendered);
    Ok(())
}
