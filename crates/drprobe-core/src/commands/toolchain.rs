use crate::domain::{DrProbeError, DrProbeResult, Tool};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const BIN_DIR_ENV: &str = "DRPROBE_BIN_DIR";

/// Where the Dr. Probe executables live.
///
/// An explicit per-tool entry in `executables` wins. Otherwise the default
/// executable name is joined onto `bin_dir`, and without a `bin_dir` the bare
/// name is left for the operating system to find on `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    #[serde(rename = "binDir", default)]
    pub bin_dir: Option<PathBuf>,
    #[serde(default)]
    pub executables: BTreeMap<String, PathBuf>,
}

impl ToolchainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bin_dir(mut self, bin_dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(bin_dir.into());
        self
    }

    pub fn with_executable(mut self, tool: Tool, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(tool.as_str().to_string(), path.into());
        self
    }

    pub fn from_json_file(path: &Path) -> DrProbeResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| {
            DrProbeError::file_system(
                "IO.TOOLCHAIN_READ",
                format!(
                    "failed to read toolchain config '{}': {}",
                    path.display(),
                    source
                ),
            )
        })?;
        let config: Self = serde_json::from_str(&source).map_err(|source| {
            DrProbeError::malformed_document(
                "PARSE.TOOLCHAIN_JSON",
                format!(
                    "failed to parse toolchain config '{}': {}",
                    path.display(),
                    source
                ),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `DRPROBE_BIN_DIR`. An unset or empty variable leaves `bin_dir` empty.
    pub fn from_env() -> Self {
        Self::from_bin_dir_value(std::env::var_os(BIN_DIR_ENV))
    }

    pub fn from_bin_dir_value(value: Option<OsString>) -> Self {
        Self {
            bin_dir: value.filter(|value| !value.is_empty()).map(PathBuf::from),
            executables: BTreeMap::new(),
        }
    }

    pub fn resolve(&self, tool: Tool) -> PathBuf {
        let explicit = self
            .executables
            .iter()
            .find(|(key, _)| Tool::from_key(key) == Some(tool))
            .map(|(_, path)| path.clone());
        if let Some(path) = explicit {
            return path;
        }

        match &self.bin_dir {
            Some(bin_dir) => bin_dir.join(tool.default_executable()),
            None => PathBuf::from(tool.default_executable()),
        }
    }

    fn validate(&self) -> DrProbeResult<()> {
        match self
            .executables
            .keys()
            .find(|key| Tool::from_key(key).is_none())
        {
            Some(key) => Err(DrProbeError::malformed_document(
                "PARSE.TOOLCHAIN_TOOL",
                format!(
                    "unknown tool '{}' in toolchain config, expected one of: cellmuncher, celslc, msa, wavimg",
                    key
                ),
            )),
            None => Ok(()),
        }
    }
}
