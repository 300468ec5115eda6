pub mod errors;

pub use errors::{
    DocumentResult, DrProbeError, DrProbeErrorCategory, DrProbeResult, ToolResult,
};

use std::fmt::{Display, Formatter};

/// The four Dr. Probe command-line executables driven by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
    CellMuncher,
    Celslc,
    Msa,
    Wavimg,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::CellMuncher, Tool::Celslc, Tool::Msa, Tool::Wavimg];

    /// Lower-case key used in toolchain configuration files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CellMuncher => "cellmuncher",
            Self::Celslc => "celslc",
            Self::Msa => "msa",
            Self::Wavimg => "wavimg",
        }
    }

    /// Executable name as shipped with the Dr. Probe distribution.
    pub const fn default_executable(self) -> &'static str {
        match self {
            Self::CellMuncher => "CellMuncher",
            Self::Celslc => "celslc",
            Self::Msa => "msa",
            Self::Wavimg => "wavimg",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str().eq_ignore_ascii_case(key.trim()))
    }
}

impl Display for Tool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Tool;

    #[test]
    fn tool_keys_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_key(tool.as_str()), Some(tool));
        }
        assert_eq!(Tool::from_key(" CellMuncher "), Some(Tool::CellMuncher));
        assert_eq!(Tool::from_key("stemsim"), None);
    }

    #[test]
    fn default_executables_match_distribution_names() {
        assert_eq!(Tool::CellMuncher.default_executable(), "CellMuncher");
        assert_eq!(Tool::Wavimg.to_string(), "wavimg");
    }
}
