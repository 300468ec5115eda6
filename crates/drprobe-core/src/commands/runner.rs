use super::toolchain::ToolchainConfig;
use crate::domain::{DrProbeError, Tool, ToolResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// One fully built tool call: which executable, its arguments, and the
/// directory that must exist before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    tool: Tool,
    args: Vec<String>,
    output_dir: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(tool: Tool, args: Vec<String>) -> Self {
        Self {
            tool,
            args,
            output_dir: None,
        }
    }

    /// An empty path means the current directory and is ignored.
    pub fn with_output_dir(mut self, output_dir: Option<&Path>) -> Self {
        self.output_dir = output_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf);
        self
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Space-joined command line for logs and dry runs.
    pub fn command_line(&self, program: &Path) -> String {
        std::iter::once(program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// The tool writes straight to this process's terminal.
    #[default]
    Inherit,
    /// Stdout is collected into [`ToolOutput::stdout`] and relayed through `tracing`.
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub tool: Tool,
    pub program: PathBuf,
    pub stdout: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ToolRunner {
    toolchain: ToolchainConfig,
    output_mode: OutputMode,
    working_dir: Option<PathBuf>,
}

impl ToolRunner {
    pub fn new(toolchain: ToolchainConfig) -> Self {
        Self {
            toolchain,
            output_mode: OutputMode::Inherit,
            working_dir: None,
        }
    }

    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    /// Directory the tools run in. Relative output directories are created below it.
    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(working_dir.into());
        self
    }

    pub fn toolchain(&self) -> &ToolchainConfig {
        &self.toolchain
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn run(&self, invocation: &ToolInvocation) -> ToolResult<ToolOutput> {
        let program = self.toolchain.resolve(invocation.tool());
        if let Some(output_dir) = invocation.output_dir() {
            self.create_output_dir(output_dir)?;
        }

        tracing::info!(
            tool = %invocation.tool(),
            command = %invocation.command_line(&program),
            "running Dr. Probe tool"
        );

        let mut command = Command::new(&program);
        command.args(invocation.args());
        if let Some(working_dir) = &self.working_dir {
            command.current_dir(working_dir);
        }

        let spawn_error = |source: std::io::Error| {
            DrProbeError::file_system(
                "IO.TOOL_SPAWN",
                format!(
                    "failed to execute {} command '{}': {}",
                    invocation.tool(),
                    program.display(),
                    source
                ),
            )
        };

        let (status, stdout, stderr) = match self.output_mode {
            OutputMode::Inherit => (command.status().map_err(spawn_error)?, None, None),
            OutputMode::Capture => {
                let output = command
                    .stdin(Stdio::null())
                    .output()
                    .map_err(spawn_error)?;
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                for line in stdout.lines() {
                    tracing::info!(tool = %invocation.tool(), "{}", line);
                }
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                (output.status, Some(stdout), Some(stderr))
            }
        };

        if status.success() {
            return Ok(ToolOutput {
                tool: invocation.tool(),
                program,
                stdout,
            });
        }

        let status_text = describe_status(status);
        tracing::warn!(tool = %invocation.tool(), status = %status_text, "tool exited unsuccessfully");

        let mut message = format!("{} failed with {}", invocation.tool(), status_text);
        for (label, text) in [("stdout", stdout), ("stderr", stderr)] {
            if let Some(text) = text.filter(|text| !text.trim().is_empty()) {
                message.push_str(&format!("\n{}:\n{}", label, text.trim_end()));
            }
        }
        Err(DrProbeError::external_tool("RUN.TOOL_EXIT", message))
    }

    fn create_output_dir(&self, output_dir: &Path) -> ToolResult<()> {
        let target = match &self.working_dir {
            Some(working_dir) if output_dir.is_relative() => working_dir.join(output_dir),
            _ => output_dir.to_path_buf(),
        };
        fs::create_dir_all(&target).map_err(|source| {
            DrProbeError::file_system(
                "IO.TOOL_OUTPUT_DIRECTORY",
                format!(
                    "failed to create output directory '{}': {}",
                    target.display(),
                    source
                ),
            )
        })
    }
}

fn describe_status(status: ExitStatus) -> String {
    status.code().map_or_else(
        || "terminated by signal".to_string(),
        |code| format!("exit code {}", code),
    )
}
