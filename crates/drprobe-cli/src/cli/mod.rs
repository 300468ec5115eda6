mod commands;
mod helpers;

use clap::Parser;
use drprobe_core::domain::DrProbeError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", error.diagnostic_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("drprobe-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "drprobe-rs",
    version,
    about = "Dr. Probe parameter files and command-line tools"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Load a parameter file and print a JSON summary
    Check(commands::CheckArgs),
    /// Load a parameter file and write it back with regenerated comments
    Normalize(commands::NormalizeArgs),
    /// Write a parameter file holding the default values
    Template(commands::TemplateArgs),
    /// Print a slice-id sequence, one id per line
    Slices(commands::SlicesArgs),
    /// Run wavimg on a parameter file
    RunWavimg(commands::RunWavimgArgs),
    /// Run msa on a parameter file
    RunMsa(commands::RunMsaArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Check(args) => commands::run_check_command(args),
        CliCommand::Normalize(args) => commands::run_normalize_command(args),
        CliCommand::Template(args) => commands::run_template_command(args),
        CliCommand::Slices(args) => commands::run_slices_command(args),
        CliCommand::RunWavimg(args) => commands::run_wavimg_command(args),
        CliCommand::RunMsa(args) => commands::run_msa_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Core(#[from] DrProbeError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_drprobe_error(&self) -> DrProbeError {
        match self {
            Self::Usage(message) => {
                DrProbeError::malformed_document("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Core(error) => error.clone(),
            Self::Internal(error) => DrProbeError::file_system("IO.CLI", format!("{error:#}")),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.as_drprobe_error().exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        self.as_drprobe_error().diagnostic_line()
    }
}
