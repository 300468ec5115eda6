use super::CliError;
use super::helpers::*;
use drprobe_core::commands::{MsaOptions, WavimgOptions};
use drprobe_core::prm::{
    MsaPrm, PrmKind, SliceSampling, WavimgPrm, cyclic_slice_ids, randomized_slice_ids,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct CheckArgs {
    /// Parameter file to load
    pub(super) file: PathBuf,

    /// File variant; detected from the first line when omitted
    #[arg(long, value_enum)]
    pub(super) kind: Option<KindArg>,
}

#[derive(clap::Args)]
pub(super) struct NormalizeArgs {
    /// Parameter file to load
    pub(super) file: PathBuf,

    /// File variant; detected from the first line when omitted
    #[arg(long, value_enum)]
    pub(super) kind: Option<KindArg>,

    /// Destination; the input file is rewritten in place when omitted
    #[arg(long)]
    pub(super) out: Option<PathBuf>,

    /// Slice-id block of msa files
    #[arg(long, value_enum, default_value = "stored")]
    pub(super) slices: SliceModeArg,

    /// Seed for `--slices random`
    #[arg(long)]
    pub(super) seed: Option<u64>,
}

#[derive(clap::Args)]
pub(super) struct TemplateArgs {
    /// File variant to write
    #[arg(value_enum)]
    pub(super) kind: KindArg,

    /// Destination path
    pub(super) out: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct SlicesArgs {
    /// Length of the sequence
    #[arg(long)]
    pub(super) total: usize,

    /// Number of distinct slice files
    #[arg(long)]
    pub(super) available: usize,

    /// Randomized contiguous sampling instead of cyclic
    #[arg(long)]
    pub(super) random: bool,

    /// Seed for `--random`
    #[arg(long)]
    pub(super) seed: Option<u64>,
}

#[derive(clap::Args)]
pub(super) struct RunWavimgArgs {
    /// wavimg parameter file
    #[arg(long)]
    pub(super) prm: PathBuf,

    /// Output file overriding the one named in the parameter file
    #[arg(long)]
    pub(super) out: Option<PathBuf>,

    /// Capture the tool output and relay it through the log
    #[arg(long)]
    pub(super) capture: bool,

    /// JSON toolchain configuration
    #[arg(long)]
    pub(super) toolchain: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct RunMsaArgs {
    /// msa parameter file
    #[arg(long)]
    pub(super) prm: PathBuf,

    /// Output file
    #[arg(long)]
    pub(super) out: PathBuf,

    /// Capture the tool output and relay it through the log
    #[arg(long)]
    pub(super) capture: bool,

    /// JSON toolchain configuration
    #[arg(long)]
    pub(super) toolchain: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckSummary<'a, T: Serialize> {
    path: String,
    kind: PrmKind,
    number_of_aberrations: usize,
    document: &'a T,
}

pub(super) fn run_check_command(args: CheckArgs) -> Result<i32, CliError> {
    let kind = resolve_kind(&args.file, args.kind)?;
    let path = args.file.display().to_string();
    match kind {
        PrmKind::Msa => {
            let document = MsaPrm::load(&args.file)?;
            print_json(&CheckSummary {
                path,
                kind,
                number_of_aberrations: document.number_of_aberrations(),
                document: &document,
            })?;
        }
        PrmKind::Wavimg => {
            let document = WavimgPrm::load(&args.file)?;
            print_json(&CheckSummary {
                path,
                kind,
                number_of_aberrations: document.number_of_aberrations(),
                document: &document,
            })?;
        }
    }
    Ok(0)
}

pub(super) fn run_normalize_command(args: NormalizeArgs) -> Result<i32, CliError> {
    let kind = resolve_kind(&args.file, args.kind)?;
    let destination = args.out.as_ref().unwrap_or(&args.file);
    match kind {
        PrmKind::Msa => MsaPrm::load(&args.file)?
            .save_with(destination, slice_sampling(args.slices, args.seed))?,
        PrmKind::Wavimg => WavimgPrm::load(&args.file)?.save(destination)?,
    }
    println!("Wrote {} parameter file {}", kind, destination.display());
    Ok(0)
}

pub(super) fn run_template_command(args: TemplateArgs) -> Result<i32, CliError> {
    let kind = PrmKind::from(args.kind);
    match kind {
        PrmKind::Msa => MsaPrm::default().save_with(&args.out, SliceSampling::Cyclic)?,
        PrmKind::Wavimg => WavimgPrm::default().save(&args.out)?,
    }
    println!("Wrote {} parameter file {}", kind, args.out.display());
    Ok(0)
}

pub(super) fn run_slices_command(args: SlicesArgs) -> Result<i32, CliError> {
    let ids = if args.random {
        randomized_slice_ids(args.total, args.available, args.seed)?
    } else {
        cyclic_slice_ids(args.total, args.available)?
    };
    for id in ids {
        println!("{}", id);
    }
    Ok(0)
}

pub(super) fn run_wavimg_command(args: RunWavimgArgs) -> Result<i32, CliError> {
    let runner = tool_runner(load_toolchain(args.toolchain.as_deref())?, args.capture);
    let mut options = WavimgOptions::new(&args.prm);
    if let Some(out) = args.out {
        options = options.output(out);
    }
    let output = runner.run(&options.invocation_in(runner.working_dir())?)?;
    println!("{} finished ({})", output.tool, output.program.display());
    Ok(0)
}

pub(super) fn run_msa_command(args: RunMsaArgs) -> Result<i32, CliError> {
    let runner = tool_runner(load_toolchain(args.toolchain.as_deref())?, args.capture);
    let output = runner.run(&MsaOptions::new(&args.prm, &args.out).invocation())?;
    println!("{} finished ({})", output.tool, output.program.display());
    Ok(0)
}
