use super::runner::ToolInvocation;
use super::{output_parent, path_arg, push_value};
use crate::domain::Tool;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Slash-prefixed `msa` switches, declared in the order they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MsaSwitch {
    /// Coherent CTEM wave calculation instead of STEM.
    Ctem,
    TxtOut,
    ThreeDOut,
    GaussianAperture,
    Wave,
    AverageWave,
    DetectorImages,
    Verbose,
    Debug,
    /// Large-angle propagators.
    LargeAnglePropagators,
    WaveFourierSpace,
    AverageWaveFourierSpace,
    ProbeDiffraction,
    ProbeImages,
    ExplicitPartialCoherence,
    // written after /vtx, -detslc and -kmom
    PositionAveragedDiffraction,
    SilentAverageWave,
    SilentAverageWaveFourierSpace,
    Silent,
    RuntimeInfo,
}

impl MsaSwitch {
    pub const fn as_arg(self) -> &'static str {
        match self {
            Self::Ctem => "/ctem",
            Self::TxtOut => "/txtout",
            Self::ThreeDOut => "/3dout",
            Self::GaussianAperture => "/gaussap",
            Self::Wave => "/wave",
            Self::AverageWave => "/avwave",
            Self::DetectorImages => "/detimg",
            Self::Verbose => "/verbose",
            Self::Debug => "/debug",
            Self::LargeAnglePropagators => "/lapro",
            Self::WaveFourierSpace => "/waveft",
            Self::AverageWaveFourierSpace => "/avwaveft",
            Self::ProbeDiffraction => "/pdif",
            Self::ProbeImages => "/pimg",
            Self::ExplicitPartialCoherence => "/epc",
            Self::PositionAveragedDiffraction => "/padif",
            Self::SilentAverageWave => "/silavwave",
            Self::SilentAverageWaveFourierSpace => "/silavwaveft",
            Self::Silent => "/silent",
            Self::RuntimeInfo => "/rti",
        }
    }

    const fn is_trailing(self) -> bool {
        matches!(
            self,
            Self::PositionAveragedDiffraction
                | Self::SilentAverageWave
                | Self::SilentAverageWaveFourierSpace
                | Self::Silent
                | Self::RuntimeInfo
        )
    }
}

/// `msa` multislice run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MsaOptions {
    pub prm: PathBuf,
    pub output: PathBuf,
    /// Input image for partial spatial coherence in STEM mode.
    pub input_image: Option<PathBuf>,
    /// Input wave file and the slice number it belongs to.
    pub input_wave: Option<(PathBuf, u32)>,
    pub px: Option<u32>,
    pub py: Option<u32>,
    pub lx: Option<u32>,
    pub ly: Option<u32>,
    /// Defocus [nm], overriding the parameter file.
    pub foc: Option<f64>,
    pub tx: Option<f64>,
    pub ty: Option<f64>,
    pub otx: Option<f64>,
    pub oty: Option<f64>,
    /// Effective source radius [nm].
    pub sr: Option<f64>,
    pub abf: Option<f64>,
    pub buni: Option<f64>,
    pub uuni: Option<f64>,
    pub switches: BTreeSet<MsaSwitch>,
    /// Orbital angular momentum of a vortex probe.
    pub vtx: Option<i32>,
    pub detslc: Option<PathBuf>,
    /// Maximum moment order and integration range [mrad].
    pub kmom: Option<(u32, f64)>,
}

impl MsaOptions {
    pub fn new(prm: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            prm: prm.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn switch(mut self, switch: MsaSwitch) -> Self {
        self.switches.insert(switch);
        self
    }

    pub fn input_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_image = Some(path.into());
        self
    }

    pub fn input_wave(mut self, path: impl Into<PathBuf>, slice: u32) -> Self {
        self.input_wave = Some((path.into(), slice));
        self
    }

    /// First scan pixel; `last` limits the calculated range.
    pub fn scan_pixel(mut self, px: u32, py: u32) -> Self {
        self.px = Some(px);
        self.py = Some(py);
        self
    }

    pub fn last_scan_pixel(mut self, lx: u32, ly: u32) -> Self {
        self.lx = Some(lx);
        self.ly = Some(ly);
        self
    }

    pub fn defocus(mut self, nm: f64) -> Self {
        self.foc = Some(nm);
        self
    }

    pub fn beam_tilt(mut self, tx: f64, ty: f64) -> Self {
        self.tx = Some(tx);
        self.ty = Some(ty);
        self
    }

    pub fn object_tilt(mut self, otx: f64, oty: f64) -> Self {
        self.otx = Some(otx);
        self.oty = Some(oty);
        self
    }

    pub fn source_radius(mut self, nm: f64) -> Self {
        self.sr = Some(nm);
        self
    }

    pub fn abf(mut self, fraction: f64) -> Self {
        self.abf = Some(fraction);
        self
    }

    pub fn buni(mut self, b_iso: f64) -> Self {
        self.buni = Some(b_iso);
        self
    }

    pub fn uuni(mut self, u_iso: f64) -> Self {
        self.uuni = Some(u_iso);
        self
    }

    pub fn vortex(mut self, momentum: i32) -> Self {
        self.vtx = Some(momentum);
        self
    }

    pub fn detector_slices(mut self, path: impl Into<PathBuf>) -> Self {
        self.detslc = Some(path.into());
        self
    }

    pub fn k_moments(mut self, order: u32, range: f64) -> Self {
        self.kmom = Some((order, range));
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-prm".to_string(),
            path_arg(&self.prm),
            "-out".to_string(),
            path_arg(&self.output),
        ];
        push_value(&mut args, "-in", self.input_image.as_deref().map(path_arg));
        if let Some((wave, slice)) = &self.input_wave {
            args.extend(["-inw".to_string(), path_arg(wave), slice.to_string()]);
        }
        push_value(&mut args, "-px", self.px);
        push_value(&mut args, "-py", self.py);
        push_value(&mut args, "-lx", self.lx);
        push_value(&mut args, "-ly", self.ly);
        push_value(&mut args, "-foc", self.foc);
        push_value(&mut args, "-tx", self.tx);
        push_value(&mut args, "-ty", self.ty);
        push_value(&mut args, "-otx", self.otx);
        push_value(&mut args, "-oty", self.oty);
        push_value(&mut args, "-sr", self.sr);
        push_value(&mut args, "-abf", self.abf);
        push_value(&mut args, "-buni", self.buni);
        push_value(&mut args, "-uuni", self.uuni);

        let (trailing, leading): (Vec<MsaSwitch>, Vec<MsaSwitch>) =
            self.switches.iter().copied().partition(|switch| switch.is_trailing());
        args.extend(leading.iter().map(|switch| switch.as_arg().to_string()));
        push_value(&mut args, "/vtx", self.vtx);
        push_value(&mut args, "-detslc", self.detslc.as_deref().map(path_arg));
        if let Some((order, range)) = self.kmom {
            args.extend(["-kmom".to_string(), order.to_string(), range.to_string()]);
        }
        args.extend(trailing.iter().map(|switch| switch.as_arg().to_string()));
        args
    }

    pub fn invocation(&self) -> ToolInvocation {
        ToolInvocation::new(Tool::Msa, self.to_args()).with_output_dir(output_parent(&self.output))
    }
}
