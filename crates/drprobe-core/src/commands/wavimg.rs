use super::runner::ToolInvocation;
use super::{output_parent, path_arg, push_value};
use crate::domain::{DocumentResult, Tool};
use crate::prm::WavimgPrm;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WavimgSwitch {
    Silent,
    Debug,
    /// No loop image output in map mode.
    NoLoopImages,
    /// Renormalize the MTF after a sideband shift.
    RenormalizeSideband,
    RuntimeInfo,
}

impl WavimgSwitch {
    pub const fn as_arg(self) -> &'static str {
        match self {
            Self::Silent => "/sil",
            Self::Debug => "/dbg",
            Self::NoLoopImages => "/nli",
            Self::RenormalizeSideband => "/rnsb",
            Self::RuntimeInfo => "/rti",
        }
    }
}

/// `wavimg` image formation from an existing wave function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WavimgOptions {
    pub prm: PathBuf,
    /// Overrides the output file named in the parameter file.
    pub output: Option<PathBuf>,
    pub btx: Option<f64>,
    pub bty: Option<f64>,
    pub foc: Option<f64>,
    pub oar: Option<f64>,
    pub sbshx: Option<f64>,
    pub sbshy: Option<f64>,
    pub switches: BTreeSet<WavimgSwitch>,
}

impl WavimgOptions {
    pub fn new(prm: impl Into<PathBuf>) -> Self {
        Self {
            prm: prm.into(),
            ..Self::default()
        }
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn beam_tilt(mut self, btx: f64, bty: f64) -> Self {
        self.btx = Some(btx);
        self.bty = Some(bty);
        self
    }

    pub fn defocus(mut self, nm: f64) -> Self {
        self.foc = Some(nm);
        self
    }

    pub fn aperture_radius(mut self, mrad: f64) -> Self {
        self.oar = Some(mrad);
        self
    }

    pub fn sideband_shift(mut self, sbshx: f64, sbshy: f64) -> Self {
        self.sbshx = Some(sbshx);
        self.sbshy = Some(sbshy);
        self
    }

    pub fn switch(mut self, switch: WavimgSwitch) -> Self {
        self.switches.insert(switch);
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-prm".to_string(), path_arg(&self.prm)];
        push_value(&mut args, "-out", self.output.as_deref().map(path_arg));
        push_value(&mut args, "-btx", self.btx);
        push_value(&mut args, "-bty", self.bty);
        push_value(&mut args, "-foc", self.foc);
        push_value(&mut args, "-oar", self.oar);
        push_value(&mut args, "-sbshx", self.sbshx);
        push_value(&mut args, "-sbshy", self.sbshy);
        args.extend(self.switches.iter().map(|switch| switch.as_arg().to_string()));
        args
    }

    /// Without `-out` the output directory comes from the output file named in
    /// the parameter file, which therefore has to load.
    pub fn invocation(&self) -> DocumentResult<ToolInvocation> {
        self.invocation_in(None)
    }

    /// Like [`invocation`](Self::invocation) for a tool started in `working_dir`
    /// (see [`ToolRunner::working_dir`](super::ToolRunner::working_dir)). A
    /// relative `prm` is read from there, as wavimg itself would.
    pub fn invocation_in(&self, working_dir: Option<&Path>) -> DocumentResult<ToolInvocation> {
        let output_file = match &self.output {
            Some(output) => output.clone(),
            None => {
                let prm = match working_dir {
                    Some(working_dir) if self.prm.is_relative() => working_dir.join(&self.prm),
                    _ => self.prm.clone(),
                };
                PathBuf::from(WavimgPrm::load(&prm)?.output_files)
            }
        };
        Ok(ToolInvocation::new(Tool::Wavimg, self.to_args())
            .with_output_dir(output_parent(&output_file)))
    }
}

#[cfg(test)]
mod tests {
    use super::{WavimgOptions, WavimgSwitch};
    use crate::domain::DrProbeErrorCategory;
    use crate::prm::WavimgPrm;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn options_and_switches_follow_fixed_order() {
        let options = WavimgOptions::new("wavimg.prm")
            .switch(WavimgSwitch::RuntimeInfo)
            .switch(WavimgSwitch::Silent)
            .sideband_shift(1.5, -2.0)
            .aperture_radius(20.0)
            .defocus(4.0)
            .beam_tilt(0.5, 0.25)
            .output("img/out.dat");

        assert_eq!(
            options.to_args(),
            [
                "-prm", "wavimg.prm", "-out", "img/out.dat", "-btx", "0.5", "-bty", "0.25",
                "-foc", "4", "-oar", "20", "-sbshx", "1.5", "-sbshy", "-2", "/sil", "/rti"
            ]
        );
    }

    #[test]
    fn explicit_output_sets_the_output_directory() {
        let invocation = WavimgOptions::new("missing.prm")
            .output("results/images/out.dat")
            .invocation()
            .expect("explicit output needs no parameter file");
        assert_eq!(invocation.output_dir(), Some(Path::new("results/images")));
    }

    #[test]
    fn output_directory_falls_back_to_the_parameter_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let prm_path = temp.path().join("wavimg.prm");
        let document = WavimgPrm {
            output_files: "img/series/focus.dat".to_string(),
            ..WavimgPrm::default()
        };
        document.save(&prm_path).expect("parameter file should be written");

        let invocation = WavimgOptions::new(&prm_path)
            .invocation()
            .expect("parameter file should load");
        assert_eq!(invocation.output_dir(), Some(Path::new("img/series")));
        assert!(!invocation.args().iter().any(|arg| arg == "-out"));
    }

    #[test]
    fn relative_parameter_file_is_read_from_the_working_dir() {
        let temp = TempDir::new().expect("tempdir should be created");
        let document = WavimgPrm {
            output_files: "img/run2/image.dat".to_string(),
            ..WavimgPrm::default()
        };
        document
            .save(&temp.path().join("sim/wavimg.prm"))
            .expect("parameter file should be written");

        let options = WavimgOptions::new("sim/wavimg.prm");
        let invocation = options
            .invocation_in(Some(temp.path()))
            .expect("parameter file should load from the working dir");
        assert_eq!(invocation.output_dir(), Some(Path::new("img/run2")));
        assert_eq!(invocation.args()[..2], ["-prm", "sim/wavimg.prm"]);

        let absolute = WavimgOptions::new(temp.path().join("sim/wavimg.prm"))
            .invocation_in(Some(Path::new("/nonexistent")))
            .expect("absolute parameter paths ignore the working dir");
        assert_eq!(absolute.output_dir(), Some(Path::new("img/run2")));
    }

    #[test]
    fn unreadable_parameter_file_fails_invocation() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = WavimgOptions::new(temp.path().join("absent.prm"))
            .invocation()
            .expect_err("missing parameter file should fail");
        assert_eq!(error.category(), DrProbeErrorCategory::FileSystemError);
    }
}
