use super::precedence::{CELSLC_OVERRIDES, suppressed_options};
use super::runner::ToolInvocation;
use super::{join_values, output_parent, path_arg, push_flag, push_value};
use crate::domain::Tool;
use std::path::PathBuf;

/// `celslc` phase-grating / potential slicing.
#[derive(Debug, Clone, PartialEq)]
pub struct CelslcOptions {
    /// Structure file. A `.cif` extension selects `-cif`, anything else `-cel`.
    pub input: PathBuf,
    /// Slice file series name.
    pub slice_name: PathBuf,
    /// Electron energy [keV].
    pub ht: f64,
    pub nx: Option<u32>,
    pub ny: Option<u32>,
    pub nz: Option<u32>,
    pub rev: bool,
    /// Frozen lattice; deactivates `dwf`.
    pub fl: bool,
    pub nv: Option<u32>,
    pub dwf: bool,
    pub buni: Option<f64>,
    /// Built-in absorptive form factors; deactivates `abf`.
    pub absorb: bool,
    pub abf: Option<f64>,
    pub pot: bool,
    pub three_d_potential: bool,
    /// External 3D potential column; the sampling then comes from the potential header.
    pub inf: Option<u32>,
    pub pps: bool,
    pub ssc: Option<u32>,
    pub rti: bool,
    pub silent: bool,
    /// Super-cell re-orientation `(u, v, w, u, v, w, a, b, c)`.
    pub prj: Option<[f64; 9]>,
    /// Fractional shift of all atoms `(x, y, z)`.
    pub tla: Option<[f64; 3]>,
}

impl Default for CelslcOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            slice_name: PathBuf::new(),
            ht: 300.0,
            nx: None,
            ny: None,
            nz: None,
            rev: false,
            fl: false,
            nv: None,
            dwf: false,
            buni: None,
            absorb: false,
            abf: None,
            pot: false,
            three_d_potential: false,
            inf: None,
            pps: false,
            ssc: None,
            rti: false,
            silent: false,
            prj: None,
            tla: None,
        }
    }
}

impl CelslcOptions {
    pub fn new(input: impl Into<PathBuf>, slice_name: impl Into<PathBuf>, ht: f64) -> Self {
        Self {
            input: input.into(),
            slice_name: slice_name.into(),
            ht,
            ..Self::default()
        }
    }

    pub fn sampling(mut self, nx: u32, ny: u32, nz: u32) -> Self {
        self.nx = Some(nx);
        self.ny = Some(ny);
        self.nz = Some(nz);
        self
    }

    pub fn frozen_lattice(mut self, variants: u32) -> Self {
        self.fl = true;
        self.nv = Some(variants);
        self
    }

    pub fn debye_waller(mut self, enabled: bool) -> Self {
        self.dwf = enabled;
        self
    }

    pub fn buni(mut self, b_iso: f64) -> Self {
        self.buni = Some(b_iso);
        self
    }

    pub fn absorb(mut self, enabled: bool) -> Self {
        self.absorb = enabled;
        self
    }

    pub fn abf(mut self, fraction: f64) -> Self {
        self.abf = Some(fraction);
        self
    }

    pub fn reverse(mut self, enabled: bool) -> Self {
        self.rev = enabled;
        self
    }

    pub fn export_potentials(mut self, enabled: bool) -> Self {
        self.pot = enabled;
        self
    }

    pub fn three_d_potential(mut self, enabled: bool) -> Self {
        self.three_d_potential = enabled;
        self
    }

    pub fn external_potential(mut self, column: u32) -> Self {
        self.inf = Some(column);
        self
    }

    pub fn projected_potentials(mut self, enabled: bool) -> Self {
        self.pps = enabled;
        self
    }

    pub fn single_slice(mut self, index: u32) -> Self {
        self.ssc = Some(index);
        self
    }

    pub fn runtime_info(mut self, enabled: bool) -> Self {
        self.rti = enabled;
        self
    }

    pub fn silent(mut self, enabled: bool) -> Self {
        self.silent = enabled;
        self
    }

    pub fn projection(mut self, prj: [f64; 9]) -> Self {
        self.prj = Some(prj);
        self
    }

    pub fn translation(mut self, tla: [f64; 3]) -> Self {
        self.tla = Some(tla);
        self
    }

    fn input_flag(&self) -> &'static str {
        let is_cif = self
            .input
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("cif"));
        if is_cif { "-cif" } else { "-cel" }
    }

    fn requested_options(&self) -> Vec<&'static str> {
        [
            ("fl", self.fl),
            ("dwf", self.dwf),
            ("abs", self.absorb),
            ("abf", self.abf.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, requested)| requested.then_some(name))
        .collect()
    }

    pub fn to_args(&self) -> Vec<String> {
        let suppressed = suppressed_options(&self.requested_options(), CELSLC_OVERRIDES);
        for option in &suppressed {
            tracing::debug!(option = %option, "celslc option deactivated by a competing option");
        }
        let active = |name: &str| !suppressed.contains(name);

        let mut args = vec![
            self.input_flag().to_string(),
            path_arg(&self.input),
            "-slc".to_string(),
            path_arg(&self.slice_name),
        ];
        if self.inf.is_none() {
            push_value(&mut args, "-nx", self.nx);
            push_value(&mut args, "-ny", self.ny);
            push_value(&mut args, "-nz", self.nz);
        }
        push_value(&mut args, "-ht", Some(self.ht));

        push_flag(&mut args, "-rev", self.rev);
        push_flag(&mut args, "-fl", self.fl);
        push_value(&mut args, "-nv", self.nv);
        push_flag(&mut args, "-dwf", self.dwf && active("dwf"));
        push_value(&mut args, "-buni", self.buni);
        push_flag(&mut args, "-abs", self.absorb);
        push_value(&mut args, "-abf", self.abf.filter(|_| active("abf")));
        push_flag(&mut args, "-pot", self.pot);
        push_flag(&mut args, "-3dp", self.three_d_potential);
        push_value(&mut args, "-inf", self.inf);
        push_flag(&mut args, "-pps", self.pps);
        push_value(&mut args, "-ssc", self.ssc);
        push_flag(&mut args, "-rti", self.rti);
        push_flag(&mut args, "-silent", self.silent);
        push_value(&mut args, "-prj", self.prj.map(|prj| join_values(&prj)));
        push_value(&mut args, "-tla", self.tla.map(|tla| join_values(&tla)));
        args
    }

    pub fn invocation(&self) -> ToolInvocation {
        ToolInvocation::new(Tool::Celslc, self.to_args())
            .with_output_dir(output_parent(&self.slice_name))
    }
}

#[cfg(test)]
mod tests {
    use super::CelslcOptions;
    use std::path::Path;

    fn has(args: &[String], flag: &str) -> bool {
        args.iter().any(|arg| arg == flag)
    }

    #[test]
    fn basic_call_with_sampling() {
        let options = CelslcOptions::new("SrTiO3.cel", "slc/SrTiO3", 300.0).sampling(256, 256, 8);
        assert_eq!(
            options.to_args(),
            [
                "-cel", "SrTiO3.cel", "-slc", "slc/SrTiO3", "-nx", "256", "-ny", "256", "-nz",
                "8", "-ht", "300"
            ]
        );
        assert_eq!(options.invocation().output_dir(), Some(Path::new("slc")));
    }

    #[test]
    fn input_flag_follows_the_extension() {
        let cif = CelslcOptions::new("structures/STO.CIF", "slices", 80.0);
        assert_eq!(cif.to_args()[0], "-cif");
        let txt = CelslcOptions::new("structures/STO.txt", "slices", 80.0);
        assert_eq!(txt.to_args()[0], "-cel");
        let bare = CelslcOptions::new("structure", "slices", 80.0);
        assert_eq!(bare.to_args()[0], "-cel");
        assert_eq!(bare.invocation().output_dir(), None);
    }

    #[test]
    fn absorb_overrides_abf() {
        let args = CelslcOptions::new("a.cel", "slc/a", 300.0)
            .debye_waller(true)
            .absorb(true)
            .abf(0.2)
            .to_args();
        assert!(has(&args, "-abs"));
        assert!(!has(&args, "-abf"));
        assert!(!has(&args, "0.2"));
        assert!(has(&args, "-dwf"));

        let args = CelslcOptions::new("a.cel", "slc/a", 300.0)
            .debye_waller(true)
            .abf(0.2)
            .to_args();
        let position = args
            .iter()
            .position(|arg| arg == "-abf")
            .expect("-abf should be present without -abs");
        assert_eq!(args[position + 1], "0.2");
    }

    #[test]
    fn frozen_lattice_overrides_dwf() {
        let args = CelslcOptions::new("a.cel", "slc/a", 300.0)
            .debye_waller(true)
            .frozen_lattice(20)
            .to_args();
        assert!(has(&args, "-fl"));
        assert!(!has(&args, "-dwf"));
        let position = args
            .iter()
            .position(|arg| arg == "-nv")
            .expect("-nv should be present");
        assert_eq!(args[position + 1], "20");
    }

    #[test]
    fn external_potential_drops_sampling_and_orders_switches() {
        let args = CelslcOptions::new("pot.cel", "slc/pot", 200.0)
            .sampling(128, 128, 4)
            .external_potential(10)
            .silent(true)
            .runtime_info(true)
            .single_slice(3)
            .projected_potentials(true)
            .three_d_potential(true)
            .export_potentials(true)
            .buni(0.5)
            .reverse(true)
            .to_args();
        assert_eq!(
            args,
            [
                "-cel", "pot.cel", "-slc", "slc/pot", "-ht", "200", "-rev", "-buni", "0.5",
                "-pot", "-3dp", "-inf", "10", "-pps", "-ssc", "3", "-rti", "-silent"
            ]
        );
    }

    #[test]
    fn projection_and_translation_are_single_comma_joined_tokens() {
        let args = CelslcOptions::new("a.cel", "a", 300.0)
            .projection([1.0, 1.0, 0.0, -1.0, 1.0, 0.0, 2.5, 2.5, 3.905])
            .translation([0.5, 0.0, 0.25])
            .to_args();
        let tail = &args[args.len() - 4..];
        assert_eq!(
            tail,
            ["-prj", "1,1,0,-1,1,0,2.5,2.5,3.905", "-tla", "0.5,0,0.25"]
        );
    }
}
