use super::runner::ToolInvocation;
use super::{join_values, output_parent, path_arg, push_flag};
use crate::domain::Tool;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Display for Axis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachCel {
    pub file: PathBuf,
    pub direction: Axis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveCloseAtoms {
    /// Minimum distance [Å].
    pub distance: f64,
    /// Optional XMS cel file receiving the deleted atoms.
    pub save_file: Option<PathBuf>,
}

/// `CellMuncher` super-cell manipulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellMuncherOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub cif: bool,
    pub attach_cel: Option<AttachCel>,
    pub repeat: Vec<(Axis, u32)>,
    /// `(element, B_iso [nm²])` pairs.
    pub set_dw_factor: Vec<(String, f64)>,
    pub frozen_lattice: Vec<Axis>,
    pub remove_close_atoms: Option<RemoveCloseAtoms>,
    pub sort: Vec<String>,
    pub override_output: bool,
}

impl CellMuncherOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn cif(mut self, enabled: bool) -> Self {
        self.cif = enabled;
        self
    }

    pub fn attach_cel(mut self, file: impl Into<PathBuf>, direction: Axis) -> Self {
        self.attach_cel = Some(AttachCel {
            file: file.into(),
            direction,
        });
        self
    }

    pub fn repeat(mut self, axis: Axis, count: u32) -> Self {
        self.repeat.push((axis, count));
        self
    }

    pub fn set_dw_factor(mut self, element: impl Into<String>, value: f64) -> Self {
        self.set_dw_factor.push((element.into(), value));
        self
    }

    pub fn frozen_lattice(mut self, axes: &[Axis]) -> Self {
        self.frozen_lattice = axes.to_vec();
        self
    }

    pub fn remove_close_atoms(mut self, distance: f64, save_file: Option<PathBuf>) -> Self {
        self.remove_close_atoms = Some(RemoveCloseAtoms {
            distance,
            save_file,
        });
        self
    }

    pub fn sort_by(mut self, key: impl Into<String>) -> Self {
        self.sort.push(key.into());
        self
    }

    pub fn override_output(mut self, enabled: bool) -> Self {
        self.override_output = enabled;
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            path_arg(&self.input),
            "-o".to_string(),
            path_arg(&self.output),
        ];
        push_flag(&mut args, "--cif", self.cif);
        if let Some(attach) = &self.attach_cel {
            args.push(format!(
                "--attach-cel={},XMS,{}",
                path_arg(&attach.file),
                attach.direction
            ));
        }
        for (axis, count) in &self.repeat {
            args.push(format!("--repeat={},{}", axis, count));
        }
        for (element, value) in &self.set_dw_factor {
            args.push(format!("--set-dw-factor={},{}", element, value));
        }
        if !self.frozen_lattice.is_empty() {
            args.push(format!("--frozen-lattice={}", join_values(&self.frozen_lattice)));
        }
        if let Some(remove) = &self.remove_close_atoms {
            match &remove.save_file {
                Some(save_file) => args.push(format!(
                    "--remove-close-atoms={},{}",
                    remove.distance,
                    path_arg(save_file)
                )),
                None => args.push(format!("--remove-close-atoms={}", remove.distance)),
            }
        }
        for key in &self.sort {
            args.push(format!("-s={}", key));
        }
        push_flag(&mut args, "--override", self.override_output);
        args
    }

    pub fn invocation(&self) -> ToolInvocation {
        ToolInvocation::new(Tool::CellMuncher, self.to_args())
            .with_output_dir(output_parent(&self.output))
    }
}
