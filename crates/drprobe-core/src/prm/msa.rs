//! Scan-probe parameter file read by `msa`.

use super::aberration::{Aberration, AberrationTable};
use super::schema::{
    FieldSpec, Scalar, ScalarKind, SchemaDocument, SchemaEntry, Shape, Value, read_document,
    render_document,
};
use super::slices::{SliceSampling, cyclic_slice_ids, randomized_slice_ids};
use super::{read_prm_source, write_prm_file};
use crate::domain::{DocumentResult, DrProbeError};
use serde::Serialize;
use std::path::Path;

pub const MICROSCOPE_SECTION: &str = "'[Microscope Parameters]'";
pub const MULTISLICE_SECTION: &str = "'[Multislice Parameters]'";
pub const END_OF_FILE: &str = "End of parameter file.";

/// Probe-forming aperture: a single semi-angle, or three values describing an
/// asymmetric convergence-angle distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConvergenceAngle {
    Symmetric(f64),
    Asymmetric([f64; 3]),
}

impl Default for ConvergenceAngle {
    fn default() -> Self {
        Self::Symmetric(30.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsaPrm {
    /// Semi angle of convergence [mrad].
    pub conv_semi_angle: ConvergenceAngle,
    /// Inner radius of the annular detector [mrad].
    pub inner_radius_ann_det: f64,
    /// Outer radius of the annular detector [mrad].
    pub outer_radius_ann_det: f64,
    /// Detector definition switch and file name.
    pub detector: (i32, String),
    /// Electron wavelength [nm].
    pub wavelength: f64,
    /// De-magnified source radius (1/e half width) [nm].
    pub source_radius: f64,
    /// Focus spread [nm].
    pub focus_spread: f64,
    pub focus_spread_kernel_hw: f64,
    pub focus_spread_kernel_size: f64,
    pub aberrations: AberrationTable,
    /// Object tilt X [deg].
    pub tilt_x: f64,
    /// Object tilt Y [deg].
    pub tilt_y: f64,
    pub h_scan_offset: f64,
    pub v_scan_offset: f64,
    pub h_scan_frame_size: f64,
    pub v_scan_frame_size: f64,
    pub scan_frame_rot: f64,
    pub scan_columns: usize,
    pub scan_rows: usize,
    pub temp_coherence_flag: i32,
    pub spat_coherence_flag: i32,
    pub super_cell_x: usize,
    pub super_cell_y: usize,
    pub super_cell_z: usize,
    /// Slice file series name; files are expected as `<name>_###.sli`.
    pub slice_files: String,
    pub number_of_slices: usize,
    pub number_frozen_lattice: usize,
    pub min_num_frozen: usize,
    pub det_readout_period: usize,
    pub tot_number_of_slices: usize,
    /// Slice ids read from a file. Only written back with [`SliceSampling::Stored`].
    pub slice_ids: Vec<usize>,
}

impl Default for MsaPrm {
    fn default() -> Self {
        Self {
            conv_semi_angle: ConvergenceAngle::default(),
            inner_radius_ann_det: 0.0,
            outer_radius_ann_det: 30.0,
            detector: (0, "prm/msa_det.prm".to_string()),
            wavelength: 0.00417571,
            source_radius: 0.01,
            focus_spread: 3.0,
            focus_spread_kernel_hw: 2.0,
            focus_spread_kernel_size: 7.0,
            aberrations: AberrationTable::new(),
            tilt_x: 0.0,
            tilt_y: 0.0,
            h_scan_offset: 0.0,
            v_scan_offset: 0.0,
            h_scan_frame_size: 1.0,
            v_scan_frame_size: 1.0,
            scan_frame_rot: 0.0,
            scan_columns: 0,
            scan_rows: 0,
            temp_coherence_flag: 0,
            spat_coherence_flag: 1,
            super_cell_x: 1,
            super_cell_y: 1,
            super_cell_z: 1,
            slice_files: "slc/slices".to_string(),
            number_of_slices: 5,
            number_frozen_lattice: 1,
            min_num_frozen: 1,
            det_readout_period: 1,
            tot_number_of_slices: 10,
            slice_ids: Vec::new(),
        }
    }
}

impl MsaPrm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aberration(mut self, aberration: Aberration, coefficients: (f64, f64)) -> Self {
        self.aberrations.set(aberration, coefficients);
        self
    }

    pub fn number_of_aberrations(&self) -> usize {
        self.aberrations.len()
    }

    pub fn load(path: &Path) -> DocumentResult<Self> {
        let source = read_prm_source(path, "msa")?;
        let document = Self::from_prm_str(&source).map_err(|error| {
            DrProbeError::malformed_document(
                error.placeholder(),
                format!("{}: {}", path.display(), error.message()),
            )
        })?;
        tracing::debug!(
            path = %path.display(),
            aberrations = document.aberrations.len(),
            slices = document.tot_number_of_slices,
            "loaded msa parameter file"
        );
        Ok(document)
    }

    pub fn from_prm_str(source: &str) -> DocumentResult<Self> {
        read_document(source)
    }

    /// Writes the file with the cyclic slice sequence.
    pub fn save(&self, path: &Path) -> DocumentResult<()> {
        self.save_with(path, SliceSampling::Cyclic)
    }

    pub fn save_with(&self, path: &Path, sampling: SliceSampling) -> DocumentResult<()> {
        let contents = self.to_prm_string(sampling)?;
        write_prm_file(path, &contents)?;
        tracing::debug!(
            path = %path.display(),
            aberrations = self.aberrations.len(),
            slices = self.tot_number_of_slices,
            ?sampling,
            "saved msa parameter file"
        );
        Ok(())
    }

    pub fn to_prm_string(&self, sampling: SliceSampling) -> DocumentResult<String> {
        let slice_ids = self.slice_sequence(sampling)?;
        render_document(self, &slice_ids)
    }

    /// Slice ids that `sampling` would write for this document.
    pub fn slice_sequence(&self, sampling: SliceSampling) -> DocumentResult<Vec<usize>> {
        let total = self.tot_number_of_slices;
        let available = self.number_of_slices;
        match sampling {
            SliceSampling::Cyclic => cyclic_slice_ids(total, available),
            SliceSampling::Randomized { seed } => randomized_slice_ids(total, available, seed),
            SliceSampling::Stored => {
                if self.slice_ids.len() != total {
                    return Err(DrProbeError::malformed_document(
                        "PARSE.MSA_SLICES",
                        format!(
                            "stored slice sequence has {} ids but the document declares {} slices",
                            self.slice_ids.len(),
                            total
                        ),
                    ));
                }
                if let Some(id) = self.slice_ids.iter().find(|id| **id >= available) {
                    return Err(DrProbeError::malformed_document(
                        "PARSE.MSA_SLICES",
                        format!(
                            "stored slice id {} is out of range for {} slice files",
                            id, available
                        ),
                    ));
                }
                Ok(self.slice_ids.clone())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MsaKey {
    ConvSemiAngle,
    InnerRadius,
    OuterRadius,
    Detector,
    Wavelength,
    SourceRadius,
    FocusSpread,
    FocusSpreadKernelHw,
    FocusSpreadKernelSize,
    TiltX,
    TiltY,
    HScanOffset,
    VScanOffset,
    HScanFrameSize,
    VScanFrameSize,
    ScanFrameRot,
    ScanColumns,
    ScanRows,
    TempCoherenceFlag,
    SpatCoherenceFlag,
    SuperCellX,
    SuperCellY,
    SuperCellZ,
    SliceFiles,
    NumberOfSlices,
    NumberFrozenLattice,
    MinNumFrozen,
    DetReadoutPeriod,
    TotNumberOfSlices,
}

const INT: Shape = Shape::Scalar(ScalarKind::Int);
const FLOAT: Shape = Shape::Scalar(ScalarKind::Float);
const TEXT: Shape = Shape::Scalar(ScalarKind::Text);

const fn field(
    key: MsaKey,
    name: &'static str,
    shape: Shape,
    comment: &'static str,
) -> SchemaEntry<MsaKey> {
    SchemaEntry::Field(FieldSpec {
        key,
        name,
        shape,
        comment,
    })
}

const MSA_SCHEMA: &[SchemaEntry<MsaKey>] = &[
    SchemaEntry::Literal(MICROSCOPE_SECTION),
    field(
        MsaKey::ConvSemiAngle,
        "conv_semi_angle",
        Shape::FloatOrTriple,
        "Semi angle of convergence [mrad]",
    ),
    field(
        MsaKey::InnerRadius,
        "inner_radius_ann_det",
        FLOAT,
        "Inner radius of the annular detector [mrad]",
    ),
    field(
        MsaKey::OuterRadius,
        "outer_radius_ann_det",
        FLOAT,
        "Outer radius of the annular detector [mrad]",
    ),
    field(
        MsaKey::Detector,
        "detector",
        Shape::Tuple(&[ScalarKind::Int, ScalarKind::Text]),
        "Detector definition file, switch and file name",
    ),
    field(MsaKey::Wavelength, "wavelength", FLOAT, "Electron wavelength [nm]"),
    field(
        MsaKey::SourceRadius,
        "source_radius",
        FLOAT,
        "De-magnified source radius (1/e half width) [nm]",
    ),
    field(MsaKey::FocusSpread, "focus_spread", FLOAT, "Focus spread [nm]"),
    field(
        MsaKey::FocusSpreadKernelHw,
        "focus_spread_kernel_hw",
        FLOAT,
        "Focus-spread kernel half-width w.r.t. the focus spread",
    ),
    field(
        MsaKey::FocusSpreadKernelSize,
        "focus_spread_kernel_size",
        FLOAT,
        "Focus-spread kernel size",
    ),
    SchemaEntry::Aberrations {
        comment: "Number of aberration definitions following",
    },
    SchemaEntry::Literal(MULTISLICE_SECTION),
    field(
        MsaKey::TiltX,
        "tilt_x",
        FLOAT,
        "Object tilt X [deg]. Approximative approach. Do not use for tilts larger than 5 degrees.",
    ),
    field(
        MsaKey::TiltY,
        "tilt_y",
        FLOAT,
        "Object tilt Y [deg]. Approximative approach. Do not use for tilts larger than 5 degrees.",
    ),
    field(
        MsaKey::HScanOffset,
        "h_scan_offset",
        FLOAT,
        "Horizontal scan frame offset [nm].",
    ),
    field(
        MsaKey::VScanOffset,
        "v_scan_offset",
        FLOAT,
        "Vertical scan frame offset [nm].",
    ),
    field(
        MsaKey::HScanFrameSize,
        "h_scan_frame_size",
        FLOAT,
        "Horizontal scan frame size [nm].",
    ),
    field(
        MsaKey::VScanFrameSize,
        "v_scan_frame_size",
        FLOAT,
        "Vertical scan frame size [nm].",
    ),
    field(
        MsaKey::ScanFrameRot,
        "scan_frame_rot",
        FLOAT,
        "Scan frame rotation [deg] w.r.t. the slice data.",
    ),
    field(
        MsaKey::ScanColumns,
        "scan_columns",
        INT,
        "Number of scan columns = number of pixels on horizontal scan image axis.",
    ),
    field(
        MsaKey::ScanRows,
        "scan_rows",
        INT,
        "Number of scan rows = number of pixels on vertical scan image axis.",
    ),
    field(
        MsaKey::TempCoherenceFlag,
        "temp_coherence_flag",
        INT,
        "Switch for partial temporal coherence calculation. Drastic increase of calculation time if activated.",
    ),
    field(
        MsaKey::SpatCoherenceFlag,
        "spat_coherence_flag",
        INT,
        "Switch for partial spatial coherence calculation. Is only applied in combination with an input image file.",
    ),
    field(
        MsaKey::SuperCellX,
        "super_cell_x",
        INT,
        "Supercell repeat factor in horizontal direction, x.",
    ),
    field(
        MsaKey::SuperCellY,
        "super_cell_y",
        INT,
        "Supercell repeat factor in vertical direction, y.",
    ),
    field(
        MsaKey::SuperCellZ,
        "super_cell_z",
        INT,
        "Supercell repeat factor in Z-direction, obsolete.",
    ),
    field(
        MsaKey::SliceFiles,
        "slice_files",
        TEXT,
        "Slice file series name [SFN]. Expected file names are [SFN]+'_###.sli' where ### is a three digit number.",
    ),
    field(
        MsaKey::NumberOfSlices,
        "number_of_slices",
        INT,
        "Number of slice files to load.",
    ),
    field(
        MsaKey::NumberFrozenLattice,
        "number_frozen_lattice",
        INT,
        "Number of frozen lattice variants per slice.",
    ),
    field(
        MsaKey::MinNumFrozen,
        "min_num_frozen",
        INT,
        "Minimum number of frozen lattice variations averaged per scan pixel in STEM mode.",
    ),
    field(
        MsaKey::DetReadoutPeriod,
        "det_readout_period",
        INT,
        "Detector readout period in slices.",
    ),
    field(
        MsaKey::TotNumberOfSlices,
        "tot_number_of_slices",
        INT,
        "Number of slices in the object.",
    ),
    SchemaEntry::SliceSequence,
    SchemaEntry::Literal(END_OF_FILE),
];

impl SchemaDocument for MsaPrm {
    type Key = MsaKey;

    const PARSE_PLACEHOLDER: &'static str = "PARSE.MSA_LINE";

    fn schema() -> &'static [SchemaEntry<MsaKey>] {
        MSA_SCHEMA
    }

    fn value(&self, key: MsaKey) -> Value {
        match key {
            MsaKey::ConvSemiAngle => match self.conv_semi_angle {
                ConvergenceAngle::Symmetric(angle) => Value::float(angle),
                ConvergenceAngle::Asymmetric(angles) => Value::floats(&angles),
            },
            MsaKey::InnerRadius => Value::float(self.inner_radius_ann_det),
            MsaKey::OuterRadius => Value::float(self.outer_radius_ann_det),
            MsaKey::Detector => Value::pair(
                Scalar::Int(self.detector.0.into()),
                Scalar::Text(self.detector.1.clone()),
            ),
            MsaKey::Wavelength => Value::float(self.wavelength),
            MsaKey::SourceRadius => Value::float(self.source_radius),
            MsaKey::FocusSpread => Value::float(self.focus_spread),
            MsaKey::FocusSpreadKernelHw => Value::float(self.focus_spread_kernel_hw),
            MsaKey::FocusSpreadKernelSize => Value::float(self.focus_spread_kernel_size),
            MsaKey::TiltX => Value::float(self.tilt_x),
            MsaKey::TiltY => Value::float(self.tilt_y),
            MsaKey::HScanOffset => Value::float(self.h_scan_offset),
            MsaKey::VScanOffset => Value::float(self.v_scan_offset),
            MsaKey::HScanFrameSize => Value::float(self.h_scan_frame_size),
            MsaKey::VScanFrameSize => Value::float(self.v_scan_frame_size),
            MsaKey::ScanFrameRot => Value::float(self.scan_frame_rot),
            MsaKey::ScanColumns => Value::count(self.scan_columns),
            MsaKey::ScanRows => Value::count(self.scan_rows),
            MsaKey::TempCoherenceFlag => Value::int(self.temp_coherence_flag),
            MsaKey::SpatCoherenceFlag => Value::int(self.spat_coherence_flag),
            MsaKey::SuperCellX => Value::count(self.super_cell_x),
            MsaKey::SuperCellY => Value::count(self.super_cell_y),
            MsaKey::SuperCellZ => Value::count(self.super_cell_z),
            MsaKey::SliceFiles => Value::text(&self.slice_files),
            MsaKey::NumberOfSlices => Value::count(self.number_of_slices),
            MsaKey::NumberFrozenLattice => Value::count(self.number_frozen_lattice),
            MsaKey::MinNumFrozen => Value::count(self.min_num_frozen),
            MsaKey::DetReadoutPeriod => Value::count(self.det_readout_period),
            MsaKey::TotNumberOfSlices => Value::count(self.tot_number_of_slices),
        }
    }

    fn assign(&mut self, key: MsaKey, value: Value) -> Result<(), String> {
        match key {
            MsaKey::ConvSemiAngle => {
                self.conv_semi_angle = match value {
                    Value::Scalar(angle) => ConvergenceAngle::Symmetric(angle.as_f64()?),
                    triple => {
                        let [first, second, third] = triple.into_tuple::<3>()?;
                        ConvergenceAngle::Asymmetric([
                            first.as_f64()?,
                            second.as_f64()?,
                            third.as_f64()?,
                        ])
                    }
                };
            }
            MsaKey::InnerRadius => self.inner_radius_ann_det = value.into_f64()?,
            MsaKey::OuterRadius => self.outer_radius_ann_det = value.into_f64()?,
            MsaKey::Detector => {
                let [switch, file] = value.into_tuple::<2>()?;
                self.detector = (switch.as_i32()?, file.into_text()?);
            }
            MsaKey::Wavelength => self.wavelength = value.into_f64()?,
            MsaKey::SourceRadius => self.source_radius = value.into_f64()?,
            MsaKey::FocusSpread => self.focus_spread = value.into_f64()?,
            MsaKey::FocusSpreadKernelHw => self.focus_spread_kernel_hw = value.into_f64()?,
            MsaKey::FocusSpreadKernelSize => self.focus_spread_kernel_size = value.into_f64()?,
            MsaKey::TiltX => self.tilt_x = value.into_f64()?,
            MsaKey::TiltY => self.tilt_y = value.into_f64()?,
            MsaKey::HScanOffset => self.h_scan_offset = value.into_f64()?,
            MsaKey::VScanOffset => self.v_scan_offset = value.into_f64()?,
            MsaKey::HScanFrameSize => self.h_scan_frame_size = value.into_f64()?,
            MsaKey::VScanFrameSize => self.v_scan_frame_size = value.into_f64()?,
            MsaKey::ScanFrameRot => self.scan_frame_rot = value.into_f64()?,
            MsaKey::ScanColumns => self.scan_columns = value.into_usize()?,
            MsaKey::ScanRows => self.scan_rows = value.into_usize()?,
            MsaKey::TempCoherenceFlag => self.temp_coherence_flag = value.into_i32()?,
            MsaKey::SpatCoherenceFlag => self.spat_coherence_flag = value.into_i32()?,
            MsaKey::SuperCellX => self.super_cell_x = value.into_usize()?,
            MsaKey::SuperCellY => self.super_cell_y = value.into_usize()?,
            MsaKey::SuperCellZ => self.super_cell_z = value.into_usize()?,
            MsaKey::SliceFiles => self.slice_files = value.into_string()?,
            MsaKey::NumberOfSlices => self.number_of_slices = value.into_usize()?,
            MsaKey::NumberFrozenLattice => self.number_frozen_lattice = value.into_usize()?,
            MsaKey::MinNumFrozen => self.min_num_frozen = value.into_usize()?,
            MsaKey::DetReadoutPeriod => self.det_readout_period = value.into_usize()?,
            MsaKey::TotNumberOfSlices => self.tot_number_of_slices = value.into_usize()?,
        }
        Ok(())
    }

    fn aberrations(&self) -> &AberrationTable {
        &self.aberrations
    }

    fn aberrations_mut(&mut self) -> &mut AberrationTable {
        &mut self.aberrations
    }

    fn slice_bounds(&self) -> Option<(usize, usize)> {
        Some((self.tot_number_of_slices, self.number_of_slices))
    }

    fn store_slice_ids(&mut self, ids: Vec<usize>) {
        self.slice_ids = ids;
    }

    /// Anything after the terminator line is not read.
    fn allows_trailing_lines(&self) -> bool {
        true
    }
}
