//! Image-formation parameter file read by `wavimg`.

use super::aberration::{Aberration, AberrationTable};
use super::schema::ScalarKind::{Float as F, Int as I, Text as T};
use super::schema::{
    FieldSpec, Scalar, SchemaDocument, SchemaEntry, Shape, Value, read_document, render_document,
};
use super::{read_prm_source, write_prm_file};
use crate::domain::{DocumentResult, DrProbeError};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Image output type option, written as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOutput {
    TemImage,
    #[default]
    ComplexImagePlaneWave,
    WaveAmplitude,
    WavePhase,
    WaveRealPart,
    WaveImaginaryPart,
    /// TEM image map of two variables, driven by loop definitions.
    TemImageMap,
}

impl ImageOutput {
    pub const ALL: [ImageOutput; 7] = [
        ImageOutput::TemImage,
        ImageOutput::ComplexImagePlaneWave,
        ImageOutput::WaveAmplitude,
        ImageOutput::WavePhase,
        ImageOutput::WaveRealPart,
        ImageOutput::WaveImaginaryPart,
        ImageOutput::TemImageMap,
    ];

    pub const fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|output| output.code() == code)
    }
}

impl Display for ImageOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::TemImage => "TEM image",
            Self::ComplexImagePlaneWave => "complex image plane wave",
            Self::WaveAmplitude => "wave amplitude",
            Self::WavePhase => "wave phase",
            Self::WaveRealPart => "wave real part",
            Self::WaveImaginaryPart => "wave imaginary part",
            Self::TemImageMap => "TEM image map of 2 variables",
        };
        f.write_str(label)
    }
}

/// Partial-coherence calculation model. Codes start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoherenceModel {
    /// Coherent sub-images over an explicit focal variation, quasi-coherent spatial envelope.
    #[default]
    FocalAveraging,
    FocalAngularAveraging,
    QuasiCoherentEnvelopes,
    /// Fourier-space synthesis with a partially coherent transmission cross-coefficient.
    FourierSpaceTcc,
    FocalAngularFrozenLattice,
}

impl CoherenceModel {
    pub const ALL: [CoherenceModel; 5] = [
        CoherenceModel::FocalAveraging,
        CoherenceModel::FocalAngularAveraging,
        CoherenceModel::QuasiCoherentEnvelopes,
        CoherenceModel::FourierSpaceTcc,
        CoherenceModel::FocalAngularFrozenLattice,
    ];

    pub const fn code(self) -> i32 {
        self as i32 + 1
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|model| model.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WavimgPrm {
    /// Wave function file name used to locate existing wave functions.
    pub wave_files: String,
    /// `(nx, ny)` wave dimensions in pixels.
    pub wave_dim: (usize, usize),
    /// `(sx, sy)` wave sampling [nm/pix].
    pub wave_sampling: (f64, f64),
    /// High tension used for the wave function calculation [kV].
    pub high_tension: i32,
    pub output_format: ImageOutput,
    /// Image output file name.
    pub output_files: String,
    /// `(ix, iy)` image output size in pixels.
    pub output_dim: (usize, usize),
    /// `(flag, mean, conversion, readout noise)`. Flag 0 = off, 1 = 32-bit, 2 = 16-bit.
    pub noise: (i32, f64, f64, f64),
    pub flag_spec_frame: i32,
    /// Output sampling [nm/pix], used with `flag_spec_frame == 1`.
    pub output_sampling: f64,
    pub img_frame_offset: (i32, i32),
    /// Frame rotation [deg] w.r.t. the wave's horizontal axis.
    pub img_rot: f64,
    pub coherence_model: CoherenceModel,
    /// `(flag, focus spread half width [nm])`.
    pub temp_coherence: (i32, f64),
    /// `(flag, beam convergence half width [mrad])`.
    pub spat_coherence: (i32, f64),
    /// `(flag, scale, file)`.
    pub mtf: (i32, f64, String),
    /// `(flag, rms amplitude x [nm], rms amplitude y [nm], orientation [deg])`.
    pub vibration: (i32, f64, f64, f64),
    pub aberrations: AberrationTable,
    /// Objective aperture radius [mrad]. Very large values deactivate it.
    pub oa_radius: f64,
    /// Aperture center w.r.t. the zero beam [mrad].
    pub oa_position: (i32, i32),
    pub number_of_loops: usize,
}

impl Default for WavimgPrm {
    fn default() -> Self {
        Self {
            wave_files: "wav/xxx.wav".to_string(),
            wave_dim: (0, 0),
            wave_sampling: (0.0, 0.0),
            high_tension: 80,
            output_format: ImageOutput::default(),
            output_files: "img/xxx.dat".to_string(),
            output_dim: (0, 0),
            noise: (0, 1.0, 1.0, 0.0),
            flag_spec_frame: 0,
            output_sampling: 0.0,
            img_frame_offset: (0, 0),
            img_rot: 0.0,
            coherence_model: CoherenceModel::default(),
            temp_coherence: (1, 0.5),
            spat_coherence: (1, 0.4),
            mtf: (1, 1.0, "PICO-US4k-080_mtf_bin1_4096.mtf".to_string()),
            vibration: (1, 0.022, 0.022, 0.0),
            aberrations: AberrationTable::new(),
            oa_radius: 15.0,
            oa_position: (0, 0),
            number_of_loops: 0,
        }
    }
}

impl WavimgPrm {
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
        let source = read_prm_source(path, "wavimg")?;
        let document = Self::from_prm_str(&source).map_err(|error| {
            DrProbeError::malformed_document(
                error.placeholder(),
                format!("{}: {}", path.display(), error.message()),
            )
        })?;
        tracing::debug!(
            path = %path.display(),
            aberrations = document.aberrations.len(),
            output = %document.output_files,
            "loaded wavimg parameter file"
        );
        Ok(document)
    }

    pub fn from_prm_str(source: &str) -> DocumentResult<Self> {
        read_document(source)
    }

    pub fn save(&self, path: &Path) -> DocumentResult<()> {
        write_prm_file(path, &self.to_prm_string()?)?;
        tracing::debug!(
            path = %path.display(),
            aberrations = self.aberrations.len(),
            "saved wavimg parameter file"
        );
        Ok(())
    }

    /// Fails when a text field holds both quote characters or a line break.
    pub fn to_prm_string(&self) -> DocumentResult<String> {
        render_document(self, &[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WavimgKey {
    WaveFiles,
    WaveDim,
    WaveSampling,
    HighTension,
    OutputFormat,
    OutputFiles,
    OutputDim,
    Noise,
    FlagSpecFrame,
    OutputSampling,
    ImgFrameOffset,
    ImgRot,
    CoherenceModel,
    TempCoherence,
    SpatCoherence,
    Mtf,
    Vibration,
    OaRadius,
    OaPosition,
    NumberOfLoops,
}

const fn field(
    key: WavimgKey,
    name: &'static str,
    shape: Shape,
    comment: &'static str,
) -> SchemaEntry<WavimgKey> {
    SchemaEntry::Field(FieldSpec {
        key,
        name,
        shape,
        comment,
    })
}

const WAVIMG_SCHEMA: &[SchemaEntry<WavimgKey>] = &[
    field(
        WavimgKey::WaveFiles,
        "wave_files",
        Shape::Scalar(T),
        "Wave function file name string used to locate existing wave functions. Use quotation marks when the string includes space characters.",
    ),
    field(
        WavimgKey::WaveDim,
        "wave_dim",
        Shape::Tuple(&[I, I]),
        "Dimension of the wave data in pixels, <nx> = number of horizontal wave pixels, <ny> = number of vertical wave pixels.",
    ),
    field(
        WavimgKey::WaveSampling,
        "wave_sampling",
        Shape::Tuple(&[F, F]),
        "Sampling rate of the wave data (<sx> = horizontal, <sy> = vertical) [nm/pix].",
    ),
    field(
        WavimgKey::HighTension,
        "high_tension",
        Shape::Scalar(I),
        "TEM high-tension used for wave function calculation [kV].",
    ),
    field(
        WavimgKey::OutputFormat,
        "output_format",
        Shape::Scalar(I),
        "Image output type option: 0 = TEM image, 1 = complex image plane wave, 2 = wave amplitude, 3 = wave phase, 4 = wave real part, 5 = wave imaginary part, 6 = TEM image map of 2 variables.",
    ),
    field(
        WavimgKey::OutputFiles,
        "output_files",
        Shape::Scalar(T),
        "Image output file name string. Use quotation marks when the string includes space characters.",
    ),
    field(
        WavimgKey::OutputDim,
        "output_dim",
        Shape::Tuple(&[I, I]),
        "Image output size (<ix> = horizontal , <iy> = vertical) in number of pixels.",
    ),
    field(
        WavimgKey::Noise,
        "noise",
        Shape::Tuple(&[I, F, F, F]),
        "Flag and parameters for creating integer images with optional noise. Flag <intflg> 0 = off (default), 1 = 32-bit, 2 = 16-bit, Parameter: <mean> = mean vacuum intensity, <conv> = electron to counts conversion rate, <rnoise> detector readout rms noise level in counts.",
    ),
    field(
        WavimgKey::FlagSpecFrame,
        "flag_spec_frame",
        Shape::Scalar(I),
        "Flag activating the extraction of a special image frame (0=OFF, 1=ON). The frame parameters are defined in the lines below.",
    ),
    field(
        WavimgKey::OutputSampling,
        "output_sampling",
        Shape::Scalar(F),
        "Image output sampling rate [nm/pix], isotropic. The parameter is used only if the Flag in line 09 is set to 1.",
    ),
    field(
        WavimgKey::ImgFrameOffset,
        "img_frame_offset",
        Shape::Tuple(&[I, I]),
        "Image frame offset in pixels of the input wave. The parameter is used only if the Flag in line 09 is set to 1.",
    ),
    field(
        WavimgKey::ImgRot,
        "img_rot",
        Shape::Scalar(F),
        "Image frame rotation in [deg] with respect to the input wave horizontal axis. The parameter is used only if the Flag in line 09 is set to 1.",
    ),
    field(
        WavimgKey::CoherenceModel,
        "coherence_model",
        Shape::Scalar(I),
        "Coherence calculation model switch: 1 = averaging of coherent sub images explicit focal variation but quasi-coherent spatial envelope, 2 = averaging of coherent sub images with explicit focal and angular variation, 3 = quasi-coherent linear envelopes, 4 = Fourier-space synthesis with partially coherent TCC, 5 = averaging of coherent sub images with explicit focal, angular, and frozen lattice variation.",
    ),
    field(
        WavimgKey::TempCoherence,
        "temp_coherence",
        Shape::Tuple(&[I, F]),
        "Flag and parameters for partial temporal coherence: <ptcflg> = flag (0=OFF, 1=ON), <f-spread> = focus spread (1/e) half width [nm].",
    ),
    field(
        WavimgKey::SpatCoherence,
        "spat_coherence",
        Shape::Tuple(&[I, F]),
        "Flag and parameters for partial spatial coherence: <pscflg> = flag (0=OFF, 1=ON), <s-conv> = beam convergence (1/e) half width [mrad].",
    ),
    field(
        WavimgKey::Mtf,
        "mtf",
        Shape::Tuple(&[I, F, T]),
        "Flag and parameters for applying the detector MTF: <mtfflag> = flag (0=OFF, 1=ON), <mtf-scale> = calculation scale of the mtf = (sampling rate experiment)/(sampling rate simulation), <mtf-file> = File name string to locate the MTF data. Use quotation marks when the string includes space characters.",
    ),
    field(
        WavimgKey::Vibration,
        "vibration",
        Shape::Tuple(&[I, F, F, F]),
        "Flag and parameters for a vibration envelope: <vibflg> = flag (0=OFF, 1=ON-ISO, 2=ON-ANISO), <vibprm1>, <vibprm2> = vibration RMS amplitudes [nm], <vibprm3> = orientation [deg] of the primary vibration amplitude w.r.t. the horizontal image axis.",
    ),
    SchemaEntry::Aberrations {
        comment: "Number of aberration definitions following this line.",
    },
    field(
        WavimgKey::OaRadius,
        "oa_radius",
        Shape::Scalar(F),
        "Objective aperture radius [mrad]. Set to very large values to deactivate.",
    ),
    field(
        WavimgKey::OaPosition,
        "oa_position",
        Shape::Tuple(&[I, I]),
        "Center of the objective aperture with respect to the zero beam [mrad].",
    ),
    field(
        WavimgKey::NumberOfLoops,
        "number_of_loops",
        Shape::Scalar(I),
        "Number variable of loop definitions following below.",
    ),
];

fn int(value: i32) -> Scalar {
    Scalar::Int(value.into())
}

fn usize_pair(value: Value) -> Result<(usize, usize), String> {
    let [first, second] = value.into_tuple::<2>()?;
    Ok((first.as_usize()?, second.as_usize()?))
}

fn int_pair(value: Value) -> Result<(i32, i32), String> {
    let [first, second] = value.into_tuple::<2>()?;
    Ok((first.as_i32()?, second.as_i32()?))
}

fn flag_and_float(value: Value) -> Result<(i32, f64), String> {
    let [flag, number] = value.into_tuple::<2>()?;
    Ok((flag.as_i32()?, number.as_f64()?))
}

fn flag_and_three_floats(value: Value) -> Result<(i32, f64, f64, f64), String> {
    let [flag, first, second, third] = value.into_tuple::<4>()?;
    Ok((flag.as_i32()?, first.as_f64()?, second.as_f64()?, third.as_f64()?))
}

impl SchemaDocument for WavimgPrm {
    type Key = WavimgKey;

    const PARSE_PLACEHOLDER: &'static str = "PARSE.WAVIMG_LINE";

    fn schema() -> &'static [SchemaEntry<WavimgKey>] {
        WAVIMG_SCHEMA
    }

    fn value(&self, key: WavimgKey) -> Value {
        match key {
            WavimgKey::WaveFiles => Value::text(&self.wave_files),
            WavimgKey::WaveDim => Value::pair(
                Scalar::Int(self.wave_dim.0 as i64),
                Scalar::Int(self.wave_dim.1 as i64),
            ),
            WavimgKey::WaveSampling => Value::floats(&[self.wave_sampling.0, self.wave_sampling.1]),
            WavimgKey::HighTension => Value::int(self.high_tension),
            WavimgKey::OutputFormat => Value::int(self.output_format.code()),
            WavimgKey::OutputFiles => Value::text(&self.output_files),
            WavimgKey::OutputDim => Value::pair(
                Scalar::Int(self.output_dim.0 as i64),
                Scalar::Int(self.output_dim.1 as i64),
            ),
            WavimgKey::Noise => Value::Tuple(vec![
                int(self.noise.0),
                Scalar::Float(self.noise.1),
                Scalar::Float(self.noise.2),
                Scalar::Float(self.noise.3),
            ]),
            WavimgKey::FlagSpecFrame => Value::int(self.flag_spec_frame),
            WavimgKey::OutputSampling => Value::float(self.output_sampling),
            WavimgKey::ImgFrameOffset => {
                Value::pair(int(self.img_frame_offset.0), int(self.img_frame_offset.1))
            }
            WavimgKey::ImgRot => Value::float(self.img_rot),
            WavimgKey::CoherenceModel => Value::int(self.coherence_model.code()),
            WavimgKey::TempCoherence => Value::pair(
                int(self.temp_coherence.0),
                Scalar::Float(self.temp_coherence.1),
            ),
            WavimgKey::SpatCoherence => Value::pair(
                int(self.spat_coherence.0),
                Scalar::Float(self.spat_coherence.1),
            ),
            WavimgKey::Mtf => Value::Tuple(vec![
                int(self.mtf.0),
                Scalar::Float(self.mtf.1),
                Scalar::Text(self.mtf.2.clone()),
            ]),
            WavimgKey::Vibration => Value::Tuple(vec![
                int(self.vibration.0),
                Scalar::Float(self.vibration.1),
                Scalar::Float(self.vibration.2),
                Scalar::Float(self.vibration.3),
            ]),
            WavimgKey::OaRadius => Value::float(self.oa_radius),
            WavimgKey::OaPosition => Value::pair(int(self.oa_position.0), int(self.oa_position.1)),
            WavimgKey::NumberOfLoops => Value::count(self.number_of_loops),
        }
    }

    fn assign(&mut self, key: WavimgKey, value: Value) -> Result<(), String> {
        match key {
            WavimgKey::WaveFiles => self.wave_files = value.into_string()?,
            WavimgKey::WaveDim => self.wave_dim = usize_pair(value)?,
            WavimgKey::WaveSampling => {
                let [sx, sy] = value.into_tuple::<2>()?;
                self.wave_sampling = (sx.as_f64()?, sy.as_f64()?);
            }
            WavimgKey::HighTension => self.high_tension = value.into_i32()?,
            WavimgKey::OutputFormat => {
                let code = value.into_i32()?;
                self.output_format = ImageOutput::from_code(code)
                    .ok_or_else(|| format!("unknown image output option {}, expected 0..=6", code))?;
            }
            WavimgKey::OutputFiles => self.output_files = value.into_string()?,
            WavimgKey::OutputDim => self.output_dim = usize_pair(value)?,
            WavimgKey::Noise => self.noise = flag_and_three_floats(value)?,
            WavimgKey::FlagSpecFrame => self.flag_spec_frame = value.into_i32()?,
            WavimgKey::OutputSampling => self.output_sampling = value.into_f64()?,
            WavimgKey::ImgFrameOffset => self.img_frame_offset = int_pair(value)?,
            WavimgKey::ImgRot => self.img_rot = value.into_f64()?,
            WavimgKey::CoherenceModel => {
                let code = value.into_i32()?;
                self.coherence_model = CoherenceModel::from_code(code)
                    .ok_or_else(|| format!("unknown coherence model {}, expected 1..=5", code))?;
            }
            WavimgKey::TempCoherence => self.temp_coherence = flag_and_float(value)?,
            WavimgKey::SpatCoherence => self.spat_coherence = flag_and_float(value)?,
            WavimgKey::Mtf => {
                let [flag, scale, file] = value.into_tuple::<3>()?;
                self.mtf = (flag.as_i32()?, scale.as_f64()?, file.into_text()?);
            }
            WavimgKey::Vibration => self.vibration = flag_and_three_floats(value)?,
            WavimgKey::OaRadius => self.oa_radius = value.into_f64()?,
            WavimgKey::OaPosition => self.oa_position = int_pair(value)?,
            WavimgKey::NumberOfLoops => self.number_of_loops = value.into_usize()?,
        }
        Ok(())
    }

    fn aberrations(&self) -> &AberrationTable {
        &self.aberrations
    }

    fn aberrations_mut(&mut self) -> &mut AberrationTable {
        &mut self.aberrations
    }

    /// Loop definitions follow the loop count; they are not modelled.
    fn allows_trailing_lines(&self) -> bool {
        self.number_of_loops > 0
    }
}

#[cfg(test)]
mod tests {
    use super::{CoherenceModel, ImageOutput, WavimgPrm};
    use crate::domain::DrProbeErrorCategory;
    use crate::prm::aberration::Aberration;

    fn lines(document: &WavimgPrm) -> Vec<String> {
        document
            .to_prm_string()
            .expect("render should succeed")
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn values(line: &str) -> &str {
        line.split(" ! ").next().unwrap_or("").trim()
    }

    #[test]
    fn default_document_renders_expected_values() {
        let rendered = lines(&WavimgPrm::default());

        assert_eq!(rendered.len(), 21);
        assert_eq!(values(&rendered[0]), "'wav/xxx.wav'");
        assert_eq!(values(&rendered[1]), "0, 0");
        assert_eq!(values(&rendered[2]), "0.0, 0.0");
        assert_eq!(values(&rendered[3]), "80");
        assert_eq!(values(&rendered[4]), "1");
        assert_eq!(values(&rendered[5]), "'img/xxx.dat'");
        assert_eq!(values(&rendered[7]), "0, 1.0, 1.0, 0.0");
        assert_eq!(values(&rendered[10]), "0, 0");
        assert_eq!(values(&rendered[12]), "1");
        assert_eq!(values(&rendered[15]), "1, 1.0, 'PICO-US4k-080_mtf_bin1_4096.mtf'");
        assert_eq!(values(&rendered[16]), "1, 0.022, 0.022, 0.0");
        assert_eq!(values(&rendered[17]), "0");
        assert_eq!(values(&rendered[18]), "15.0");
        assert_eq!(values(&rendered[20]), "0");
        assert!(rendered.iter().all(|line| line.contains(" ! ")));
    }

    #[test]
    fn round_trip_preserves_fields_and_aberrations() {
        let mut document = WavimgPrm::default()
            .with_aberration(Aberration::SphericalAberration, (-15000.0, 0.0))
            .with_aberration(Aberration::Defocus, (2.5, 0.0))
            .with_aberration(Aberration::ThreeFoldAstigmatism, (12.3456, 45.0));
        document.wave_files = "wav/SrTiO3 run.wav".to_string();
        document.wave_dim = (512, 256);
        document.wave_sampling = (0.0078125, 0.015625);
        document.high_tension = 300;
        document.output_format = ImageOutput::TemImage;
        document.output_dim = (256, 256);
        document.noise = (1, 1000.0, 0.5, 3.25);
        document.img_frame_offset = (-4, 7);
        document.img_rot = 12.5;
        document.coherence_model = CoherenceModel::FocalAngularFrozenLattice;
        document.vibration = (2, 0.01, 0.03, 35.0);
        document.oa_radius = 250.0;
        document.oa_position = (1, -1);
        document.number_of_loops = 2;

        let rendered = document.to_prm_string().expect("render should succeed");
        let reloaded = WavimgPrm::from_prm_str(&rendered).expect("reload should succeed");
        assert_eq!(reloaded, document);
    }

    #[test]
    fn aberration_lines_follow_index_order_and_count() {
        let document = WavimgPrm::default()
            .with_aberration(Aberration::FifthOrderSpherical, (1.0, 0.0))
            .with_aberration(Aberration::ImageShift, (0.5, 0.25));
        let rendered = lines(&document);

        assert_eq!(values(&rendered[17]), "2");
        assert_eq!(values(&rendered[18]), "0 0.5000 0.2500");
        assert!(rendered[18].ends_with("! image_shift"));
        assert_eq!(values(&rendered[19]), "11 1.0000 0.0000");
        assert!(rendered[19].ends_with("! C5"));
        assert_eq!(values(&rendered[20]), "15.0");
    }

    #[test]
    fn enum_codes_are_stable() {
        assert_eq!(ImageOutput::TemImage.code(), 0);
        assert_eq!(ImageOutput::TemImageMap.code(), 6);
        assert_eq!(ImageOutput::from_code(3), Some(ImageOutput::WavePhase));
        assert_eq!(ImageOutput::from_code(7), None);
        assert_eq!(CoherenceModel::FocalAveraging.code(), 1);
        assert_eq!(CoherenceModel::FourierSpaceTcc.code(), 4);
        assert_eq!(CoherenceModel::from_code(0), None);
        assert_eq!(
            CoherenceModel::from_code(5),
            Some(CoherenceModel::FocalAngularFrozenLattice)
        );
    }

    #[test]
    fn unknown_codes_are_malformed() {
        let mut rendered = lines(&WavimgPrm::default());
        rendered[4] = "9 ! Image output type option".to_string();
        let error =
            WavimgPrm::from_prm_str(&rendered.join("\n")).expect_err("code 9 should be rejected");
        assert_eq!(error.category(), DrProbeErrorCategory::MalformedDocument);
        assert_eq!(error.placeholder(), "PARSE.WAVIMG_LINE");
        assert!(error.message().starts_with("line 5:"), "{}", error.message());

        let mut rendered = lines(&WavimgPrm::default());
        rendered[12] = "0 ! Coherence calculation model switch".to_string();
        let error =
            WavimgPrm::from_prm_str(&rendered.join("\n")).expect_err("model 0 should be rejected");
        assert!(error.message().contains("coherence model"), "{}", error.message());
    }

    #[test]
    fn short_tuples_and_missing_trailer_are_malformed() {
        let mut rendered = lines(&WavimgPrm::default());
        rendered[7] = "1, 1000.0 ! noise".to_string();
        let error = WavimgPrm::from_prm_str(&rendered.join("\n")).expect_err("short noise tuple");
        assert!(error.message().contains("'noise'"), "{}", error.message());

        let rendered = lines(&WavimgPrm::default());
        let truncated = rendered[..20].join("\n");
        let error = WavimgPrm::from_prm_str(&truncated).expect_err("missing loop count");
        assert!(error.message().contains("number_of_loops"), "{}", error.message());
    }

    #[test]
    fn aberration_count_must_match_the_definition_lines() {
        let document = WavimgPrm::default().with_aberration(Aberration::Defocus, (2.0, 0.0));
        let mut rendered = lines(&document);
        assert_eq!(values(&rendered[17]), "1");
        for index in [4, 3, 2] {
            rendered.insert(19, format!("{} 1000.0000 0.0000 ! extra", index));
        }

        let error = WavimgPrm::from_prm_str(&rendered.join("\n"))
            .expect_err("undeclared aberration lines should fail");
        assert_eq!(error.placeholder(), "PARSE.WAVIMG_LINE");
        assert!(error.message().starts_with("line 20:"), "{}", error.message());
        assert!(error.message().contains("'oa_radius'"), "{}", error.message());

        rendered[17] = "4 ! Number of aberration definitions".to_string();
        let reloaded = WavimgPrm::from_prm_str(&rendered.join("\n"))
            .expect("declared aberration lines should load");
        assert_eq!(reloaded.aberrations.len(), 4);
    }

    #[test]
    fn trailing_lines_need_a_loop_count() {
        let mut rendered = lines(&WavimgPrm::default());
        rendered.push("1 ! loop definition".to_string());
        rendered.push(String::new());

        let error = WavimgPrm::from_prm_str(&rendered.join("\n"))
            .expect_err("content after the last field should fail");
        assert!(error.message().starts_with("line 22:"), "{}", error.message());

        rendered[20] = "1 ! Number of loops".to_string();
        let reloaded =
            WavimgPrm::from_prm_str(&rendered.join("\n")).expect("loop lines should be skipped");
        assert_eq!(reloaded.number_of_loops, 1);

        let blank_tail = format!("{}\n\n\n", lines(&WavimgPrm::default()).join("\n"));
        WavimgPrm::from_prm_str(&blank_tail).expect("blank trailing lines should be ignored");
    }

    #[test]
    fn text_fields_with_quotes_survive_a_reload() {
        let mut document = WavimgPrm::default();
        document.output_files = "img/o'brien.dat".to_string();
        document.wave_files = "wav/\"quoted\".wav".to_string();

        let rendered = document.to_prm_string().expect("render should succeed");
        let reloaded = WavimgPrm::from_prm_str(&rendered).expect("reload should succeed");
        assert_eq!(reloaded.output_files, "img/o'brien.dat");
        assert_eq!(reloaded.wave_files, "wav/\"quoted\".wav");

        document.output_files = "img/o'brien \"final\".dat".to_string();
        let error = document
            .to_prm_string()
            .expect_err("text with both quote characters has no file form");
        assert_eq!(error.category(), DrProbeErrorCategory::MalformedDocument);
        assert_eq!(error.placeholder(), "SAVE.PRM_VALUE");
        assert!(error.message().contains("'output_files'"), "{}", error.message());
    }
}
