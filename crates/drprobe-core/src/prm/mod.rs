pub mod aberration;
pub(crate) mod line;
pub mod msa;
pub(crate) mod schema;
pub mod slices;
pub mod wavimg;

pub use aberration::{Aberration, AberrationTable};
pub use msa::{ConvergenceAngle, MsaPrm};
pub use slices::{SliceSampling, cyclic_slice_ids, divisor_nearest_sqrt, randomized_slice_ids};
pub use wavimg::{CoherenceModel, ImageOutput, WavimgPrm};

use crate::domain::{DocumentResult, DrProbeError};
use crate::serialization::ensure_parent_dir;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

/// The two parameter-file variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrmKind {
    Msa,
    Wavimg,
}

impl PrmKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Msa => "msa",
            Self::Wavimg => "wavimg",
        }
    }

    /// An msa file opens with its microscope section header; anything else is
    /// taken as a wavimg file.
    pub fn detect(source: &str) -> Self {
        let first = source.lines().next().unwrap_or("");
        let header = first.split('!').next().unwrap_or("").trim();
        if header.eq_ignore_ascii_case(msa::MICROSCOPE_SECTION) {
            Self::Msa
        } else {
            Self::Wavimg
        }
    }
}

impl Display for PrmKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

pub(crate) fn read_prm_source(path: &Path, kind: &str) -> DocumentResult<String> {
    fs::read_to_string(path).map_err(|source| {
        DrProbeError::file_system(
            "IO.PRM_READ",
            format!(
                "failed to read {} parameter file '{}': {}",
                kind,
                path.display(),
                source
            ),
        )
    })
}

pub(crate) fn write_prm_file(path: &Path, contents: &str) -> DocumentResult<()> {
    ensure_parent_dir(path).map_err(|source| {
        DrProbeError::file_system(
            "IO.PRM_DIRECTORY",
            format!(
                "failed to create directory for parameter file '{}': {}",
                path.display(),
                source
            ),
        )
    })?;
    fs::write(path, contents).map_err(|source| {
        DrProbeError::file_system(
            "IO.PRM_WRITE",
            format!(
                "failed to write parameter file '{}': {}",
                path.display(),
                source
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{MsaPrm, PrmKind, SliceSampling, WavimgPrm};
    use crate::domain::DrProbeErrorCategory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn kind_detection_uses_the_first_line() {
        let msa = MsaPrm::default()
            .to_prm_string(SliceSampling::Cyclic)
            .expect("msa should render");
        assert_eq!(PrmKind::detect(&msa), PrmKind::Msa);
        let wavimg = WavimgPrm::default()
            .to_prm_string()
            .expect("wavimg should render");
        assert_eq!(PrmKind::detect(&wavimg), PrmKind::Wavimg);
        assert_eq!(PrmKind::detect(""), PrmKind::Wavimg);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let temp = TempDir::new().expect("tempdir should be created");
        let msa_path = temp.path().join("prm/nested/msa.prm");
        let wavimg_path = temp.path().join("prm/other/wavimg.prm");

        MsaPrm::default().save(&msa_path).expect("msa save should succeed");
        WavimgPrm::default()
            .save(&wavimg_path)
            .expect("wavimg save should succeed");

        let reloaded = MsaPrm::load(&msa_path).expect("msa should reload");
        assert_eq!(reloaded.slice_ids.len(), reloaded.tot_number_of_slices);
        assert_eq!(
            WavimgPrm::load(&wavimg_path).expect("wavimg should reload"),
            WavimgPrm::default()
        );
        let written = fs::read_to_string(&msa_path).expect("file should be readable");
        assert!(written.ends_with("End of parameter file.\n"));
    }

    #[test]
    fn missing_files_are_file_system_errors() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = MsaPrm::load(&temp.path().join("absent.prm")).expect_err("load should fail");
        assert_eq!(error.category(), DrProbeErrorCategory::FileSystemError);
        assert_eq!(error.placeholder(), "IO.PRM_READ");
    }

    #[test]
    fn load_errors_name_the_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("broken.prm");
        fs::write(&path, "'wav/a.wav' ! name\n").expect("fixture should be written");

        let error = WavimgPrm::load(&path).expect_err("short file should fail");
        assert_eq!(error.category(), DrProbeErrorCategory::MalformedDocument);
        assert!(error.message().contains("broken.prm"), "{}", error.message());
        assert!(error.message().contains("line 2:"), "{}", error.message());
    }
}
