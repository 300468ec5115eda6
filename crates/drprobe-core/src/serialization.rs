//! Number formatting and file placement shared by the parameter-file writers.

use std::fs;
use std::path::Path;

/// `value` with exactly `precision` decimals, no padding.
pub(crate) fn format_fixed(value: f64, precision: usize) -> String {
    format!("{:.*}", precision, value)
}

/// Creates the directory a file will be written into. Bare file names need none.
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_parent_dir, format_fixed};
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn aberration_coefficients_round_to_four_decimals() {
        assert_eq!(format_fixed(0.123456, 4), "0.1235");
        assert_eq!(format_fixed(-4.5, 4), "-4.5000");
        assert_eq!(format_fixed(1200.0, 4), "1200.0000");
        assert_eq!(format_fixed(2.5, 0), "2");
    }

    #[test]
    fn parent_directories_are_created_once_needed() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("prm/stem/msa.prm");

        ensure_parent_dir(&path).expect("parent directory should be created");
        assert!(temp.path().join("prm/stem").is_dir());
        ensure_parent_dir(&path).expect("existing directory should be accepted");

        ensure_parent_dir(Path::new("wavimg.prm")).expect("bare file names need no directory");
    }
}
