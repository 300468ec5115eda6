//! Slice-sequence generation for the `msa` parameter file.

use crate::domain::{DocumentResult, DrProbeError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// How the slice-id block of an `msa` parameter file is produced on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceSampling {
    /// Entry `i` is `i mod number_of_slices`.
    #[default]
    Cyclic,
    /// Writes the ids held by the document, e.g. the ones read by `load`.
    Stored,
    /// Contiguous cyclic runs starting at random offsets, for frozen-lattice
    /// decorrelation. `seed: None` draws the seed from the OS.
    Randomized { seed: Option<u64> },
}

/// The straightforward sequence `0, 1, .., available - 1, 0, 1, ..` of length `total`.
pub fn cyclic_slice_ids(total: usize, available: usize) -> DocumentResult<Vec<usize>> {
    require_available(total, available)?;
    Ok((0..total).map(|step| step % available).collect())
}

/// Randomized contiguous cyclic sampling.
///
/// The sequence is split into blocks whose length is the divisor of `total`
/// closest to `sqrt(total)` (the larger one on a tie). Each block is a run of
/// consecutive slice ids, wrapping at `available`, that starts at an
/// independent random offset. When `total <= available` there is a single
/// block covering the whole sequence.
pub fn randomized_slice_ids(
    total: usize,
    available: usize,
    seed: Option<u64>,
) -> DocumentResult<Vec<usize>> {
    require_available(total, available)?;
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let block_length = if total <= available {
        total
    } else {
        divisor_nearest_sqrt(total)
    };

    let mut ids = Vec::with_capacity(total);
    for _ in 0..total / block_length {
        let offset = rng.gen_range(0..available);
        ids.extend((offset..offset + block_length).map(|step| step % available));
    }
    Ok(ids)
}

/// Divisor of `value` nearest to its square root; ties go to the larger divisor.
pub fn divisor_nearest_sqrt(value: usize) -> usize {
    if value <= 1 {
        return 1;
    }

    // The nearest divisor pairs with the largest divisor not above the root.
    let lower = (1..=value.isqrt())
        .rev()
        .find(|candidate| value % candidate == 0)
        .unwrap_or(1);
    let upper = value / lower;

    let root = (value as f64).sqrt();
    if (upper as f64 - root).abs() <= (root - lower as f64).abs() {
        upper
    } else {
        lower
    }
}

fn require_available(total: usize, available: usize) -> DocumentResult<()> {
    if total > 0 && available == 0 {
        return Err(DrProbeError::malformed_document(
            "PARSE.MSA_SLICES",
            format!(
                "cannot build {} slice ids without any slice files (number of slice files is 0)",
                total
            ),
        ));
    }
    Ok(())
}
