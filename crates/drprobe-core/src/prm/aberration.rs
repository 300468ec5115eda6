use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// The twelve coherent aberration terms understood by `msa` and `wavimg`,
/// ordered by their index in the parameter files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Aberration {
    ImageShift,
    Defocus,
    TwoFoldAstigmatism,
    Coma,
    ThreeFoldAstigmatism,
    SphericalAberration,
    StarAberration,
    FourFoldAstigmatism,
    FifthOrderComa,
    LobeAberration,
    FiveFoldAstigmatism,
    FifthOrderSpherical,
}

impl Aberration {
    pub const ALL: [Aberration; 12] = [
        Aberration::ImageShift,
        Aberration::Defocus,
        Aberration::TwoFoldAstigmatism,
        Aberration::Coma,
        Aberration::ThreeFoldAstigmatism,
        Aberration::SphericalAberration,
        Aberration::StarAberration,
        Aberration::FourFoldAstigmatism,
        Aberration::FifthOrderComa,
        Aberration::LobeAberration,
        Aberration::FiveFoldAstigmatism,
        Aberration::FifthOrderSpherical,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Name written as the inline comment of an aberration line.
    pub const fn label(self) -> &'static str {
        match self {
            Self::ImageShift => "image_shift",
            Self::Defocus => "defocus",
            Self::TwoFoldAstigmatism => "2-fold-astigmatism",
            Self::Coma => "coma",
            Self::ThreeFoldAstigmatism => "3-fold-astigmatism",
            Self::SphericalAberration => "CS",
            Self::StarAberration => "star_aberration",
            Self::FourFoldAstigmatism => "4-fold-astigmatism",
            Self::FifthOrderComa => "coma(5th)",
            Self::LobeAberration => "lobe-aberration",
            Self::FiveFoldAstigmatism => "5-fold-astigmatism",
            Self::FifthOrderSpherical => "C5",
        }
    }
}

impl Display for Aberration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).label())
    }
}

/// Aberration coefficients keyed by term. Absent terms are simply not written;
/// the count line in a parameter file is always `len()` at save time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AberrationTable {
    entries: BTreeMap<Aberration, (f64, f64)>,
}

impl AberrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, aberration: Aberration, coefficients: (f64, f64)) -> Option<(f64, f64)> {
        self.entries.insert(aberration, coefficients)
    }

    pub fn get(&self, aberration: Aberration) -> Option<(f64, f64)> {
        self.entries.get(&aberration).copied()
    }

    pub fn remove(&mut self, aberration: Aberration) -> Option<(f64, f64)> {
        self.entries.remove(&aberration)
    }

    pub fn contains(&self, aberration: Aberration) -> bool {
        self.entries.contains_key(&aberration)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Aberration, (f64, f64))> + '_ {
        self.entries
            .iter()
            .map(|(aberration, coefficients)| (*aberration, *coefficients))
    }
}

impl FromIterator<(Aberration, (f64, f64))> for AberrationTable {
    fn from_iter<I: IntoIterator<Item = (Aberration, (f64, f64))>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
