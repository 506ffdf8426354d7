//! Static pasta catalog.
//!
//! Every entry is a long pasta sold in strands of roughly the same length, so
//! a single dry strand doubles as the 10-inch calibration reference.

#[cfg(test)]
#[path = "pasta_test.rs"]
mod pasta_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::REFERENCE_LENGTH_IN;

/// Error returned when parsing a [`PastaKind`] identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PastaError {
    #[error("unknown pasta kind: {0}")]
    UnknownKind(String),
}

/// Physical properties of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PastaSpec {
    pub id: &'static str,
    pub name: &'static str,
    /// Cooked volume divided by raw volume.
    pub expansion: f64,
    /// Dry density in g/cm³.
    pub density: f64,
    /// Strand length in inches.
    pub length_in: f64,
}

const SPAGHETTI: PastaSpec = PastaSpec {
    id: "spaghetti",
    name: "Spaghetti",
    expansion: 2.5,
    density: 0.65,
    length_in: REFERENCE_LENGTH_IN,
};

const ANGEL_HAIR: PastaSpec = PastaSpec {
    id: "angel-hair",
    name: "Angel Hair",
    expansion: 2.2,
    density: 0.60,
    length_in: REFERENCE_LENGTH_IN,
};

const LINGUINE: PastaSpec = PastaSpec {
    id: "linguine",
    name: "Linguine",
    expansion: 2.4,
    density: 0.65,
    length_in: REFERENCE_LENGTH_IN,
};

const FETTUCCINE: PastaSpec = PastaSpec {
    id: "fettuccine",
    name: "Fettuccine",
    expansion: 2.3,
    density: 0.70,
    length_in: REFERENCE_LENGTH_IN,
};

const BUCATINI: PastaSpec = PastaSpec {
    id: "bucatini",
    name: "Bucatini",
    expansion: 2.4,
    density: 0.68,
    length_in: REFERENCE_LENGTH_IN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PastaKind {
    Spaghetti,
    AngelHair,
    Linguine,
    Fettuccine,
    Bucatini,
}

impl PastaKind {
    /// Catalog order, as offered in the selection list.
    pub const ALL: [Self; 5] = [Self::Spaghetti, Self::AngelHair, Self::Linguine, Self::Fettuccine, Self::Bucatini];

    #[must_use]
    pub fn spec(self) -> &'static PastaSpec {
        match self {
            Self::Spaghetti => &SPAGHETTI,
            Self::AngelHair => &ANGEL_HAIR,
            Self::Linguine => &LINGUINE,
            Self::Fettuccine => &FETTUCCINE,
            Self::Bucatini => &BUCATINI,
        }
    }

    #[must_use]
    pub fn id(self) -> &'static str {
        self.spec().id
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    #[must_use]
    pub fn expansion(self) -> f64 {
        self.spec().expansion
    }

    #[must_use]
    pub fn density(self) -> f64 {
        self.spec().density
    }
}

impl FromStr for PastaKind {
    type Err = PastaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| PastaError::UnknownKind(s.to_owned()))
    }
}

impl fmt::Display for PastaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
