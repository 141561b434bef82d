use crate::common::CompareError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Frequency-domain hash: luminance grid, 2-D DCT, sign bits of the
    /// lowest-frequency coefficient block.
    Structural,
    /// Adjacent-pixel hash: bit set when a cell is brighter than its
    /// right-hand neighbor.
    Gradient,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Structural => write!(f, "structural"),
            HashAlgorithm::Gradient => write!(f, "gradient"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structural" => Ok(HashAlgorithm::Structural),
            "gradient" => Ok(HashAlgorithm::Gradient),
            other => Err(CompareError::Configuration {
                message: format!("unknown hash algorithm '{}'", other),
            }),
        }
    }
}

/// A perceptual fingerprint: a fixed-length bit sequence packed MSB-first
/// into bytes. Two fingerprints are comparable only when they were computed
/// with the same algorithm and grid size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub(crate) algorithm: HashAlgorithm,
    pub(crate) grid_size: u32,
    pub(crate) bits: Vec<u8>,
    pub(crate) bit_len: usize,
}

impl Fingerprint {
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}
