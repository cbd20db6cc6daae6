// SPDX-License-Identifier: Apache-2.0

/// Rejected configuration for the cut manager or the superchoice pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    CutSizeOutOfRange { k_max: usize, min: usize, max: usize },
    ZeroKeepMax,
    LutSizeOutOfRange { lut_size: usize, min: usize, max: usize },
    CutSizeNotAboveLutSize { cut_size_max: usize, lut_size: usize },
    ZeroVolumeMax,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CutSizeOutOfRange { k_max, min, max } => write!(
                f,
                "cut size bound {} is outside the supported range [{}, {}]",
                k_max, min, max
            ),
            Self::ZeroKeepMax => write!(f, "cut list capacity must be at least 1"),
            Self::LutSizeOutOfRange { lut_size, min, max } => write!(
                f,
                "LUT size {} is outside the supported range [{}, {}]",
                lut_size, min, max
            ),
            Self::CutSizeNotAboveLutSize {
                cut_size_max,
                lut_size,
            } => write!(
                f,
                "cut size bound {} must exceed the LUT size {}",
                cut_size_max, lut_size
            ),
            Self::ZeroVolumeMax => write!(f, "cone volume cap must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}
