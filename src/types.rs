//! Shared types and enums used across stripcut.
//! Includes `OutputFormat`, `WidthEnforcement` and `SplitStrategy`.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg, // Lossy, written at quality 100
    Bmp,
    Tiff,
    Tga,
}

impl OutputFormat {
    /// Parse a user-facing extension such as `.png` or `jpg`.
    pub fn from_extension(extension: &str) -> Result<Self> {
        let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "bmp" => Ok(OutputFormat::Bmp),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            "tga" => Ok(OutputFormat::Tga),
            _ => Err(Error::UnknownOutputFormat {
                extension: extension.to_string(),
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Tga => "tga",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "PNG"),
            OutputFormat::Jpeg => write!(f, "JPEG"),
            OutputFormat::Bmp => write!(f, "BMP"),
            OutputFormat::Tiff => write!(f, "TIFF"),
            OutputFormat::Tga => write!(f, "TGA"),
        }
    }
}

#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum WidthEnforcement {
    None,
    MatchMinimum,
    Custom,
}

impl std::fmt::Display for WidthEnforcement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidthEnforcement::None => write!(f, "None"),
            WidthEnforcement::MatchMinimum => write!(f, "MatchMinimum"),
            WidthEnforcement::Custom => write!(f, "Custom"),
        }
    }
}

#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Walk away from the nominal row by scan-step until a clean row appears
    Nudge,
    /// Score every row in a window around the nominal row and keep the best
    Windowed,
}

impl std::fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitStrategy::Nudge => write!(f, "Nudge"),
            SplitStrategy::Windowed => write!(f, "Windowed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_extensions() {
        assert_eq!(OutputFormat::from_extension(".png").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_extension(".JPEG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_extension("jpg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_extension(".tif").unwrap(), OutputFormat::Tiff);
        assert_eq!(OutputFormat::from_extension(".tga").unwrap(), OutputFormat::Tga);
    }

    #[test]
    fn rejects_unknown_extension() {
        match OutputFormat::from_extension(".webp") {
            Err(Error::UnknownOutputFormat { extension }) => assert_eq!(extension, ".webp"),
            other => panic!("expected UnknownOutputFormat, got {:?}", other),
        }
    }
}
