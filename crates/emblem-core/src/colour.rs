//! Rank colours.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ColourFormatKind;

/// Largest valid 24-bit RGB value.
pub const MAX_RGB: u32 = 0xFF_FFFF;

/// A rank colour: the platform default, or a 24-bit RGB value.
///
/// Snapshots and role-creation payloads carry colours the way the platform
/// models them, as an optional integer; `Default` maps to `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Option<u32>", into = "Option<u32>")]
pub enum Colour {
    Default,
    Rgb(u32),
}

impl Colour {
    /// Parse the colour field of a definition line: `None` or `#RRGGBB`.
    pub fn parse(field: &str) -> Result<Self, ColourFormatKind> {
        if field == "None" {
            return Ok(Self::Default);
        }
        let Some(hex) = field.strip_prefix('#') else {
            return Err(ColourFormatKind::Unrecognized);
        };
        let value = u32::from_str_radix(hex, 16).map_err(|_| ColourFormatKind::InvalidHex)?;
        if value > MAX_RGB {
            return Err(ColourFormatKind::OutOfRange);
        }
        Ok(Self::Rgb(value))
    }

    /// The wire form used in role-creation payloads.
    pub fn as_rgb(self) -> Option<u32> {
        match self {
            Self::Default => None,
            Self::Rgb(value) => Some(value),
        }
    }
}

/// A stored colour integer above [`MAX_RGB`]; only reachable through a
/// hand-edited or corrupted snapshot.
#[derive(Debug, Error)]
#[error("colour value {0:#x} exceeds #ffffff")]
pub struct ColourOutOfRange(pub u32);

impl TryFrom<Option<u32>> for Colour {
    type Error = ColourOutOfRange;

    fn try_from(value: Option<u32>) -> Result<Self, Self::Error> {
        match value {
            None => Ok(Self::Default),
            Some(value) if value <= MAX_RGB => Ok(Self::Rgb(value)),
            Some(value) => Err(ColourOutOfRange(value)),
        }
    }
}

impl From<Colour> for Option<u32> {
    fn from(colour: Colour) -> Self {
        colour.as_rgb()
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Rgb(value) => write!(f, "#{value:06x}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_sentinel() {
        assert_eq!(Colour::parse("#ff0000"), Ok(Colour::Rgb(0xFF0000)));
        assert_eq!(Colour::parse("#FFFFFF"), Ok(Colour::Rgb(MAX_RGB)));
        assert_eq!(Colour::parse("None"), Ok(Colour::Default));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Colour::parse("#1000000"), Err(ColourFormatKind::OutOfRange));
        assert_eq!(Colour::parse("#zzz"), Err(ColourFormatKind::InvalidHex));
        assert_eq!(Colour::parse("red"), Err(ColourFormatKind::Unrecognized));
        assert_eq!(Colour::parse("none"), Err(ColourFormatKind::Unrecognized));
        assert_eq!(Colour::parse(""), Err(ColourFormatKind::Unrecognized));
    }

    #[test]
    fn wire_form_round_trips() {
        assert_eq!(Colour::try_from(Some(0x00FF00)).unwrap(), Colour::Rgb(0x00FF00));
        assert_eq!(Colour::try_from(None).unwrap(), Colour::Default);
        assert!(Colour::try_from(Some(MAX_RGB + 1)).is_err());
        assert_eq!(Option::<u32>::from(Colour::Default), None);
    }

    #[test]
    fn display_matches_definition_syntax() {
        assert_eq!(Colour::Rgb(0xFF).to_string(), "#0000ff");
        assert_eq!(Colour::Default.to_string(), "default");
    }
}
