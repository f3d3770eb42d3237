//! Hex colour strings as used in the reaction colour table.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Colour applied when a user has no recognised reaction left.
pub const FALLBACK_COLOUR: &str = "FFFFFF";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hex colour `{0}`: expected six hex digits such as `00ff00`")]
pub struct ColourError(pub String);

/// An 8-bit RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(red: u8, green: u8, blue: u8) -> Rgb {
        Rgb { red, green, blue }
    }

    /// Decode `RRGGBB`, with or without a leading `#`. Case-insensitive.
    pub fn from_hex(hex: &str) -> Result<Rgb, ColourError> {
        let digits = hex.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColourError(hex.to_string()));
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| ColourError(hex.to_string()))?;
        Ok(Rgb::new(
            (value >> 16) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        ))
    }

    /// Components scaled to `0.0..=1.0`, the form the Sheets API expects.
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.red) / 255.0,
            f32::from(self.green) / 255.0,
            f32::from(self.blue) / 255.0,
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl std::str::FromStr for Rgb {
    type Err = ColourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgb::from_hex("00FF00"), Ok(Rgb::new(0, 255, 0)));
        assert_eq!(Rgb::from_hex("ffff00"), Ok(Rgb::new(255, 255, 0)));
        assert_eq!(Rgb::from_hex("#1a2B3c"), Ok(Rgb::new(0x1A, 0x2B, 0x3C)));
        assert_eq!(Rgb::from_hex(FALLBACK_COLOUR), Ok(Rgb::WHITE));
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        for bad in ["", "fff", "00ff00ff", "zzzzzz", "#", "+12345"] {
            assert_eq!(Rgb::from_hex(bad), Err(ColourError(bad.to_string())), "{bad:?}");
        }
    }

    #[test]
    fn test_to_unit_normalises() {
        assert_eq!(Rgb::new(0, 255, 0).to_unit(), (0.0, 1.0, 0.0));
        let (r, g, b) = Rgb::new(51, 102, 255).to_unit();
        assert!((r - 0.2).abs() < 1e-6);
        assert!((g - 0.4).abs() < 1e-6);
        assert_eq!(b, 1.0);
    }

    #[test]
    fn test_display_round_trips_through_hex() {
        let colour = Rgb::new(0xAB, 0x01, 0xFF);
        assert_eq!(colour.to_string(), "AB01FF");
        assert_eq!(colour.to_string().parse::<Rgb>(), Ok(colour));
    }
}
