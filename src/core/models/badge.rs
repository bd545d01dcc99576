use serde::{Deserialize, Serialize};

/// Severity bucket that drives indicator color and visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Hidden,
    Nominal,
    Caution,
    Critical,
}

impl Tier {
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    /// Indicator color for the tier; `None` for a hidden badge.
    pub fn color(&self) -> Option<BadgeColor> {
        match self {
            Self::Hidden => None,
            Self::Nominal => Some(BadgeColor::GREEN),
            Self::Caution => Some(BadgeColor::AMBER),
            Self::Critical => Some(BadgeColor::RED),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hidden => write!(f, "Hidden"),
            Self::Nominal => write!(f, "Nominal"),
            Self::Caution => write!(f, "Caution"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// RGB color written alongside the indicator text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BadgeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BadgeColor {
    pub const RED: Self = Self::rgb(0xF4, 0x43, 0x36);
    pub const AMBER: Self = Self::rgb(0xFF, 0xC1, 0x07);
    pub const ORANGE: Self = Self::rgb(0xFF, 0x98, 0x00);
    pub const GREEN: Self = Self::rgb(0x4C, 0xAF, 0x50);
    pub const GRAY: Self = Self::rgb(0x88, 0x88, 0x88);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse "#RRGGBB" (leading '#' optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for BadgeColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<BadgeColor> for String {
    fn from(color: BadgeColor) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for BadgeColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color: '{}'", value))
    }
}

/// What the indicator shows right now. Empty text means cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeFace {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<BadgeColor>,
}

impl BadgeFace {
    pub fn cleared() -> Self {
        Self {
            text: String::new(),
            color: None,
        }
    }

    /// Static "!" shown when no usable data is available.
    pub fn error() -> Self {
        Self {
            text: "!".to_string(),
            color: Some(BadgeColor::GRAY),
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_colors_match_palette() {
        assert_eq!(Tier::Critical.color().unwrap().to_hex(), "#F44336");
        assert_eq!(Tier::Caution.color().unwrap().to_hex(), "#FFC107");
        assert_eq!(Tier::Nominal.color().unwrap().to_hex(), "#4CAF50");
        assert!(Tier::Hidden.color().is_none());
    }

    #[test]
    fn only_hidden_is_invisible() {
        assert!(!Tier::Hidden.is_visible());
        assert!(Tier::Nominal.is_visible());
        assert!(Tier::Caution.is_visible());
        assert!(Tier::Critical.is_visible());
    }

    #[test]
    fn parse_hex_with_and_without_hash() {
        assert_eq!(BadgeColor::from_hex("#888888"), Some(BadgeColor::GRAY));
        assert_eq!(BadgeColor::from_hex("ffc107"), Some(BadgeColor::AMBER));
        assert!(BadgeColor::from_hex("#12345").is_none());
        assert!(BadgeColor::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn face_serializes_color_as_hex() {
        let json = serde_json::to_string(&BadgeFace::error()).unwrap();
        assert_eq!(json, r##"{"text":"!","color":"#888888"}"##);
        let cleared = serde_json::to_string(&BadgeFace::cleared()).unwrap();
        assert_eq!(cleared, r#"{"text":""}"#);
    }
}
