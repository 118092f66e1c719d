use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::brush::ColorBrush;

/// Style record for one named token of a grammar.
///
/// Every attribute is optional; an unset attribute means "inherit", never a
/// default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorToken {
    pub name: String,
    pub foreground: Option<ColorBrush>,
    pub background: Option<ColorBrush>,
    pub underline: Option<bool>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
}

impl ColorToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            foreground: None,
            background: None,
            underline: None,
            font_weight: None,
            font_style: None,
        }
    }

    pub fn with_foreground(mut self, brush: impl Into<ColorBrush>) -> Self {
        self.foreground = Some(brush.into());
        self
    }

    pub fn with_background(mut self, brush: impl Into<ColorBrush>) -> Self {
        self.background = Some(brush.into());
        self
    }

    pub fn with_underline(mut self, underline: bool) -> Self {
        self.underline = Some(underline);
        self
    }

    pub fn with_font_weight(mut self, weight: FontWeight) -> Self {
        self.font_weight = Some(weight);
        self
    }

    pub fn with_font_style(mut self, style: FontStyle) -> Self {
        self.font_style = Some(style);
        self
    }

    /// True when no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.foreground.is_none()
            && self.background.is_none()
            && self.underline.is_none()
            && self.font_weight.is_none()
            && self.font_style.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleParseError {
    #[error("'{0}' is not a valid font weight")]
    FontWeight(String),
    #[error("'{0}' is not a valid font style")]
    FontStyle(String),
    #[error("'{0}' is not a valid underline flag")]
    Underline(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontWeight {
    Thin,
    ExtraLight,
    Light,
    Normal,
    Medium,
    SemiBold,
    Bold,
    ExtraBold,
    Black,
    ExtraBlack,
}

impl FontWeight {
    const ALL: [FontWeight; 10] = [
        FontWeight::Thin,
        FontWeight::ExtraLight,
        FontWeight::Light,
        FontWeight::Normal,
        FontWeight::Medium,
        FontWeight::SemiBold,
        FontWeight::Bold,
        FontWeight::ExtraBold,
        FontWeight::Black,
        FontWeight::ExtraBlack,
    ];

    /// OpenType weight class.
    pub fn value(self) -> u16 {
        match self {
            FontWeight::Thin => 100,
            FontWeight::ExtraLight => 200,
            FontWeight::Light => 300,
            FontWeight::Normal => 400,
            FontWeight::Medium => 500,
            FontWeight::SemiBold => 600,
            FontWeight::Bold => 700,
            FontWeight::ExtraBold => 800,
            FontWeight::Black => 900,
            FontWeight::ExtraBlack => 950,
        }
    }

    /// Nearest named weight; ties resolve to the lighter one.
    pub fn from_value(value: u16) -> Self {
        let mut best = FontWeight::Thin;
        for weight in Self::ALL {
            if weight.value().abs_diff(value) < best.value().abs_diff(value) {
                best = weight;
            }
        }
        best
    }

    pub fn name(self) -> &'static str {
        match self {
            FontWeight::Thin => "Thin",
            FontWeight::ExtraLight => "ExtraLight",
            FontWeight::Light => "Light",
            FontWeight::Normal => "Normal",
            FontWeight::Medium => "Medium",
            FontWeight::SemiBold => "SemiBold",
            FontWeight::Bold => "Bold",
            FontWeight::ExtraBold => "ExtraBold",
            FontWeight::Black => "Black",
            FontWeight::ExtraBlack => "ExtraBlack",
        }
    }
}

impl FromStr for FontWeight {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        let weight = match value.to_ascii_lowercase().as_str() {
            "thin" => FontWeight::Thin,
            "extralight" | "ultralight" => FontWeight::ExtraLight,
            "light" => FontWeight::Light,
            "normal" | "regular" => FontWeight::Normal,
            "medium" => FontWeight::Medium,
            "semibold" | "demibold" => FontWeight::SemiBold,
            "bold" => FontWeight::Bold,
            "extrabold" | "ultrabold" => FontWeight::ExtraBold,
            "black" | "heavy" => FontWeight::Black,
            "extrablack" | "ultrablack" => FontWeight::ExtraBlack,
            other => match other.parse::<u16>() {
                Ok(number) if (1..=999).contains(&number) => FontWeight::from_value(number),
                _ => return Err(StyleParseError::FontWeight(value.to_string())),
            },
        };
        Ok(weight)
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Normal,
    Italic,
    Oblique,
}

impl FromStr for FontStyle {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        match value.to_ascii_lowercase().as_str() {
            "normal" => Ok(FontStyle::Normal),
            "italic" => Ok(FontStyle::Italic),
            "oblique" => Ok(FontStyle::Oblique),
            _ => Err(StyleParseError::FontStyle(value.to_string())),
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FontStyle::Normal => "Normal",
            FontStyle::Italic => "Italic",
            FontStyle::Oblique => "Oblique",
        })
    }
}

pub fn parse_underline(value: &str) -> Result<bool, StyleParseError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(StyleParseError::Underline(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn font_weight_accepts_names_aliases_and_numbers() {
        assert_eq!("Bold".parse::<FontWeight>().unwrap(), FontWeight::Bold);
        assert_eq!("regular".parse::<FontWeight>().unwrap(), FontWeight::Normal);
        assert_eq!("Heavy".parse::<FontWeight>().unwrap(), FontWeight::Black);
        assert_eq!("600".parse::<FontWeight>().unwrap(), FontWeight::SemiBold);
        assert_eq!("650".parse::<FontWeight>().unwrap(), FontWeight::SemiBold);
        assert_eq!("1".parse::<FontWeight>().unwrap(), FontWeight::Thin);
        assert_eq!("999".parse::<FontWeight>().unwrap(), FontWeight::ExtraBlack);
        assert!("0".parse::<FontWeight>().is_err());
        assert!("Chunky".parse::<FontWeight>().is_err());
    }

    #[test]
    fn font_style_and_underline_parse() {
        assert_eq!("Italic".parse::<FontStyle>().unwrap(), FontStyle::Italic);
        assert!("Slanted".parse::<FontStyle>().is_err());
        assert_eq!(parse_underline("true"), Ok(true));
        assert_eq!(parse_underline("0"), Ok(false));
        assert!(parse_underline("yes").is_err());
    }

    #[test]
    fn placeholder_token_has_no_attributes() {
        let token = ColorToken::new("Comment");
        assert!(token.is_empty());
        let token = token.with_foreground(Color::rgb(0x57, 0xA6, 0x4A));
        assert!(!token.is_empty());
    }
}
