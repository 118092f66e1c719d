use std::fmt;

use thiserror::Error;

use crate::color::{Color, ColorParseError};

/// Prefix that marks a symbolic reference into the system palette.
pub const SYSTEM_COLORS_PREFIX: &str = "SystemColors.";

macro_rules! system_colors {
    ($($variant:ident => $rgb:expr),* $(,)?) => {
        /// Entries of the fixed system palette that overlay files may reference
        /// through `SystemColors.<Name>`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SystemColor {
            $($variant),*
        }

        impl SystemColor {
            pub const ALL: &'static [SystemColor] = &[$(SystemColor::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(SystemColor::$variant => stringify!($variant)),*
                }
            }

            /// Palette value used when the host does not supply its own.
            pub fn default_color(self) -> Color {
                let value: u32 = match self {
                    $(SystemColor::$variant => $rgb),*
                };
                Color::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
            }
        }
    };
}

system_colors! {
    ActiveBorder => 0xB4B4B4,
    ActiveCaption => 0x99B4D1,
    ActiveCaptionText => 0x000000,
    AppWorkspace => 0xABABAB,
    Control => 0xF0F0F0,
    ControlDark => 0xA0A0A0,
    ControlDarkDark => 0x696969,
    ControlLight => 0xE3E3E3,
    ControlLightLight => 0xFFFFFF,
    ControlText => 0x000000,
    Desktop => 0x000000,
    GradientActiveCaption => 0xB9D1EA,
    GradientInactiveCaption => 0xD7E4F2,
    GrayText => 0x6D6D6D,
    Highlight => 0x0078D7,
    HighlightText => 0xFFFFFF,
    HotTrack => 0x0066CC,
    InactiveBorder => 0xF4F7FC,
    InactiveCaption => 0xBFCDDB,
    InactiveCaptionText => 0x000000,
    InactiveSelectionHighlight => 0xF0F0F0,
    InactiveSelectionHighlightText => 0x000000,
    Info => 0xFFFFE1,
    InfoText => 0x000000,
    Menu => 0xF0F0F0,
    MenuBar => 0xF0F0F0,
    MenuHighlight => 0x3399FF,
    MenuText => 0x000000,
    ScrollBar => 0xC8C8C8,
    Window => 0xFFFFFF,
    WindowFrame => 0x646464,
    WindowText => 0x000000,
}

impl SystemColor {
    /// Exact, case-sensitive lookup by palette name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|color| color.name() == name)
    }
}

impl fmt::Display for SystemColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SYSTEM_COLORS_PREFIX}{}", self.name())
    }
}

/// A color value as written in an overlay: either fixed at parse time or a
/// late-bound system palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorBrush {
    Fixed(Color),
    System(SystemColor),
}

impl ColorBrush {
    pub fn color(&self) -> Color {
        match self {
            ColorBrush::Fixed(color) => *color,
            ColorBrush::System(system) => system.default_color(),
        }
    }
}

impl From<Color> for ColorBrush {
    fn from(value: Color) -> Self {
        ColorBrush::Fixed(value)
    }
}

impl fmt::Display for ColorBrush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorBrush::Fixed(color) => fmt::Display::fmt(color, f),
            ColorBrush::System(system) => fmt::Display::fmt(system, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrushParseError {
    #[error(transparent)]
    Color(#[from] ColorParseError),
    /// `SystemColors.<Name>` named an entry outside the palette.
    #[error("Cannot find '{0}'")]
    UnknownReference(String),
}

/// Parses a brush attribute: a color literal, or `SystemColors.<Name>`.
pub fn parse_brush(input: &str) -> Result<ColorBrush, BrushParseError> {
    let trimmed = input.trim();
    if let Some(reference) = trimmed.strip_prefix(SYSTEM_COLORS_PREFIX) {
        return SystemColor::from_name(reference)
            .map(ColorBrush::System)
            .ok_or_else(|| BrushParseError::UnknownReference(trimmed.to_string()));
    }
    Ok(ColorBrush::Fixed(Color::parse(trimmed)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_system_color_references() {
        let brush = parse_brush("SystemColors.WindowText").unwrap();
        assert_eq!(brush, ColorBrush::System(SystemColor::WindowText));
        assert_eq!(brush.color(), Color::rgb(0, 0, 0));
        assert_eq!(brush.to_string(), "SystemColors.WindowText");
    }

    #[test]
    fn unknown_system_reference_names_the_reference() {
        let err = parse_brush("SystemColors.NoSuchBrush").unwrap_err();
        assert_eq!(
            err,
            BrushParseError::UnknownReference("SystemColors.NoSuchBrush".into())
        );
        assert_eq!(err.to_string(), "Cannot find 'SystemColors.NoSuchBrush'");
    }

    #[test]
    fn literal_brushes_are_fixed() {
        assert_eq!(
            parse_brush("#1E1E1E").unwrap(),
            ColorBrush::Fixed(Color::rgb(0x1E, 0x1E, 0x1E))
        );
        assert!(matches!(
            parse_brush("#12"),
            Err(BrushParseError::Color(ColorParseError::InvalidLength))
        ));
    }

    #[test]
    fn color_errors_keep_their_message() {
        let err = parse_brush("#GGG").unwrap_err();
        assert_eq!(err, BrushParseError::Color(ColorParseError::InvalidHex));
        assert_eq!(err.to_string(), "contains non-hex digits");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn system_palette_names_are_unique() {
        for (index, color) in SystemColor::ALL.iter().enumerate() {
            assert_eq!(SystemColor::from_name(color.name()), Some(*color));
            assert!(SystemColor::ALL[..index].iter().all(|other| other != color));
        }
    }
}
