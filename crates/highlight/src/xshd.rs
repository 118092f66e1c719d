use serde::Deserialize;
use thiserror::Error;

use crate::brush::{parse_brush, BrushParseError};
use crate::color_set::SyntaxColorSet;
use crate::grammar::Grammar;
use crate::token::{parse_underline, ColorToken, FontStyle, FontWeight, StyleParseError};

#[derive(Debug, Error)]
pub enum XshdError {
    #[error("failed to decode grammar definition: {0}")]
    XmlDecode(#[from] quick_xml::DeError),
    #[error("color '{name}': {source}")]
    Brush {
        name: String,
        #[source]
        source: BrushParseError,
    },
    #[error("color '{name}': {source}")]
    Style {
        name: String,
        #[source]
        source: StyleParseError,
    },
}

/// The named-color part of an `.xshd` grammar: enough of the base engine for
/// themes to tint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedColorGrammar {
    name: String,
    extensions: Vec<String>,
    colors: Vec<ColorToken>,
}

impl NamedColorGrammar {
    pub fn new(name: impl Into<String>, extensions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            extensions,
            colors: Vec::new(),
        }
    }

    pub fn with_color(mut self, token: ColorToken) -> Self {
        match self.colors.iter_mut().find(|existing| existing.name == token.name) {
            Some(existing) => *existing = token,
            None => self.colors.push(token),
        }
        self
    }

    pub fn from_xshd(xml: &str) -> Result<Self, XshdError> {
        let definition: XshdDefinition = quick_xml::de::from_str(xml)?;

        let extensions = definition
            .extensions
            .map(|value| split_extensions(&value))
            .unwrap_or_default();
        let mut grammar = NamedColorGrammar::new(definition.name, extensions);
        for entry in definition.colors {
            grammar = grammar.with_color(entry.into_token()?);
        }
        Ok(grammar)
    }

    /// Replaces base colors with the theme's colors of the same name.
    /// Returns the theme color names that have no base counterpart.
    pub fn apply_theme(&mut self, theme: &SyntaxColorSet) -> Vec<String> {
        let mut ignored = Vec::new();
        for name in theme.color_names() {
            let Some(themed) = theme.color(name) else {
                continue;
            };
            match self.colors.iter_mut().find(|color| color.name == name) {
                Some(base) => *base = themed.clone(),
                None => ignored.push(name.to_string()),
            }
        }
        ignored
    }
}

impl Grammar for NamedColorGrammar {
    fn name(&self) -> &str {
        &self.name
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn named_color(&self, name: &str) -> Option<&ColorToken> {
        self.colors.iter().find(|color| color.name == name)
    }

    fn named_colors(&self) -> Vec<&ColorToken> {
        self.colors.iter().collect()
    }
}

/// Splits a `;`-delimited extension attribute, dropping empty entries.
pub fn split_extensions(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename = "SyntaxDefinition")]
struct XshdDefinition {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@extensions", default)]
    extensions: Option<String>,
    #[serde(rename = "Color", default)]
    colors: Vec<XshdColor>,
}

#[derive(Debug, Deserialize)]
struct XshdColor {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@foreground", default)]
    foreground: Option<String>,
    #[serde(rename = "@background", default)]
    background: Option<String>,
    #[serde(rename = "@fontWeight", default)]
    font_weight: Option<String>,
    #[serde(rename = "@fontStyle", default)]
    font_style: Option<String>,
    #[serde(rename = "@underline", default)]
    underline: Option<String>,
}

impl XshdColor {
    fn into_token(self) -> Result<ColorToken, XshdError> {
        let name = self.name;
        let brush = |value: Option<String>| {
            value
                .map(|value| parse_brush(&value))
                .transpose()
                .map_err(|source| XshdError::Brush {
                    name: name.clone(),
                    source,
                })
        };
        let style_error = |source: StyleParseError| XshdError::Style {
            name: name.clone(),
            source,
        };

        let foreground = brush(self.foreground)?;
        let background = brush(self.background)?;
        let font_weight = self
            .font_weight
            .map(|value| value.parse::<FontWeight>())
            .transpose()
            .map_err(style_error)?;
        let font_style = self
            .font_style
            .map(|value| value.parse::<FontStyle>())
            .transpose()
            .map_err(style_error)?;
        let underline = self
            .underline
            .map(|value| parse_underline(&value))
            .transpose()
            .map_err(style_error)?;

        Ok(ColorToken {
            name,
            foreground,
            background,
            underline,
            font_weight,
            font_style,
        })
    }
}
