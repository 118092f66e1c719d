mod brush;
mod color;
mod color_set;
mod grammar;
mod token;
mod xshd;

pub use brush::{parse_brush, BrushParseError, ColorBrush, SystemColor, SYSTEM_COLORS_PREFIX};
pub use color::{Color, ColorParseError};
pub use color_set::{ColorSetError, SyntaxColorSet, SyntaxColorSetBuilder};
pub use grammar::{normalize_extension, Grammar, GrammarHandle};
pub use token::{parse_underline, ColorToken, FontStyle, FontWeight, StyleParseError};
pub use xshd::{split_extensions, NamedColorGrammar, XshdError};
