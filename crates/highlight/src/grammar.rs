use std::fmt;
use std::sync::Arc;

use crate::token::ColorToken;

/// A base highlighting grammar as seen by the theme layer: a name, its file
/// extensions and the named colors rules refer to.
pub trait Grammar: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn extensions(&self) -> &[String];

    fn named_color(&self, name: &str) -> Option<&ColorToken>;

    fn named_colors(&self) -> Vec<&ColorToken>;
}

pub type GrammarHandle = Arc<dyn Grammar>;

/// Lookup key for an extension: leading dots trimmed, ASCII-lowercased.
pub fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_ascii_lowercase()
}
