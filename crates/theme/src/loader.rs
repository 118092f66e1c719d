use std::sync::Arc;

use themedhl_highlight::{Grammar, GrammarHandle, NamedColorGrammar, SyntaxColorSet};
use tracing::{debug, warn};

use crate::error::{FormatError, ThemeError};

/// Builds a base grammar from its resource bytes, tinted with the active
/// theme's colors for that grammar when the theme has any.
pub trait GrammarLoader: Send + Sync {
    fn load(
        &self,
        name: &str,
        source: &[u8],
        theme_colors: Option<&SyntaxColorSet>,
    ) -> Result<GrammarHandle, ThemeError>;
}

/// Loads the named colors of `.xshd` grammars.
#[derive(Debug, Clone, Copy, Default)]
pub struct XshdGrammarLoader;

impl GrammarLoader for XshdGrammarLoader {
    fn load(
        &self,
        name: &str,
        source: &[u8],
        theme_colors: Option<&SyntaxColorSet>,
    ) -> Result<GrammarHandle, ThemeError> {
        let text = std::str::from_utf8(source)
            .map_err(|err| FormatError::new(format!("grammar is not valid UTF-8: {err}")))?;
        let mut grammar = NamedColorGrammar::from_xshd(text.trim_start_matches('\u{feff}'))
            .map_err(|err| FormatError::new(err.to_string()))?;

        if grammar.name() != name {
            warn!(
                registered = name,
                declared = grammar.name(),
                "grammar declares a different name than it was registered under"
            );
        }
        if let Some(colors) = theme_colors {
            let ignored = grammar.apply_theme(colors);
            if !ignored.is_empty() {
                debug!(grammar = name, ?ignored, "theme colors without a base color were ignored");
            }
        }
        Ok(Arc::new(grammar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ColorDecl, SyntaxColorSetDecl, ThemeDocument};
    use crate::resolver::ThemeResolver;
    use themedhl_highlight::Color;

    const CSHARP: &str = r##"<SyntaxDefinition name="C#" extensions=".cs">
  <Color name="Comment" foreground="Green" />
  <Color name="String" foreground="#A31515" />
</SyntaxDefinition>"##;

    #[test]
    fn tints_named_colors_with_theme() {
        let document = ThemeDocument::new("Dark").with_element(
            SyntaxColorSetDecl::new("C#")
                .with_color(ColorDecl::new("Comment").with_foreground(Color::rgb(0x57, 0xA6, 0x4A))),
        );
        let model = ThemeResolver::resolve(&document).unwrap();

        let grammar = XshdGrammarLoader
            .load("C#", CSHARP.as_bytes(), model.syntax_color_set("C#"))
            .unwrap();
        let comment = grammar.named_color("Comment").unwrap();
        assert_eq!(
            comment.foreground.map(|brush| brush.color()),
            Some(Color::rgb(0x57, 0xA6, 0x4A))
        );
        let string = grammar.named_color("String").unwrap();
        assert_eq!(
            string.foreground.map(|brush| brush.color()),
            Some(Color::rgb(0xA3, 0x15, 0x15))
        );
    }

    #[test]
    fn untinted_load_keeps_base_colors() {
        let grammar = XshdGrammarLoader.load("C#", CSHARP.as_bytes(), None).unwrap();
        assert_eq!(
            grammar
                .named_color("Comment")
                .and_then(|color| color.foreground)
                .map(|brush| brush.color()),
            Some(Color::rgb(0x00, 0x80, 0x00))
        );
    }

    #[test]
    fn malformed_grammar_is_a_format_error() {
        let err = XshdGrammarLoader
            .load("C#", b"<SyntaxDefinition", None)
            .unwrap_err();
        assert!(matches!(err, ThemeError::Format(_)));
    }
}
