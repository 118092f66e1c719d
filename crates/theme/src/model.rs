use std::collections::HashMap;

use themedhl_highlight::{ColorBrush, SyntaxColorSet};

/// Editor chrome override from an overlay's `<GlobalStyles>` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalStyle {
    pub type_name: String,
    pub foreground: Option<ColorBrush>,
    pub background: Option<ColorBrush>,
    pub border: Option<ColorBrush>,
}

impl GlobalStyle {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            foreground: None,
            background: None,
            border: None,
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

    pub fn with_border(mut self, brush: impl Into<ColorBrush>) -> Self {
        self.border = Some(brush.into());
        self
    }
}

/// A resolved overlay: per-grammar color sets, global styles and free-form
/// properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeModel {
    name: String,
    syntax_color_sets: HashMap<String, SyntaxColorSet>,
    global_styles: Vec<GlobalStyle>,
    properties: HashMap<String, String>,
}

impl ThemeModel {
    pub(crate) fn from_parts(
        name: String,
        syntax_color_sets: HashMap<String, SyntaxColorSet>,
        global_styles: Vec<GlobalStyle>,
        properties: HashMap<String, String>,
    ) -> Self {
        Self {
            name,
            syntax_color_sets,
            global_styles,
            properties,
        }
    }

    /// A model with only global styles, for callers that drive chrome
    /// application without an overlay file.
    pub fn with_global_styles(name: impl Into<String>, global_styles: Vec<GlobalStyle>) -> Self {
        Self {
            name: name.into(),
            global_styles,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn syntax_color_set(&self, grammar: &str) -> Option<&SyntaxColorSet> {
        self.syntax_color_sets.get(grammar)
    }

    /// Grammar names, sorted.
    pub fn grammar_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.syntax_color_sets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn syntax_color_sets(&self) -> impl Iterator<Item = &SyntaxColorSet> {
        self.syntax_color_sets.values()
    }

    pub fn global_styles(&self) -> &[GlobalStyle] {
        &self.global_styles
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }
}
