use themedhl_highlight::{ColorBrush, FontStyle, FontWeight};

use crate::error::TextPosition;

/// XML namespace of the overlay format.
pub const THEME_NAMESPACE: &str =
    "http://icsharpcode.net/sharpdevelop/themesyntaxdefinition/2019";

/// Parse tree of one overlay file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeDocument {
    pub name: String,
    pub elements: Vec<ThemeElement>,
}

impl ThemeDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: impl Into<ThemeElement>) -> Self {
        self.elements.push(element.into());
        self
    }

    pub fn syntax_color_sets(&self) -> impl Iterator<Item = &SyntaxColorSetDecl> {
        self.elements.iter().filter_map(|element| match element {
            ThemeElement::SyntaxColorSet(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn global_styles(&self) -> impl Iterator<Item = &GlobalStyleDecl> {
        self.elements.iter().filter_map(|element| match element {
            ThemeElement::GlobalStyle(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyDecl> {
        self.elements.iter().filter_map(|element| match element {
            ThemeElement::Property(decl) => Some(decl),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeElement {
    SyntaxColorSet(SyntaxColorSetDecl),
    GlobalStyle(GlobalStyleDecl),
    Property(PropertyDecl),
}

impl ThemeElement {
    pub fn position(&self) -> Option<TextPosition> {
        match self {
            ThemeElement::SyntaxColorSet(decl) => decl.position,
            ThemeElement::GlobalStyle(decl) => decl.position,
            ThemeElement::Property(decl) => decl.position,
        }
    }
}

impl From<SyntaxColorSetDecl> for ThemeElement {
    fn from(value: SyntaxColorSetDecl) -> Self {
        ThemeElement::SyntaxColorSet(value)
    }
}

impl From<GlobalStyleDecl> for ThemeElement {
    fn from(value: GlobalStyleDecl) -> Self {
        ThemeElement::GlobalStyle(value)
    }
}

impl From<PropertyDecl> for ThemeElement {
    fn from(value: PropertyDecl) -> Self {
        ThemeElement::Property(value)
    }
}

/// `<SyntaxDefinition>`: the colors one grammar takes under this theme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxColorSetDecl {
    pub name: String,
    pub extensions: Vec<String>,
    pub colors: Vec<ColorDecl>,
    pub position: Option<TextPosition>,
}

impl SyntaxColorSetDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_color(mut self, color: ColorDecl) -> Self {
        self.colors.push(color);
        self
    }
}

/// `<Color>`. Color specs are already resolved to brushes by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorDecl {
    pub name: String,
    pub foreground: Option<ColorBrush>,
    pub background: Option<ColorBrush>,
    pub underline: Option<bool>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub example_text: Option<String>,
    pub position: Option<TextPosition>,
}

impl ColorDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
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
}

/// A child of `<GlobalStyles>`; the element name is the style's type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalStyleDecl {
    pub type_name: String,
    pub foreground: Option<ColorBrush>,
    pub background: Option<ColorBrush>,
    pub border: Option<ColorBrush>,
    pub position: Option<TextPosition>,
}

impl GlobalStyleDecl {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: String,
    pub value: String,
    pub position: Option<TextPosition>,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            position: None,
        }
    }
}
