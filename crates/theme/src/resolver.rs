use std::collections::HashMap;

use themedhl_highlight::{ColorSetError, ColorToken, SyntaxColorSet, SyntaxColorSetBuilder};
use tracing::debug;

use crate::document::{ColorDecl, ThemeDocument};
use crate::error::{SemanticError, TextPosition};
use crate::model::{GlobalStyle, ThemeModel};

/// Grammar name to the color set under construction for it.
pub type RegisteredSets = HashMap<String, SyntaxColorSetBuilder>;

/// Compiles a [`ThemeDocument`] into a [`ThemeModel`].
pub struct ThemeResolver;

impl ThemeResolver {
    pub fn resolve(document: &ThemeDocument) -> Result<ThemeModel, SemanticError> {
        let registered = register_names(document)?;
        let syntax_color_sets = populate(document, registered)?;

        let global_styles = document
            .global_styles()
            .map(|decl| GlobalStyle {
                type_name: decl.type_name.clone(),
                foreground: decl.foreground,
                background: decl.background,
                border: decl.border,
            })
            .collect();
        let mut properties = HashMap::new();
        for property in document.properties() {
            properties.insert(property.name.clone(), property.value.clone());
        }

        debug!(
            theme = %document.name,
            grammars = syntax_color_sets.len(),
            "resolved theme overlay"
        );
        Ok(ThemeModel::from_parts(
            document.name.clone(),
            syntax_color_sets,
            global_styles,
            properties,
        ))
    }
}

/// First pass: one empty set per grammar and one placeholder per color,
/// rejecting empty and duplicate names.
pub fn register_names(document: &ThemeDocument) -> Result<RegisteredSets, SemanticError> {
    let mut registered = RegisteredSets::new();
    for decl in document.syntax_color_sets() {
        if decl.name.is_empty() {
            return Err(SemanticError::at(
                decl.position,
                "Name must not be the empty string",
            ));
        }
        if registered.contains_key(&decl.name) {
            return Err(SemanticError::at(
                decl.position,
                format!("Duplicate syntax definition name '{}'.", decl.name),
            ));
        }
        let mut builder = SyntaxColorSetBuilder::new(decl.name.as_str())
            .map_err(|err| color_set_error(decl.position, err))?;
        for color in &decl.colors {
            builder
                .register_color(&color.name)
                .map_err(|err| color_set_error(color.position, err))?;
        }
        registered.insert(decl.name.clone(), builder);
    }
    Ok(registered)
}

/// Second pass: copies extensions and overwrites every placeholder with the
/// declared attributes, then freezes the sets.
pub fn populate(
    document: &ThemeDocument,
    mut registered: RegisteredSets,
) -> Result<HashMap<String, SyntaxColorSet>, SemanticError> {
    for decl in document.syntax_color_sets() {
        let builder = registered.get_mut(&decl.name).ok_or_else(|| {
            SemanticError::at(
                decl.position,
                format!("Themed Syntax Definition does not exist '{}'.", decl.name),
            )
        })?;
        builder.set_extensions(decl.extensions.iter().cloned());
        for color in &decl.colors {
            if color.name.is_empty() {
                return Err(SemanticError::at(
                    color.position,
                    "Name must not be the empty string",
                ));
            }
            builder
                .populate_color(color_token(color))
                .map_err(|err| color_set_error(color.position, err))?;
        }
    }
    Ok(registered
        .into_iter()
        .map(|(name, builder)| (name, builder.finish()))
        .collect())
}

fn color_token(decl: &ColorDecl) -> ColorToken {
    ColorToken {
        name: decl.name.clone(),
        foreground: decl.foreground,
        background: decl.background,
        underline: decl.underline,
        font_weight: decl.font_weight,
        font_style: decl.font_style,
    }
}

fn color_set_error(position: Option<TextPosition>, err: ColorSetError) -> SemanticError {
    let message = match err {
        ColorSetError::DuplicateColor(name) => format!("Duplicate color name '{name}'."),
        ColorSetError::UnknownColor(name) => format!("Color '{name}' does not exist."),
        ColorSetError::EmptyName => "Name must not be the empty string".to_string(),
    };
    SemanticError::at(position, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{GlobalStyleDecl, PropertyDecl, SyntaxColorSetDecl};
    use themedhl_highlight::Color;

    fn csharp() -> SyntaxColorSetDecl {
        SyntaxColorSetDecl::new("C#")
            .with_extensions([".cs"])
            .with_color(ColorDecl::new("Comment").with_foreground(Color::rgb(0x57, 0xA6, 0x4A)))
            .with_color(ColorDecl::new("String").with_background(Color::rgb(1, 2, 3)))
    }

    #[test]
    fn pass_one_registers_placeholders() {
        let document = ThemeDocument::new("Dark").with_element(csharp());
        let registered = register_names(&document).unwrap();
        let set = registered.into_iter().next().unwrap().1.finish();
        assert_eq!(set.name(), "C#");
        assert!(set.extensions().is_empty());
        assert!(set.color("Comment").unwrap().is_empty());
        assert!(set.color("String").unwrap().is_empty());
    }

    #[test]
    fn pass_two_fills_values_and_extensions() {
        let document = ThemeDocument::new("Dark").with_element(csharp());
        let registered = register_names(&document).unwrap();
        let sets = populate(&document, registered).unwrap();
        let set = &sets["C#"];
        assert_eq!(set.extensions(), [".cs".to_string()]);
        assert_eq!(
            set.color("Comment").unwrap().foreground.map(|brush| brush.color()),
            Some(Color::rgb(0x57, 0xA6, 0x4A))
        );
    }

    #[test]
    fn pass_two_rejects_unregistered_grammar() {
        let document = ThemeDocument::new("Dark").with_element(csharp());
        let err = populate(&document, RegisteredSets::new()).unwrap_err();
        assert!(err.message.contains("does not exist"));
    }

    #[test]
    fn duplicate_grammar_names_fail_in_either_order() {
        let other = SyntaxColorSetDecl::new("C#").with_color(ColorDecl::new("Keyword"));
        for document in [
            ThemeDocument::new("Dark")
                .with_element(csharp())
                .with_element(other.clone()),
            ThemeDocument::new("Dark")
                .with_element(other.clone())
                .with_element(csharp()),
        ] {
            let err = ThemeResolver::resolve(&document).unwrap_err();
            assert_eq!(err.message, "Duplicate syntax definition name 'C#'.");
        }
    }

    #[test]
    fn duplicate_color_names_fail() {
        let document = ThemeDocument::new("Dark").with_element(
            csharp().with_color(ColorDecl::new("Comment").with_foreground(Color::rgb(0, 0, 0))),
        );
        let err = ThemeResolver::resolve(&document).unwrap_err();
        assert_eq!(err.message, "Duplicate color name 'Comment'.");
    }

    #[test]
    fn empty_names_fail() {
        let document = ThemeDocument::new("Dark").with_element(SyntaxColorSetDecl::new(""));
        assert!(ThemeResolver::resolve(&document).is_err());

        let document = ThemeDocument::new("Dark")
            .with_element(SyntaxColorSetDecl::new("C#").with_color(ColorDecl::new("")));
        let err = ThemeResolver::resolve(&document).unwrap_err();
        assert_eq!(err.message, "Name must not be the empty string");
    }

    #[test]
    fn properties_are_last_write_wins_and_styles_keep_order() {
        let document = ThemeDocument::new("Dark")
            .with_element(PropertyDecl::new("Author", "first"))
            .with_element(GlobalStyleDecl::new("Selection"))
            .with_element(PropertyDecl::new("Author", "second"))
            .with_element(GlobalStyleDecl::new("DefaultStyle"));
        let model = ThemeResolver::resolve(&document).unwrap();
        assert_eq!(model.property("Author"), Some("second"));
        let names: Vec<_> = model
            .global_styles()
            .iter()
            .map(|style| style.type_name.as_str())
            .collect();
        assert_eq!(names, ["Selection", "DefaultStyle"]);
    }
}
