use std::collections::HashMap;

use thiserror::Error;

use crate::token::ColorToken;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorSetError {
    #[error("Name must not be the empty string")]
    EmptyName,
    #[error("Duplicate color name '{0}'")]
    DuplicateColor(String),
    #[error("Color '{0}' does not exist")]
    UnknownColor(String),
}

/// The named colors of one grammar under one theme, plus the file extensions
/// that grammar is associated with.
///
/// Membership is fixed once the set is built; only the value stored under an
/// existing name can be swapped through [`SyntaxColorSet::replace_color`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxColorSet {
    name: String,
    extensions: Vec<String>,
    colors: HashMap<String, ColorToken>,
}

impl SyntaxColorSet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn color(&self, name: &str) -> Option<&ColorToken> {
        self.colors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.colors.contains_key(name)
    }

    pub fn colors(&self) -> impl Iterator<Item = &ColorToken> {
        self.colors.values()
    }

    /// Color names sorted for stable output.
    pub fn color_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.colors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Swaps the value stored under `token.name`, returning the previous one.
    pub fn replace_color(&mut self, token: ColorToken) -> Result<ColorToken, ColorSetError> {
        match self.colors.get_mut(&token.name) {
            Some(slot) => Ok(std::mem::replace(slot, token)),
            None => Err(ColorSetError::UnknownColor(token.name)),
        }
    }
}

/// Two-phase construction of a [`SyntaxColorSet`].
///
/// `register_color` fixes which names exist; `populate_color` and
/// `set_extensions` fill values in. Only the holder of the builder can do
/// either, and [`SyntaxColorSetBuilder::finish`] freezes the structure.
#[derive(Debug)]
pub struct SyntaxColorSetBuilder {
    set: SyntaxColorSet,
}

impl SyntaxColorSetBuilder {
    pub fn new(name: impl Into<String>) -> Result<Self, ColorSetError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ColorSetError::EmptyName);
        }
        Ok(Self {
            set: SyntaxColorSet {
                name,
                extensions: Vec::new(),
                colors: HashMap::new(),
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.set.name
    }

    /// Adds a placeholder token with no attributes.
    pub fn register_color(&mut self, name: &str) -> Result<(), ColorSetError> {
        if name.is_empty() {
            return Err(ColorSetError::EmptyName);
        }
        if self.set.colors.contains_key(name) {
            return Err(ColorSetError::DuplicateColor(name.to_string()));
        }
        self.set
            .colors
            .insert(name.to_string(), ColorToken::new(name));
        Ok(())
    }

    /// Overwrites a registered placeholder in place.
    pub fn populate_color(&mut self, token: ColorToken) -> Result<(), ColorSetError> {
        if token.name.is_empty() {
            return Err(ColorSetError::EmptyName);
        }
        self.set.replace_color(token).map(|_| ())
    }

    pub fn set_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set.extensions = extensions.into_iter().map(Into::into).collect();
    }

    pub fn finish(self) -> SyntaxColorSet {
        self.set
    }
}
