use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ThemeError;

/// Store of overlay and base grammar files, addressed by
/// `(prefix, name)` such as `("ThemedHL.Resources.Themes", "Dark.xshtd")`.
pub trait ResourceProvider: Send + Sync {
    fn open(&self, prefix: &str, name: &str) -> Result<Vec<u8>, ThemeError>;
}

fn not_found(prefix: &str, name: &str) -> ThemeError {
    ThemeError::ResourceNotFound {
        prefix: prefix.to_string(),
        name: name.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    entries: HashMap<(String, String), Vec<u8>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        prefix: impl Into<String>,
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) {
        self.entries
            .insert((prefix.into(), name.into()), data.into());
    }

    pub fn with(
        mut self,
        prefix: impl Into<String>,
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        self.insert(prefix, name, data);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceProvider for MemoryResources {
    fn open(&self, prefix: &str, name: &str) -> Result<Vec<u8>, ThemeError> {
        self.entries
            .get(&(prefix.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| not_found(prefix, name))
    }
}

/// Resources laid out on disk as `<root>/<prefix>/<name>`.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, prefix: &str, name: &str) -> PathBuf {
        self.root.join(prefix).join(name)
    }
}

impl ResourceProvider for DirectoryResources {
    fn open(&self, prefix: &str, name: &str) -> Result<Vec<u8>, ThemeError> {
        match fs::read(self.path_of(prefix, name)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(not_found(prefix, name)),
            Err(err) => Err(ThemeError::ResourceRead {
                prefix: prefix.to_string(),
                name: name.to_string(),
                message: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_lookup_misses_are_not_found() {
        let resources = MemoryResources::new().with("A.Light", "CSharp-Mode.xshd", "<x/>");
        assert_eq!(resources.open("A.Light", "CSharp-Mode.xshd").unwrap(), b"<x/>");
        assert!(matches!(
            resources.open("A.Themes", "CSharp-Mode.xshd"),
            Err(ThemeError::ResourceNotFound { .. })
        ));
    }

    #[test]
    fn directory_resources_read_nested_paths() {
        let dir = tempdir().expect("tempdir");
        let themes = dir.path().join("ThemedHL.Resources.Themes");
        fs::create_dir_all(&themes).unwrap();
        fs::write(themes.join("Dark.xshtd"), "dark").unwrap();

        let resources = DirectoryResources::new(dir.path());
        assert_eq!(
            resources.open("ThemedHL.Resources.Themes", "Dark.xshtd").unwrap(),
            b"dark"
        );
        assert_eq!(
            resources.open("ThemedHL.Resources.Themes", "Missing.xshtd"),
            Err(ThemeError::ResourceNotFound {
                prefix: "ThemedHL.Resources.Themes".into(),
                name: "Missing.xshtd".into(),
            })
        );
    }
}
