use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ThemeError;

pub const BASE_PREFIX: &str = "ThemedHL.Resources.Light";
pub const OVERLAY_PREFIX: &str = "ThemedHL.Resources.Themes";

/// Themes and built-in grammars a registry is constructed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeCatalog {
    #[serde(default = "default_current")]
    pub current: String,
    #[serde(default)]
    pub themes: Vec<ThemeEntryConfig>,
    #[serde(default)]
    pub grammars: Vec<BuiltinGrammar>,
}

fn default_current() -> String {
    "Light".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeEntryConfig {
    pub key: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_base_prefix")]
    pub base_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlaySource>,
}

fn default_base_prefix() -> String {
    BASE_PREFIX.to_string()
}

impl ThemeEntryConfig {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            base_prefix: default_base_prefix(),
            overlay: None,
        }
    }

    pub fn with_base_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.base_prefix = prefix.into();
        self
    }

    pub fn with_overlay(mut self, prefix: impl Into<String>, name: impl Into<String>) -> Self {
        self.overlay = Some(OverlaySource {
            prefix: prefix.into(),
            name: name.into(),
        });
        self
    }

    /// Display name, falling back to the key.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.key
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySource {
    pub prefix: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinGrammar {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    pub resource: String,
}

impl BuiltinGrammar {
    pub fn new(name: &str, extensions: &[&str], resource: &str) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
            resource: resource.to_string(),
        }
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ThemeCatalog {
    /// Dark, Light and True Blue over the stock grammar set, Light active.
    pub fn builtin() -> Self {
        Self {
            current: "Light".to_string(),
            themes: vec![
                ThemeEntryConfig::new("Dark", "Dark").with_overlay(OVERLAY_PREFIX, "Dark.xshtd"),
                ThemeEntryConfig::new("Light", "Light"),
                ThemeEntryConfig::new("TrueBlue", "True Blue")
                    .with_overlay(OVERLAY_PREFIX, "TrueBlue.xshtd"),
            ],
            grammars: builtin_grammars(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ThemeError> {
        let catalog: ThemeCatalog = serde_json::from_str(json)
            .map_err(|err| ThemeError::Catalog(format!("failed to parse catalog: {err}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, ThemeError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| ThemeError::Catalog(format!("failed to serialize catalog: {err}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ThemeError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| {
            ThemeError::Catalog(format!("failed to read catalog {}: {err}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ThemeError> {
        if self.themes.is_empty() {
            return Err(ThemeError::Catalog("no themes were provided".into()));
        }
        let mut keys = HashSet::new();
        for theme in &self.themes {
            if theme.key.is_empty() {
                return Err(ThemeError::Catalog("theme keys must not be empty".into()));
            }
            if !keys.insert(theme.key.as_str()) {
                return Err(ThemeError::Catalog(format!(
                    "duplicate theme key '{}'",
                    theme.key
                )));
            }
            if theme.base_prefix.is_empty() {
                return Err(ThemeError::Catalog(format!(
                    "theme '{}' has an empty base prefix",
                    theme.key
                )));
            }
            if let Some(overlay) = &theme.overlay {
                if overlay.prefix.is_empty() || overlay.name.is_empty() {
                    return Err(ThemeError::Catalog(format!(
                        "theme '{}' has an incomplete overlay source",
                        theme.key
                    )));
                }
            }
        }
        if !keys.contains(self.current.as_str()) {
            return Err(ThemeError::Catalog(format!(
                "current theme '{}' is not registered",
                self.current
            )));
        }
        let mut grammar_names = HashSet::new();
        for grammar in &self.grammars {
            if grammar.name.is_empty() || grammar.resource.is_empty() {
                return Err(ThemeError::Catalog(
                    "built-in grammars need a name and a resource".into(),
                ));
            }
            if !grammar_names.insert(grammar.name.as_str()) {
                return Err(ThemeError::Catalog(format!(
                    "duplicate grammar '{}'",
                    grammar.name
                )));
            }
        }
        Ok(())
    }

    pub fn theme(&self, key: &str) -> Option<&ThemeEntryConfig> {
        self.themes.iter().find(|theme| theme.key == key)
    }
}

fn builtin_grammars() -> Vec<BuiltinGrammar> {
    vec![
        BuiltinGrammar::new("XmlDoc", &[], "XmlDoc.xshd"),
        BuiltinGrammar::new("C#", &[".cs"], "CSharp-Mode.xshd"),
        BuiltinGrammar::new("JavaScript", &[".js"], "JavaScript-Mode.xshd"),
        BuiltinGrammar::new("HTML", &[".htm", ".html"], "HTML-Mode.xshd"),
        BuiltinGrammar::new(
            "ASP/XHTML",
            &[".asp", ".aspx", ".asax", ".asmx", ".ascx", ".master"],
            "ASPX.xshd",
        ),
        BuiltinGrammar::new("Boo", &[".boo"], "Boo.xshd"),
        BuiltinGrammar::new("Coco", &[".atg"], "Coco-Mode.xshd"),
        BuiltinGrammar::new("CSS", &[".css"], "CSS-Mode.xshd"),
        BuiltinGrammar::new(
            "C++",
            &[".c", ".h", ".cc", ".cpp", ".hpp"],
            "CPP-Mode.xshd",
        ),
        BuiltinGrammar::new("Java", &[".java"], "Java-Mode.xshd"),
        BuiltinGrammar::new("Patch", &[".patch", ".diff"], "Patch-Mode.xshd"),
        BuiltinGrammar::new(
            "PowerShell",
            &[".ps1", ".psm1", ".psd1"],
            "PowerShell.xshd",
        ),
        BuiltinGrammar::new("PHP", &[".php"], "PHP-Mode.xshd"),
        BuiltinGrammar::new("Python", &[".py", ".pyw"], "Python-Mode.xshd"),
        BuiltinGrammar::new("TeX", &[".tex"], "Tex-Mode.xshd"),
        BuiltinGrammar::new("TSQL", &[".sql"], "TSQL-Mode.xshd"),
        BuiltinGrammar::new("VB", &[".vb"], "VB-Mode.xshd"),
        BuiltinGrammar::new(
            "XML",
            &[
                ".xml", ".xsl", ".xslt", ".xsd", ".manifest", ".config", ".addin", ".xshd",
                ".wxs", ".wxi", ".wxl", ".proj", ".csproj", ".vbproj", ".ilproj", ".booproj",
                ".build", ".xfrm", ".targets", ".xaml", ".xpt", ".xft", ".map", ".wsdl",
                ".disco", ".ps1xml", ".nuspec",
            ],
            "XML-Mode.xshd",
        ),
        BuiltinGrammar::new("MarkDown", &[".md"], "MarkDown-Mode.xshd"),
        BuiltinGrammar::new("ActionScript3", &[".as"], "AS3.xshd"),
        BuiltinGrammar::new("BAT", &[".bat", ".dos"], "DOSBATCH.xshd"),
        BuiltinGrammar::new("F#", &[".fs"], "FSharp-Mode.xshd"),
        BuiltinGrammar::new("HLSL", &[".fx"], "HLSL.xshd"),
        BuiltinGrammar::new("INI", &[".cfg", ".conf", ".ini", ".iss"], "INI.xshd"),
        BuiltinGrammar::new("LOG", &[".log"], "Log.xshd"),
        BuiltinGrammar::new("Pascal", &[".pas"], "Pascal.xshd"),
        BuiltinGrammar::new("PLSQL", &[".plsql"], "PLSQL.xshd"),
        BuiltinGrammar::new("Ruby", &[".rb"], "Ruby.xshd"),
        BuiltinGrammar::new("Scheme", &[".sls", ".sps", ".ss", ".scm"], "scheme.xshd"),
        BuiltinGrammar::new("Squirrel", &[".nut"], "squirrel.xshd"),
        BuiltinGrammar::new("TXT", &[".txt"], "TXT.xshd"),
        BuiltinGrammar::new("VTL", &[".vtl", ".vm"], "vtl.xshd"),
    ]
}
