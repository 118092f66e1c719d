//! Theme overlays for syntax highlighting: parse `.xshtd` overlay files,
//! resolve them against named grammars and switch between themes at run time.

mod catalog;
mod document;
mod error;
mod global_style;
mod loader;
mod model;
mod parser;
mod registry;
mod resolver;
mod resources;

pub use catalog::{
    BuiltinGrammar, OverlaySource, ThemeCatalog, ThemeEntryConfig, BASE_PREFIX, OVERLAY_PREFIX,
};
pub use document::{
    ColorDecl, GlobalStyleDecl, PropertyDecl, SyntaxColorSetDecl, ThemeDocument, ThemeElement,
    THEME_NAMESPACE,
};
pub use error::{FormatError, SemanticError, TextPosition, ThemeError};
pub use global_style::{
    apply_global_styles, GlobalStyleKind, ResourceSink, ResourceSlot, ResourceTable,
    ResourceValue, StyleChannel,
};
pub use loader::{GrammarLoader, XshdGrammarLoader};
pub use model::{GlobalStyle, ThemeModel};
pub use parser::ThemeDocumentParser;
pub use registry::{deferred_loader, DeferredLoader, GrammarSlot, HlTheme, ThemeRegistry};
pub use resolver::{populate, register_names, RegisteredSets, ThemeResolver};
pub use resources::{DirectoryResources, MemoryResources, ResourceProvider};
