use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::OnceCell;
use themedhl_highlight::{normalize_extension, GrammarHandle, SyntaxColorSet};
use tracing::{debug, info, warn};

use crate::catalog::{BuiltinGrammar, OverlaySource, ThemeCatalog, ThemeEntryConfig};
use crate::error::ThemeError;
use crate::global_style::{apply_global_styles, ResourceSink};
use crate::loader::{GrammarLoader, XshdGrammarLoader};
use crate::model::ThemeModel;
use crate::parser::ThemeDocumentParser;
use crate::resolver::ThemeResolver;
use crate::resources::ResourceProvider;

/// Grammar factory run on first use, given the theme's colors for it.
pub type DeferredLoader =
    Box<dyn FnOnce(Option<&SyntaxColorSet>) -> Result<GrammarHandle, ThemeError> + Send>;

pub fn deferred_loader<F>(load: F) -> DeferredLoader
where
    F: FnOnce(Option<&SyntaxColorSet>) -> Result<GrammarHandle, ThemeError> + Send + 'static,
{
    Box::new(load)
}

pub enum GrammarSlot {
    Loaded(GrammarHandle),
    Deferred(DeferredLoader),
    /// A deferred load that failed; the error is replayed instead of retrying.
    Failed(ThemeError),
}

impl fmt::Debug for GrammarSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarSlot::Loaded(grammar) => f.debug_tuple("Loaded").field(&grammar.name()).finish(),
            GrammarSlot::Deferred(_) => f.write_str("Deferred"),
            GrammarSlot::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
        }
    }
}

#[derive(Debug, Default)]
struct GrammarTable {
    order: Vec<String>,
    slots: HashMap<String, GrammarSlot>,
    by_extension: HashMap<String, String>,
}

impl GrammarTable {
    fn register(&mut self, name: &str, extensions: &[String], slot: GrammarSlot) {
        if self.slots.insert(name.to_string(), slot).is_none() {
            self.order.push(name.to_string());
        }
        for extension in extensions {
            self.by_extension
                .insert(normalize_extension(extension), name.to_string());
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}

/// One registered theme: where its base grammars and overlay live, the
/// lazily resolved overlay model and the grammars loaded under it.
#[derive(Debug)]
pub struct HlTheme {
    key: String,
    display_name: String,
    base_prefix: String,
    overlay: Option<OverlaySource>,
    model: Option<Arc<ThemeModel>>,
    resolution_attempted: bool,
    grammars: GrammarTable,
}

impl HlTheme {
    pub fn new(config: &ThemeEntryConfig) -> Self {
        Self {
            key: config.key.clone(),
            display_name: config.label().to_string(),
            base_prefix: config.base_prefix.clone(),
            overlay: config.overlay.clone(),
            model: None,
            resolution_attempted: false,
            grammars: GrammarTable::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn base_prefix(&self) -> &str {
        &self.base_prefix
    }

    pub fn overlay(&self) -> Option<&OverlaySource> {
        self.overlay.as_ref()
    }

    pub fn resolution_attempted(&self) -> bool {
        self.resolution_attempted
    }

    /// Loads and resolves the overlay at most once.
    ///
    /// The first failure is returned to this caller; afterwards the entry
    /// behaves as if it had no overlay.
    pub fn resolve(
        &mut self,
        resources: &dyn ResourceProvider,
    ) -> Result<Option<Arc<ThemeModel>>, ThemeError> {
        if self.resolution_attempted {
            return Ok(self.model.clone());
        }
        self.resolution_attempted = true;
        let Some(overlay) = &self.overlay else {
            return Ok(None);
        };
        match load_overlay(resources, overlay) {
            Ok(model) => {
                debug!(
                    theme = %self.key,
                    grammars = model.grammar_names().len(),
                    "theme overlay ready"
                );
                self.model = Some(Arc::new(model));
                Ok(self.model.clone())
            }
            Err(err) => {
                warn!(theme = %self.key, error = %err, "theme overlay failed to load; continuing without it");
                Err(err.in_theme(&self.key))
            }
        }
    }

    /// Copy of this theme's colors for `grammar`.
    pub fn theme_color_set(
        &mut self,
        resources: &dyn ResourceProvider,
        grammar: &str,
    ) -> Result<Option<SyntaxColorSet>, ThemeError> {
        let model = self.resolve(resources)?;
        Ok(model.and_then(|model| model.syntax_color_set(grammar).cloned()))
    }

    pub fn register_grammar(&mut self, name: &str, extensions: &[String], grammar: GrammarHandle) {
        self.grammars
            .register(name, extensions, GrammarSlot::Loaded(grammar));
    }

    pub fn register_deferred(&mut self, name: &str, extensions: &[String], loader: DeferredLoader) {
        self.grammars
            .register(name, extensions, GrammarSlot::Deferred(loader));
    }

    pub fn contains_grammar(&self, name: &str) -> bool {
        self.grammars.contains(name)
    }

    pub fn definition(
        &mut self,
        resources: &dyn ResourceProvider,
        name: &str,
    ) -> Result<Option<GrammarHandle>, ThemeError> {
        match self.grammars.slots.get(name) {
            None => return Ok(None),
            Some(GrammarSlot::Loaded(grammar)) => return Ok(Some(grammar.clone())),
            Some(GrammarSlot::Failed(err)) => return Err(err.clone()),
            Some(GrammarSlot::Deferred(_)) => {}
        }

        let model = self.resolve(resources)?;
        let Some(GrammarSlot::Deferred(loader)) = self.grammars.slots.remove(name) else {
            return Ok(None);
        };
        let colors = model.as_deref().and_then(|model| model.syntax_color_set(name));
        match loader(colors) {
            Ok(grammar) => {
                debug!(theme = %self.key, grammar = name, "grammar loaded");
                self.grammars
                    .slots
                    .insert(name.to_string(), GrammarSlot::Loaded(grammar.clone()));
                Ok(Some(grammar))
            }
            Err(err) => {
                let err = err.in_grammar(name);
                self.grammars
                    .slots
                    .insert(name.to_string(), GrammarSlot::Failed(err.clone()));
                Err(err)
            }
        }
    }

    pub fn definition_by_extension(
        &mut self,
        resources: &dyn ResourceProvider,
        extension: &str,
    ) -> Result<Option<GrammarHandle>, ThemeError> {
        match self.grammars.by_extension.get(&normalize_extension(extension)) {
            Some(name) => {
                let name = name.clone();
                self.definition(resources, &name)
            }
            None => Ok(None),
        }
    }

    /// Every registered grammar in registration order, loading deferred ones.
    pub fn definitions(
        &mut self,
        resources: &dyn ResourceProvider,
    ) -> Result<Vec<GrammarHandle>, ThemeError> {
        let names = self.grammars.order.clone();
        let mut grammars = Vec::with_capacity(names.len());
        for name in names {
            if let Some(grammar) = self.definition(resources, &name)? {
                grammars.push(grammar);
            }
        }
        Ok(grammars)
    }
}

fn load_overlay(
    resources: &dyn ResourceProvider,
    overlay: &OverlaySource,
) -> Result<ThemeModel, ThemeError> {
    let bytes = resources.open(&overlay.prefix, &overlay.name)?;
    let document = ThemeDocumentParser::parse(&bytes, true)?;
    Ok(ThemeResolver::resolve(&document)?)
}

struct RegistryState {
    themes: Vec<HlTheme>,
    current: usize,
}

impl RegistryState {
    fn current(&mut self) -> &mut HlTheme {
        &mut self.themes[self.current]
    }
}

/// Process-wide set of highlighting themes with a switchable current theme.
///
/// Every call takes the registry's single lock, including overlay resolution
/// and deferred grammar loads, so each happens at most once.
pub struct ThemeRegistry {
    resources: Arc<dyn ResourceProvider>,
    loader: Arc<dyn GrammarLoader>,
    builtin_grammars: Vec<BuiltinGrammar>,
    state: Mutex<RegistryState>,
}

static GLOBAL: OnceCell<ThemeRegistry> = OnceCell::new();

impl ThemeRegistry {
    /// The built-in catalog over `resources`, reading `.xshd` grammars.
    pub fn new(resources: Arc<dyn ResourceProvider>) -> Self {
        Self::from_catalog(
            ThemeCatalog::builtin(),
            resources,
            Arc::new(XshdGrammarLoader),
        )
        .expect("built-in theme catalog must be valid")
    }

    pub fn from_catalog(
        catalog: ThemeCatalog,
        resources: Arc<dyn ResourceProvider>,
        loader: Arc<dyn GrammarLoader>,
    ) -> Result<Self, ThemeError> {
        catalog.validate()?;
        let themes: Vec<HlTheme> = catalog.themes.iter().map(HlTheme::new).collect();
        let current = themes
            .iter()
            .position(|theme| theme.key == catalog.current)
            .ok_or_else(|| ThemeError::KeyNotFound(catalog.current.clone()))?;

        let registry = Self {
            resources,
            loader,
            builtin_grammars: catalog.grammars,
            state: Mutex::new(RegistryState { themes, current }),
        };
        {
            let mut state = registry.lock();
            registry.register_builtins(state.current());
        }
        Ok(registry)
    }

    /// Makes `registry` the process-wide instance. Fails, handing it back, if
    /// one is already installed.
    pub fn install(registry: ThemeRegistry) -> Result<&'static ThemeRegistry, ThemeRegistry> {
        GLOBAL.set(registry)?;
        Ok(GLOBAL.get().expect("global theme registry was just installed"))
    }

    pub fn global() -> Option<&'static ThemeRegistry> {
        GLOBAL.get()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().expect("theme registry state poisoned")
    }

    /// Queues every built-in grammar the entry does not know yet, read from
    /// the entry's own base prefix.
    fn register_builtins(&self, theme: &mut HlTheme) {
        for builtin in &self.builtin_grammars {
            if theme.contains_grammar(&builtin.name) {
                continue;
            }
            let resources = Arc::clone(&self.resources);
            let loader = Arc::clone(&self.loader);
            let prefix = theme.base_prefix.clone();
            let resource = builtin.resource.clone();
            let name = builtin.name.clone();
            theme.register_deferred(
                &builtin.name,
                &builtin.extensions,
                deferred_loader(move |colors| {
                    let source = resources.open(&prefix, &resource)?;
                    loader.load(&name, &source, colors)
                }),
            );
        }
    }

    pub fn current_theme_key(&self) -> String {
        let mut state = self.lock();
        state.current().key.clone()
    }

    pub fn theme_keys(&self) -> Vec<String> {
        self.lock()
            .themes
            .iter()
            .map(|theme| theme.key.clone())
            .collect()
    }

    pub fn display_name(&self, key: &str) -> Option<String> {
        self.lock()
            .themes
            .iter()
            .find(|theme| theme.key == key)
            .map(|theme| theme.display_name.clone())
    }

    /// Switches the current theme and queues the built-in grammars under it.
    /// Grammars handed out earlier keep their old colors.
    pub fn set_current_theme(&self, key: &str) -> Result<(), ThemeError> {
        let mut state = self.lock();
        let index = state
            .themes
            .iter()
            .position(|theme| theme.key == key)
            .ok_or_else(|| ThemeError::KeyNotFound(key.to_string()))?;
        state.current = index;
        self.register_builtins(state.current());
        info!(theme = key, "current highlighting theme changed");
        Ok(())
    }

    pub fn get_definition(&self, name: &str) -> Result<Option<GrammarHandle>, ThemeError> {
        let mut state = self.lock();
        state.current().definition(self.resources.as_ref(), name)
    }

    pub fn get_definition_by_extension(
        &self,
        extension: &str,
    ) -> Result<Option<GrammarHandle>, ThemeError> {
        let mut state = self.lock();
        state
            .current()
            .definition_by_extension(self.resources.as_ref(), extension)
    }

    pub fn definitions(&self) -> Result<Vec<GrammarHandle>, ThemeError> {
        let mut state = self.lock();
        state.current().definitions(self.resources.as_ref())
    }

    pub fn register_grammar(&self, name: &str, extensions: &[String], grammar: GrammarHandle) {
        let mut state = self.lock();
        state.current().register_grammar(name, extensions, grammar);
    }

    pub fn register_deferred_grammar(
        &self,
        name: &str,
        extensions: &[String],
        loader: DeferredLoader,
    ) {
        let mut state = self.lock();
        state.current().register_deferred(name, extensions, loader);
    }

    /// The current theme's colors for `grammar`, if its overlay has any.
    pub fn get_theme_color_set(&self, grammar: &str) -> Result<Option<SyntaxColorSet>, ThemeError> {
        let mut state = self.lock();
        state
            .current()
            .theme_color_set(self.resources.as_ref(), grammar)
    }

    pub fn theme_model(&self) -> Result<Option<Arc<ThemeModel>>, ThemeError> {
        let mut state = self.lock();
        state.current().resolve(self.resources.as_ref())
    }

    /// Applies the current overlay's global styles; a theme without an
    /// overlay leaves the sink untouched.
    pub fn apply_current_global_styles(&self, sink: &mut dyn ResourceSink) -> Result<(), ThemeError> {
        match self.theme_model()? {
            Some(model) => apply_global_styles(&model, sink),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ThemeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeRegistry")
            .field("builtin_grammars", &self.builtin_grammars.len())
            .finish_non_exhaustive()
    }
}
