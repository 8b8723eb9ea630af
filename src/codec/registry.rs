//! Ordered factory registries, one per content role

use parking_lot::RwLock;
use std::fmt;
use std::sync::OnceLock;

use super::{BlockLevel, ParagraphLevel, RunLevel};

/// Maps a qualified element name to a fresh block-level element
pub type BlockFactory = Box<dyn Fn(&str) -> Option<Box<dyn BlockLevel>> + Send + Sync>;
/// Maps a qualified element name to a fresh paragraph-level element
pub type ParagraphFactory = Box<dyn Fn(&str) -> Option<Box<dyn ParagraphLevel>> + Send + Sync>;
/// Maps a qualified element name to a fresh run-level element
pub type RunFactory = Box<dyn Fn(&str) -> Option<Box<dyn RunLevel>> + Send + Sync>;

/// Element factories for the three content roles.
///
/// Registration is append-only and may happen from several threads during
/// start-up. Lookup walks the factories in registration order and the first
/// one that claims a name wins, so two modules claiming the same name
/// resolve to whichever registered first.
#[derive(Default)]
pub struct Registry {
    block: RwLock<Vec<BlockFactory>>,
    paragraph: RwLock<Vec<ParagraphFactory>>,
    run: RwLock<Vec<RunFactory>>,
}

impl Registry {
    /// Registry without any factories: every non-core element stays raw
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the element modules shipped in this crate
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::document::register_builtins(&registry);
        registry
    }

    /// Process-wide registry with the built-in modules, created on first use
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::with_builtins)
    }

    pub fn register_block<F>(&self, factory: F)
    where
        F: Fn(&str) -> Option<Box<dyn BlockLevel>> + Send + Sync + 'static,
    {
        self.block.write().push(Box::new(factory));
    }

    pub fn register_paragraph_content<F>(&self, factory: F)
    where
        F: Fn(&str) -> Option<Box<dyn ParagraphLevel>> + Send + Sync + 'static,
    {
        self.paragraph.write().push(Box::new(factory));
    }

    pub fn register_run_content<F>(&self, factory: F)
    where
        F: Fn(&str) -> Option<Box<dyn RunLevel>> + Send + Sync + 'static,
    {
        self.run.write().push(Box::new(factory));
    }

    /// Fresh block-level element for `name`, if any factory claims it
    pub fn new_block(&self, name: &str) -> Option<Box<dyn BlockLevel>> {
        self.block.read().iter().find_map(|factory| factory(name))
    }

    /// Fresh paragraph-level element for `name`, if any factory claims it
    pub fn new_paragraph_content(&self, name: &str) -> Option<Box<dyn ParagraphLevel>> {
        self.paragraph.read().iter().find_map(|factory| factory(name))
    }

    /// Fresh run-level element for `name`, if any factory claims it
    pub fn new_run_content(&self, name: &str) -> Option<Box<dyn RunLevel>> {
        self.run.read().iter().find_map(|factory| factory(name))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("block", &self.block.read().len())
            .field("paragraph", &self.paragraph.read().len())
            .field("run", &self.run.read().len())
            .finish()
    }
}
