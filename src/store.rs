//! Template lookup by name.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the template used when the caller does not pick one.
pub const DEFAULT_TEMPLATE: &str = "template.pptx";

/// A source of named template packages.
///
/// Implementations hand back the complete package bytes; nothing is kept open
/// after `open` returns.
pub trait TemplateStore: Send + Sync {
    /// Read the named template, failing with [`Error::TemplateNotFound`] when
    /// it does not exist.
    fn open(&self, name: &str) -> Result<Vec<u8>>;

    /// Returns true if the named template exists.
    fn contains(&self, name: &str) -> bool;
}

// --- Implementation: Directory ---

/// Templates stored as files below a root directory.
#[derive(Debug, Clone)]
pub struct DirTemplateStore {
    root: PathBuf,
}

impl DirTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` below the root. Names that would escape the root are
    /// treated as missing.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl TemplateStore for DirTemplateStore {
    fn open(&self, name: &str) -> Result<Vec<u8>> {
        let path = self
            .resolve(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::TemplateNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some_and(|p| p.is_file())
    }
}

// --- Implementation: In-Memory ---

/// Templates held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    templates: HashMap<String, Vec<u8>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a template.
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.templates.insert(name.into(), data);
    }

    pub fn with_template(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert(name, data);
        self
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn open(&self, name: &str) -> Result<Vec<u8>> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))
    }

    fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}
