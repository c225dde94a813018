//! Locally generated odoc output, e.g. `_build/default/_doc/_html`.
//!
//! The root holds one directory per library; each module page lives at
//! `<library>/<Module>/<Sub>/index.html.json`.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::docs_parser::ModuleDoc;
use crate::error::{DocsError, Result};

const PAGE_FILE: &str = "index.html.json";
const SKIP_DIRS: &[&str] = &["odoc.support"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct LocalModule {
    pub library: String,
    pub module_path: String,
}

#[derive(Debug, Clone)]
pub struct LocalDocs {
    root: PathBuf,
}

impl LocalDocs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Library directories in name order.
    fn libraries(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut libraries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() && !SKIP_DIRS.contains(&name.as_str()) {
                libraries.push((name, path));
            }
        }
        libraries.sort();
        Ok(libraries)
    }

    /// Every module page under the root, grouped by library.
    pub fn list_modules(&self) -> Result<Vec<LocalModule>> {
        let mut modules = Vec::new();
        for (library, dir) in self.libraries()? {
            for entry in WalkDir::new(&dir).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable entry under {:?}: {}", dir, e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() || entry.file_name() != PAGE_FILE {
                    continue;
                }
                let Some(parent) = entry.path().parent() else {
                    continue;
                };
                let Ok(relative) = parent.strip_prefix(&dir) else {
                    continue;
                };
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                // The library's own index page is not a module.
                if parts.is_empty() {
                    continue;
                }
                modules.push(LocalModule {
                    library: library.clone(),
                    module_path: parts.join("."),
                });
            }
        }
        modules.sort();
        tracing::debug!("Found {} local modules under {:?}", modules.len(), self.root);
        Ok(modules)
    }

    /// Documentation of a dot-separated module path, searched across
    /// libraries in name order. Returns the library it was found in.
    pub fn module_doc(&self, module_path: &str) -> Result<Option<(String, ModuleDoc)>> {
        let relative = module_dir(module_path)?.join(PAGE_FILE);
        for (library, dir) in self.libraries()? {
            let candidate = dir.join(&relative);
            if candidate.is_file() {
                tracing::debug!("Reading {:?}", candidate);
                let json = fs::read_to_string(&candidate)?;
                return Ok(Some((library, ModuleDoc::from_page_json(&json))));
            }
        }
        Ok(None)
    }
}

/// `Irmin.Store` → `Irmin/Store`, rejecting anything that is not a plain
/// sequence of names.
fn module_dir(module_path: &str) -> Result<PathBuf> {
    let invalid = || DocsError::InvalidModulePath(module_path.to_string());
    let mut dir = PathBuf::new();
    for part in module_path.trim().split('.') {
        if part.is_empty() || part.contains(['/', '\\']) {
            return Err(invalid());
        }
        dir.push(part);
    }
    Ok(dir)
}
