//! Definition store - declarative rule files loaded from a directory

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use httpscan_common::{Definition, HttpScanError, HttpScanResult};

/// Base name of the reserved template file, never loaded as a definition.
pub const TEMPLATE_NAME: &str = "template";
/// Extension of definition files.
pub const DEFINITION_EXTENSION: &str = "json";

/// Every loaded definition, keyed by file base name.
///
/// Iteration is ordered by key, which fixes the rule order the index is
/// built in and with it the first-match-wins tie-break.
#[derive(Debug, Clone, Default)]
pub struct DefinitionStore {
    definitions: BTreeMap<String, Definition>,
}

impl DefinitionStore {
    /// Load all definition files in `dir`.
    ///
    /// A missing directory is a configuration error. A file that cannot be
    /// read or parsed is logged and skipped.
    pub fn load<P: AsRef<Path>>(dir: P) -> HttpScanResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(HttpScanError::Config(format!(
                "definitions directory {} not found",
                dir.display()
            )));
        }

        let mut definitions = BTreeMap::new();
        for path in definition_files(dir)? {
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            match load_definition(&path) {
                Ok(definition) => {
                    if definition.name != key {
                        debug!(
                            "Definition file {} declares name {:?}",
                            path.display(),
                            definition.name
                        );
                    }
                    definitions.insert(key, definition);
                }
                Err(e) => warn!("Skipping definition {}: {}", path.display(), e),
            }
        }

        info!("Loaded {} definitions from {}", definitions.len(), dir.display());
        Ok(Self { definitions })
    }

    /// Build a store from in-memory definitions, keyed by their `name`.
    pub fn from_definitions<I: IntoIterator<Item = Definition>>(definitions: I) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Definition> {
        self.definitions.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.definitions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Definition)> {
        self.definitions.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Read and parse one definition file.
pub fn load_definition(path: &Path) -> HttpScanResult<Definition> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| HttpScanError::Definition {
        name,
        reason: e.to_string(),
    })
}

/// `*.json` files in `dir` other than the template.
fn definition_files(dir: &Path) -> HttpScanResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let is_definition = path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(DEFINITION_EXTENSION)
            && path.file_stem().and_then(|s| s.to_str()) != Some(TEMPLATE_NAME);
        if is_definition {
            files.push(path);
        }
    }
    Ok(files)
}
