//! Asset graph loading and resolution.
//!
//! The bundler emits a manifest mapping opaque artifact IDs to output
//! records. Chunks carry the source module that produced them; assets are
//! content-hash-named files. Lookups reconstruct the logical-name to
//! hashed-name mapping from the filename grammar alone.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Errors that can occur loading or querying the asset graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Failed to read asset graph: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse asset graph: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed graph entry '{key}': {message}")]
    Malformed { key: String, message: String },

    #[error("No chunk produced by a module ending in '{suffix}'")]
    ChunkNotFound { suffix: String },

    #[error("No asset matching logical name '{name}'")]
    AssetNotFound { name: String },
}

/// One emitted artifact in the bundler's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEntry {
    /// Compiled script output tied to a source module.
    Chunk {
        file_name: String,
        facade_module_id: Option<String>,
    },
    /// Non-script output file (font, image, etc.), content-hash-named.
    Asset { file_name: String },
}

impl GraphEntry {
    /// The emitted, content-hashed output path.
    pub fn file_name(&self) -> &str {
        match self {
            GraphEntry::Chunk { file_name, .. } => file_name,
            GraphEntry::Asset { file_name } => file_name,
        }
    }
}

/// Raw manifest record, validated into a [`GraphEntry`] at load time.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "fileName")]
    file_name: Option<String>,

    #[serde(rename = "facadeModuleId")]
    facade_module_id: Option<String>,

    #[serde(default, rename = "isAsset")]
    is_asset: bool,

    #[serde(default, rename = "isChunk")]
    is_chunk: bool,
}

/// The bundler's manifest of all emitted output files.
///
/// Built once per run, read-only afterwards. Keys are opaque; iteration
/// order is the sorted key order, so lookups are deterministic.
#[derive(Debug, Clone)]
pub struct AssetGraph {
    entries: BTreeMap<String, GraphEntry>,
}

impl AssetGraph {
    /// Load and validate a graph from a JSON manifest file.
    pub fn from_json_file(path: &Path) -> Result<Self, GraphError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load and validate a graph from JSON text.
    ///
    /// Every record must carry a `fileName` and exactly one of the
    /// `isChunk`/`isAsset` role tags; anything else fails the whole load so
    /// that a malformed manifest surfaces here rather than as a confusing
    /// not-found error during rendering.
    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        let raw: BTreeMap<String, RawEntry> = serde_json::from_str(json)?;

        let mut entries = BTreeMap::new();
        for (key, record) in raw {
            let file_name = record.file_name.ok_or_else(|| GraphError::Malformed {
                key: key.clone(),
                message: "missing fileName".to_string(),
            })?;

            let entry = match (record.is_chunk, record.is_asset) {
                (true, false) => GraphEntry::Chunk {
                    file_name,
                    facade_module_id: record.facade_module_id,
                },
                (false, true) => GraphEntry::Asset { file_name },
                _ => {
                    return Err(GraphError::Malformed {
                        key,
                        message: "expected exactly one of isChunk/isAsset".to_string(),
                    })
                }
            };

            entries.insert(key, entry);
        }

        tracing::debug!("Loaded asset graph with {} entries", entries.len());

        Ok(Self { entries })
    }

    /// Number of entries in the graph.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the graph has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the chunk whose facade module path ends with `suffix`.
    ///
    /// Matching is an exact, case-sensitive trailing comparison. The graph
    /// is expected to contain at most one match per suffix; if it does not,
    /// the first entry in iteration order wins.
    pub fn chunk_by_module_suffix(&self, suffix: &str) -> Result<&GraphEntry, GraphError> {
        self.entries
            .values()
            .find(|entry| match entry {
                GraphEntry::Chunk {
                    facade_module_id: Some(id),
                    ..
                } => id.ends_with(suffix),
                _ => false,
            })
            .ok_or_else(|| GraphError::ChunkNotFound {
                suffix: suffix.to_string(),
            })
    }

    /// Resolve a hashed asset filename from a human-readable logical name.
    ///
    /// Bundlers emit assets as `name-<hash>.ext`; a candidate matches
    /// `"name.ext"` when the extension is identical and the candidate base
    /// is the logical base followed by a single `-<lowercase hex>` suffix.
    pub fn asset_by_logical_name(&self, name: &str) -> Result<&GraphEntry, GraphError> {
        let (base, ext) = split_name(name);

        self.entries
            .values()
            .find(|entry| {
                let GraphEntry::Asset { file_name } = entry else {
                    return false;
                };
                let candidate = Path::new(file_name)
                    .file_name()
                    .and_then(|f| f.to_str())
                    .unwrap_or(file_name);
                let (candidate_base, candidate_ext) = split_name(candidate);

                candidate_ext == ext
                    && candidate_base
                        .strip_prefix(base)
                        .is_some_and(|hash| HASH_SUFFIX.is_match(hash))
            })
            .ok_or_else(|| GraphError::AssetNotFound {
                name: name.to_string(),
            })
    }
}

static HASH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^-[0-9a-f]+$").expect("valid hash suffix pattern"));

/// Split a filename into base name and extension (without the dot).
fn split_name(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((base, ext)) => (base, ext),
        None => (name, ""),
    }
}
