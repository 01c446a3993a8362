//! Reference catalog loading.
//!
//! Catalogs are JSON-lines files, one card per line:
//!
//! ```text
//! {"id": "5f8287b1-...", "name": "Lightning Bolt", "set": "lea", "phash": "c3a1...e0"}
//! ```
//!
//! `scryfall_id` is accepted for `id` and `hash` for `phash`. The hash is either a hex
//! string or an unsigned integer. One file holds one bit length.

pub mod error;


use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, instrument};

pub use error::{CatalogError, CatalogResult};

use crate::index::{CatalogIndex, CatalogItem, IndexKind, PHash, PHashError};

/// A hash as it appears on the wire: hex string or unsigned integer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HashInput {
    Hex(String),
    Integer(u64),
}

impl HashInput {
    /// Interprets the value as a `bit_length`-bit hash.
    pub fn to_phash(&self, bit_length: usize) -> Result<PHash, PHashError> {
        match self {
            HashInput::Hex(hex) => PHash::from_hex(hex, bit_length),
            HashInput::Integer(value) => PHash::from_u64(*value, bit_length),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(alias = "scryfall_id")]
    id: String,
    name: String,
    set: String,
    #[serde(alias = "hash")]
    phash: HashInput,
}

/// Parses catalog rows from `reader`. Blank lines are skipped.
pub fn parse_catalog<R: BufRead>(reader: R, bit_length: usize) -> CatalogResult<Vec<CatalogItem>> {
    let mut items = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let row: CatalogRow = serde_json::from_str(line).map_err(|source| CatalogError::Parse {
            line: line_no,
            source,
        })?;
        let hash = row
            .phash
            .to_phash(bit_length)
            .map_err(|source| CatalogError::InvalidHash {
                line: line_no,
                id: row.id.clone(),
                source,
            })?;

        items.push(CatalogItem::new(row.id, row.name, row.set, hash));
    }

    Ok(items)
}

/// Reads a catalog file. An empty catalog is an error.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn load_catalog(path: impl AsRef<Path>, bit_length: usize) -> CatalogResult<Vec<CatalogItem>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let items = parse_catalog(BufReader::new(file), bit_length)?;

    if items.is_empty() {
        return Err(CatalogError::Empty {
            path: path.to_path_buf(),
        });
    }

    debug!(items = items.len(), "Catalog parsed");
    Ok(items)
}

/// Loads a catalog file and builds the requested index over it.
pub fn load_index(
    path: impl AsRef<Path>,
    kind: IndexKind,
    bit_length: usize,
) -> CatalogResult<(CatalogIndex, String)> {
    let items = load_catalog(path, bit_length)?;
    let digest = catalog_digest(&items);
    let index = CatalogIndex::build(kind, items, bit_length)?;

    info!(kind = %kind, bit_length, digest = %digest, "Catalog index ready");
    Ok((index, digest))
}

/// BLAKE3 fingerprint over every `(id, hash)` pair, in catalog order.
///
/// Two catalogs with the same digest build identical indexes.
pub fn catalog_digest(items: &[CatalogItem]) -> String {
    let mut hasher = blake3::Hasher::new();
    for item in items {
        hasher.update(item.id.as_bytes());
        hasher.update(&[0]);
        hasher.update(item.hash.to_hex().as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
