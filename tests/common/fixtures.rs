//! Test fixtures for integration tests.

use std::io::Write;
use std::path::PathBuf;

use cardscan::CatalogItem;
use cardscan::index::mock::random_catalog;
use tempfile::TempDir;

pub use cardscan::index::mock::{flip_bits, random_hash, seeded_rng};

pub const DEFAULT_BITS: usize = 64;

pub const DEFAULT_SEED: u64 = 0x5eed_ca7d;

#[derive(Default)]
pub struct CatalogBuilder {
    bit_length: Option<usize>,
    size: Option<usize>,
    seed: Option<u64>,
    extra: Vec<CatalogItem>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_length(mut self, bits: usize) -> Self {
        self.bit_length = Some(bits);
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_item(mut self, item: CatalogItem) -> Self {
        self.extra.push(item);
        self
    }

    pub fn build(self) -> Vec<CatalogItem> {
        let bits = self.bit_length.unwrap_or(DEFAULT_BITS);
        let mut rng = seeded_rng(self.seed.unwrap_or(DEFAULT_SEED));

        let mut items = random_catalog(&mut rng, self.size.unwrap_or(200), bits);
        items.extend(self.extra);
        items
    }
}

/// Renders items as catalog JSON lines.
pub fn to_jsonl(items: &[CatalogItem]) -> String {
    items
        .iter()
        .map(|item| {
            serde_json::json!({
                "id": item.id,
                "name": item.name,
                "set": item.set,
                "phash": item.hash.to_hex(),
            })
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes `items` to a catalog file inside a fresh temp dir.
pub fn write_catalog(items: &[CatalogItem]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("catalog.jsonl");
    let mut file = std::fs::File::create(&path).expect("create catalog");
    writeln!(file, "{}", to_jsonl(items)).expect("write catalog");
    (dir, path)
}
