//! Basic session-then-index match flow.

use std::sync::Arc;

use anyhow::Result;
use cardscan::{CardMatcher, CatalogItem, IndexKind, MatchLookup, PHash, SessionCache, TrieIndex};

fn main() -> Result<()> {
    let bits = 64;
    let catalog = vec![
        CatalogItem::new(
            "bolt",
            "Lightning Bolt",
            "lea",
            PHash::from_u64(0x00ff_00ff_00ff_00ff, bits)?,
        ),
        CatalogItem::new(
            "counterspell",
            "Counterspell",
            "lea",
            PHash::from_u64(0xff00_ff00_ff00_ff00, bits)?,
        ),
    ];

    let index = TrieIndex::build(catalog, bits)?;
    let matcher = CardMatcher::new(Arc::new(index), SessionCache::default());
    println!("{} index ready: {}", IndexKind::Trie, matcher.summary());

    // Two frames of the same card, a few bits apart.
    for frame in [0x00ff_00ff_00ff_00feu64, 0x01ff_00ff_00ff_00ffu64] {
        let hash = PHash::from_u64(frame, bits)?;
        match matcher.lookup(Some("demo"), &hash, None)? {
            MatchLookup::HitSession(r) => {
                println!("session hit: {} (d={})", r[0].id(), r[0].distance)
            }
            MatchLookup::HitIndex(r) => println!("index hit: {} (d={})", r[0].id(), r[0].distance),
            MatchLookup::Miss => println!("miss"),
        }
    }

    Ok(())
}
