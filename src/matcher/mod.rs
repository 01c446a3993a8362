//! Match orchestration over a [`HashIndex`](crate::index::HashIndex) and a
//! [`SessionCache`](crate::cache::SessionCache).

pub mod engine;
pub mod error;
pub mod types;


pub use engine::CardMatcher;
pub use error::{MatchError, MatcherResult};
pub use types::{
    CARDSCAN_STATUS_HEADER, CARDSCAN_STATUS_HEALTHY,
    CARDSCAN_STATUS_NOT_READY, CARDSCAN_STATUS_READY, CARDSCAN_STATUS_REMOVED, CardMatch,
    MatchLookup, MatchQuery, MatchStatus,
};
