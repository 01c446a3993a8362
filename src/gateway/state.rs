use std::sync::Arc;

use crate::index::HashIndex;
use crate::matcher::CardMatcher;

pub struct HandlerState<I: HashIndex + 'static> {
    pub matcher: Arc<CardMatcher<I>>,

    /// BLAKE3 fingerprint of the loaded catalog.
    pub catalog_digest: String,
}

impl<I: HashIndex + 'static> HandlerState<I> {
    pub fn new(matcher: Arc<CardMatcher<I>>, catalog_digest: impl Into<String>) -> Self {
        Self {
            matcher,
            catalog_digest: catalog_digest.into(),
        }
    }
}

impl<I: HashIndex + 'static> Clone for HandlerState<I> {
    fn clone(&self) -> Self {
        Self {
            matcher: Arc::clone(&self.matcher),
            catalog_digest: self.catalog_digest.clone(),
        }
    }
}
