//! Short-lived, per-session memory of recently matched candidates.

pub mod clock;
pub mod session;


#[cfg(any(test, feature = "mock"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use session::SessionCache;
