//! Domain logic for QaBase.
//!
//! The [`LifecycleEngine`] is the only writer of entries: it applies the
//! status rules in [`lifecycle`], serializes work per entry and persists
//! through `qabase-storage`. [`SearchIndex`] is the read side for chat and
//! public search.

pub mod engine;
pub mod lifecycle;
mod locks;
pub mod progress;
pub mod search;

pub use engine::{Created, LifecycleEngine};
pub use progress::{ProgressReporter, SilentProgress};
pub use search::{ChatLookup, SearchIndex};
