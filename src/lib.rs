//! `nodekv` is an embedded, persistent key-value store built around a
//! node-chain free-space allocator over a single values file.
//!
//! A `Store` keeps two byte streams in sync: a values file holding the
//! JSON-encoded payload for every live key, and a metadata file
//! recording the chain of allocated/reclaimable byte ranges plus the
//! key→node map. `set` reuses a reclaimable node when one is large
//! enough (best-fit, by capacity), relocating only when it must;
//! `remove` returns a node to the reclaimable index, coalescing it with
//! any spatially adjacent reclaimable neighbors.
//!
//! See `DESIGN.md` for the allocator's invariants and the provenance of
//! each module.

#[macro_use]
mod error;

mod config;
mod controller;
mod index;
mod node;
mod persistence;
mod storage;
mod store;

pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::store::Store;
