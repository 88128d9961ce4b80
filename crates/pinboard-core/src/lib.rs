//! Board workspaces: role-based access resolution and sibling ordering on
//! top of a transactional store port.
//!
//! Every operation takes the store handle and the acting user explicitly.
//! Authorization and validation complete before the first write.

pub mod access;
pub mod board;
pub mod card;
pub mod card_list;
pub mod error;
pub mod member;
pub mod ordering;
pub mod store;

mod validate;

#[cfg(test)]
mod testing;

pub use access::{Access, Capability};
pub use error::{KanbanError, Result, StoreError, StoreResult};
pub use store::{Store, StoreTx};
