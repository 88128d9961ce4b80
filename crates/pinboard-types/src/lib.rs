pub mod api;
pub mod difficulty;
pub mod models;
pub mod role;

pub use difficulty::{Difficulty, InvalidDifficulty};
pub use models::{Board, Card, CardList, Membership, UserRef};
pub use role::{ParseRoleError, Role};
