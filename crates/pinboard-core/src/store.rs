use chrono::{DateTime, Utc};
use uuid::Uuid;

use pinboard_types::{Board, Card, CardList, Membership, UserRef};

use crate::error::{Result, StoreResult};

/// Transactional access to persisted boards.
///
/// `write` runs the closure inside one transaction: it commits when the
/// closure returns `Ok` and rolls back otherwise. Implementations must
/// enforce uniqueness of (board, list order), (list, card order) and
/// (board, member user), reporting violations as
/// [`StoreError::UniqueViolation`](crate::StoreError::UniqueViolation).
pub trait Store: Send + Sync {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StoreTx) -> Result<T>;

    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StoreTx) -> Result<T>;
}

/// Row-level operations available inside a store transaction.
///
/// Listing methods return siblings sorted by `order`.
pub trait StoreTx {
    // -- Identity --

    fn user(&self, id: Uuid) -> StoreResult<Option<UserRef>>;

    // -- Boards --

    fn board(&self, id: Uuid) -> StoreResult<Option<Board>>;
    /// Boards the user owns or holds a membership on, oldest first.
    fn boards_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Board>>;
    fn insert_board(&self, board: &Board) -> StoreResult<()>;
    fn update_board(&self, board: &Board) -> StoreResult<()>;
    /// Removes the board together with its lists, cards and memberships.
    fn delete_board(&self, id: Uuid) -> StoreResult<()>;

    // -- Memberships --

    fn membership(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<Option<Membership>>;
    fn memberships(&self, board_id: Uuid) -> StoreResult<Vec<Membership>>;
    fn insert_membership(&self, membership: &Membership) -> StoreResult<()>;
    fn update_membership(&self, membership: &Membership) -> StoreResult<()>;
    fn delete_membership(&self, id: Uuid) -> StoreResult<()>;

    // -- Card lists --

    fn card_list(&self, id: Uuid) -> StoreResult<Option<CardList>>;
    fn card_lists(&self, board_id: Uuid) -> StoreResult<Vec<CardList>>;
    fn max_card_list_order(&self, board_id: Uuid) -> StoreResult<Option<i32>>;
    fn insert_card_list(&self, list: &CardList) -> StoreResult<()>;
    fn update_card_list(&self, list: &CardList) -> StoreResult<()>;
    fn set_card_list_order(&self, id: Uuid, order: i32, at: DateTime<Utc>) -> StoreResult<()>;
    /// Removes the list and its cards.
    fn delete_card_list(&self, id: Uuid) -> StoreResult<()>;

    // -- Cards --

    fn card(&self, id: Uuid) -> StoreResult<Option<Card>>;
    fn cards(&self, card_list_id: Uuid) -> StoreResult<Vec<Card>>;
    fn max_card_order(&self, card_list_id: Uuid) -> StoreResult<Option<i32>>;
    fn insert_card(&self, card: &Card) -> StoreResult<()>;
    /// Rewrites every column, including `card_list_id`.
    fn update_card(&self, card: &Card) -> StoreResult<()>;
    fn set_card_order(&self, id: Uuid, order: i32, at: DateTime<Utc>) -> StoreResult<()>;
    fn delete_card(&self, id: Uuid) -> StoreResult<()>;
}
