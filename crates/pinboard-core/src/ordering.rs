//! Sibling ordering within a parent scope (board → lists, list → cards).
//!
//! Orders are unique per scope and need not be contiguous. New items go to
//! `max + 1`, computed inside the inserting transaction. The store's
//! uniqueness constraint catches concurrent writers that read the same
//! maximum; the loser recomputes and retries a bounded number of times.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use pinboard_types::api::ReorderItem;

use crate::access::{self, Capability};
use crate::board::ensure_active;
use crate::error::{KanbanError, Result, StoreResult};
use crate::store::{Store, StoreTx};

/// First order handed out in an empty scope.
pub const MIN_ORDER: i32 = 1;

/// Insert attempts per new item before giving up with `Conflict`.
pub const MAX_ORDER_ATTEMPTS: usize = 5;

/// Parent whose children share one order sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Board(Uuid),
    CardList(Uuid),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Board(id) => write!(f, "board {}", id),
            Scope::CardList(id) => write!(f, "card list {}", id),
        }
    }
}

/// `(max ?? 0) + 1`.
pub fn next_order(current_max: Option<i32>) -> Result<i32> {
    current_max
        .unwrap_or(MIN_ORDER - 1)
        .checked_add(1)
        .ok_or_else(|| KanbanError::conflict("no order values left in this scope"))
}

/// Outcome of one insert attempt.
pub(crate) enum Placement<T> {
    Placed(T),
    /// The chosen order was taken by a concurrent writer.
    Collided,
}

/// Runs `attempt` in a fresh write transaction until it places its item.
/// Authorization inside `attempt` is re-evaluated on every try.
pub(crate) fn place_with_retry<S, T, F>(store: &S, scope: Scope, mut attempt: F) -> Result<T>
where
    S: Store,
    F: FnMut(&dyn StoreTx) -> Result<Placement<T>>,
{
    for n in 1..=MAX_ORDER_ATTEMPTS {
        match store.write(|tx| attempt(tx))? {
            Placement::Placed(item) => return Ok(item),
            Placement::Collided => {
                warn!(
                    "Order collision in {} (attempt {}/{}), retrying",
                    scope, n, MAX_ORDER_ATTEMPTS
                );
            }
        }
    }

    Err(KanbanError::conflict(format!(
        "could not assign a unique order in {} after {} attempts",
        scope, MAX_ORDER_ATTEMPTS
    )))
}

/// Where an ordered item lives.
pub(crate) struct Located {
    pub scope: Uuid,
    pub board_id: Uuid,
}

/// Per-kind storage hooks so lists and cards share one reorder routine.
pub(crate) trait OrderedKind {
    const ITEM: &'static str;
    const SCOPE: &'static str;

    fn locate(tx: &dyn StoreTx, id: Uuid) -> StoreResult<Option<Located>>;
    fn siblings(tx: &dyn StoreTx, scope: Uuid) -> StoreResult<Vec<(Uuid, i32)>>;
    fn set_order(tx: &dyn StoreTx, id: Uuid, order: i32, at: DateTime<Utc>) -> StoreResult<()>;
}

pub(crate) struct ListOrder;

impl OrderedKind for ListOrder {
    const ITEM: &'static str = "card list";
    const SCOPE: &'static str = "board";

    fn locate(tx: &dyn StoreTx, id: Uuid) -> StoreResult<Option<Located>> {
        Ok(tx.card_list(id)?.map(|list| Located {
            scope: list.board_id,
            board_id: list.board_id,
        }))
    }

    fn siblings(tx: &dyn StoreTx, scope: Uuid) -> StoreResult<Vec<(Uuid, i32)>> {
        Ok(tx
            .card_lists(scope)?
            .into_iter()
            .map(|l| (l.id, l.order))
            .collect())
    }

    fn set_order(tx: &dyn StoreTx, id: Uuid, order: i32, at: DateTime<Utc>) -> StoreResult<()> {
        tx.set_card_list_order(id, order, at)
    }
}

pub(crate) struct CardOrder;

impl OrderedKind for CardOrder {
    const ITEM: &'static str = "card";
    const SCOPE: &'static str = "card list";

    fn locate(tx: &dyn StoreTx, id: Uuid) -> StoreResult<Option<Located>> {
        let Some(card) = tx.card(id)? else {
            return Ok(None);
        };
        Ok(tx.card_list(card.card_list_id)?.map(|list| Located {
            scope: list.id,
            board_id: list.board_id,
        }))
    }

    fn siblings(tx: &dyn StoreTx, scope: Uuid) -> StoreResult<Vec<(Uuid, i32)>> {
        Ok(tx
            .cards(scope)?
            .into_iter()
            .map(|c| (c.id, c.order))
            .collect())
    }

    fn set_order(tx: &dyn StoreTx, id: Uuid, order: i32, at: DateTime<Utc>) -> StoreResult<()> {
        tx.set_card_order(id, order, at)
    }
}

/// Reorders card lists. All-or-nothing across every affected board.
pub fn reorder_card_lists<S: Store>(store: &S, actor: Uuid, batch: &[ReorderItem]) -> Result<()> {
    reorder::<S, ListOrder>(store, actor, batch)
}

/// Reorders cards. All-or-nothing across every affected list.
pub fn reorder_cards<S: Store>(store: &S, actor: Uuid, batch: &[ReorderItem]) -> Result<()> {
    reorder::<S, CardOrder>(store, actor, batch)
}

fn reorder<S: Store, K: OrderedKind>(store: &S, actor: Uuid, batch: &[ReorderItem]) -> Result<()> {
    check_batch_shape(batch)?;

    store.write(|tx| {
        let mut checked_boards = HashSet::new();
        let mut scopes: HashMap<Uuid, Vec<(Uuid, i32)>> = HashMap::new();

        for item in batch {
            let located = K::locate(tx, item.id)?.ok_or(KanbanError::NotFound(K::ITEM))?;
            if checked_boards.insert(located.board_id) {
                let (board, _) =
                    access::require(tx, located.board_id, actor, Capability::EditContent)?;
                ensure_active(&board)?;
            }
            if !scopes.contains_key(&located.scope) {
                scopes.insert(located.scope, K::siblings(tx, located.scope)?);
            }
        }

        let moves: HashMap<Uuid, i32> = batch.iter().map(|i| (i.id, i.order)).collect();
        for (scope, siblings) in &scopes {
            check_unique_after(siblings, &moves, K::SCOPE, *scope)?;
        }

        // Park every moved item on a distinct negative order first, so a swap
        // inside the batch never collides with a row not yet rewritten.
        let now = Utc::now();
        for (parked, item) in (1..).zip(batch) {
            K::set_order(tx, item.id, -parked, now)?;
        }
        for item in batch {
            K::set_order(tx, item.id, item.order, now)?;
        }

        info!(
            "Reordered {} {}(s) across {} {}(s) for {}",
            batch.len(),
            K::ITEM,
            scopes.len(),
            K::SCOPE,
            actor
        );
        Ok(())
    })
}

fn check_batch_shape(batch: &[ReorderItem]) -> Result<()> {
    if batch.is_empty() {
        return Err(KanbanError::validation("no items to reorder"));
    }

    let mut seen = HashSet::with_capacity(batch.len());
    for item in batch {
        if !seen.insert(item.id) {
            return Err(KanbanError::validation(format!(
                "item {} appears more than once",
                item.id
            )));
        }
        check_order_value(item.order)?;
    }
    Ok(())
}

pub(crate) fn check_order_value(order: i32) -> Result<()> {
    if order < MIN_ORDER {
        return Err(KanbanError::validation(format!(
            "order must be at least {}, got {}",
            MIN_ORDER, order
        )));
    }
    Ok(())
}

/// Applies `moves` to `siblings` and rejects any duplicate order.
pub(crate) fn check_unique_after(
    siblings: &[(Uuid, i32)],
    moves: &HashMap<Uuid, i32>,
    scope_kind: &str,
    scope: Uuid,
) -> Result<()> {
    let mut taken = HashSet::with_capacity(siblings.len());
    for (id, order) in siblings {
        let order = moves.get(id).copied().unwrap_or(*order);
        if !taken.insert(order) {
            return Err(KanbanError::validation(format!(
                "order {} would be used twice in {} {}",
                order, scope_kind, scope
            )));
        }
    }
    Ok(())
}
