use std::collections::HashMap;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use pinboard_types::CardList;
use pinboard_types::api::{CardListPatch, NewCardList};

use crate::access::{self, Capability};
use crate::board::ensure_active;
use crate::error::{KanbanError, Result, StoreError};
use crate::ordering::{self, Placement, Scope};
use crate::store::{Store, StoreTx};
use crate::validate::{self, LIST_DESCRIPTION_MAX, LIST_TITLE_MAX};

/// Loads a list and the board it belongs to, checking `capability`.
fn require_list(
    tx: &dyn StoreTx,
    list_id: Uuid,
    actor: Uuid,
    capability: Capability,
) -> Result<(CardList, pinboard_types::Board)> {
    let list = tx
        .card_list(list_id)?
        .ok_or(KanbanError::NotFound("card list"))?;
    let (board, _) = access::require(tx, list.board_id, actor, capability)
        .map_err(|e| match e {
            // A list on an invisible board is itself invisible.
            KanbanError::NotFound(_) => KanbanError::NotFound("card list"),
            other => other,
        })?;
    Ok((list, board))
}

/// Appends a list after the board's current last list.
pub fn create_card_list<S: Store>(store: &S, actor: Uuid, input: &NewCardList) -> Result<CardList> {
    let title = validate::title("title", &input.title, LIST_TITLE_MAX)?;
    let description = validate::description(
        "description",
        input.description.as_deref(),
        LIST_DESCRIPTION_MAX,
    )?;

    let list = ordering::place_with_retry(store, Scope::Board(input.board_id), |tx| {
        let (board, _) = access::require(tx, input.board_id, actor, Capability::EditContent)?;
        ensure_active(&board)?;

        let now = Utc::now();
        let list = CardList {
            id: Uuid::new_v4(),
            board_id: board.id,
            title: title.clone(),
            description: description.clone(),
            order: ordering::next_order(tx.max_card_list_order(board.id)?)?,
            created_at: now,
            updated_at: now,
        };

        match tx.insert_card_list(&list) {
            Ok(()) => Ok(Placement::Placed(list)),
            Err(StoreError::UniqueViolation(_)) => Ok(Placement::Collided),
            Err(e) => Err(e.into()),
        }
    })?;

    info!(
        "Card list {} '{}' created on board {} by {} (order {})",
        list.id, list.title, list.board_id, actor, list.order
    );
    Ok(list)
}

pub fn get_card_list<S: Store>(store: &S, actor: Uuid, list_id: Uuid) -> Result<CardList> {
    store.read(|tx| Ok(require_list(tx, list_id, actor, Capability::ViewBoard)?.0))
}

/// Lists of a board in display order.
pub fn list_card_lists<S: Store>(store: &S, actor: Uuid, board_id: Uuid) -> Result<Vec<CardList>> {
    store.read(|tx| {
        access::require(tx, board_id, actor, Capability::ViewBoard)?;
        Ok(tx.card_lists(board_id)?)
    })
}

/// Partial update. A new `order` must not be taken by a sibling.
pub fn update_card_list<S: Store>(
    store: &S,
    actor: Uuid,
    list_id: Uuid,
    patch: &CardListPatch,
) -> Result<CardList> {
    let title = patch
        .title
        .as_deref()
        .map(|t| validate::title("title", t, LIST_TITLE_MAX))
        .transpose()?;
    let description = patch
        .description
        .as_deref()
        .map(|d| validate::description("description", Some(d), LIST_DESCRIPTION_MAX))
        .transpose()?;
    if let Some(order) = patch.order {
        ordering::check_order_value(order)?;
    }

    let list = store.write(|tx| {
        let (mut list, board) = require_list(tx, list_id, actor, Capability::EditContent)?;
        ensure_active(&board)?;

        if let Some(order) = patch.order.filter(|o| *o != list.order) {
            let siblings: Vec<(Uuid, i32)> = tx
                .card_lists(board.id)?
                .into_iter()
                .map(|l| (l.id, l.order))
                .collect();
            let moves = HashMap::from([(list.id, order)]);
            ordering::check_unique_after(&siblings, &moves, "board", board.id)?;
            list.order = order;
        }
        if let Some(title) = title {
            list.title = title;
        }
        if let Some(description) = description {
            list.description = description;
        }
        list.updated_at = Utc::now();

        tx.update_card_list(&list)?;
        Ok(list)
    })?;

    info!("Card list {} updated by {}", list.id, actor);
    Ok(list)
}

/// Cascades to the list's cards. Remaining siblings keep their orders.
pub fn delete_card_list<S: Store>(store: &S, actor: Uuid, list_id: Uuid) -> Result<()> {
    store.write(|tx| {
        let (_, board) = require_list(tx, list_id, actor, Capability::EditContent)?;
        ensure_active(&board)?;
        tx.delete_card_list(list_id)?;
        Ok(())
    })?;

    info!("Card list {} deleted by {}", list_id, actor);
    Ok(())
}
