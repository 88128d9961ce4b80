use std::collections::HashMap;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use pinboard_types::api::{CardPatch, MoveCard, NewCard};
use pinboard_types::{Board, Card, CardList, Difficulty};

use crate::access::{self, Access, Capability};
use crate::board::ensure_active;
use crate::error::{KanbanError, Result, StoreError};
use crate::ordering::{self, Placement, Scope};
use crate::store::{Store, StoreTx};
use crate::validate::{self, CARD_DESCRIPTION_MAX, CARD_TITLE_MAX};

fn parse_difficulty(points: i64) -> Result<Difficulty> {
    Difficulty::try_from(points).map_err(|e| KanbanError::validation(e.to_string()))
}

fn hide_as(err: KanbanError, what: &'static str) -> KanbanError {
    match err {
        KanbanError::NotFound(_) => KanbanError::NotFound(what),
        other => other,
    }
}

/// Loads a card with its list and board, checking `capability`.
fn require_card(
    tx: &dyn StoreTx,
    card_id: Uuid,
    actor: Uuid,
    capability: Capability,
) -> Result<(Card, CardList, Board)> {
    let card = tx.card(card_id)?.ok_or(KanbanError::NotFound("card"))?;
    let list = tx
        .card_list(card.card_list_id)?
        .ok_or(KanbanError::NotFound("card"))?;
    let (board, _) = access::require(tx, list.board_id, actor, capability)
        .map_err(|e| hide_as(e, "card"))?;
    Ok((card, list, board))
}

/// An assignee must be an active user who can see the board.
fn check_assignee(tx: &dyn StoreTx, board: &Board, assignee: Option<Uuid>) -> Result<()> {
    let Some(user_id) = assignee else {
        return Ok(());
    };
    let active = tx.user(user_id)?.is_some_and(|u| u.active);
    if !active || access::resolve(tx, board, user_id)? == Access::None {
        return Err(KanbanError::validation(
            "assignee must be a user with access to this board",
        ));
    }
    Ok(())
}

/// Appends a card after the list's current last card.
pub fn create_card<S: Store>(store: &S, actor: Uuid, input: &NewCard) -> Result<Card> {
    let title = validate::title("title", &input.title, CARD_TITLE_MAX)?;
    let description = validate::description(
        "description",
        input.description.as_deref(),
        CARD_DESCRIPTION_MAX,
    )?;
    let difficulty = parse_difficulty(input.difficulty)?;
    validate::window("estimated window", input.estimated_start, input.estimated_end)?;

    let card = ordering::place_with_retry(store, Scope::CardList(input.card_list_id), |tx| {
        let list = tx
            .card_list(input.card_list_id)?
            .ok_or(KanbanError::NotFound("card list"))?;
        let (board, _) = access::require(tx, list.board_id, actor, Capability::EditContent)
            .map_err(|e| hide_as(e, "card list"))?;
        ensure_active(&board)?;
        check_assignee(tx, &board, input.assigned_to)?;

        let now = Utc::now();
        let card = Card {
            id: Uuid::new_v4(),
            card_list_id: list.id,
            title: title.clone(),
            description: description.clone(),
            difficulty,
            assigned_to: input.assigned_to,
            estimated_start: input.estimated_start,
            estimated_end: input.estimated_end,
            actual_start: None,
            actual_end: None,
            order: ordering::next_order(tx.max_card_order(list.id)?)?,
            created_at: now,
            updated_at: now,
        };

        match tx.insert_card(&card) {
            Ok(()) => Ok(Placement::Placed(card)),
            Err(StoreError::UniqueViolation(_)) => Ok(Placement::Collided),
            Err(e) => Err(e.into()),
        }
    })?;

    info!(
        "Card {} '{}' created in list {} by {} (order {}, difficulty {})",
        card.id,
        card.title,
        card.card_list_id,
        actor,
        card.order,
        card.difficulty.points()
    );
    Ok(card)
}

pub fn get_card<S: Store>(store: &S, actor: Uuid, card_id: Uuid) -> Result<Card> {
    store.read(|tx| Ok(require_card(tx, card_id, actor, Capability::ViewBoard)?.0))
}

/// Cards of a list in display order.
pub fn list_cards<S: Store>(store: &S, actor: Uuid, list_id: Uuid) -> Result<Vec<Card>> {
    store.read(|tx| {
        let list = tx
            .card_list(list_id)?
            .ok_or(KanbanError::NotFound("card list"))?;
        access::require(tx, list.board_id, actor, Capability::ViewBoard)
            .map_err(|e| hide_as(e, "card list"))?;
        Ok(tx.cards(list_id)?)
    })
}

/// Partial update; see [`CardPatch`] for the tri-state fields.
pub fn update_card<S: Store>(
    store: &S,
    actor: Uuid,
    card_id: Uuid,
    patch: &CardPatch,
) -> Result<Card> {
    let title = patch
        .title
        .as_deref()
        .map(|t| validate::title("title", t, CARD_TITLE_MAX))
        .transpose()?;
    let description = patch
        .description
        .as_deref()
        .map(|d| validate::description("description", Some(d), CARD_DESCRIPTION_MAX))
        .transpose()?;
    let difficulty = patch.difficulty.map(parse_difficulty).transpose()?;
    if let Some(order) = patch.order {
        ordering::check_order_value(order)?;
    }

    let card = store.write(|tx| {
        let (mut card, list, board) = require_card(tx, card_id, actor, Capability::EditContent)?;
        ensure_active(&board)?;

        if let Some(assignee) = patch.assigned_to {
            check_assignee(tx, &board, assignee)?;
            card.assigned_to = assignee;
        }
        if let Some(order) = patch.order.filter(|o| *o != card.order) {
            let siblings: Vec<(Uuid, i32)> = tx
                .cards(list.id)?
                .into_iter()
                .map(|c| (c.id, c.order))
                .collect();
            let moves = HashMap::from([(card.id, order)]);
            ordering::check_unique_after(&siblings, &moves, "card list", list.id)?;
            card.order = order;
        }
        if let Some(title) = title {
            card.title = title;
        }
        if let Some(description) = description {
            card.description = description;
        }
        if let Some(difficulty) = difficulty {
            card.difficulty = difficulty;
        }
        if let Some(start) = patch.estimated_start {
            card.estimated_start = start;
        }
        if let Some(end) = patch.estimated_end {
            card.estimated_end = end;
        }
        if let Some(start) = patch.actual_start {
            card.actual_start = start;
        }
        if let Some(end) = patch.actual_end {
            card.actual_end = end;
        }
        validate::window("estimated window", card.estimated_start, card.estimated_end)?;
        validate::window("actual window", card.actual_start, card.actual_end)?;
        card.updated_at = Utc::now();

        tx.update_card(&card)?;
        Ok(card)
    })?;

    info!("Card {} updated by {}", card.id, actor);
    Ok(card)
}

/// Moves a card to the end of another list on the same board.
pub fn move_card<S: Store>(
    store: &S,
    actor: Uuid,
    card_id: Uuid,
    target: &MoveCard,
) -> Result<Card> {
    let card = ordering::place_with_retry(store, Scope::CardList(target.card_list_id), |tx| {
        let (mut card, list, board) = require_card(tx, card_id, actor, Capability::EditContent)?;
        ensure_active(&board)?;

        if list.id == target.card_list_id {
            return Ok(Placement::Placed(card));
        }
        let destination = tx
            .card_list(target.card_list_id)?
            .ok_or(KanbanError::NotFound("card list"))?;
        if destination.board_id != board.id {
            return Err(KanbanError::validation(
                "cards can only move between lists of the same board",
            ));
        }

        card.card_list_id = destination.id;
        card.order = ordering::next_order(tx.max_card_order(destination.id)?)?;
        card.updated_at = Utc::now();

        match tx.update_card(&card) {
            Ok(()) => Ok(Placement::Placed(card)),
            Err(StoreError::UniqueViolation(_)) => Ok(Placement::Collided),
            Err(e) => Err(e.into()),
        }
    })?;

    info!(
        "Card {} moved to list {} by {} (order {})",
        card.id, card.card_list_id, actor, card.order
    );
    Ok(card)
}

/// Remaining siblings keep their orders.
pub fn delete_card<S: Store>(store: &S, actor: Uuid, card_id: Uuid) -> Result<()> {
    store.write(|tx| {
        let (_, _, board) = require_card(tx, card_id, actor, Capability::EditContent)?;
        ensure_active(&board)?;
        tx.delete_card(card_id)?;
        Ok(())
    })?;

    info!("Card {} deleted by {}", card_id, actor);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::testing::MemoryStore;
    use pinboard_types::Role;

    struct Fixture {
        store: MemoryStore,
        owner: Uuid,
        board: Board,
        list: Uuid,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let owner = store.add_user("owner");
        let board = store.seed_board(owner, "Sprint");
        let list = store.seed_list(board.id, "Todo", 1);
        Fixture {
            store,
            owner,
            board,
            list,
        }
    }

    fn new_card(list: Uuid, title: &str, difficulty: i64) -> NewCard {
        NewCard {
            card_list_id: list,
            title: title.into(),
            description: None,
            difficulty,
            assigned_to: None,
            estimated_start: None,
            estimated_end: None,
        }
    }

    #[test]
    fn cards_are_appended_in_order() {
        let f = fixture();
        let a = create_card(&f.store, f.owner, &new_card(f.list, "a", 3)).unwrap();
        let b = create_card(&f.store, f.owner, &new_card(f.list, "b", 5)).unwrap();
        assert_eq!((a.order, b.order), (1, 2));
        assert_eq!(b.difficulty, Difficulty::Five);
    }

    #[test]
    fn off_scale_difficulty_is_invalid() {
        let f = fixture();
        let err = create_card(&f.store, f.owner, &new_card(f.list, "a", 4)).unwrap_err();
        assert!(matches!(err, KanbanError::Validation(_)));
        assert!(f.store.read(|tx| Ok(tx.cards(f.list)?)).unwrap().is_empty());
    }

    #[test]
    fn viewer_cannot_create_but_can_read() {
        let f = fixture();
        let viewer = f.store.add_user("viewer");
        f.store.seed_member(f.board.id, viewer, Role::Viewer);
        let card = create_card(&f.store, f.owner, &new_card(f.list, "a", 1)).unwrap();

        let err = create_card(&f.store, viewer, &new_card(f.list, "b", 1)).unwrap_err();
        assert!(matches!(err, KanbanError::Forbidden(_)));
        assert_eq!(get_card(&f.store, viewer, card.id).unwrap().id, card.id);
        assert_eq!(list_cards(&f.store, viewer, f.list).unwrap().len(), 1);
    }

    #[test]
    fn assignee_needs_board_access() {
        let f = fixture();
        let editor = f.store.add_user("editor");
        let outsider = f.store.add_user("outsider");
        f.store.seed_member(f.board.id, editor, Role::Editor);

        let mut input = new_card(f.list, "a", 2);
        input.assigned_to = Some(outsider);
        let err = create_card(&f.store, f.owner, &input).unwrap_err();
        assert!(matches!(err, KanbanError::Validation(_)));

        input.assigned_to = Some(editor);
        let card = create_card(&f.store, f.owner, &input).unwrap();
        assert_eq!(card.assigned_to, Some(editor));

        input.assigned_to = Some(f.owner);
        assert!(create_card(&f.store, f.owner, &input).is_ok());
    }

    #[test]
    fn update_keeps_omitted_fields_and_can_unassign() {
        let f = fixture();
        let mut input = new_card(f.list, "a", 8);
        input.assigned_to = Some(f.owner);
        input.description = Some("details".into());
        let card = create_card(&f.store, f.owner, &input).unwrap();

        let rename = CardPatch {
            title: Some("renamed".into()),
            ..Default::default()
        };
        let updated = update_card(&f.store, f.owner, card.id, &rename).unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description, "details");
        assert_eq!(updated.difficulty, Difficulty::Eight);
        assert_eq!(updated.assigned_to, Some(f.owner));

        let unassign = CardPatch {
            assigned_to: Some(None),
            ..Default::default()
        };
        let updated = update_card(&f.store, f.owner, card.id, &unassign).unwrap();
        assert_eq!(updated.assigned_to, None);
        assert!(updated.updated_at >= card.updated_at);
    }

    #[test]
    fn update_validates_windows_and_difficulty() {
        let f = fixture();
        let card = create_card(&f.store, f.owner, &new_card(f.list, "a", 1)).unwrap();
        let now = Utc::now();

        let reversed = CardPatch {
            actual_start: Some(Some(now)),
            actual_end: Some(Some(now - Duration::days(1))),
            ..Default::default()
        };
        let err = update_card(&f.store, f.owner, card.id, &reversed).unwrap_err();
        assert!(matches!(err, KanbanError::Validation(_)));

        let bad = CardPatch {
            difficulty: Some(4),
            ..Default::default()
        };
        let err = update_card(&f.store, f.owner, card.id, &bad).unwrap_err();
        assert!(matches!(err, KanbanError::Validation(_)));

        let ok = CardPatch {
            actual_start: Some(Some(now)),
            actual_end: Some(Some(now + Duration::days(1))),
            difficulty: Some(55),
            ..Default::default()
        };
        let updated = update_card(&f.store, f.owner, card.id, &ok).unwrap();
        assert_eq!(updated.actual_start, Some(now));
        assert_eq!(updated.difficulty, Difficulty::FiftyFive);
    }

    #[test]
    fn move_appends_to_destination() {
        let f = fixture();
        let done = f.store.seed_list(f.board.id, "Done", 2);
        f.store.seed_card(done, "finished", 4);
        let card = create_card(&f.store, f.owner, &new_card(f.list, "a", 1)).unwrap();

        let target = MoveCard { card_list_id: done };
        let moved = move_card(&f.store, f.owner, card.id, &target).unwrap();
        assert_eq!(moved.card_list_id, done);
        assert_eq!(moved.order, 5);
        assert!(f.store.read(|tx| Ok(tx.cards(f.list)?)).unwrap().is_empty());
    }

    #[test]
    fn move_retries_after_a_stale_order_read() {
        let f = fixture();
        let done = f.store.seed_list(f.board.id, "Done", 2);
        f.store.seed_card(done, "finished", 1);
        let card = create_card(&f.store, f.owner, &new_card(f.list, "a", 1)).unwrap();

        f.store.serve_stale_order_reads(1);
        let target = MoveCard { card_list_id: done };
        let moved = move_card(&f.store, f.owner, card.id, &target).unwrap();
        assert_eq!(moved.card_list_id, done);
        assert_eq!(moved.order, 2);
    }

    #[test]
    fn move_gives_up_after_repeated_collisions() {
        let f = fixture();
        let done = f.store.seed_list(f.board.id, "Done", 2);
        f.store.seed_card(done, "finished", 1);
        let card = create_card(&f.store, f.owner, &new_card(f.list, "a", 1)).unwrap();

        f.store.serve_stale_order_reads(usize::MAX);
        let err = move_card(&f.store, f.owner, card.id, &MoveCard { card_list_id: done })
            .unwrap_err();
        f.store.serve_stale_order_reads(0);
        assert!(matches!(err, KanbanError::Conflict(_)));

        let card = get_card(&f.store, f.owner, card.id).unwrap();
        assert_eq!(card.card_list_id, f.list);
    }

    #[test]
    fn move_across_boards_is_rejected() {
        let f = fixture();
        let other = f.store.seed_board(f.owner, "Other");
        let elsewhere = f.store.seed_list(other.id, "Inbox", 1);
        let card = create_card(&f.store, f.owner, &new_card(f.list, "a", 1)).unwrap();

        let err = move_card(&f.store, f.owner, card.id, &MoveCard { card_list_id: elsewhere })
            .unwrap_err();
        assert!(matches!(err, KanbanError::Validation(_)));
    }

    #[test]
    fn delete_leaves_gap() {
        let f = fixture();
        let a = create_card(&f.store, f.owner, &new_card(f.list, "a", 1)).unwrap();
        create_card(&f.store, f.owner, &new_card(f.list, "b", 1)).unwrap();
        delete_card(&f.store, f.owner, a.id).unwrap();

        let c = create_card(&f.store, f.owner, &new_card(f.list, "c", 1)).unwrap();
        let orders: Vec<i32> = list_cards(&f.store, f.owner, f.list)
            .unwrap()
            .iter()
            .map(|c| c.order)
            .collect();
        assert_eq!(orders, [2, 3]);
        assert_eq!(c.order, 3);
    }

    #[test]
    fn card_on_hidden_board_is_not_found() {
        let f = fixture();
        let stranger = f.store.add_user("stranger");
        let card = create_card(&f.store, f.owner, &new_card(f.list, "a", 1)).unwrap();

        assert!(matches!(
            get_card(&f.store, stranger, card.id),
            Err(KanbanError::NotFound("card"))
        ));
        assert!(matches!(
            delete_card(&f.store, stranger, card.id),
            Err(KanbanError::NotFound("card"))
        ));
    }
}
