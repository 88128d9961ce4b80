use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use pinboard_types::Board;
use pinboard_types::api::{BoardDetail, BoardPatch, CardListDetail, NewBoard};

use crate::access::{self, Capability};
use crate::error::{KanbanError, Result};
use crate::store::Store;
use crate::validate::{self, BOARD_DESCRIPTION_MAX, BOARD_TITLE_MAX};

/// Content on archived boards is read-only.
pub(crate) fn ensure_active(board: &Board) -> Result<()> {
    if board.archived {
        return Err(KanbanError::conflict("board is archived"));
    }
    Ok(())
}

/// The actor becomes the board's implicit owner.
pub fn create_board<S: Store>(store: &S, actor: Uuid, input: &NewBoard) -> Result<Board> {
    let now = Utc::now();
    let board = Board {
        id: Uuid::new_v4(),
        title: validate::title("title", &input.title, BOARD_TITLE_MAX)?,
        description: validate::description(
            "description",
            input.description.as_deref(),
            BOARD_DESCRIPTION_MAX,
        )?,
        owner_id: actor,
        archived: false,
        created_at: now,
        updated_at: now,
    };

    store.write(|tx| {
        tx.insert_board(&board)?;
        Ok(())
    })?;

    info!("Board {} '{}' created by {}", board.id, board.title, actor);
    Ok(board)
}

pub fn get_board<S: Store>(store: &S, actor: Uuid, board_id: Uuid) -> Result<BoardDetail> {
    store.read(|tx| {
        let (board, _) = access::require(tx, board_id, actor, Capability::ViewBoard)?;

        let mut card_lists = Vec::new();
        for list in tx.card_lists(board.id)? {
            let cards = tx.cards(list.id)?;
            card_lists.push(CardListDetail { list, cards });
        }
        let members = tx.memberships(board.id)?;

        Ok(BoardDetail {
            board,
            card_lists,
            members,
        })
    })
}

/// Boards the actor owns or is a member of.
pub fn list_boards<S: Store>(store: &S, actor: Uuid) -> Result<Vec<Board>> {
    store.read(|tx| Ok(tx.boards_for_user(actor)?))
}

/// Partial update. An archived board only accepts a patch that unarchives
/// it; the other fields of that same patch are applied too.
pub fn update_board<S: Store>(
    store: &S,
    actor: Uuid,
    board_id: Uuid,
    patch: &BoardPatch,
) -> Result<Board> {
    let title = patch
        .title
        .as_deref()
        .map(|t| validate::title("title", t, BOARD_TITLE_MAX))
        .transpose()?;
    let description = patch
        .description
        .as_deref()
        .map(|d| validate::description("description", Some(d), BOARD_DESCRIPTION_MAX))
        .transpose()?;

    let board = store.write(|tx| {
        let (mut board, _) = access::require(tx, board_id, actor, Capability::ManageBoard)?;
        if board.archived && patch.archived != Some(false) {
            return Err(KanbanError::conflict(
                "board is archived; unarchive it before making changes",
            ));
        }

        if let Some(title) = title {
            board.title = title;
        }
        if let Some(description) = description {
            board.description = description;
        }
        if let Some(archived) = patch.archived {
            board.archived = archived;
        }
        board.updated_at = Utc::now();

        tx.update_board(&board)?;
        Ok(board)
    })?;

    info!("Board {} updated by {} (archived: {})", board.id, actor, board.archived);
    Ok(board)
}

/// Cascades to lists, cards and memberships.
pub fn delete_board<S: Store>(store: &S, actor: Uuid, board_id: Uuid) -> Result<()> {
    store.write(|tx| {
        access::require(tx, board_id, actor, Capability::ManageBoard)?;
        tx.delete_board(board_id)?;
        Ok(())
    })?;

    info!("Board {} deleted by {}", board_id, actor);
    Ok(())
}
