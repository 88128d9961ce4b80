//! Access resolution for boards.
//!
//! [`resolve`] is the only place that decides how a user relates to a
//! board. Callers go through [`require`], which turns a decision into the
//! not-found/forbidden policy: a user who cannot see a board is told it
//! does not exist, a member whose role is too low is told they are
//! forbidden.

use tracing::debug;
use uuid::Uuid;

use pinboard_types::{Board, Role};

use crate::error::{KanbanError, Result, StoreResult};
use crate::store::StoreTx;

/// How a user relates to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The board's creator, implicit and never a membership row.
    Owner,
    Member(Role),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewBoard,
    EditContent,
    ManageMembers,
    /// Rename, archive, delete.
    ManageBoard,
}

impl Capability {
    fn describe(self) -> &'static str {
        match self {
            Capability::ViewBoard => "view this board",
            Capability::EditContent => "edit content on this board",
            Capability::ManageMembers => "manage members of this board",
            Capability::ManageBoard => "manage this board",
        }
    }
}

impl Access {
    /// Effective role. The implicit owner ranks as `Role::Owner`.
    pub fn role(self) -> Option<Role> {
        match self {
            Access::Owner => Some(Role::Owner),
            Access::Member(role) => Some(role),
            Access::None => None,
        }
    }

    pub fn allows(self, capability: Capability) -> bool {
        let Some(role) = self.role() else {
            return false;
        };
        match capability {
            Capability::ViewBoard => true,
            Capability::EditContent => role >= Role::Editor,
            Capability::ManageMembers | Capability::ManageBoard => role == Role::Owner,
        }
    }
}

/// Owner match short-circuits; otherwise the membership row decides.
pub fn resolve(tx: &dyn StoreTx, board: &Board, user_id: Uuid) -> StoreResult<Access> {
    if board.owner_id == user_id {
        return Ok(Access::Owner);
    }
    Ok(tx
        .membership(board.id, user_id)?
        .map_or(Access::None, |m| Access::Member(m.role)))
}

/// Pure decision: does `user_id` hold `capability` on the board? An absent
/// board yields `false`.
pub fn authorize(
    tx: &dyn StoreTx,
    board_id: Uuid,
    user_id: Uuid,
    capability: Capability,
) -> StoreResult<bool> {
    match tx.board(board_id)? {
        Some(board) => Ok(resolve(tx, &board, user_id)?.allows(capability)),
        None => Ok(false),
    }
}

/// Loads the board and checks `capability`, applying the disclosure policy.
pub fn require(
    tx: &dyn StoreTx,
    board_id: Uuid,
    actor: Uuid,
    capability: Capability,
) -> Result<(Board, Access)> {
    let board = tx.board(board_id)?.ok_or(KanbanError::NotFound("board"))?;
    let access = resolve(tx, &board, actor)?;

    if access == Access::None {
        debug!("User {} has no access to board {}", actor, board_id);
        return Err(KanbanError::NotFound("board"));
    }
    if !access.allows(capability) {
        debug!(
            "User {} ({:?}) may not {} ({})",
            actor,
            access,
            capability.describe(),
            board_id
        );
        return Err(KanbanError::forbidden(format!(
            "your role does not allow you to {}",
            capability.describe()
        )));
    }

    Ok((board, access))
}
