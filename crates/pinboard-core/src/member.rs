use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use pinboard_types::Membership;
use pinboard_types::Role;
use pinboard_types::api::{AddMember, MemberRolePatch};

use crate::access::{self, Capability};
use crate::error::{KanbanError, Result, StoreError};
use crate::store::Store;

fn parse_role(raw: &str) -> Result<Role> {
    raw.parse::<Role>()
        .map_err(|e| KanbanError::validation(e.to_string()))
}

pub fn list_members<S: Store>(store: &S, actor: Uuid, board_id: Uuid) -> Result<Vec<Membership>> {
    store.read(|tx| {
        access::require(tx, board_id, actor, Capability::ViewBoard)?;
        Ok(tx.memberships(board_id)?)
    })
}

pub fn add_member<S: Store>(
    store: &S,
    actor: Uuid,
    board_id: Uuid,
    input: &AddMember,
) -> Result<Membership> {
    let role = parse_role(&input.role)?;

    let membership = store.write(|tx| {
        let (board, _) = access::require(tx, board_id, actor, Capability::ManageMembers)?;

        match tx.user(input.user_id)? {
            Some(user) if user.active => {}
            _ => return Err(KanbanError::validation("user not found")),
        }
        if board.owner_id == input.user_id {
            return Err(KanbanError::conflict("user already owns this board"));
        }
        if tx.membership(board_id, input.user_id)?.is_some() {
            return Err(KanbanError::conflict(
                "user is already a member of this board",
            ));
        }

        let membership = Membership {
            id: Uuid::new_v4(),
            board_id,
            user_id: input.user_id,
            role,
            joined_at: Utc::now(),
        };
        match tx.insert_membership(&membership) {
            Err(StoreError::UniqueViolation(_)) => Err(KanbanError::conflict(
                "user is already a member of this board",
            )),
            other => {
                other?;
                Ok(membership)
            }
        }
    })?;

    info!(
        "User {} added to board {} as {} by {}",
        membership.user_id, board_id, membership.role, actor
    );
    Ok(membership)
}

pub fn update_member_role<S: Store>(
    store: &S,
    actor: Uuid,
    board_id: Uuid,
    user_id: Uuid,
    patch: &MemberRolePatch,
) -> Result<Membership> {
    let role = parse_role(&patch.role)?;

    let membership = store.write(|tx| {
        let (board, _) = access::require(tx, board_id, actor, Capability::ManageMembers)?;
        if board.owner_id == user_id {
            return Err(KanbanError::validation("cannot change the owner's role"));
        }
        let mut membership = tx
            .membership(board_id, user_id)?
            .ok_or(KanbanError::NotFound("member"))?;
        membership.role = role;
        tx.update_membership(&membership)?;
        Ok(membership)
    })?;

    info!(
        "User {} on board {} is now {} (set by {})",
        user_id, board_id, membership.role, actor
    );
    Ok(membership)
}

/// The owner is not a membership row and can never be removed.
pub fn remove_member<S: Store>(
    store: &S,
    actor: Uuid,
    board_id: Uuid,
    user_id: Uuid,
) -> Result<()> {
    store.write(|tx| {
        let (board, _) = access::require(tx, board_id, actor, Capability::ManageMembers)?;
        if board.owner_id == user_id {
            return Err(KanbanError::validation("cannot remove owner"));
        }
        let membership = tx
            .membership(board_id, user_id)?
            .ok_or(KanbanError::NotFound("member"))?;
        tx.delete_membership(membership.id)?;
        Ok(())
    })?;

    info!("User {} removed from board {} by {}", user_id, board_id, actor);
    Ok(())
}
