//! In-memory [`Store`] for unit tests. Enforces the same uniqueness rules
//! and cascades as the SQLite schema.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use pinboard_types::{Board, Card, CardList, Difficulty, Membership, Role, UserRef};

use crate::error::{KanbanError, Result, StoreError, StoreResult};
use crate::store::{Store, StoreTx};

#[derive(Clone, Default)]
struct State {
    users: HashMap<Uuid, UserRef>,
    boards: HashMap<Uuid, Board>,
    memberships: Vec<Membership>,
    lists: HashMap<Uuid, CardList>,
    cards: HashMap<Uuid, Card>,
}

pub struct MemoryStore {
    state: Mutex<State>,
    stale_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            stale_reads: AtomicUsize::new(0),
        }
    }

    /// The next `n` reads of a scope's maximum order report an empty scope,
    /// the way a writer racing another transaction would see it.
    pub fn serve_stale_order_reads(&self, n: usize) {
        self.stale_reads.store(n, Ordering::SeqCst);
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        self.insert_user(username, true)
    }

    pub fn add_inactive_user(&self, username: &str) -> Uuid {
        self.insert_user(username, false)
    }

    fn insert_user(&self, username: &str, active: bool) -> Uuid {
        let user = UserRef {
            id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: username.to_string(),
            active,
            created_at: Utc::now(),
        };
        let id = user.id;
        self.state.lock().unwrap().users.insert(id, user);
        id
    }

    pub fn seed_board(&self, owner_id: Uuid, title: &str) -> Board {
        let now = Utc::now();
        let board = Board {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            owner_id,
            archived: false,
            created_at: now,
            updated_at: now,
        };
        self.write(|tx| Ok(tx.insert_board(&board)?)).unwrap();
        board
    }

    pub fn seed_member(&self, board_id: Uuid, user_id: Uuid, role: Role) {
        let membership = Membership {
            id: Uuid::new_v4(),
            board_id,
            user_id,
            role,
            joined_at: Utc::now(),
        };
        self.write(|tx| Ok(tx.insert_membership(&membership)?)).unwrap();
    }

    pub fn seed_list(&self, board_id: Uuid, title: &str, order: i32) -> Uuid {
        let now = Utc::now();
        let list = CardList {
            id: Uuid::new_v4(),
            board_id,
            title: title.to_string(),
            description: String::new(),
            order,
            created_at: now,
            updated_at: now,
        };
        self.write(|tx| Ok(tx.insert_card_list(&list)?)).unwrap();
        list.id
    }

    pub fn seed_card(&self, card_list_id: Uuid, title: &str, order: i32) -> Uuid {
        let now = Utc::now();
        let card = Card {
            id: Uuid::new_v4(),
            card_list_id,
            title: title.to_string(),
            description: String::new(),
            difficulty: Difficulty::One,
            assigned_to: None,
            estimated_start: None,
            estimated_end: None,
            actual_start: None,
            actual_end: None,
            order,
            created_at: now,
            updated_at: now,
        };
        self.write(|tx| Ok(tx.insert_card(&card)?)).unwrap();
        card.id
    }

    fn run<T, F>(&self, commit: bool, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StoreTx) -> Result<T>,
    {
        let mut state = self
            .state
            .lock()
            .map_err(|_| KanbanError::Storage(anyhow::anyhow!("memory store poisoned")))?;
        let tx = MemoryTx {
            state: RefCell::new(state.clone()),
            stale_reads: &self.stale_reads,
        };
        let out = f(&tx)?;
        if commit {
            *state = tx.state.into_inner();
        }
        Ok(out)
    }
}

impl Store for MemoryStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StoreTx) -> Result<T>,
    {
        self.run(false, f)
    }

    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StoreTx) -> Result<T>,
    {
        self.run(true, f)
    }
}

struct MemoryTx<'a> {
    state: RefCell<State>,
    stale_reads: &'a AtomicUsize,
}

impl MemoryTx<'_> {
    fn stale(&self) -> bool {
        self.stale_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn list_order_taken(state: &State, list: &CardList) -> bool {
        state
            .lists
            .values()
            .any(|l| l.id != list.id && l.board_id == list.board_id && l.order == list.order)
    }

    fn card_order_taken(state: &State, card: &Card) -> bool {
        state.cards.values().any(|c| {
            c.id != card.id && c.card_list_id == card.card_list_id && c.order == card.order
        })
    }

    fn save_list(&self, list: &CardList) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if Self::list_order_taken(&state, list) {
            return Err(StoreError::UniqueViolation(
                "card_lists.board_id, card_lists.position".into(),
            ));
        }
        state.lists.insert(list.id, list.clone());
        Ok(())
    }

    fn save_card(&self, card: &Card) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if Self::card_order_taken(&state, card) {
            return Err(StoreError::UniqueViolation(
                "cards.card_list_id, cards.position".into(),
            ));
        }
        state.cards.insert(card.id, card.clone());
        Ok(())
    }
}

impl StoreTx for MemoryTx<'_> {
    fn user(&self, id: Uuid) -> StoreResult<Option<UserRef>> {
        Ok(self.state.borrow().users.get(&id).cloned())
    }

    fn board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        Ok(self.state.borrow().boards.get(&id).cloned())
    }

    fn boards_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Board>> {
        let state = self.state.borrow();
        let mut boards: Vec<Board> = state
            .boards
            .values()
            .filter(|b| {
                b.owner_id == user_id
                    || state
                        .memberships
                        .iter()
                        .any(|m| m.board_id == b.id && m.user_id == user_id)
            })
            .cloned()
            .collect();
        boards.sort_by_key(|b| b.created_at);
        Ok(boards)
    }

    fn insert_board(&self, board: &Board) -> StoreResult<()> {
        self.state.borrow_mut().boards.insert(board.id, board.clone());
        Ok(())
    }

    fn update_board(&self, board: &Board) -> StoreResult<()> {
        self.insert_board(board)
    }

    fn delete_board(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        state.boards.remove(&id);
        state.memberships.retain(|m| m.board_id != id);
        let lists: Vec<Uuid> = state
            .lists
            .values()
            .filter(|l| l.board_id == id)
            .map(|l| l.id)
            .collect();
        for list in lists {
            state.lists.remove(&list);
            state.cards.retain(|_, c| c.card_list_id != list);
        }
        Ok(())
    }

    fn membership(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<Option<Membership>> {
        Ok(self
            .state
            .borrow()
            .memberships
            .iter()
            .find(|m| m.board_id == board_id && m.user_id == user_id)
            .cloned())
    }

    fn memberships(&self, board_id: Uuid) -> StoreResult<Vec<Membership>> {
        Ok(self
            .state
            .borrow()
            .memberships
            .iter()
            .filter(|m| m.board_id == board_id)
            .cloned()
            .collect())
    }

    fn insert_membership(&self, membership: &Membership) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if state
            .memberships
            .iter()
            .any(|m| m.board_id == membership.board_id && m.user_id == membership.user_id)
        {
            return Err(StoreError::UniqueViolation(
                "board_members.board_id, board_members.user_id".into(),
            ));
        }
        state.memberships.push(membership.clone());
        Ok(())
    }

    fn update_membership(&self, membership: &Membership) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(row) = state.memberships.iter_mut().find(|m| m.id == membership.id) {
            row.role = membership.role;
        }
        Ok(())
    }

    fn delete_membership(&self, id: Uuid) -> StoreResult<()> {
        self.state.borrow_mut().memberships.retain(|m| m.id != id);
        Ok(())
    }

    fn card_list(&self, id: Uuid) -> StoreResult<Option<CardList>> {
        Ok(self.state.borrow().lists.get(&id).cloned())
    }

    fn card_lists(&self, board_id: Uuid) -> StoreResult<Vec<CardList>> {
        let mut lists: Vec<CardList> = self
            .state
            .borrow()
            .lists
            .values()
            .filter(|l| l.board_id == board_id)
            .cloned()
            .collect();
        lists.sort_by_key(|l| l.order);
        Ok(lists)
    }

    fn max_card_list_order(&self, board_id: Uuid) -> StoreResult<Option<i32>> {
        if self.stale() {
            return Ok(None);
        }
        Ok(self
            .state
            .borrow()
            .lists
            .values()
            .filter(|l| l.board_id == board_id)
            .map(|l| l.order)
            .max())
    }

    fn insert_card_list(&self, list: &CardList) -> StoreResult<()> {
        self.save_list(list)
    }

    fn update_card_list(&self, list: &CardList) -> StoreResult<()> {
        self.save_list(list)
    }

    fn set_card_list_order(&self, id: Uuid, order: i32, at: DateTime<Utc>) -> StoreResult<()> {
        let current = self.state.borrow().lists.get(&id).cloned();
        match current {
            Some(mut list) => {
                list.order = order;
                list.updated_at = at;
                self.save_list(&list)
            }
            None => Ok(()),
        }
    }

    fn delete_card_list(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        state.lists.remove(&id);
        state.cards.retain(|_, c| c.card_list_id != id);
        Ok(())
    }

    fn card(&self, id: Uuid) -> StoreResult<Option<Card>> {
        Ok(self.state.borrow().cards.get(&id).cloned())
    }

    fn cards(&self, card_list_id: Uuid) -> StoreResult<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .state
            .borrow()
            .cards
            .values()
            .filter(|c| c.card_list_id == card_list_id)
            .cloned()
            .collect();
        cards.sort_by_key(|c| c.order);
        Ok(cards)
    }

    fn max_card_order(&self, card_list_id: Uuid) -> StoreResult<Option<i32>> {
        if self.stale() {
            return Ok(None);
        }
        Ok(self
            .state
            .borrow()
            .cards
            .values()
            .filter(|c| c.card_list_id == card_list_id)
            .map(|c| c.order)
            .max())
    }

    fn insert_card(&self, card: &Card) -> StoreResult<()> {
        self.save_card(card)
    }

    fn update_card(&self, card: &Card) -> StoreResult<()> {
        self.save_card(card)
    }

    fn set_card_order(&self, id: Uuid, order: i32, at: DateTime<Utc>) -> StoreResult<()> {
        let current = self.state.borrow().cards.get(&id).cloned();
        match current {
            Some(mut card) => {
                card.order = order;
                card.updated_at = at;
                self.save_card(&card)
            }
            None => Ok(()),
        }
    }

    fn delete_card(&self, id: Uuid) -> StoreResult<()> {
        self.state.borrow_mut().cards.remove(&id);
        Ok(())
    }
}
