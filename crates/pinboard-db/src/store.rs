//! [`Store`] backed by the SQLite connection.
//!
//! Sibling order lives in the `position` column. The UNIQUE constraints on
//! (board_id, position), (card_list_id, position) and (board_id, user_id)
//! surface as [`StoreError::UniqueViolation`].

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use pinboard_core::{KanbanError, Result, Store, StoreError, StoreResult, StoreTx};
use pinboard_types::{Board, Card, CardList, Difficulty, Membership, Role, UserRef};

use crate::Database;
use crate::queries::sqlite_unique_violation;

const BOARD_COLUMNS: &str = "id, title, description, owner_id, archived, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, board_id, user_id, role, joined_at";
const LIST_COLUMNS: &str = "id, board_id, title, description, position, created_at, updated_at";
const CARD_COLUMNS: &str = "id, card_list_id, title, description, difficulty, assigned_to, \
     estimated_start, estimated_end, actual_start, actual_end, position, created_at, updated_at";

impl Store for Database {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StoreTx) -> Result<T>,
    {
        let conn = self.lock().map_err(KanbanError::Storage)?;
        f(&SqliteTx { conn: &conn })
    }

    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StoreTx) -> Result<T>,
    {
        let mut conn = self.lock().map_err(KanbanError::Storage)?;
        let tx = conn
            .transaction()
            .map_err(|e| KanbanError::Storage(e.into()))?;

        // Dropping `tx` on the error path rolls back.
        let out = f(&SqliteTx { conn: &tx })?;

        tx.commit().map_err(|e| KanbanError::Storage(e.into()))?;
        Ok(out)
    }
}

struct SqliteTx<'a> {
    conn: &'a Connection,
}

fn store_err(e: rusqlite::Error) -> StoreError {
    if sqlite_unique_violation(&e) {
        let detail = match &e {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.clone(),
            other => other.to_string(),
        };
        return StoreError::UniqueViolation(detail);
    }
    StoreError::Backend(e.into())
}

fn conversion(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion(idx, e))
}

fn opt_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| raw.parse().map_err(|e| conversion(idx, e)))
        .transpose()
}

fn board_from_row(row: &Row<'_>) -> rusqlite::Result<Board> {
    Ok(Board {
        id: uuid_at(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        owner_id: uuid_at(row, 3)?,
        archived: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    let role: String = row.get(3)?;
    Ok(Membership {
        id: uuid_at(row, 0)?,
        board_id: uuid_at(row, 1)?,
        user_id: uuid_at(row, 2)?,
        role: role.parse::<Role>().map_err(|e| conversion(3, e))?,
        joined_at: row.get(4)?,
    })
}

fn list_from_row(row: &Row<'_>) -> rusqlite::Result<CardList> {
    Ok(CardList {
        id: uuid_at(row, 0)?,
        board_id: uuid_at(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        order: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    let difficulty: i64 = row.get(4)?;
    Ok(Card {
        id: uuid_at(row, 0)?,
        card_list_id: uuid_at(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        difficulty: Difficulty::try_from(difficulty).map_err(|e| conversion(4, e))?,
        assigned_to: opt_uuid_at(row, 5)?,
        estimated_start: row.get(6)?,
        estimated_end: row.get(7)?,
        actual_start: row.get(8)?,
        actual_end: row.get(9)?,
        order: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl SqliteTx<'_> {
    fn one<T>(
        &self,
        sql: &str,
        key: &str,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> StoreResult<Option<T>> {
        self.conn
            .query_row(sql, [key], map)
            .optional()
            .map_err(store_err)
    }

    fn many<T>(
        &self,
        sql: &str,
        key: &str,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> StoreResult<Vec<T>> {
        let mut stmt = self.conn.prepare(sql).map_err(store_err)?;
        let rows = stmt
            .query_map([key], map)
            .map_err(store_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(store_err)?;
        Ok(rows)
    }

    fn max_position(&self, sql: &str, key: Uuid) -> StoreResult<Option<i32>> {
        self.conn
            .query_row(sql, [key.to_string()], |row| row.get(0))
            .map_err(store_err)
    }

    fn exec(&self, sql: &str, params: impl rusqlite::Params) -> StoreResult<()> {
        self.conn.execute(sql, params).map_err(store_err)?;
        Ok(())
    }
}

impl StoreTx for SqliteTx<'_> {
    // -- Identity --

    fn user(&self, id: Uuid) -> StoreResult<Option<UserRef>> {
        self.one(
            "SELECT id, username, full_name, is_active, created_at FROM users WHERE id = ?1",
            &id.to_string(),
            |row| {
                Ok(UserRef {
                    id: uuid_at(row, 0)?,
                    username: row.get(1)?,
                    full_name: row.get(2)?,
                    active: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )
    }

    // -- Boards --

    fn board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        let sql = format!("SELECT {} FROM boards WHERE id = ?1", BOARD_COLUMNS);
        self.one(&sql, &id.to_string(), board_from_row)
    }

    fn boards_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Board>> {
        let sql = format!(
            "SELECT {} FROM boards
             WHERE owner_id = ?1
                OR id IN (SELECT board_id FROM board_members WHERE user_id = ?1)
             ORDER BY created_at",
            BOARD_COLUMNS
        );
        self.many(&sql, &user_id.to_string(), board_from_row)
    }

    fn insert_board(&self, board: &Board) -> StoreResult<()> {
        self.exec(
            "INSERT INTO boards (id, title, description, owner_id, archived, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                board.id.to_string(),
                board.title,
                board.description,
                board.owner_id.to_string(),
                board.archived,
                board.created_at,
                board.updated_at,
            ],
        )
    }

    fn update_board(&self, board: &Board) -> StoreResult<()> {
        self.exec(
            "UPDATE boards SET title = ?2, description = ?3, archived = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                board.id.to_string(),
                board.title,
                board.description,
                board.archived,
                board.updated_at,
            ],
        )
    }

    fn delete_board(&self, id: Uuid) -> StoreResult<()> {
        // Lists, cards and memberships go with it via ON DELETE CASCADE.
        self.exec("DELETE FROM boards WHERE id = ?1", [id.to_string()])
    }

    // -- Memberships --

    fn membership(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<Option<Membership>> {
        let sql = format!(
            "SELECT {} FROM board_members WHERE board_id = ?1 AND user_id = ?2",
            MEMBER_COLUMNS
        );
        self.conn
            .query_row(
                &sql,
                [board_id.to_string(), user_id.to_string()],
                membership_from_row,
            )
            .optional()
            .map_err(store_err)
    }

    fn memberships(&self, board_id: Uuid) -> StoreResult<Vec<Membership>> {
        let sql = format!(
            "SELECT {} FROM board_members WHERE board_id = ?1 ORDER BY joined_at",
            MEMBER_COLUMNS
        );
        self.many(&sql, &board_id.to_string(), membership_from_row)
    }

    fn insert_membership(&self, membership: &Membership) -> StoreResult<()> {
        self.exec(
            "INSERT INTO board_members (id, board_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                membership.id.to_string(),
                membership.board_id.to_string(),
                membership.user_id.to_string(),
                membership.role.as_str(),
                membership.joined_at,
            ],
        )
    }

    fn update_membership(&self, membership: &Membership) -> StoreResult<()> {
        self.exec(
            "UPDATE board_members SET role = ?2 WHERE id = ?1",
            params![membership.id.to_string(), membership.role.as_str()],
        )
    }

    fn delete_membership(&self, id: Uuid) -> StoreResult<()> {
        self.exec("DELETE FROM board_members WHERE id = ?1", [id.to_string()])
    }

    // -- Card lists --

    fn card_list(&self, id: Uuid) -> StoreResult<Option<CardList>> {
        let sql = format!("SELECT {} FROM card_lists WHERE id = ?1", LIST_COLUMNS);
        self.one(&sql, &id.to_string(), list_from_row)
    }

    fn card_lists(&self, board_id: Uuid) -> StoreResult<Vec<CardList>> {
        let sql = format!(
            "SELECT {} FROM card_lists WHERE board_id = ?1 ORDER BY position",
            LIST_COLUMNS
        );
        self.many(&sql, &board_id.to_string(), list_from_row)
    }

    fn max_card_list_order(&self, board_id: Uuid) -> StoreResult<Option<i32>> {
        self.max_position(
            "SELECT MAX(position) FROM card_lists WHERE board_id = ?1",
            board_id,
        )
    }

    fn insert_card_list(&self, list: &CardList) -> StoreResult<()> {
        self.exec(
            "INSERT INTO card_lists
                 (id, board_id, title, description, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                list.id.to_string(),
                list.board_id.to_string(),
                list.title,
                list.description,
                list.order,
                list.created_at,
                list.updated_at,
            ],
        )
    }

    fn update_card_list(&self, list: &CardList) -> StoreResult<()> {
        self.exec(
            "UPDATE card_lists SET title = ?2, description = ?3, position = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                list.id.to_string(),
                list.title,
                list.description,
                list.order,
                list.updated_at,
            ],
        )
    }

    fn set_card_list_order(&self, id: Uuid, order: i32, at: DateTime<Utc>) -> StoreResult<()> {
        self.exec(
            "UPDATE card_lists SET position = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), order, at],
        )
    }

    fn delete_card_list(&self, id: Uuid) -> StoreResult<()> {
        self.exec("DELETE FROM card_lists WHERE id = ?1", [id.to_string()])
    }

    // -- Cards --

    fn card(&self, id: Uuid) -> StoreResult<Option<Card>> {
        let sql = format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS);
        self.one(&sql, &id.to_string(), card_from_row)
    }

    fn cards(&self, card_list_id: Uuid) -> StoreResult<Vec<Card>> {
        let sql = format!(
            "SELECT {} FROM cards WHERE card_list_id = ?1 ORDER BY position",
            CARD_COLUMNS
        );
        self.many(&sql, &card_list_id.to_string(), card_from_row)
    }

    fn max_card_order(&self, card_list_id: Uuid) -> StoreResult<Option<i32>> {
        self.max_position(
            "SELECT MAX(position) FROM cards WHERE card_list_id = ?1",
            card_list_id,
        )
    }

    fn insert_card(&self, card: &Card) -> StoreResult<()> {
        self.exec(
            "INSERT INTO cards (id, card_list_id, title, description, difficulty, assigned_to,
                                estimated_start, estimated_end, actual_start, actual_end,
                                position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                card.id.to_string(),
                card.card_list_id.to_string(),
                card.title,
                card.description,
                u8::from(card.difficulty),
                card.assigned_to.map(|u| u.to_string()),
                card.estimated_start,
                card.estimated_end,
                card.actual_start,
                card.actual_end,
                card.order,
                card.created_at,
                card.updated_at,
            ],
        )
    }

    fn update_card(&self, card: &Card) -> StoreResult<()> {
        self.exec(
            "UPDATE cards SET card_list_id = ?2, title = ?3, description = ?4, difficulty = ?5,
                              assigned_to = ?6, estimated_start = ?7, estimated_end = ?8,
                              actual_start = ?9, actual_end = ?10, position = ?11, updated_at = ?12
             WHERE id = ?1",
            params![
                card.id.to_string(),
                card.card_list_id.to_string(),
                card.title,
                card.description,
                u8::from(card.difficulty),
                card.assigned_to.map(|u| u.to_string()),
                card.estimated_start,
                card.estimated_end,
                card.actual_start,
                card.actual_end,
                card.order,
                card.updated_at,
            ],
        )
    }

    fn set_card_order(&self, id: Uuid, order: i32, at: DateTime<Utc>) -> StoreResult<()> {
        self.exec(
            "UPDATE cards SET position = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), order, at],
        )
    }

    fn delete_card(&self, id: Uuid) -> StoreResult<()> {
        self.exec("DELETE FROM cards WHERE id = ?1", [id.to_string()])
    }
}
