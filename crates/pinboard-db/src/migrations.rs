use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            full_name   TEXT NOT NULL DEFAULT '',
            password    TEXT NOT NULL,
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS boards (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            owner_id    TEXT NOT NULL REFERENCES users(id),
            archived    INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_boards_owner
            ON boards(owner_id);

        CREATE TABLE IF NOT EXISTS board_members (
            id          TEXT PRIMARY KEY,
            board_id    TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            role        TEXT NOT NULL,
            joined_at   TEXT NOT NULL,
            UNIQUE(board_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_board_members_user
            ON board_members(user_id);

        CREATE TABLE IF NOT EXISTS card_lists (
            id          TEXT PRIMARY KEY,
            board_id    TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
            title       TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            position    INTEGER NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL,
            UNIQUE(board_id, position)
        );

        CREATE TABLE IF NOT EXISTS cards (
            id              TEXT PRIMARY KEY,
            card_list_id    TEXT NOT NULL REFERENCES card_lists(id) ON DELETE CASCADE,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL DEFAULT '',
            difficulty      INTEGER NOT NULL
                CHECK (difficulty IN (1, 2, 3, 5, 8, 13, 21, 34, 55)),
            assigned_to     TEXT REFERENCES users(id),
            estimated_start TEXT,
            estimated_end   TEXT,
            actual_start    TEXT,
            actual_end      TEXT,
            position        INTEGER NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL,
            UNIQUE(card_list_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_cards_assignee
            ON cards(assigned_to);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
