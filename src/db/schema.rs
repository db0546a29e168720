//! Database schema and migrations for sixchan.
//!
//! Migrations are applied in order when the database is first opened or
//! upgraded. The schema_version table tracks which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,           -- Argon2 hash
    is_admin    INTEGER NOT NULL DEFAULT 0,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);
"#,
    // v2: Boards, threads and the reply tree
    r#"
CREATE TABLE boards (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name        TEXT NOT NULL UNIQUE,
    code        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE threads (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    board_id    INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    image       TEXT,
    created_at  TEXT NOT NULL,
    is_edited   INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_threads_board_id ON threads(board_id);
CREATE INDEX idx_threads_owner_id ON threads(owner_id);

-- A reply hangs off exactly one of a thread or another reply.
CREATE TABLE replies (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    text        TEXT NOT NULL,
    image       TEXT,
    created_at  TEXT NOT NULL,
    thread_id   INTEGER REFERENCES threads(id) ON DELETE CASCADE,
    reply_id    INTEGER REFERENCES replies(id) ON DELETE CASCADE,
    is_edited   INTEGER NOT NULL DEFAULT 0,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    CHECK ((thread_id IS NULL) <> (reply_id IS NULL))
);

CREATE INDEX idx_replies_thread_id ON replies(thread_id);
CREATE INDEX idx_replies_reply_id ON replies(reply_id);
CREATE INDEX idx_replies_created_at ON replies(created_at);
"#,
    // v3: Vote ledger
    r#"
CREATE TABLE upvotes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    thread_id   INTEGER NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    UNIQUE(user_id, thread_id)
);

CREATE TABLE downvotes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    thread_id   INTEGER NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    UNIQUE(user_id, thread_id)
);

CREATE INDEX idx_upvotes_thread_id ON upvotes(thread_id);
CREATE INDEX idx_downvotes_thread_id ON downvotes(thread_id);
"#,
];
