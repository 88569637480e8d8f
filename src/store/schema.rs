pub const SCHEMA: &str = r#"
-- Accounts; every identity owns exactly one profile
CREATE TABLE IF NOT EXISTS identities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    is_staff INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    identity_id INTEGER NOT NULL UNIQUE REFERENCES identities(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS lessons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    topic TEXT NOT NULL
);

-- Follow log; followers/following are projections of the live rows
CREATE TABLE IF NOT EXISTS friendships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_profile INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    to_profile INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),

    CHECK (from_profile <> to_profile)
);

CREATE TABLE IF NOT EXISTS taken_lessons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    lesson_id INTEGER NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
    times_taken INTEGER NOT NULL DEFAULT 0 CHECK (times_taken >= 0),

    UNIQUE(profile_id, lesson_id)
);

-- Access and refresh tokens; only argon2id hashes are stored
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,
    token_lookup TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('access', 'refresh')),
    identity_id INTEGER NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT NOT NULL,
    last_used_at TEXT,
    revoked_at TEXT            -- NULL = active
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_friendships_from ON friendships(from_profile);
CREATE INDEX IF NOT EXISTS idx_friendships_to ON friendships(to_profile);
CREATE INDEX IF NOT EXISTS idx_taken_lessons_profile ON taken_lessons(profile_id);
CREATE INDEX IF NOT EXISTS idx_taken_lessons_lesson ON taken_lessons(lesson_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_identity ON tokens(identity_id);
"#;
