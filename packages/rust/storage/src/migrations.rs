//! SQL migration definitions for the qabase database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: qa_entries, FTS5",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per knowledge entry. The answer history is a JSON array
-- (newest first) so every entry write is a single statement.
CREATE TABLE IF NOT EXISTS qa_entries (
    id                 TEXT PRIMARY KEY,
    question           TEXT NOT NULL,
    answer             TEXT,
    question_processed TEXT,
    answer_processed   TEXT,
    status             TEXT NOT NULL
        CHECK (status IN ('pending', 'approved', 'rejected', 'unanswered')),
    source             TEXT NOT NULL
        CHECK (source IN ('web', 'csv', 'voice', 'slack')),
    submitted_by       TEXT,
    chat_user          TEXT,
    external_id        TEXT,
    answers_json       TEXT NOT NULL DEFAULT '[]',
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    approved_at        TEXT,
    CHECK (submitted_by IS NULL OR chat_user IS NULL)
);

CREATE INDEX IF NOT EXISTS idx_qa_entries_status ON qa_entries(status, created_at);
CREATE INDEX IF NOT EXISTS idx_qa_entries_created ON qa_entries(created_at);

-- Full-text search over original and processed text
CREATE VIRTUAL TABLE IF NOT EXISTS qa_entries_fts USING fts5(
    question,
    answer,
    question_processed,
    answer_processed,
    content=qa_entries,
    content_rowid=rowid
);

-- Triggers to keep FTS in sync with qa_entries
CREATE TRIGGER IF NOT EXISTS qa_entries_fts_insert AFTER INSERT ON qa_entries BEGIN
    INSERT INTO qa_entries_fts(rowid, question, answer, question_processed, answer_processed)
    VALUES (new.rowid, new.question, new.answer, new.question_processed, new.answer_processed);
END;

CREATE TRIGGER IF NOT EXISTS qa_entries_fts_delete AFTER DELETE ON qa_entries BEGIN
    INSERT INTO qa_entries_fts(qa_entries_fts, rowid, question, answer, question_processed, answer_processed)
    VALUES ('delete', old.rowid, old.question, old.answer, old.question_processed, old.answer_processed);
END;

CREATE TRIGGER IF NOT EXISTS qa_entries_fts_update AFTER UPDATE ON qa_entries BEGIN
    INSERT INTO qa_entries_fts(qa_entries_fts, rowid, question, answer, question_processed, answer_processed)
    VALUES ('delete', old.rowid, old.question, old.answer, old.question_processed, old.answer_processed);
    INSERT INTO qa_entries_fts(rowid, question, answer, question_processed, answer_processed)
    VALUES (new.rowid, new.question, new.answer, new.question_processed, new.answer_processed);
END;

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Per-channel dedup keys",
            sql: r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_qa_entries_external
    ON qa_entries(source, external_id)
    WHERE external_id IS NOT NULL;

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_ascending_and_recorded() {
        let migrations = all_migrations();
        for pair in migrations.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
        for m in &migrations {
            assert!(
                m.sql
                    .contains(&format!("INSERT INTO schema_migrations (version) VALUES ({})", m.version)),
                "migration v{} does not record itself",
                m.version
            );
        }
    }
}
