//! Turso Embedded / libSQL storage layer for knowledge entries.
//!
//! The [`Storage`] struct wraps a libSQL database holding every entry, its
//! answer history and an FTS5 index over question and answer text.
//!
//! Every write touches exactly one `qa_entries` row in one statement.
//! Status updates are compare-and-set on the previous status, and updates
//! never insert, so a deleted entry cannot come back through a late write.

mod migrations;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, params};
use qabase_normalizer::MatchTerm;
use qabase_shared::{AnswerRecord, EntryId, QaBaseError, QaEntry, Result, Source, Status};

/// Columns selected for every entry read, in [`row_to_entry`] order.
const ENTRY_COLUMNS: &str = "e.id, e.question, e.answer, e.question_processed, e.answer_processed, \
     e.status, e.source, e.submitted_by, e.chat_user, e.external_id, e.answers_json, \
     e.created_at, e.updated_at, e.approved_at";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// Which entries the question log should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnsweredFilter {
    #[default]
    Any,
    Answered,
    Unanswered,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| QaBaseError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing, migrated database at `path` in read-only mode
    /// (reporting, offline inspection). Writes fail; nothing is created.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(QaBaseError::Storage(format!(
                "no database at {}",
                path.display()
            )));
        }
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: true,
        };
        if storage.get_schema_version().await == 0 {
            return Err(QaBaseError::Storage(format!(
                "{} has no qabase schema",
                path.display()
            )));
        }
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    QaBaseError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    pub async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(QaBaseError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Entry writes
    // -----------------------------------------------------------------------

    /// Insert a new entry. Returns `false` when an entry with the same
    /// `(source, external_id)` already exists and nothing was written.
    pub async fn insert_entry(&self, entry: &QaEntry) -> Result<bool> {
        self.check_writable()?;
        let answers_json = encode_answers(&entry.answers)?;
        let created_at = format_ts(&entry.created_at);
        let updated_at = format_ts(&entry.updated_at);
        let approved_at = entry.approved_at.as_ref().map(format_ts);

        let inserted = self
            .conn
            .execute(
                "INSERT INTO qa_entries (
                    id, question, answer, question_processed, answer_processed,
                    status, source, submitted_by, chat_user, external_id,
                    answers_json, created_at, updated_at, approved_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT DO NOTHING",
                params![
                    entry.id.to_string(),
                    entry.question.as_str(),
                    entry.answer.as_deref(),
                    entry.question_processed.as_deref(),
                    entry.answer_processed.as_deref(),
                    entry.status.as_str(),
                    entry.source.as_str(),
                    entry.submitted_by.as_deref(),
                    entry.chat_user.as_deref(),
                    entry.external_id.as_deref(),
                    answers_json,
                    created_at,
                    updated_at,
                    approved_at
                ],
            )
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;
        Ok(inserted > 0)
    }

    /// Write the mutable fields of `entry` if its stored status is still
    /// `expected`. Returns `false` when the row is gone or its status moved.
    pub async fn update_entry(&self, entry: &QaEntry, expected: Status) -> Result<bool> {
        self.check_writable()?;
        let answers_json = encode_answers(&entry.answers)?;
        let updated_at = format_ts(&entry.updated_at);
        let approved_at = entry.approved_at.as_ref().map(format_ts);

        let changed = self
            .conn
            .execute(
                "UPDATE qa_entries SET
                    question = ?1, answer = ?2, question_processed = ?3,
                    answer_processed = ?4, status = ?5, answers_json = ?6,
                    updated_at = ?7, approved_at = ?8
                 WHERE id = ?9 AND status = ?10",
                params![
                    entry.question.as_str(),
                    entry.answer.as_deref(),
                    entry.question_processed.as_deref(),
                    entry.answer_processed.as_deref(),
                    entry.status.as_str(),
                    answers_json,
                    updated_at,
                    approved_at,
                    entry.id.to_string(),
                    expected.as_str()
                ],
            )
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;
        Ok(changed > 0)
    }

    /// Permanently remove an entry. Returns `false` if it did not exist.
    pub async fn delete_entry(&self, id: &EntryId) -> Result<bool> {
        self.check_writable()?;
        let deleted = self
            .conn
            .execute(
                "DELETE FROM qa_entries WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;
        Ok(deleted > 0)
    }

    // -----------------------------------------------------------------------
    // Entry reads
    // -----------------------------------------------------------------------

    /// Get an entry by id.
    pub async fn get_entry(&self, id: &EntryId) -> Result<Option<QaEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM qa_entries e WHERE e.id = ?1");
        let mut rows = self
            .conn
            .query(&sql, params![id.to_string()])
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_entry(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(QaBaseError::Storage(e.to_string())),
        }
    }

    /// Find the entry a channel already created for `external_id`.
    pub async fn find_by_external_id(
        &self,
        source: Source,
        external_id: &str,
    ) -> Result<Option<QaEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM qa_entries e WHERE e.source = ?1 AND e.external_id = ?2"
        );
        let mut rows = self
            .conn
            .query(&sql, params![source.as_str(), external_id])
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_entry(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(QaBaseError::Storage(e.to_string())),
        }
    }

    /// List entries newest first, optionally restricted to one status.
    pub async fn list_entries(&self, status: Option<Status>, limit: u32) -> Result<Vec<QaEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM qa_entries e
             WHERE (?1 IS NULL OR e.status = ?1)
             ORDER BY e.created_at DESC, e.id DESC
             LIMIT ?2"
        );
        let rows = self
            .conn
            .query(&sql, params![status.map(Status::as_str), limit])
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;
        collect_entries(rows).await
    }

    /// Submission history, newest first.
    pub async fn list_question_log(
        &self,
        answered: AnsweredFilter,
        limit: u32,
    ) -> Result<Vec<QaEntry>> {
        let filter = match answered {
            AnsweredFilter::Any => "",
            AnsweredFilter::Answered => "WHERE e.answer IS NOT NULL",
            AnsweredFilter::Unanswered => "WHERE e.answer IS NULL",
        };
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM qa_entries e {filter}
             ORDER BY e.created_at DESC, e.id DESC
             LIMIT ?1"
        );
        let rows = self
            .conn
            .query(&sql, params![limit])
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;
        collect_entries(rows).await
    }

    /// Number of entries in each status. Statuses with no entries are reported as zero.
    pub async fn count_by_status(&self) -> Result<Vec<(Status, u64)>> {
        let mut rows = self
            .conn
            .query(
                "SELECT status, COUNT(*) FROM qa_entries GROUP BY status",
                params![],
            )
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;

        let mut counts: Vec<(Status, u64)> = Status::ALL.iter().map(|s| (*s, 0)).collect();
        loop {
            let row = match rows.next().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => return Err(QaBaseError::Storage(e.to_string())),
            };
            let status: String = row
                .get(0)
                .map_err(|e| QaBaseError::Storage(e.to_string()))?;
            let count: i64 = row
                .get(1)
                .map_err(|e| QaBaseError::Storage(e.to_string()))?;
            let status = parse_column::<Status>(&status, "status")?;
            if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == status) {
                slot.1 = u64::try_from(count).unwrap_or(0);
            }
        }
        Ok(counts)
    }

    // -----------------------------------------------------------------------
    // FTS search
    // -----------------------------------------------------------------------

    /// Full-text search restricted to approved entries, best match first.
    ///
    /// `terms` are OR-ed; each is quoted so FTS5 operators in user input are
    /// matched literally. No terms means no results.
    pub async fn search_approved(&self, terms: &[MatchTerm], limit: u32) -> Result<Vec<QaEntry>> {
        let Some(query) = fts_query(terms) else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT {ENTRY_COLUMNS}
             FROM qa_entries_fts fts
             JOIN qa_entries e ON e.rowid = fts.rowid
             WHERE qa_entries_fts MATCH ?1 AND e.status = 'approved'
             ORDER BY rank, e.created_at DESC
             LIMIT ?2"
        );
        let rows = self
            .conn
            .query(&sql, params![query, limit])
            .await
            .map_err(|e| QaBaseError::Storage(e.to_string()))?;
        collect_entries(rows).await
    }
}

/// Build an FTS5 query OR-ing each term as a quoted string. Prefix terms
/// get a trailing `*`.
pub fn fts_query(terms: &[MatchTerm]) -> Option<String> {
    let quoted: Vec<String> = terms
        .iter()
        .filter(|t| !t.text().trim().is_empty())
        .map(|t| {
            let escaped = t.text().trim().replace('"', "\"\"");
            match t {
                MatchTerm::Exact(_) => format!("\"{escaped}\""),
                MatchTerm::Prefix(_) => format!("\"{escaped}\"*"),
            }
        })
        .collect();
    if quoted.is_empty() {
        None
    } else {
        Some(quoted.join(" OR "))
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

async fn collect_entries(mut rows: libsql::Rows) -> Result<Vec<QaEntry>> {
    let mut results = Vec::new();
    loop {
        match rows.next().await {
            Ok(Some(row)) => results.push(row_to_entry(&row)?),
            Ok(None) => break,
            Err(e) => return Err(QaBaseError::Storage(e.to_string())),
        }
    }
    Ok(results)
}

/// Convert a database row selected with [`ENTRY_COLUMNS`] to a [`QaEntry`].
fn row_to_entry(row: &libsql::Row) -> Result<QaEntry> {
    let text = |idx: i32| -> Result<String> {
        row.get::<String>(idx)
            .map_err(|e| QaBaseError::Storage(e.to_string()))
    };

    let nullable = |idx: i32| -> Result<Option<String>> {
        row.get::<Option<String>>(idx)
            .map_err(|e| QaBaseError::Storage(e.to_string()))
    };

    let id = text(0)?;
    let answers_json = text(10)?;
    let approved_at = nullable(13)?;

    Ok(QaEntry {
        id: id
            .parse()
            .map_err(|e| QaBaseError::Storage(format!("invalid entry id '{id}': {e}")))?,
        question: text(1)?,
        answer: nullable(2)?,
        question_processed: nullable(3)?,
        answer_processed: nullable(4)?,
        status: parse_column(&text(5)?, "status")?,
        source: parse_column(&text(6)?, "source")?,
        submitted_by: nullable(7)?,
        chat_user: nullable(8)?,
        external_id: nullable(9)?,
        answers: serde_json::from_str::<Vec<AnswerRecord>>(&answers_json)
            .map_err(|e| QaBaseError::Storage(format!("invalid answers_json: {e}")))?,
        created_at: parse_ts(&text(11)?)?,
        updated_at: parse_ts(&text(12)?)?,
        approved_at: approved_at.as_deref().map(parse_ts).transpose()?,
    })
}

fn parse_column<T>(value: &str, column: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| QaBaseError::Storage(format!("invalid {column} '{value}': {e}")))
}

fn encode_answers(answers: &[AnswerRecord]) -> Result<String> {
    serde_json::to_string(answers).map_err(|e| QaBaseError::Storage(e.to_string()))
}

/// Fixed-width RFC 3339 so lexical order matches time order.
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| QaBaseError::Storage(format!("invalid timestamp '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use qabase_shared::{AnswerSource, timestamp_now};
    use uuid::Uuid;

    fn exact(term: &str) -> MatchTerm {
        MatchTerm::Exact(term.to_string())
    }

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("qb_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn entry(question: &str, answer: Option<&str>, status: Status) -> QaEntry {
        let now = timestamp_now();
        QaEntry {
            id: EntryId::new(),
            question: question.into(),
            answer: answer.map(String::from),
            question_processed: Some(question.to_lowercase()),
            answer_processed: answer.map(str::to_lowercase),
            status,
            source: Source::Web,
            submitted_by: Some("tester".into()),
            chat_user: None,
            external_id: None,
            answers: answer
                .map(|a| {
                    vec![AnswerRecord {
                        text: a.into(),
                        source: AnswerSource::Web,
                        created_at: now,
                    }]
                })
                .unwrap_or_default(),
            created_at: now,
            updated_at: now,
            approved_at: (status == Status::Approved).then_some(now),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("qb_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn entry_roundtrip_preserves_fields() {
        let storage = test_storage().await;
        let e = entry("How do I book leave?", Some("Use the HR portal."), Status::Pending);

        assert!(storage.insert_entry(&e).await.expect("insert"));
        let found = storage
            .get_entry(&e.id)
            .await
            .expect("get")
            .expect("entry exists");
        assert_eq!(found, e);
    }

    #[tokio::test]
    async fn missing_entry_is_none() {
        let storage = test_storage().await;
        assert!(storage.get_entry(&EntryId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn external_id_is_unique_per_source() {
        let storage = test_storage().await;
        let mut first = entry("Where is the office?", None, Status::Unanswered);
        first.source = Source::Slack;
        first.submitted_by = None;
        first.chat_user = Some("U1".into());
        first.external_id = Some("msg-1".into());
        assert!(storage.insert_entry(&first).await.unwrap());

        let mut again = first.clone();
        again.id = EntryId::new();
        assert!(!storage.insert_entry(&again).await.unwrap());

        let found = storage
            .find_by_external_id(Source::Slack, "msg-1")
            .await
            .unwrap()
            .expect("found by external id");
        assert_eq!(found.id, first.id);

        // Same key on another channel is a different entry
        let mut other = entry("Where is the office?", Some("Floor 3"), Status::Pending);
        other.external_id = Some("msg-1".into());
        assert!(storage.insert_entry(&other).await.unwrap());
    }

    #[tokio::test]
    async fn check_constraint_rejects_double_attribution() {
        let storage = test_storage().await;
        let mut e = entry("Q", Some("A"), Status::Pending);
        e.chat_user = Some("U1".into());
        assert!(storage.insert_entry(&e).await.is_err());
    }

    #[tokio::test]
    async fn update_is_compare_and_set() {
        let storage = test_storage().await;
        let e = entry("Q", Some("A"), Status::Pending);
        storage.insert_entry(&e).await.unwrap();

        let mut approved = e.clone();
        approved.status = Status::Approved;
        assert!(storage.update_entry(&approved, Status::Pending).await.unwrap());

        // Stale expectation does not write
        let mut rejected = e.clone();
        rejected.status = Status::Rejected;
        assert!(!storage.update_entry(&rejected, Status::Pending).await.unwrap());

        let found = storage.get_entry(&e.id).await.unwrap().unwrap();
        assert_eq!(found.status, Status::Approved);
    }

    #[tokio::test]
    async fn update_after_delete_does_not_resurrect() {
        let storage = test_storage().await;
        let e = entry("Q", Some("A"), Status::Pending);
        storage.insert_entry(&e).await.unwrap();

        assert!(storage.delete_entry(&e.id).await.unwrap());
        assert!(!storage.delete_entry(&e.id).await.unwrap());

        let mut approved = e.clone();
        approved.status = Status::Approved;
        assert!(!storage.update_entry(&approved, Status::Pending).await.unwrap());
        assert!(storage.get_entry(&e.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let storage = test_storage().await;
        let mut older = entry("older", Some("a"), Status::Pending);
        older.created_at = older.created_at - Duration::seconds(10);
        let newer = entry("newer", Some("b"), Status::Pending);
        let approved = entry("approved", Some("c"), Status::Approved);
        for e in [&older, &newer, &approved] {
            storage.insert_entry(e).await.unwrap();
        }

        let pending = storage
            .list_entries(Some(Status::Pending), 10)
            .await
            .unwrap();
        let questions: Vec<_> = pending.iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, vec!["newer", "older"]);

        let all = storage.list_entries(None, 10).await.unwrap();
        assert_eq!(all.len(), 3);

        let limited = storage.list_entries(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn question_log_filters_on_answer() {
        let storage = test_storage().await;
        storage
            .insert_entry(&entry("answered", Some("yes"), Status::Pending))
            .await
            .unwrap();
        storage
            .insert_entry(&entry("open", None, Status::Unanswered))
            .await
            .unwrap();

        let answered = storage
            .list_question_log(AnsweredFilter::Answered, 10)
            .await
            .unwrap();
        assert_eq!(answered.len(), 1);
        assert_eq!(answered[0].question, "answered");

        let open = storage
            .list_question_log(AnsweredFilter::Unanswered, 10)
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].question, "open");

        let any = storage
            .list_question_log(AnsweredFilter::Any, 10)
            .await
            .unwrap();
        assert_eq!(any.len(), 2);
    }

    #[tokio::test]
    async fn fts_search_only_returns_approved() {
        let storage = test_storage().await;
        let approved = entry(
            "How do I reset my VPN password?",
            Some("Use the self-service portal."),
            Status::Approved,
        );
        let pending = entry(
            "VPN keeps disconnecting",
            Some("Update the client."),
            Status::Pending,
        );
        let unrelated = entry("Lunch menu", Some("Ask the canteen."), Status::Approved);
        for e in [&approved, &pending, &unrelated] {
            storage.insert_entry(e).await.unwrap();
        }

        let results = storage
            .search_approved(&[exact("vpn")], 10)
            .await
            .expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, approved.id);
    }

    #[tokio::test]
    async fn fts_search_sees_status_changes() {
        let storage = test_storage().await;
        let e = entry("Parking permits", Some("Facilities desk."), Status::Pending);
        storage.insert_entry(&e).await.unwrap();
        let terms = vec![exact("parking")];
        assert!(storage.search_approved(&terms, 10).await.unwrap().is_empty());

        let mut approved = e.clone();
        approved.status = Status::Approved;
        storage.update_entry(&approved, Status::Pending).await.unwrap();
        assert_eq!(storage.search_approved(&terms, 10).await.unwrap().len(), 1);

        storage.delete_entry(&e.id).await.unwrap();
        assert!(storage.search_approved(&terms, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fts_search_treats_operators_literally() {
        let storage = test_storage().await;
        storage
            .insert_entry(&entry("NOT a question", Some("x"), Status::Approved))
            .await
            .unwrap();
        let terms = vec![exact("not"), MatchTerm::Prefix("\"near".to_string())];
        let results = storage.search_approved(&terms, 10).await.expect("search");
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn empty_terms_return_nothing() {
        let storage = test_storage().await;
        assert!(storage.search_approved(&[], 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn counts_cover_every_status() {
        let storage = test_storage().await;
        storage
            .insert_entry(&entry("a", Some("1"), Status::Pending))
            .await
            .unwrap();
        storage
            .insert_entry(&entry("b", Some("2"), Status::Pending))
            .await
            .unwrap();
        let counts = storage.count_by_status().await.unwrap();
        assert_eq!(counts.len(), 4);
        assert!(counts.contains(&(Status::Pending, 2)));
        assert!(counts.contains(&(Status::Rejected, 0)));
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("qb_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.insert_entry(&entry("Q", Some("A"), Status::Pending))
            .await
            .unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        let result = ro.insert_entry(&entry("Q2", Some("A2"), Status::Pending)).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
        assert_eq!(ro.list_entries(None, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn readonly_requires_existing_database() {
        let missing = std::env::temp_dir().join(format!("qb_test_{}.db", Uuid::now_v7()));
        assert!(Storage::open_readonly(&missing).await.is_err());
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn fts_prefix_matches_inflections() {
        let storage = test_storage().await;
        storage
            .insert_entry(&entry(
                "Когда выплачивается зарплата?",
                Some("Пятого числа."),
                Status::Approved,
            ))
            .await
            .unwrap();
        assert!(
            storage
                .search_approved(&[exact("зарплату")], 10)
                .await
                .unwrap()
                .is_empty()
        );
        let hits = storage
            .search_approved(&[MatchTerm::Prefix("зарплат".into())], 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn null_columns_read_back_as_none() {
        let storage = test_storage().await;
        let e = entry("Unanswered?", None, Status::Unanswered);
        storage.insert_entry(&e).await.unwrap();
        let loaded = storage.get_entry(&e.id).await.unwrap().unwrap();
        assert_eq!(loaded.answer, None);
        assert_eq!(loaded.answer_processed, None);
        assert_eq!(loaded.approved_at, None);
        assert_eq!(loaded.external_id, None);
    }

    #[test]
    fn fts_query_quotes_and_joins() {
        let terms = vec![
            exact("vpn"),
            exact("pass\"word"),
            MatchTerm::Prefix("reset".into()),
            exact(" "),
        ];
        assert_eq!(
            fts_query(&terms).as_deref(),
            Some("\"vpn\" OR \"pass\"\"word\" OR \"reset\"*")
        );
        assert!(fts_query(&[]).is_none());
    }
}
