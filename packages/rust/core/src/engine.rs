//! The lifecycle engine: owns entry creation and every status change.
//!
//! Transitions and deletes hold the entry's lock from read to write, and
//! the write is conditional on the status that was read. An entry deleted
//! while a transition waits is reported as not found, never re-created.

use std::sync::Arc;

use qabase_intake::{IntakeAdapter, IntakeItem};
use qabase_shared::{
    BatchReport, EntryId, EntryPatch, QaBaseError, QaEntry, QuestionLogItem, Result, RowError,
    Status, Submission, timestamp_now,
};
use qabase_storage::{AnsweredFilter, Storage};
use tracing::{info, instrument, warn};

use crate::lifecycle;
use crate::locks::EntryLocks;
use crate::progress::ProgressReporter;

/// Result of submitting one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub entry: QaEntry,
    /// `false` when a dedup key matched an existing entry.
    pub created: bool,
}

/// Coordinates lifecycle rules, storage and per-entry locking.
pub struct LifecycleEngine {
    storage: Arc<Storage>,
    locks: EntryLocks,
}

impl LifecycleEngine {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            locks: EntryLocks::default(),
        }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create an entry from a submission, or return the existing one when
    /// the submission's dedup key was seen before on the same channel.
    #[instrument(skip_all, fields(source = %submission.source))]
    pub async fn submit(&self, submission: Submission) -> Result<Created> {
        if let Some(key) = submission.external_id.as_deref() {
            if let Some(existing) = self
                .storage
                .find_by_external_id(submission.source, key)
                .await?
            {
                info!(id = %existing.id, external_id = key, "duplicate submission, reusing entry");
                return Ok(Created {
                    entry: existing,
                    created: false,
                });
            }
        }

        let entry = lifecycle::create(submission, timestamp_now())?;
        if self.storage.insert_entry(&entry).await? {
            info!(id = %entry.id, status = %entry.status, "entry created");
            return Ok(Created {
                entry,
                created: true,
            });
        }

        // A concurrent submission with the same key won the insert.
        let key = entry.external_id.as_deref().unwrap_or_default();
        match self.storage.find_by_external_id(entry.source, key).await? {
            Some(existing) => Ok(Created {
                entry: existing,
                created: false,
            }),
            None => Err(QaBaseError::Storage(format!(
                "insert of entry {} was ignored without a conflicting entry",
                entry.id
            ))),
        }
    }

    /// Run a single-record adapter and submit its output.
    pub async fn ingest_one<A: IntakeAdapter>(&self, adapter: &A, raw: A::Raw) -> Result<Created> {
        let mut intake = adapter.ingest(raw).await?;
        if let Some(err) = intake.row_errors.pop() {
            return Err(QaBaseError::validation(err.detail));
        }
        match intake.items.pop() {
            Some(IntakeItem { submission, .. }) if intake.items.is_empty() => {
                check_source(adapter, &submission)?;
                self.submit(submission).await
            }
            Some(_) => Err(QaBaseError::validation(format!(
                "{} adapter produced more than one submission",
                adapter.name()
            ))),
            None => Err(QaBaseError::validation("payload produced no submission")),
        }
    }

    /// Run a batch adapter and submit every row independently.
    ///
    /// Rows the adapter rejected and rows the engine could not store are
    /// both reported in [`BatchReport::errors`], ordered by row.
    #[instrument(skip_all, fields(adapter = adapter.name()))]
    pub async fn ingest_batch<A: IntakeAdapter>(
        &self,
        adapter: &A,
        raw: A::Raw,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        progress.phase("Parsing");
        let intake = adapter.ingest(raw).await?;

        progress.phase("Importing");
        let total = intake.items.len();
        let mut report = BatchReport {
            errors: intake.row_errors,
            ..BatchReport::default()
        };
        for (idx, item) in intake.items.into_iter().enumerate() {
            let submitted = match check_source(adapter, &item.submission) {
                Ok(()) => self.submit(item.submission).await,
                Err(e) => Err(e),
            };
            match submitted {
                Ok(created) => {
                    report.imported += 1;
                    report.ids.push(created.entry.id);
                }
                Err(e) => {
                    warn!(row = item.row, error = %e, "row not imported");
                    report.errors.push(RowError {
                        row: item.row,
                        detail: e.to_string(),
                    });
                }
            }
            progress.row_processed(idx + 1, total);
        }
        report.errors.sort_by_key(|e| e.row);

        if report.is_partial() {
            warn!(
                imported = report.imported,
                failed = report.errors.len(),
                "batch import partially succeeded"
            );
        } else {
            info!(
                imported = report.imported,
                failed = report.errors.len(),
                "batch import finished"
            );
        }
        progress.done(&report);
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get(&self, id: &EntryId) -> Result<QaEntry> {
        self.storage
            .get_entry(id)
            .await?
            .ok_or_else(|| QaBaseError::not_found(id))
    }

    /// Entries newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<Status>, limit: u32) -> Result<Vec<QaEntry>> {
        self.storage.list_entries(status, limit).await
    }

    /// The moderation queue.
    pub async fn pending(&self, limit: u32) -> Result<Vec<QaEntry>> {
        self.list(Some(Status::Pending), limit).await
    }

    /// Chat questions waiting for an answer.
    pub async fn unanswered(&self, limit: u32) -> Result<Vec<QaEntry>> {
        self.list(Some(Status::Unanswered), limit).await
    }

    /// Submission history across every channel.
    pub async fn question_log(
        &self,
        answered: AnsweredFilter,
        limit: u32,
    ) -> Result<Vec<QuestionLogItem>> {
        let entries = self.storage.list_question_log(answered, limit).await?;
        Ok(entries.into_iter().map(QuestionLogItem::from).collect())
    }

    /// Entry counts per status.
    pub async fn stats(&self) -> Result<Vec<(Status, u64)>> {
        self.storage.count_by_status().await
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    #[instrument(skip_all, fields(id = %id))]
    pub async fn approve(&self, id: &EntryId) -> Result<QaEntry> {
        let entry = self
            .transition(id, "approve", |e| lifecycle::approve(e, timestamp_now()))
            .await?;
        info!("entry approved");
        Ok(entry)
    }

    #[instrument(skip_all, fields(id = %id))]
    pub async fn reject(&self, id: &EntryId) -> Result<QaEntry> {
        let entry = self
            .transition(id, "reject", |e| lifecycle::reject(e, timestamp_now()))
            .await?;
        info!("entry rejected");
        Ok(entry)
    }

    /// Answer an unanswered question; the entry becomes searchable.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn add_answer(&self, id: &EntryId, text: &str) -> Result<QaEntry> {
        let entry = self
            .transition(id, "answer", |e| {
                lifecycle::add_answer(e, text, timestamp_now())
            })
            .await?;
        info!("entry answered");
        Ok(entry)
    }

    /// Admin override of question, answer and status. Audited. An empty
    /// patch writes nothing and returns the entry as stored.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn edit(&self, id: &EntryId, patch: &EntryPatch) -> Result<QaEntry> {
        if patch.is_empty() {
            return self.get(id).await;
        }
        let mut previous = None;
        let entry = self
            .transition(id, "edit", |e| {
                previous = Some(e.status);
                lifecycle::edit(e, patch, timestamp_now())
            })
            .await?;

        warn!(
            target: "qabase::audit",
            entry_id = %id,
            from = %previous.map(Status::as_str).unwrap_or("unknown"),
            to = %entry.status,
            question_changed = patch.question.is_some(),
            answer_changed = patch.answer.is_some(),
            "admin edit bypassed transition rules"
        );
        Ok(entry)
    }

    /// Permanently remove an entry.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: &EntryId) -> Result<()> {
        let _guard = self.locks.lock(id).await;
        if !self.storage.delete_entry(id).await? {
            return Err(QaBaseError::not_found(id));
        }
        info!("entry deleted");
        Ok(())
    }

    /// Read, apply and conditionally write one entry under its lock.
    async fn transition<F>(&self, id: &EntryId, operation: &'static str, apply: F) -> Result<QaEntry>
    where
        F: FnOnce(&QaEntry) -> Result<QaEntry>,
    {
        let _guard = self.locks.lock(id).await;
        let current = self.get(id).await?;
        let next = apply(&current)?;

        if self.storage.update_entry(&next, current.status).await? {
            return Ok(next);
        }

        // Another writer outside this engine changed the row.
        match self.storage.get_entry(id).await? {
            None => Err(QaBaseError::not_found(id)),
            Some(latest) => Err(QaBaseError::invalid_transition(
                latest.status,
                operation,
                "entry changed concurrently",
            )),
        }
    }
}

/// An adapter may only produce entries for its own channel.
fn check_source<A: IntakeAdapter>(adapter: &A, submission: &Submission) -> Result<()> {
    if submission.source == adapter.source() {
        return Ok(());
    }
    Err(QaBaseError::Ingest(format!(
        "{} adapter produced a '{}' submission",
        adapter.name(),
        submission.source
    )))
}
