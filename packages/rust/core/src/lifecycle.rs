//! The entry state machine.
//!
//! Pure functions from the current entry to the next one. Storage, locking
//! and logging live in [`crate::engine`].
//!
//! | From       | Operation       | To         |
//! |------------|-----------------|------------|
//! | pending    | approve         | approved   |
//! | pending    | reject          | rejected   |
//! | unanswered | add_answer      | approved   |
//! | any        | edit            | any        |

use chrono::{DateTime, Utc};
use qabase_normalizer::normalize_non_empty;
use qabase_shared::{
    AnswerRecord, AnswerSource, Attribution, EntryId, EntryPatch, QaBaseError, QaEntry, Result,
    Source, Status, Submission,
};

/// Build a new entry from an adapter's submission.
pub fn create(submission: Submission, now: DateTime<Utc>) -> Result<QaEntry> {
    let question_processed = normalize_non_empty(&submission.question)
        .ok_or_else(|| QaBaseError::validation("question must not be empty"))?;
    let answer = submission
        .answer
        .filter(|a| normalize_non_empty(a).is_some());

    match (submission.status, &answer) {
        (Status::Pending, None) => {
            return Err(QaBaseError::validation("answer must not be empty"));
        }
        (Status::Unanswered, Some(_)) => {
            return Err(QaBaseError::validation(
                "unanswered submissions must not carry an answer",
            ));
        }
        (Status::Pending | Status::Unanswered, _) => {}
        (other, _) => {
            return Err(QaBaseError::validation(format!(
                "entries cannot be created in status '{other}'"
            )));
        }
    }

    let (submitted_by, chat_user) = match submission.attribution {
        Attribution::Anonymous => (None, None),
        Attribution::SubmittedBy(_) if submission.source == Source::Slack => {
            return Err(QaBaseError::validation(
                "chat submissions are attributed by chat user",
            ));
        }
        Attribution::SubmittedBy(name) => (Some(name), None),
        Attribution::ChatUser(_) if submission.source != Source::Slack => {
            return Err(QaBaseError::validation(format!(
                "{} submissions cannot carry a chat user",
                submission.source
            )));
        }
        Attribution::ChatUser(user) => (None, Some(user)),
    };

    let answers = answer
        .iter()
        .map(|text| AnswerRecord {
            text: text.clone(),
            source: AnswerSource::from(submission.source),
            created_at: now,
        })
        .collect();

    Ok(QaEntry {
        id: EntryId::new(),
        question: submission.question,
        answer_processed: answer.as_deref().and_then(normalize_non_empty),
        answer,
        question_processed: Some(question_processed),
        status: submission.status,
        source: submission.source,
        submitted_by,
        chat_user,
        external_id: submission.external_id,
        answers,
        created_at: now,
        updated_at: now,
        approved_at: None,
    })
}

/// `pending → approved`. Requires a non-empty answer.
pub fn approve(entry: &QaEntry, now: DateTime<Utc>) -> Result<QaEntry> {
    if entry.status != Status::Pending {
        return Err(QaBaseError::invalid_transition(
            entry.status,
            "approve",
            "only pending entries can be approved",
        ));
    }
    if !entry.has_answer() {
        return Err(QaBaseError::invalid_transition(
            entry.status,
            "approve",
            "entry has no answer",
        ));
    }

    let mut next = entry.clone();
    next.status = Status::Approved;
    next.approved_at = Some(now);
    next.updated_at = now;
    Ok(next)
}

/// `pending → rejected`.
pub fn reject(entry: &QaEntry, now: DateTime<Utc>) -> Result<QaEntry> {
    if entry.status != Status::Pending {
        return Err(QaBaseError::invalid_transition(
            entry.status,
            "reject",
            "only pending entries can be rejected",
        ));
    }

    let mut next = entry.clone();
    next.status = Status::Rejected;
    next.updated_at = now;
    Ok(next)
}

/// `unanswered → approved` with a moderator's answer, recorded as `manual`.
pub fn add_answer(entry: &QaEntry, text: &str, now: DateTime<Utc>) -> Result<QaEntry> {
    if entry.status != Status::Unanswered {
        return Err(QaBaseError::invalid_transition(
            entry.status,
            "answer",
            "only unanswered entries can be answered",
        ));
    }
    let processed = normalize_non_empty(text)
        .ok_or_else(|| QaBaseError::validation("answer must not be empty"))?;

    let mut next = entry.clone();
    next.answers.insert(
        0,
        AnswerRecord {
            text: text.to_string(),
            source: AnswerSource::Manual,
            created_at: now,
        },
    );
    next.answer = Some(text.to_string());
    next.answer_processed = Some(processed);
    next.status = Status::Approved;
    next.approved_at = Some(now);
    next.updated_at = now;
    Ok(next)
}

/// Admin override. Sets any field and any status without transition checks.
///
/// A changed, non-blank answer is prepended to the history with source
/// `edit`; a blank answer clears the current answer but keeps the history.
pub fn edit(entry: &QaEntry, patch: &EntryPatch, now: DateTime<Utc>) -> Result<QaEntry> {
    let status = patch.status.as_deref().map(str::parse::<Status>).transpose()?;

    let mut next = entry.clone();
    if let Some(question) = &patch.question {
        next.question_processed = Some(
            normalize_non_empty(question)
                .ok_or_else(|| QaBaseError::validation("question must not be empty"))?,
        );
        next.question = question.clone();
    }

    if let Some(answer) = &patch.answer {
        match normalize_non_empty(answer) {
            None => {
                next.answer = None;
                next.answer_processed = None;
            }
            Some(processed) if entry.answer.as_deref() != Some(answer.as_str()) => {
                next.answers.insert(
                    0,
                    AnswerRecord {
                        text: answer.clone(),
                        source: AnswerSource::Edit,
                        created_at: now,
                    },
                );
                next.answer = Some(answer.clone());
                next.answer_processed = Some(processed);
            }
            Some(_) => {}
        }
    }

    if let Some(status) = status {
        next.status = status;
        if status == Status::Approved && next.approved_at.is_none() {
            next.approved_at = Some(now);
        }
    }

    next.updated_at = now;
    Ok(next)
}
