//! CSV bulk import.
//!
//! The header row must name `question` and `answer` columns; an optional
//! `submitted_by` column carries attribution. Rows are independent: a bad
//! row is reported with its 1-based data row number and the rest of the
//! file is still imported.

use async_trait::async_trait;
use qabase_shared::{QaBaseError, Result, RowError, Source, Submission};
use tracing::{debug, instrument};

use crate::{Intake, IntakeAdapter, IntakeItem, is_blank};

/// Parses CSV payloads into `pending` submissions.
pub struct CsvBatchAdapter;

/// Column positions resolved from the header row.
struct Columns {
    question: usize,
    answer: usize,
    submitted_by: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers.iter().position(|h| {
                h.trim_start_matches('\u{FEFF}')
                    .trim()
                    .eq_ignore_ascii_case(name)
            })
        };
        match (find("question"), find("answer")) {
            (Some(question), Some(answer)) => Ok(Self {
                question,
                answer,
                submitted_by: find("submitted_by"),
            }),
            _ => Err(QaBaseError::validation(
                "CSV header must contain 'question' and 'answer' columns",
            )),
        }
    }
}

#[async_trait]
impl IntakeAdapter for CsvBatchAdapter {
    type Raw = Vec<u8>;

    fn source(&self) -> Source {
        Source::Csv
    }

    fn name(&self) -> &str {
        "csv"
    }

    #[instrument(skip_all, fields(adapter = "csv", bytes = raw.len()))]
    async fn ingest(&self, raw: Vec<u8>) -> Result<Intake> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(raw.as_slice());

        let headers = reader
            .headers()
            .map_err(|e| QaBaseError::validation(format!("could not read CSV header: {e}")))?
            .clone();
        let columns = Columns::from_headers(&headers)?;

        let mut intake = Intake::default();
        for (idx, record) in reader.records().enumerate() {
            let row = idx + 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    intake.row_errors.push(RowError {
                        row,
                        detail: format!("malformed row: {e}"),
                    });
                    continue;
                }
            };

            let question = record.get(columns.question).unwrap_or_default();
            let answer = record.get(columns.answer).unwrap_or_default();
            if is_blank(question) {
                intake.row_errors.push(RowError {
                    row,
                    detail: "question is empty".into(),
                });
                continue;
            }
            if is_blank(answer) {
                intake.row_errors.push(RowError {
                    row,
                    detail: "answer is empty".into(),
                });
                continue;
            }

            let submitted_by = columns
                .submitted_by
                .and_then(|i| record.get(i))
                .map(String::from);
            intake.items.push(IntakeItem {
                row,
                submission: Submission::answered(Source::Csv, question, answer)
                    .submitted_by(submitted_by),
            });
        }

        debug!(
            accepted = intake.items.len(),
            rejected = intake.row_errors.len(),
            "parsed CSV batch"
        );
        Ok(intake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qabase_shared::{Attribution, Status};

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_fixture(name: &str) -> Vec<u8> {
        std::fs::read(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    #[tokio::test]
    async fn imports_fixture_with_one_bad_row() {
        let intake = CsvBatchAdapter
            .ingest(load_fixture("csv/knowledge.csv"))
            .await
            .expect("ingest");

        assert_eq!(intake.items.len(), 3);
        assert_eq!(
            intake.row_errors,
            vec![RowError {
                row: 3,
                detail: "answer is empty".into()
            }]
        );
        let rows: Vec<usize> = intake.items.iter().map(|i| i.row).collect();
        assert_eq!(rows, vec![1, 2, 4]);

        let first = &intake.items[0].submission;
        assert_eq!(first.source, Source::Csv);
        assert_eq!(first.status, Status::Pending);
        assert_eq!(first.attribution, Attribution::SubmittedBy("alice".into()));
        // Empty submitted_by cell means no attribution
        assert_eq!(intake.items[1].submission.attribution, Attribution::Anonymous);
    }

    #[tokio::test]
    async fn wrong_field_count_is_row_error() {
        let csv = "question,answer\nQ1,A1\nonly-one-field\nQ3,A3\n";
        let intake = CsvBatchAdapter.ingest(csv.as_bytes().to_vec()).await.unwrap();
        assert_eq!(intake.items.len(), 2);
        assert_eq!(intake.row_errors.len(), 1);
        assert_eq!(intake.row_errors[0].row, 2);
        assert!(intake.row_errors[0].detail.starts_with("malformed row"));
    }

    #[tokio::test]
    async fn quoted_fields_keep_commas_and_newlines() {
        let csv = "answer,question\n\"Yes, on Fridays\",\"Is there\nremote work?\"\n";
        let intake = CsvBatchAdapter.ingest(csv.as_bytes().to_vec()).await.unwrap();
        let sub = &intake.items[0].submission;
        assert_eq!(sub.question, "Is there\nremote work?");
        assert_eq!(sub.answer.as_deref(), Some("Yes, on Fridays"));
    }

    #[tokio::test]
    async fn header_with_bom_and_case_is_accepted() {
        let csv = "\u{FEFF}Question,ANSWER\nQ,A\n";
        let intake = CsvBatchAdapter.ingest(csv.as_bytes().to_vec()).await.unwrap();
        assert_eq!(intake.items.len(), 1);
    }

    #[tokio::test]
    async fn missing_answer_column_rejects_file() {
        let err = CsvBatchAdapter
            .ingest(b"question,notes\nQ,N\n".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, QaBaseError::Validation { .. }));
    }

    #[tokio::test]
    async fn empty_payload_rejects_file() {
        let err = CsvBatchAdapter.ingest(Vec::new()).await.unwrap_err();
        assert!(matches!(err, QaBaseError::Validation { .. }));
    }
}
