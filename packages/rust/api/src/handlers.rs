//! Route handlers.

use std::collections::BTreeMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use qabase_core::{ChatLookup, Created, SilentProgress};
use qabase_intake::{
    ChatAdapter, ChatQuestion, CsvBatchAdapter, ManualAdapter, ManualSubmission, VoiceUpload,
};
use qabase_shared::{BatchReport, EntryId, EntryPatch, QaEntry, QuestionLogItem, Status};
use qabase_storage::AnsweredFilter;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = std::result::Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Returned by the creating endpoints.
#[derive(Serialize)]
pub(crate) struct Receipt {
    id: EntryId,
    status: Status,
}

#[derive(Deserialize)]
pub(crate) struct SearchRequest {
    #[serde(default)]
    query: String,
}

#[derive(Serialize)]
pub(crate) struct SearchResponse {
    entries: Vec<QaEntry>,
}

#[derive(Deserialize)]
pub(crate) struct ChatSearchQuery {
    #[serde(default)]
    query: String,
}

#[derive(Serialize)]
pub(crate) struct ChatSearchResponse {
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct AnswerRequest {
    #[serde(default)]
    answer: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoiceQuery {
    #[serde(default, alias = "submitted_by")]
    submitted_by: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Deserialize)]
pub(crate) struct LogQuery {
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    answered: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatsResponse {
    total: u64,
    by_status: BTreeMap<&'static str, u64>,
}

#[derive(Serialize)]
pub(crate) struct Health {
    status: &'static str,
}

fn parse_id(raw: &str) -> ApiResult<EntryId> {
    raw.parse().map_err(|_| ApiError::UnknownId(raw.to_string()))
}

fn receipt(created: Created) -> (StatusCode, Json<Receipt>) {
    let code = if created.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (
        code,
        Json(Receipt {
            id: created.entry.id,
            status: created.entry.status,
        }),
    )
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub(crate) async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub(crate) async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let counts = state.engine.stats().await?;
    let total: u64 = counts.iter().map(|(_, n)| n).sum();
    let by_status = counts
        .into_iter()
        .map(|(status, n)| (status.as_str(), n))
        .collect();
    Ok(Json(StatsResponse { total, by_status }))
}

// ---------------------------------------------------------------------------
// Intake
// ---------------------------------------------------------------------------

pub(crate) async fn submit(
    State(state): State<AppState>,
    body: Result<Json<ManualSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Receipt>)> {
    let Json(form) = body?;
    let created = state.engine.ingest_one(&ManualAdapter, form).await?;
    Ok(receipt(created))
}

pub(crate) async fn import_csv(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<BatchReport>> {
    let body = body?;
    let report = state
        .engine
        .ingest_batch(&CsvBatchAdapter, body.to_vec(), &SilentProgress)
        .await?;
    Ok(Json(report))
}

pub(crate) async fn submit_voice(
    State(state): State<AppState>,
    query: Result<Query<VoiceQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<QaEntry>> {
    let Query(query) = query?;
    let body = body?;
    let adapter = state.voice.as_ref().ok_or(ApiError::VoiceDisabled)?;

    let upload = VoiceUpload {
        audio: body.to_vec(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        submitted_by: query.submitted_by,
    };
    let created = state.engine.ingest_one(adapter.as_ref(), upload).await?;
    Ok(Json(created.entry))
}

pub(crate) async fn chat_question(
    State(state): State<AppState>,
    body: Result<Json<ChatQuestion>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Receipt>)> {
    let Json(question) = body?;
    let created = state.engine.ingest_one(&ChatAdapter, question).await?;
    Ok(receipt(created))
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

pub(crate) async fn pending(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<QaEntry>>> {
    let Query(query) = query?;
    let limit = state.listing.effective_limit(query.limit);
    Ok(Json(state.engine.pending(limit).await?))
}

pub(crate) async fn unanswered(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<QaEntry>>> {
    let Query(query) = query?;
    let limit = state.listing.effective_limit(query.limit);
    Ok(Json(state.engine.unanswered(limit).await?))
}

pub(crate) async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<QaEntry>>> {
    let Query(query) = query?;
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<Status>()?),
    };
    let limit = state.listing.effective_limit(query.limit);
    Ok(Json(state.engine.list(status, limit).await?))
}

pub(crate) async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<QaEntry>> {
    let id = parse_id(&id)?;
    Ok(Json(state.engine.approve(&id).await?))
}

pub(crate) async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<QaEntry>> {
    let id = parse_id(&id)?;
    Ok(Json(state.engine.reject(&id).await?))
}

pub(crate) async fn add_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AnswerRequest>, JsonRejection>,
) -> ApiResult<Json<QaEntry>> {
    let id = parse_id(&id)?;
    let Json(body) = body?;
    Ok(Json(state.engine.add_answer(&id, &body.answer).await?))
}

pub(crate) async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<QaEntry>> {
    let id = parse_id(&id)?;
    Ok(Json(state.engine.get(&id).await?))
}

pub(crate) async fn edit_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EntryPatch>, JsonRejection>,
) -> ApiResult<Json<QaEntry>> {
    let id = parse_id(&id)?;
    let Json(patch) = body?;
    Ok(Json(state.engine.edit(&id, &patch).await?))
}

pub(crate) async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state.engine.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn question_log(
    State(state): State<AppState>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<QuestionLogItem>>> {
    let Query(query) = query?;
    let answered = match query.answered {
        None => AnsweredFilter::Any,
        Some(true) => AnsweredFilter::Answered,
        Some(false) => AnsweredFilter::Unanswered,
    };
    let limit = state.listing.effective_limit(query.limit);
    Ok(Json(state.engine.question_log(answered, limit).await?))
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

pub(crate) async fn search(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Json(request) = body?;
    let entries = state.search.search(&request.query).await?;
    Ok(Json(SearchResponse { entries }))
}

pub(crate) async fn chat_search(
    State(state): State<AppState>,
    query: Result<Query<ChatSearchQuery>, QueryRejection>,
) -> ApiResult<Json<ChatSearchResponse>> {
    let Query(query) = query?;
    let response = match state.search.chat_lookup(&query.query).await? {
        ChatLookup::Found { answer } => ChatSearchResponse {
            found: true,
            answer: Some(answer),
        },
        ChatLookup::NotFound => ChatSearchResponse {
            found: false,
            answer: None,
        },
    };
    Ok(Json(response))
}
