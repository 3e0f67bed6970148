//! Transaction handlers.
//!
//! Thin adapters: parse the request, make one ledger index call, shape the
//! response. A failed index call is reported, never retried.

use crate::domain::{ApiError, ApiResult};
use crate::router::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shared_types::{
    ChannelId, LocationId, StoredTransaction, Topic, TopicSet, TransactionEnvelope,
};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Body of `POST /persistTransaction`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistRequest {
    pub data: String,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    pub topics: Vec<Topic>,
}

impl PersistRequest {
    /// Split into what the index stores. Duplicate topics collapse.
    pub fn into_parts(self) -> (TransactionEnvelope, TopicSet) {
        let envelope = TransactionEnvelope {
            data: self.data,
            channel_id: self.channel_id,
        };
        (envelope, self.topics.into_iter().collect())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistResponse {
    pub location_id: LocationId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelQuery {
    pub channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopicQuery {
    pub topic: Option<String>,
}

/// `POST /persistTransaction`
pub async fn persist_transaction(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<PersistResponse>)> {
    let request: PersistRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid transaction: {}", e)))?;

    let (envelope, topics) = request.into_parts();
    envelope
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let location_id = state
        .index
        .append(envelope, topics)
        .await
        .map_err(|e| backing_error(&state, "append", e))?;

    state.metrics.record_persisted();
    info!(location_id = %location_id, "Transaction persisted");
    Ok((StatusCode::CREATED, Json(PersistResponse { location_id })))
}

/// `GET /getTransactionsByChannelId?channelId=<id>`
pub async fn transactions_by_channel(
    State(state): State<AppState>,
    query: Result<Query<ChannelQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<StoredTransaction>>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let channel_id = required(query.channel_id, "channelId")
        .and_then(|raw| ChannelId::parse(raw).map_err(|e| ApiError::bad_request(e.to_string())))?;

    let transactions = state
        .index
        .read_by_channel(&channel_id)
        .await
        .map_err(|e| backing_error(&state, "read_by_channel", e))?;

    Ok(Json(transactions))
}

/// `GET /getChannelsByTopic?topic=<topic>`
///
/// An unknown topic is an empty list, not an error.
pub async fn channels_by_topic(
    State(state): State<AppState>,
    query: Result<Query<TopicQuery>, QueryRejection>,
) -> ApiResult<Json<BTreeSet<ChannelId>>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let topic = required(query.topic, "topic")
        .and_then(|raw| Topic::parse(raw).map_err(|e| ApiError::bad_request(e.to_string())))?;

    let channels = state
        .index
        .read_by_topic(&topic)
        .await
        .map_err(|e| backing_error(&state, "read_by_topic", e))?;

    Ok(Json(channels))
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value.ok_or_else(|| ApiError::bad_request(format!("missing query parameter `{}`", name)))
}

fn backing_error(state: &AppState, operation: &str, error: lg_01_ledger_index::IndexError) -> ApiError {
    let api_error = ApiError::from_index(operation, error);
    if !api_error.is_client_error() {
        state.metrics.record_backing_failure();
        warn!(operation, error = %api_error.message, "Ledger index call failed");
    }
    api_error
}
