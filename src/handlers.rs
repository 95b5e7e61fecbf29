// handlers.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use crate::auth;
use crate::error::AppError;
use crate::identity::{self, VoterIdentity};
use crate::models::{PollSummary, PollUpsertRequest, VoteRequest};
use crate::results::{self, OptionTally, PollResults};
use crate::state::AppState;
use crate::vote::{self, VoteOutcome};

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollResults>,
}

/// Submit a vote. Identity is implicit: the session user when logged in,
/// the anonymous voter cookie otherwise. Always answers in the vote-flow
/// message taxonomy, never with a bare error body.
pub async fn submit_vote(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<VoteRequest>,
) -> (StatusCode, CookieJar, Json<VoteResponse>) {
    let session_user = match auth::session_user(&state.pool, &jar).await {
        Ok(user) => user,
        Err(e) => {
            error!("session lookup failed: {e}");
            return vote_response(VoteOutcome::Failed, jar);
        }
    };

    let cookie_token = jar
        .get(identity::VOTER_COOKIE)
        .map(|c| c.value().to_owned());
    let voter = identity::resolve(session_user, cookie_token.as_deref());

    // Malformed ids never reach the store.
    let outcome = match (payload.poll_id.parse(), payload.poll_option_id.parse()) {
        (Ok(poll_id), Ok(option_id)) => {
            vote::submit(&state.pool, poll_id, option_id, &voter.identity).await
        }
        _ => VoteOutcome::Invalid,
    };

    // Persist a freshly minted token alongside the attempt, whatever the
    // outcome — the token carries no state until a vote references it, so
    // writing it before a failed vote is harmless and keeps retries on the
    // same identity.
    let jar = match (&voter.identity, voter.freshly_issued) {
        (VoterIdentity::Anonymous(token), true) => {
            jar.add(identity::voter_cookie(token.clone(), state.config.cookie_secure))
        }
        _ => jar,
    };

    vote_response(outcome, jar)
}

fn vote_response(
    outcome: VoteOutcome,
    jar: CookieJar,
) -> (StatusCode, CookieJar, Json<VoteResponse>) {
    let status = outcome.status();
    let message = outcome.message();
    let poll = match outcome {
        VoteOutcome::Submitted(poll) => poll,
        _ => None,
    };

    (status, jar, Json(VoteResponse { message, poll }))
}

#[derive(Debug, Serialize)]
pub struct PollView {
    pub id: Uuid,
    pub question: String,
    pub created_at: DateTime<Utc>,
    pub total_votes: i64,
    pub options: Vec<OptionTally>,
    pub has_voted: bool,
}

/// Voting-view read: options in creation order plus whether the current
/// identity has already voted. The flag feeds the initial render only; the
/// submission path re-checks on its own.
pub async fn get_poll(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Json<PollView>, AppError> {
    let poll_id: Uuid = id.parse().map_err(|_| AppError::NotFound)?;

    let poll = results::aggregate(&state.pool, poll_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let session_user = auth::session_user(&state.pool, &jar).await?;
    let cookie_token = jar
        .get(identity::VOTER_COOKIE)
        .map(|c| c.value().to_owned());
    let voter = identity::resolve(session_user, cookie_token.as_deref());

    // A token minted for this very request cannot have voted yet; reads do
    // not write the cookie back, so skip the lookup.
    let has_voted = if voter.freshly_issued {
        false
    } else {
        vote::has_voted(&state.pool, poll_id, &voter.identity).await?
    };

    Ok(Json(PollView {
        id: poll.id,
        question: poll.question,
        created_at: poll.created_at,
        total_votes: poll.total_votes,
        options: poll.options,
        has_voted,
    }))
}

/// Creator-only results view, highest tally first.
pub async fn get_results(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Json<PollResults>, AppError> {
    let user_id = auth::session_user(&state.pool, &jar)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let poll_id: Uuid = id.parse().map_err(|_| AppError::NotFound)?;

    let mut poll = results::aggregate(&state.pool, poll_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if poll.created_by != user_id {
        return Err(AppError::Forbidden);
    }

    results::sort_descending(&mut poll.options);

    Ok(Json(poll))
}

/// Dashboard listing: the caller's polls, newest first.
pub async fn list_polls(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<PollSummary>>, AppError> {
    let user_id = auth::session_user(&state.pool, &jar)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let polls = sqlx::query_as::<_, PollSummary>(
        "SELECT id, question, created_at FROM polls WHERE created_by = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(polls))
}

/// Create a poll with its options in one transaction, so a failed option
/// insert never leaves an orphaned question behind.
pub async fn create_poll(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<PollUpsertRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user_id = auth::session_user(&state.pool, &jar)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let (question, options) = payload.validated().map_err(AppError::Validation)?;

    let mut tx = state.pool.begin().await?;

    let (poll_id,): (Uuid,) =
        sqlx::query_as("INSERT INTO polls (question, created_by) VALUES ($1, $2) RETURNING id")
            .bind(&question)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

    for (position, text) in options.iter().enumerate() {
        sqlx::query("INSERT INTO poll_options (poll_id, text, position) VALUES ($1, $2, $3)")
            .bind(poll_id)
            .bind(text)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": poll_id }))))
}

/// Replace a poll's question and options; creator only. Options are
/// replaced wholesale, and votes for removed options cascade away.
pub async fn edit_poll(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Json(payload): Json<PollUpsertRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = auth::session_user(&state.pool, &jar)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let poll_id: Uuid = id.parse().map_err(|_| AppError::NotFound)?;

    let (question, options) = payload.validated().map_err(AppError::Validation)?;

    let created_by: Option<(Uuid,)> = sqlx::query_as("SELECT created_by FROM polls WHERE id = $1")
        .bind(poll_id)
        .fetch_optional(&state.pool)
        .await?;

    match created_by {
        None => return Err(AppError::NotFound),
        Some((creator,)) if creator != user_id => return Err(AppError::Forbidden),
        Some(_) => {}
    }

    let mut tx = state.pool.begin().await?;

    sqlx::query("UPDATE polls SET question = $1 WHERE id = $2")
        .bind(&question)
        .bind(poll_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM poll_options WHERE poll_id = $1")
        .bind(poll_id)
        .execute(&mut *tx)
        .await?;

    for (position, text) in options.iter().enumerate() {
        sqlx::query("INSERT INTO poll_options (poll_id, text, position) VALUES ($1, $2, $3)")
            .bind(poll_id)
            .bind(text)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(Json(json!({ "status": "Poll updated" })))
}
