use http::StatusCode;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::identity::VoterIdentity;
use crate::models::Vote;
use crate::results::{self, PollResults};

/// Outcome of a vote submission, from the voter's perspective. A duplicate
/// vote is an expected outcome here, not a fault.
#[derive(Debug)]
pub enum VoteOutcome {
    /// The vote was durably recorded. Carries a fresh result snapshot when
    /// the follow-up aggregation read succeeded.
    Submitted(Option<PollResults>),
    AlreadyVoted,
    Invalid,
    Failed,
}

impl VoteOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            VoteOutcome::Submitted(_) => "Vote submitted successfully!",
            VoteOutcome::AlreadyVoted => "You have already voted in this poll.",
            VoteOutcome::Invalid => "Invalid poll or option.",
            VoteOutcome::Failed => "Failed to submit vote. Please try again.",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            VoteOutcome::Submitted(_) => StatusCode::OK,
            VoteOutcome::AlreadyVoted => StatusCode::CONFLICT,
            VoteOutcome::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
            VoteOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Advisory duplicate-vote check. Fast path only: two racing requests can
/// both see `false` here, so the unique indexes on `votes` remain the
/// authoritative guard.
pub async fn has_voted(
    pool: &PgPool,
    poll_id: Uuid,
    voter: &VoterIdentity,
) -> Result<bool, sqlx::Error> {
    let existing: Option<Vote> = match voter {
        VoterIdentity::User(user_id) => {
            sqlx::query_as("SELECT * FROM votes WHERE poll_id = $1 AND user_id = $2")
                .bind(poll_id)
                .bind(user_id)
                .fetch_optional(pool)
                .await?
        }
        VoterIdentity::Anonymous(token) => {
            sqlx::query_as("SELECT * FROM votes WHERE poll_id = $1 AND voter_token = $2")
                .bind(poll_id)
                .bind(token)
                .fetch_optional(pool)
                .await?
        }
    };

    Ok(existing.is_some())
}

/// An option id that does not belong to the poll (or a poll with no
/// options at all) never reaches the vote table.
async fn option_belongs_to_poll(
    pool: &PgPool,
    poll_id: Uuid,
    option_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM poll_options WHERE id = $1 AND poll_id = $2)")
            .bind(option_id)
            .bind(poll_id)
            .fetch_one(pool)
            .await?;

    Ok(exists)
}

/// Record one vote for the given identity.
///
/// Validation and the advisory guard run first; the insert itself relies on
/// the partial unique indexes to serialize same-identity races across
/// processes, so a unique violation reports as a duplicate rather than a
/// failure. Any other store error is logged and reported as transient —
/// resubmitting is safe.
pub async fn submit(
    pool: &PgPool,
    poll_id: Uuid,
    option_id: Uuid,
    voter: &VoterIdentity,
) -> VoteOutcome {
    match option_belongs_to_poll(pool, poll_id, option_id).await {
        Ok(true) => {}
        Ok(false) => return VoteOutcome::Invalid,
        Err(e) => {
            error!("vote validation query failed: {e}");
            return VoteOutcome::Failed;
        }
    }

    match has_voted(pool, poll_id, voter).await {
        Ok(true) => return VoteOutcome::AlreadyVoted,
        Ok(false) => {}
        Err(e) => {
            error!("duplicate-vote check failed: {e}");
            return VoteOutcome::Failed;
        }
    }

    let insert = match voter {
        VoterIdentity::User(user_id) => {
            sqlx::query("INSERT INTO votes (poll_id, poll_option_id, user_id) VALUES ($1, $2, $3)")
                .bind(poll_id)
                .bind(option_id)
                .bind(user_id)
                .execute(pool)
                .await
        }
        VoterIdentity::Anonymous(token) => sqlx::query(
            "INSERT INTO votes (poll_id, poll_option_id, voter_token) VALUES ($1, $2, $3)",
        )
        .bind(poll_id)
        .bind(option_id)
        .bind(token)
        .execute(pool)
        .await,
    };

    match insert {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return VoteOutcome::AlreadyVoted,
        Err(e) => {
            error!("vote insert failed: {e}");
            return VoteOutcome::Failed;
        }
    }

    // The vote is durable at this point; a failed snapshot read only costs
    // the immediate result display.
    match results::aggregate(pool, poll_id).await {
        Ok(poll) => VoteOutcome::Submitted(poll),
        Err(e) => {
            error!("post-vote aggregation failed: {e}");
            VoteOutcome::Submitted(None)
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_messages() {
        assert_eq!(
            VoteOutcome::Submitted(None).message(),
            "Vote submitted successfully!"
        );
        assert_eq!(
            VoteOutcome::AlreadyVoted.message(),
            "You have already voted in this poll."
        );
        assert_eq!(VoteOutcome::Invalid.message(), "Invalid poll or option.");
        assert_eq!(
            VoteOutcome::Failed.message(),
            "Failed to submit vote. Please try again."
        );
    }

    #[test]
    fn outcome_statuses() {
        assert_eq!(VoteOutcome::Submitted(None).status(), StatusCode::OK);
        assert_eq!(VoteOutcome::AlreadyVoted.status(), StatusCode::CONFLICT);
        assert_eq!(
            VoteOutcome::Invalid.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            VoteOutcome::Failed.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
