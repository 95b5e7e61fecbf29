use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Poll, PollOption};

/// Per-option tally within a poll's aggregated results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionTally {
    pub id: Uuid,
    pub text: String,
    pub votes: i64,
    pub percent: i64,
}

/// Aggregated results for one poll. Options keep creation order; callers
/// that want a leaderboard apply [`sort_descending`].
#[derive(Debug, Clone, Serialize)]
pub struct PollResults {
    pub id: Uuid,
    pub question: String,
    #[serde(skip_serializing)]
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub total_votes: i64,
    pub options: Vec<OptionTally>,
}

/// Count votes per option for one poll, zero-vote options included.
/// Returns `None` when the poll does not exist.
pub async fn aggregate(pool: &PgPool, poll_id: Uuid) -> Result<Option<PollResults>, sqlx::Error> {
    let poll: Option<Poll> = sqlx::query_as("SELECT * FROM polls WHERE id = $1")
        .bind(poll_id)
        .fetch_optional(pool)
        .await?;

    let Some(poll) = poll else {
        return Ok(None);
    };

    let options: Vec<PollOption> =
        sqlx::query_as("SELECT * FROM poll_options WHERE poll_id = $1 ORDER BY position")
            .bind(poll_id)
            .fetch_all(pool)
            .await?;

    let counts: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT poll_option_id, COUNT(*) FROM votes WHERE poll_id = $1 GROUP BY poll_option_id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    let by_option: HashMap<Uuid, i64> = counts.into_iter().collect();
    let total: i64 = by_option.values().sum();

    let options = options
        .into_iter()
        .map(|option| {
            let votes = by_option.get(&option.id).copied().unwrap_or(0);
            OptionTally {
                id: option.id,
                text: option.text,
                votes,
                percent: percentage(votes, total),
            }
        })
        .collect();

    Ok(Some(PollResults {
        id: poll.id,
        question: poll.question,
        created_by: poll.created_by,
        created_at: poll.created_at,
        total_votes: total,
        options,
    }))
}

/// Share of `votes` in `total`, rounded to a whole percent. A zero total
/// yields zero, never a division fault.
pub fn percentage(votes: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }

    ((votes * 100) as f64 / total as f64).round() as i64
}

/// Results-view ordering: highest tally first. The sort is stable, so tied
/// options keep their creation order.
pub fn sort_descending(options: &mut [OptionTally]) {
    options.sort_by(|a, b| b.votes.cmp(&a.votes));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(text: &str, votes: i64, total: i64) -> OptionTally {
        OptionTally {
            id: Uuid::new_v4(),
            text: text.to_owned(),
            votes,
            percent: percentage(votes, total),
        }
    }

    #[test]
    fn zero_total_means_zero_percent() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn single_vote_takes_all() {
        // Poll "Color?", first vote for Red: {Red: 1 (100%), Blue: 0 (0%)}.
        assert_eq!(percentage(1, 1), 100);
        assert_eq!(percentage(0, 1), 0);
    }

    #[test]
    fn even_split() {
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 2) + percentage(1, 2), 100);
    }

    #[test]
    fn rounded_shares_sum_close_to_hundred() {
        let shares = [1, 1, 1];
        let total: i64 = shares.iter().sum();
        let sum: i64 = shares.iter().map(|&v| percentage(v, total)).sum();

        assert!((sum - 100).abs() <= 1, "sum was {sum}");
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 8), 13);
    }

    #[test]
    fn descending_sort_is_stable() {
        let mut options = vec![
            tally("Red", 1, 4),
            tally("Green", 2, 4),
            tally("Blue", 1, 4),
        ];

        sort_descending(&mut options);

        assert_eq!(options[0].text, "Green");
        // Tied options keep creation order.
        assert_eq!(options[1].text, "Red");
        assert_eq!(options[2].text, "Blue");
    }
}
