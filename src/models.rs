// models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Poll {
    pub id: Uuid,
    pub question: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PollOption {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub text: String,
    pub position: i32,
}

/// One recorded vote. Exactly one of `user_id` / `voter_token` is set,
/// enforced by a check constraint on the table.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub poll_option_id: Uuid,
    pub user_id: Option<Uuid>,
    pub voter_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Dashboard row: a poll without its options.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PollSummary {
    pub id: Uuid,
    pub question: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub poll_id: String,
    pub poll_option_id: String,
}

/// Create/edit payload: a question plus the full option list.
#[derive(Debug, Deserialize)]
pub struct PollUpsertRequest {
    pub question: String,
    pub options: Vec<String>,
}

impl PollUpsertRequest {
    /// Trim the question and options, dropping blank options. A poll needs
    /// a question and at least two options to survive validation.
    pub fn validated(self) -> Result<(String, Vec<String>), String> {
        let question = self.question.trim().to_owned();
        let options: Vec<String> = self
            .options
            .iter()
            .map(|o| o.trim().to_owned())
            .filter(|o| !o.is_empty())
            .collect();

        if question.is_empty() || options.len() < 2 {
            return Err("Please provide a question and at least two options.".to_owned());
        }

        Ok((question, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question: &str, options: &[&str]) -> PollUpsertRequest {
        PollUpsertRequest {
            question: question.to_owned(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[test]
    fn accepts_question_with_two_options() {
        let (question, options) = request("Color?", &["Red", "Blue"]).validated().unwrap();
        assert_eq!(question, "Color?");
        assert_eq!(options, vec!["Red", "Blue"]);
    }

    #[test]
    fn rejects_empty_question() {
        let err = request("   ", &["Red", "Blue"]).validated().unwrap_err();
        assert_eq!(err, "Please provide a question and at least two options.");
    }

    #[test]
    fn rejects_fewer_than_two_options() {
        assert!(request("Color?", &["Red"]).validated().is_err());
        assert!(request("Color?", &[]).validated().is_err());
    }

    #[test]
    fn blank_options_do_not_count() {
        assert!(request("Color?", &["Red", "  "]).validated().is_err());
    }

    #[test]
    fn trims_question_and_options() {
        let (question, options) = request(" Color? ", &[" Red ", "Blue "]).validated().unwrap();
        assert_eq!(question, "Color?");
        assert_eq!(options, vec!["Red", "Blue"]);
    }
}
