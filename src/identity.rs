use axum_extra::extract::cookie::Cookie;
use time::Duration;
use uuid::Uuid;

/// Name of the long-lived anonymous voter cookie.
pub const VOTER_COOKIE: &str = "poll_voter_token";

const VOTER_COOKIE_MAX_AGE_DAYS: i64 = 365;

/// The identity a vote is recorded under: a session-backed user id or the
/// anonymous token carried in [`VOTER_COOKIE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoterIdentity {
    User(Uuid),
    Anonymous(String),
}

/// Identity resolved for one request, plus whether the anonymous token was
/// minted just now and still needs to be written back as a cookie.
#[derive(Debug, Clone)]
pub struct ResolvedVoter {
    pub identity: VoterIdentity,
    pub freshly_issued: bool,
}

/// Resolve the voter identity for a request. A session identity always wins
/// over an anonymous cookie; with neither present a new token is minted.
/// The caller persists freshly minted tokens via [`voter_cookie`] — no
/// cookie is written here.
pub fn resolve(session_user: Option<Uuid>, cookie_token: Option<&str>) -> ResolvedVoter {
    if let Some(user_id) = session_user {
        return ResolvedVoter {
            identity: VoterIdentity::User(user_id),
            freshly_issued: false,
        };
    }

    match cookie_token {
        Some(token) if !token.is_empty() => ResolvedVoter {
            identity: VoterIdentity::Anonymous(token.to_owned()),
            freshly_issued: false,
        },
        _ => ResolvedVoter {
            identity: VoterIdentity::Anonymous(Uuid::new_v4().to_string()),
            freshly_issued: true,
        },
    }
}

/// Build the persistent voter cookie for a freshly minted token: HTTP-only,
/// root path, one-year lifetime, `Secure` in production.
pub fn voter_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((VOTER_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .path("/")
        .max_age(Duration::days(VOTER_COOKIE_MAX_AGE_DAYS))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_wins_over_anonymous_cookie() {
        let user_id = Uuid::new_v4();
        let resolved = resolve(Some(user_id), Some("leftover-token"));

        assert_eq!(resolved.identity, VoterIdentity::User(user_id));
        assert!(!resolved.freshly_issued);
    }

    #[test]
    fn cookie_token_is_reused_verbatim() {
        let resolved = resolve(None, Some("stable-token"));

        assert_eq!(
            resolved.identity,
            VoterIdentity::Anonymous("stable-token".to_owned())
        );
        assert!(!resolved.freshly_issued);
    }

    #[test]
    fn empty_cookie_counts_as_absent() {
        let resolved = resolve(None, Some(""));
        assert!(resolved.freshly_issued);
    }

    #[test]
    fn fresh_tokens_are_unique() {
        let a = resolve(None, None);
        let b = resolve(None, None);

        assert!(a.freshly_issued);
        assert!(b.freshly_issued);
        assert_ne!(a.identity, b.identity);
    }

    #[test]
    fn voter_cookie_contract() {
        let cookie = voter_cookie("token".to_owned(), true);

        assert_eq!(cookie.name(), VOTER_COOKIE);
        assert_eq!(cookie.value(), "token");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(365)));
    }

    #[test]
    fn voter_cookie_secure_flag_follows_config() {
        let cookie = voter_cookie("token".to_owned(), false);
        assert_eq!(cookie.secure(), Some(false));
    }
}
