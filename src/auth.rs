use axum_extra::extract::cookie::CookieJar;
use sqlx::PgPool;
use uuid::Uuid;

/// Name of the session cookie issued by the auth provider.
pub const SESSION_COOKIE: &str = "session_token";

/// Look up the user behind the request's session cookie, if any.
///
/// Sessions are minted and expired by the auth provider; this service only
/// reads its session store. An unknown or expired token resolves to no user.
pub async fn session_user(pool: &PgPool, jar: &CookieJar) -> Result<Option<Uuid>, sqlx::Error> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()")
            .bind(cookie.value())
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(user_id,)| user_id))
}
