use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::SessionConfig;

/// Payload of the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user ID
    pub sid: Uuid, // session row ID
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl SessionKeys {
    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }

    /// Signs a token for `session_id`, returning it with its expiry.
    pub fn sign(&self, user_id: Uuid, session_id: Uuid) -> anyhow::Result<(String, OffsetDateTime)> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            sid: session_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, session_id = %session_id, "session token signed");
        Ok((token, exp))
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        self.decode_with(token, true)
    }

    /// Signature and audience are still checked; only `exp` is ignored.
    pub fn verify_ignoring_expiry(&self, token: &str) -> anyhow::Result<Claims> {
        self.decode_with(token, false)
    }

    fn decode_with(&self, token: &str, validate_exp: bool) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = validate_exp;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// Server-side session capability.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Opens a session for `user_id` and returns the token to hand to the client.
    async fn create(&self, user_id: Uuid) -> anyhow::Result<String>;
    /// `None` for forged, expired or destroyed sessions.
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Uuid>>;
    /// Idempotent; unknown tokens are ignored.
    async fn destroy(&self, token: &str) -> anyhow::Result<()>;
    /// Deletes sessions past their expiry and returns how many went.
    async fn purge_expired(&self) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
    keys: SessionKeys,
}

impl PgSessionStore {
    pub fn new(db: PgPool, keys: SessionKeys) -> Self {
        Self { db, keys }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.purge_expired().await?;
        let session_id = Uuid::new_v4();
        let (token, expires_at) = self.keys.sign(user_id, session_id)?;
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Uuid>> {
        let claims = match self.keys.verify(token) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "rejected session token");
                return Ok(None);
            }
        };
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            SELECT user_id
            FROM sessions
            WHERE id = $1 AND expires_at > now()
            "#,
        )
        .bind(claims.sid)
        .fetch_optional(&self.db)
        .await?;
        Ok(row
            .map(|(user_id,)| user_id)
            .filter(|user_id| *user_id == claims.sub))
    }

    async fn destroy(&self, token: &str) -> anyhow::Result<()> {
        let Ok(claims) = self.keys.verify_ignoring_expiry(token) else {
            return Ok(());
        };
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(claims.sid)
            .execute(&self.db)
            .await?;
        debug!(session_id = %claims.sid, "session destroyed");
        Ok(())
    }

    async fn purge_expired(&self) -> anyhow::Result<u64> {
        let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.db)
            .await?
            .rows_affected();
        if purged > 0 {
            debug!(purged, "expired sessions purged");
        }
        Ok(purged)
    }
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(cfg: &SessionConfig, token: &str) -> anyhow::Result<HeaderValue> {
    let max_age = cfg.ttl_minutes.max(1) * 60;
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        cfg.cookie_name, token, max_age
    );
    if cfg.cookie_secure {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie)?)
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn clear_session_cookie(cfg: &SessionConfig) -> anyhow::Result<HeaderValue> {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", cfg.cookie_name);
    if cfg.cookie_secure {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie)?)
}

/// Reads the session token from the cookie, falling back to a bearer header.
pub fn token_from_headers<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value);

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}
