//! In-memory stores so the auth flow can be tested without PostgreSQL.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{
    password::hash_password,
    repo::{DuplicateKey, UserRepository},
    repo_types::{NewUser, Role, User, UserType},
    session::{SessionKeys, SessionStore},
};
use crate::config::SessionConfig;

pub fn session_config() -> SessionConfig {
    SessionConfig {
        secret: "test-secret".into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 5,
        cookie_name: "session".into(),
        cookie_secure: false,
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
    create_calls: Mutex<usize>,
    create_failure: Mutex<Option<DuplicateKey>>,
    reads_fail: Mutex<bool>,
}

impl MemoryUserRepository {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn create_calls(&self) -> usize {
        *self.create_calls.lock().unwrap()
    }

    pub fn fail_create_with(&self, dup: DuplicateKey) {
        *self.create_failure.lock().unwrap() = Some(dup);
    }

    pub fn fail_reads(&self) {
        *self.reads_fail.lock().unwrap() = true;
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    fn find(&self, pred: impl Fn(&User) -> bool) -> anyhow::Result<Option<User>> {
        if *self.reads_fail.lock().unwrap() {
            anyhow::bail!("store unavailable");
        }
        Ok(self.users.lock().unwrap().iter().find(|u| pred(u)).cloned())
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut User)) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id)?;
        f(user);
        Some(user.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.find(|u| u.email == email)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.find(|u| u.username.as_deref() == Some(username))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.find(|u| u.id == id)
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<User> {
        *self.create_calls.lock().unwrap() += 1;
        if let Some(dup) = *self.create_failure.lock().unwrap() {
            return Err(dup.into());
        }
        let active = new_user.starts_active();
        let user = User {
            id: Uuid::new_v4(),
            role: new_user.role(),
            email: new_user.email,
            username: new_user.username,
            name: new_user.name,
            password_hash: new_user.password_hash,
            user_type: new_user.user_type,
            active,
            is_approved: active,
            country: new_user.country,
            currency: new_user.currency,
            education: new_user.education,
            created_at: OffsetDateTime::now_utc(),
        };
        self.insert(user.clone());
        Ok(user)
    }

    async fn list_pending_instructors(&self) -> anyhow::Result<Vec<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.user_type == UserType::Instructor && !u.is_approved)
            .cloned()
            .collect())
    }

    async fn approve(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.update(id, |u| {
            u.is_approved = true;
            u.active = true;
        }))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<Option<User>> {
        Ok(self.update(id, |u| u.active = active))
    }
}

/// Adds a user with a real argon2 hash of `password`.
pub fn seed_user(
    users: &MemoryUserRepository,
    email: &str,
    password: &str,
    role: Role,
    user_type: UserType,
    active: bool,
    is_approved: bool,
) -> User {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        username: None,
        name: email.split('@').next().unwrap_or(email).to_string(),
        password_hash: hash_password(password).expect("hash"),
        role,
        user_type,
        active,
        is_approved,
        country: None,
        currency: None,
        education: (user_type == UserType::Instructor).then(|| "Ijazah".to_string()),
        created_at: OffsetDateTime::now_utc(),
    };
    users.insert(user.clone());
    user
}

/// Signs real tokens but keeps session rows in a map.
pub struct MemorySessionStore {
    keys: SessionKeys,
    // session id -> (user id, expiry)
    live: Mutex<HashMap<Uuid, (Uuid, OffsetDateTime)>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self {
            keys: SessionKeys::from_config(&session_config()),
            live: Mutex::new(HashMap::new()),
        }
    }
}

impl MemorySessionStore {
    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    /// Leaves a session row behind that expired a minute ago.
    pub fn insert_expired(&self, user_id: Uuid) -> Uuid {
        let session_id = Uuid::new_v4();
        let expired = OffsetDateTime::now_utc() - time::Duration::minutes(1);
        self.live.lock().unwrap().insert(session_id, (user_id, expired));
        session_id
    }

    pub fn contains(&self, session_id: Uuid) -> bool {
        self.live.lock().unwrap().contains_key(&session_id)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.purge_expired().await?;
        let session_id = Uuid::new_v4();
        let (token, expires_at) = self.keys.sign(user_id, session_id)?;
        self.live.lock().unwrap().insert(session_id, (user_id, expires_at));
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Uuid>> {
        let Ok(claims) = self.keys.verify(token) else {
            return Ok(None);
        };
        let now = OffsetDateTime::now_utc();
        let live = self.live.lock().unwrap();
        Ok(live
            .get(&claims.sid)
            .filter(|(user_id, expires_at)| *user_id == claims.sub && *expires_at > now)
            .map(|(user_id, _)| *user_id))
    }

    async fn destroy(&self, token: &str) -> anyhow::Result<()> {
        if let Ok(claims) = self.keys.verify_ignoring_expiry(token) {
            self.live.lock().unwrap().remove(&claims.sid);
        }
        Ok(())
    }

    async fn purge_expired(&self) -> anyhow::Result<u64> {
        let now = OffsetDateTime::now_utc();
        let mut live = self.live.lock().unwrap();
        let before = live.len();
        live.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - live.len()) as u64)
    }
}
