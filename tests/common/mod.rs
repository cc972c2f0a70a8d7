//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use bookvote::auth::{hash_password, AuthMiddlewareState, Authenticator, TokenSigner};
use bookvote::domain::{NewUser, User, UserId};
use bookvote::infra::{InMemoryStatusStore, InMemoryUserStore, InMemoryVoteStore, UserStore};
use bookvote::metrics::MetricsRegistry;
use bookvote::server::{build_router, AppState};

/// Password used by every fixture account.
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Fixed id for the fixture admin account.
pub fn admin_user_id() -> UserId {
    UserId::from_uuid(Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap())
}

/// Fixed id for a fixture voter account.
pub fn voter_user_id() -> UserId {
    UserId::from_uuid(Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap())
}

pub fn test_signer() -> Arc<TokenSigner> {
    Arc::new(TokenSigner::new(
        b"integration-test-secret",
        "bookvote",
        "bookvote-api",
        Duration::hours(1),
        Duration::days(7),
    ))
}

/// An in-process application over in-memory stores.
///
/// The stores stay accessible so tests can seed accounts and toggle the
/// voting status without going through the API.
pub struct TestApp {
    pub router: axum::Router,
    pub users: Arc<InMemoryUserStore>,
    pub status: InMemoryStatusStore,
    pub tokens: Arc<TokenSigner>,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserStore::new());
        let status = InMemoryStatusStore::new();
        let votes = Arc::new(InMemoryVoteStore::new(users.clone(), status.clone()));
        let tokens = test_signer();

        let state = AppState {
            users: users.clone(),
            votes,
            status: Arc::new(status.clone()),
            tokens: tokens.clone(),
            metrics: Arc::new(MetricsRegistry::new()),
            pool: None,
            email_domain: None,
        };

        let auth_state = AuthMiddlewareState {
            authenticator: Arc::new(Authenticator::new(tokens.clone())),
            rate_limiter: None,
        };

        let router = build_router(auth_state)
            .expect("router should build")
            .with_state(state);

        Self {
            router,
            users,
            status,
            tokens,
        }
    }

    /// Seed an account with [`TEST_PASSWORD`].
    pub async fn seed_user(&self, username: &str, admin: bool) -> User {
        let mut user = NewUser::new(
            username,
            format!("{username}@example.com"),
            hash_password(TEST_PASSWORD).unwrap(),
        );
        if admin {
            user = user.admin();
        }
        self.users.create_user(user).await.unwrap()
    }

    /// A valid access token for an account.
    pub fn token_for(&self, user: &User) -> String {
        self.tokens.issue_pair(user).unwrap().token
    }
}

/// Assert a result is Ok, with a useful failure message.
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("expected Ok, got Err: {e:?}"),
        }
    };
}

/// Assert a result matches an error pattern.
#[macro_export]
macro_rules! assert_err_matches {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            other => panic!(
                "expected Err({}), got {other:?}",
                stringify!($pattern)
            ),
        }
    };
}
