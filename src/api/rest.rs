//! REST API endpoints for the book poll.

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::error::{forbidden, validation_error, ApiError};
use crate::api::types::{
    CastVoteRequest, LoginRequest, LoginResponse, RefreshRequest, RegisterRequest, UserResponse,
    VoteView, VotesResponse,
};
use crate::auth::{AuthContext, AuthContextExt, AuthError};
use crate::domain::{ballot_titles, is_on_ballot, NewUser, StatusUpdate, UserId, VotingStatus};
use crate::infra::VotingError;
use crate::metrics::metric_names;
use crate::server::AppState;
use crate::tally;

/// Routes that are reachable without a token.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

/// Routes behind the bearer-token middleware.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/voting-status", get(get_voting_status))
        .route("/voting-status", post(set_voting_status))
        .route("/vote", post(cast_vote))
        .route("/get-votes", get(get_votes))
        .route("/users/:id", get(get_user))
}

fn ensure_admin(auth: &AuthContext) -> Result<(), ApiError> {
    if !auth.is_admin() {
        return Err(forbidden("Admin permission required"));
    }
    Ok(())
}

/// Accepts `local@domain` with a dot somewhere in the domain. Deliverability
/// is not checked.
fn is_well_formed_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

// ============================================================================
// Accounts
// ============================================================================

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(validation_error("username", "username must not be empty"));
    }

    let email = request.email.trim();
    if !is_well_formed_email(email) {
        return Err(validation_error("email", "email address is not well-formed"));
    }
    if let Some(required) = &state.email_domain {
        if !email.ends_with(required.as_str()) {
            return Err(validation_error(
                "email",
                format!("email must end with {}", required),
            ));
        }
    }

    if request.password.is_empty() {
        return Err(validation_error("password", "password must not be empty"));
    }
    if request.password != request.confirm_password {
        return Err(validation_error(
            "confirm_password",
            "passwords do not match",
        ));
    }

    let password_hash = crate::auth::hash_password(&request.password)?;
    // Registration never grants admin; that flag is set by the operator CLI.
    let user = state
        .users
        .create_user(NewUser::new(username, email, password_hash))
        .await?;

    state.metrics.inc_counter(metric_names::REGISTRATIONS).await;
    tracing::info!(username = %user.username, "account registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let account = state.users.find_by_username(request.username.trim()).await?;

    // Lookup failure and hash mismatch are indistinguishable to the caller.
    let user = match account {
        Some(user) if crate::auth::verify_password(&request.password, &user.password_hash) => user,
        _ => {
            state
                .metrics
                .inc_counter(metric_names::LOGIN_FAILURES)
                .await;
            return Err(VotingError::InvalidCredentials.into());
        }
    };

    let pair = state.tokens.issue_pair(&user)?;
    state.metrics.inc_counter(metric_names::LOGINS).await;
    tracing::info!(username = %user.username, "login succeeded");

    Ok(Json(LoginResponse::new(pair, user.is_admin)))
}

async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user_id = state.tokens.validate_refresh(&request.refresh_token)?;

    // Re-read the account so a deleted account cannot refresh and a changed
    // admin flag takes effect on the next pair.
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AuthError::InvalidToken("account no longer exists".to_string()))?;

    let pair = state.tokens.issue_pair(&user)?;
    Ok(Json(LoginResponse::new(pair, user.is_admin)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = UserId::from_uuid(id);
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(VotingError::UserNotFound(user_id))?;

    Ok(Json(user.into()))
}

// ============================================================================
// Voting status
// ============================================================================

async fn get_voting_status(State(state): State<AppState>) -> Result<Json<VotingStatus>, ApiError> {
    let status = state.status.get_status().await?;
    Ok(Json(status))
}

async fn set_voting_status(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<VotingStatus>, ApiError> {
    ensure_admin(&auth)?;

    let status = state.status.set_status(update).await?;

    state
        .metrics
        .inc_counter(metric_names::STATUS_UPDATES)
        .await;
    state
        .metrics
        .set_gauge(metric_names::VOTING_ACTIVE, status.is_active as u64)
        .await;
    tracing::info!(
        is_active = status.is_active,
        display_results = status.display_results,
        admin = %auth.username,
        "voting status updated"
    );

    Ok(Json(status))
}

// ============================================================================
// Votes
// ============================================================================

async fn cast_vote(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Json(request): Json<CastVoteRequest>,
) -> Result<(StatusCode, Json<VoteView>), ApiError> {
    if !is_on_ballot(&request.book) {
        state
            .metrics
            .inc_counter(metric_names::VOTES_REJECTED)
            .await;
        return Err(VotingError::UnknownOption {
            title: request.book.to_string(),
        }
        .into());
    }

    match state.votes.cast_vote(auth.user_id, &request.book).await {
        Ok(vote) => {
            state.metrics.inc_counter(metric_names::VOTES_CAST).await;
            tracing::info!(username = %auth.username, book = %vote.book, "vote cast");
            Ok((
                StatusCode::CREATED,
                Json(VoteView::from_cast(vote, auth.username)),
            ))
        }
        Err(e) => {
            state
                .metrics
                .inc_counter(metric_names::VOTES_REJECTED)
                .await;
            Err(e.into())
        }
    }
}

async fn get_votes(State(state): State<AppState>) -> Result<Json<VotesResponse>, ApiError> {
    let records = state.votes.list_votes().await?;
    let vote_counts = tally::compute_counts(&ballot_titles(), records.iter().map(|r| &r.book));
    let votes = records.into_iter().map(VoteView::from).collect();

    Ok(Json(VotesResponse { votes, vote_counts }))
}
