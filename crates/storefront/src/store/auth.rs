//! Authentication store.
//!
//! Owns the session. A successful login persists the bearer token through
//! the gateway's [`TokenStorage`](crate::api::TokenStorage), so every request
//! issued after the `LoggedIn` action carries it.

use secrecy::SecretString;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::api::decode::{ShapeKeys, decode_item, decode_object};
use crate::api::{ApiClient, ApiError, TokenStorage};
use crate::models::{AuthPayload, Session, User};

use super::{Reducer, RequestStatus, Store};

const AUTH_KEYS: ShapeKeys = ShapeKeys::items(&["auth"]);
const USER_KEYS: ShapeKeys = ShapeKeys::items(&["user"]);
const ACK_KEYS: ShapeKeys = ShapeKeys::items(&[]);

/// Authentication slice.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub user: Option<User>,
    pub session: Option<Session>,
    pub is_authenticated: bool,
    /// Last informational message from the server ("check your inbox").
    pub notice: Option<String>,
    pub request: RequestStatus,
}

impl AuthState {
    /// Seed the slice from a previously persisted token.
    #[must_use]
    pub fn restore(storage: &dyn TokenStorage) -> Self {
        let session = storage.load().map(|token| Session {
            user_id: None,
            token,
        });
        Self {
            is_authenticated: session.is_some(),
            session,
            ..Self::default()
        }
    }
}

/// Actions understood by [`AuthState`].
#[derive(Debug)]
pub enum AuthAction {
    Pending,
    Rejected(String),
    LoggedIn {
        user: Option<User>,
        token: SecretString,
    },
    Registered {
        user: Option<User>,
        message: Option<String>,
    },
    UserLoaded(Option<User>),
    Acknowledged(Option<String>),
    LoggedOut,
}

impl Reducer for AuthState {
    type Action = AuthAction;

    fn pending() -> Self::Action {
        AuthAction::Pending
    }

    fn rejected(message: String) -> Self::Action {
        AuthAction::Rejected(message)
    }

    fn reduce(&mut self, action: Self::Action) {
        match action {
            AuthAction::Pending => self.request.start(),
            AuthAction::Rejected(message) => self.request.fail(message),
            AuthAction::LoggedIn { user, token } => {
                self.session = Some(Session {
                    user_id: user.as_ref().map(|u| u.id.clone()),
                    token,
                });
                if user.is_some() {
                    self.user = user;
                }
                self.is_authenticated = true;
                self.notice = None;
                self.request.succeed();
            }
            AuthAction::Registered { user, message } => {
                if user.is_some() {
                    self.user = user;
                }
                self.notice = message;
                self.request.succeed();
            }
            AuthAction::UserLoaded(user) => {
                if let Some(user) = user {
                    if let Some(session) = self.session.as_mut() {
                        session.user_id = Some(user.id.clone());
                    }
                    self.user = Some(user);
                }
                self.request.succeed();
            }
            AuthAction::Acknowledged(message) => {
                self.notice = message;
                self.request.succeed();
            }
            AuthAction::LoggedOut => {
                *self = Self::default();
            }
        }
    }
}

/// Fields sent when creating an account.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Result of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The server issued a token; the customer is logged in.
    SignedIn(Option<User>),
    /// The account exists but must be verified before login.
    VerificationRequired(Option<String>),
}

// =============================================================================
// AuthStore
// =============================================================================

/// Authentication triggers.
#[derive(Clone)]
pub struct AuthStore {
    api: ApiClient,
    store: Store<AuthState>,
}

impl AuthStore {
    /// Create the store, restoring any persisted session.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let initial = AuthState::restore(api.tokens().as_ref());
        Self {
            api,
            store: Store::new(initial),
        }
    }

    /// The underlying state container.
    #[must_use]
    pub const fn store(&self) -> &Store<AuthState> {
        &self.store
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> AuthState {
        self.store.snapshot().await
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the gateway error, or `IncompleteResponse` when the server
    /// accepted the credentials but issued no token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api
                .post(
                    "/auth/login",
                    json!({ "email": email, "password": password }),
                )
                .await?;
            let payload: AuthPayload = decode_object(&body, AUTH_KEYS, "auth.login").ok_or(
                ApiError::IncompleteResponse {
                    context: "auth.login",
                    field: "token",
                },
            )?;
            let token = payload
                .token()
                .map(|t| SecretString::from(t.to_string()))
                .ok_or(ApiError::IncompleteResponse {
                    context: "auth.login",
                    field: "token",
                })?;
            persist_token(api.tokens().as_ref(), &token);
            Ok((payload.user, token))
        };

        let (user, _) = self
            .store
            .run("auth.login", request, |(user, token)| AuthAction::LoggedIn {
                user: user.clone(),
                token: token.clone(),
            })
            .await?;

        info!("Customer logged in");
        Ok(user)
    }

    /// Create an account. Logs in only if the server returns a token.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: &RegisterInput) -> Result<RegisterOutcome, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api
                .post("/auth/register", serde_json::to_value(input).unwrap_or_default())
                .await?;
            let payload: Option<AuthPayload> = decode_object(&body, AUTH_KEYS, "auth.register");
            let token = payload
                .as_ref()
                .and_then(AuthPayload::token)
                .map(|t| SecretString::from(t.to_string()));
            if let Some(token) = &token {
                persist_token(api.tokens().as_ref(), token);
            }
            Ok((payload, token))
        };

        let (payload, token) = self
            .store
            .run("auth.register", request, |(payload, token)| {
                let user = payload.as_ref().and_then(|p| p.user.clone());
                match token {
                    Some(token) => AuthAction::LoggedIn {
                        user,
                        token: token.clone(),
                    },
                    None => AuthAction::Registered {
                        user,
                        message: payload.as_ref().and_then(|p| p.message.clone()),
                    },
                }
            })
            .await?;

        let user = payload.as_ref().and_then(|p| p.user.clone());
        Ok(if token.is_some() {
            RegisterOutcome::SignedIn(user)
        } else {
            RegisterOutcome::VerificationRequired(payload.and_then(|p| p.message))
        })
    }

    /// Fetch the customer behind the current token.
    ///
    /// # Errors
    ///
    /// Returns the gateway error (typically 401 without a valid token).
    #[instrument(skip(self))]
    pub async fn fetch_current_user(&self) -> Result<Option<User>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api.get("/auth/me").await?;
            Ok(decode_item::<User>(&body, USER_KEYS, "auth.me"))
        };
        self.store
            .run("auth.me", request, |user| AuthAction::UserLoaded(user.clone()))
            .await
    }

    /// Confirm an email address with the token from the verification mail.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all)]
    pub async fn verify_email(&self, token: &str) -> Result<Option<String>, ApiError> {
        self.acknowledge("auth.verify_email", "/auth/verify-email", json!({ "token": token }))
            .await
    }

    /// Request a password-reset mail.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError> {
        self.acknowledge(
            "auth.forgot_password",
            "/auth/forgot-password",
            json!({ "email": email }),
        )
        .await
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
    ) -> Result<Option<String>, ApiError> {
        self.acknowledge(
            "auth.reset_password",
            "/auth/reset-password",
            json!({ "token": token, "password": password }),
        )
        .await
    }

    /// Drop the session locally and forget the persisted token.
    ///
    /// No server call is made.
    pub async fn logout(&self) {
        if let Err(e) = self.api.tokens().clear() {
            warn!(error = %e, "Failed to clear persisted token");
        }
        self.store.dispatch(AuthAction::LoggedOut).await;
        info!("Customer logged out");
    }

    async fn acknowledge(
        &self,
        operation: &'static str,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<Option<String>, ApiError> {
        let api = &self.api;
        let request = async {
            let response = api.post(endpoint, body).await?;
            Ok(decode_object::<Acknowledgement>(&response, ACK_KEYS, operation)
                .and_then(|ack| ack.message))
        };
        self.store
            .run(operation, request, |message| {
                AuthAction::Acknowledged(message.clone())
            })
            .await
    }
}

#[derive(serde::Deserialize)]
struct Acknowledgement {
    #[serde(default)]
    message: Option<String>,
}

fn persist_token(storage: &dyn TokenStorage, token: &SecretString) {
    // The in-memory session still works if this fails; only restarts lose it.
    if let Err(e) = storage.save(token) {
        warn!(error = %e, "Failed to persist bearer token");
    }
}
