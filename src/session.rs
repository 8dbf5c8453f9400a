//! Authenticated-session context.
//!
//! One [`AuthSession`] per process, created explicitly and handed to every view
//! and API facade that needs the current user or bearer token. Cloning shares
//! the same underlying state.

use std::{fmt, future::Future, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    client::ApiClient,
    dto::auth::{LoginRequest, SignupRequest},
    error::{AppError, AppResult},
    models::{AuthTokens, User},
    notify::Notifier,
    services::auth_service,
    store::TokenStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Uninitialized,
    Restoring,
    Authenticated,
    Anonymous,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Uninitialized => "uninitialized",
            SessionStatus::Restoring => "restoring",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Anonymous => "anonymous",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    user: Option<User>,
    tokens: Option<AuthTokens>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Uninitialized,
            user: None,
            tokens: None,
        }
    }
}

#[derive(Clone)]
pub struct AuthSession {
    client: ApiClient,
    store: TokenStore,
    notifier: Notifier,
    state: Arc<RwLock<SessionState>>,
    retry_on_unauthorized: bool,
}

impl AuthSession {
    pub fn new(client: ApiClient, store: TokenStore, notifier: Notifier) -> Self {
        Self {
            client,
            store,
            notifier,
            state: Arc::new(RwLock::new(SessionState::default())),
            retry_on_unauthorized: true,
        }
    }

    /// Whether authenticated calls refresh and retry once after a 401.
    pub fn with_retry_on_unauthorized(mut self, enabled: bool) -> Self {
        self.retry_on_unauthorized = enabled;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.tokens.is_some()
    }

    pub async fn is_loading(&self) -> bool {
        matches!(
            self.status().await,
            SessionStatus::Uninitialized | SessionStatus::Restoring
        )
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn tokens(&self) -> Option<AuthTokens> {
        self.state.read().await.tokens.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .tokens
            .as_ref()
            .map(|t| t.access.clone())
    }

    /// Rebuilds the session from the token store. Never fails: any problem
    /// with the stored session downgrades to [`SessionStatus::Anonymous`].
    /// Storage is cleared only when it is unreadable or the backend rejects
    /// the tokens, never because the backend could not be reached.
    pub async fn restore(&self) -> SessionStatus {
        self.set_status(SessionStatus::Restoring).await;

        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(error = %err, "stored session unreadable, clearing");
                self.clear_store();
                return self.become_anonymous().await;
            }
        };
        let Some((tokens, user)) = stored else {
            return self.become_anonymous().await;
        };

        let valid = match auth_service::verify_token(&self.client, &tokens.access).await {
            Ok(valid) => valid,
            Err(err) if err.is_transport() => {
                tracing::warn!(error = %err, "backend unreachable, keeping stored session");
                return self.become_anonymous().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "token verification failed");
                false
            }
        };
        if valid {
            tracing::info!(username = %user.username, "session restored");
            return self.become_authenticated(tokens, user).await;
        }

        match auth_service::refresh_token(&self.client, &tokens.refresh).await {
            Ok(resp) => {
                let tokens = AuthTokens {
                    access: resp.access,
                    ..tokens
                };
                if let Err(err) = self.store.save_tokens(&tokens) {
                    tracing::warn!(error = %err, "failed to persist refreshed tokens");
                }
                tracing::info!(username = %user.username, "session restored after refresh");
                self.become_authenticated(tokens, user).await
            }
            Err(err) if err.is_transport() => {
                tracing::warn!(error = %err, "backend unreachable, keeping stored session");
                self.become_anonymous().await
            }
            Err(err) => {
                tracing::info!(error = %err, "stored session expired");
                self.clear_store();
                self.become_anonymous().await
            }
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<()> {
        match self.authenticate(username, password).await {
            Ok(()) => {
                self.notifier.success("Success", "Logged in successfully");
                Ok(())
            }
            Err(err) => {
                self.notifier.error(err.to_string());
                Err(err)
            }
        }
    }

    /// Creates the account, then logs in with the same credentials.
    pub async fn signup(&self, payload: SignupRequest) -> AppResult<()> {
        let resp = match auth_service::signup(&self.client, &payload).await {
            Ok(resp) => resp,
            Err(err) => {
                self.notifier.error(err.to_string());
                return Err(err);
            }
        };
        self.notifier.success("Success", resp.message.clone());

        self.login(&payload.username, &payload.password).await?;

        // The signup response is the only server-confirmed profile we ever get.
        if let Err(err) = self.store.save_user(&resp.user) {
            tracing::warn!(error = %err, "failed to persist user profile");
        }
        let mut state = self.state.write().await;
        if state.tokens.is_some() {
            state.user = Some(resp.user);
        }
        Ok(())
    }

    /// Clears the local session unconditionally, then asks the backend to
    /// invalidate the refresh token. A failed server call is only logged.
    pub async fn logout(&self) {
        let refresh = {
            let mut state = self.state.write().await;
            let refresh = state.tokens.take().map(|t| t.refresh);
            state.user = None;
            state.status = SessionStatus::Anonymous;
            refresh
        };
        self.clear_store();
        tracing::info!("logged out");
        self.notifier
            .success("Logged out", "You have been logged out successfully");

        if let Some(refresh) = refresh {
            if let Err(err) = auth_service::logout(&self.client, &refresh).await {
                tracing::warn!(error = %err, "server-side logout failed");
            }
        }
    }

    /// Exchanges the refresh token for a new access token. A rejected refresh
    /// drops the session to anonymous; an unreachable backend leaves it intact.
    pub async fn refresh_access(&self) -> AppResult<String> {
        let refresh = self
            .tokens()
            .await
            .map(|t| t.refresh)
            .ok_or(AppError::NotAuthenticated)?;

        match auth_service::refresh_token(&self.client, &refresh).await {
            Ok(resp) => {
                let mut state = self.state.write().await;
                // A logout that landed while the refresh was in flight wins.
                if let Some(tokens) = state.tokens.as_mut() {
                    tokens.access = resp.access.clone();
                    if let Err(err) = self.store.save_tokens(tokens) {
                        tracing::warn!(error = %err, "failed to persist refreshed tokens");
                    }
                }
                tracing::debug!("access token refreshed");
                Ok(resp.access)
            }
            Err(err) if err.is_transport() => {
                tracing::warn!(error = %err, "token refresh unreachable, keeping session");
                Err(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed, ending session");
                self.clear_store();
                self.become_anonymous().await;
                Err(err)
            }
        }
    }

    /// Runs an authenticated call with the current access token.
    ///
    /// Fails with [`AppError::NotAuthenticated`] before any I/O when there is no
    /// token. A 401 answer triggers one refresh and one retry when enabled.
    pub async fn with_token<T, F, Fut>(&self, call: F) -> AppResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let token = self
            .access_token()
            .await
            .ok_or(AppError::NotAuthenticated)?;

        match call(token).await {
            Err(err) if err.is_unauthorized() && self.retry_on_unauthorized => {
                tracing::info!(error = %err, "access token rejected, refreshing");
                match self.refresh_access().await {
                    Ok(fresh) => call(fresh).await,
                    Err(_) => Err(err),
                }
            }
            other => other,
        }
    }

    async fn authenticate(&self, username: &str, password: &str) -> AppResult<()> {
        let payload = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let tokens = auth_service::login(&self.client, &payload).await?;
        let user = User::placeholder(username);

        if let Err(err) = self
            .store
            .save_tokens(&tokens)
            .and_then(|()| self.store.save_user(&user))
        {
            tracing::warn!(error = %err, "failed to persist session");
        }
        tracing::info!(username = %username, "logged in");
        self.become_authenticated(tokens, user).await;
        Ok(())
    }

    async fn set_status(&self, status: SessionStatus) {
        self.state.write().await.status = status;
    }

    async fn become_authenticated(&self, tokens: AuthTokens, user: User) -> SessionStatus {
        let mut state = self.state.write().await;
        state.tokens = Some(tokens);
        state.user = Some(user);
        state.status = SessionStatus::Authenticated;
        state.status
    }

    async fn become_anonymous(&self) -> SessionStatus {
        let mut state = self.state.write().await;
        state.tokens = None;
        state.user = None;
        state.status = SessionStatus::Anonymous;
        state.status
    }

    fn clear_store(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to clear token store");
        }
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("base_url", &self.client.base_url())
            .field("retry_on_unauthorized", &self.retry_on_unauthorized)
            .finish_non_exhaustive()
    }
}
