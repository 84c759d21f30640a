use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, AuthResponse};
use crate::error::{reason, SyncError};
use crate::models::AuthUser;
use crate::sync::ResourceSyncEngine;

use super::CredentialStore;

/// Whether a session token is held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

/// Which sign-in form the shell is showing while anonymous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthForm {
    #[default]
    Login,
    Register,
}

impl AuthForm {
    pub fn toggle(self) -> Self {
        match self {
            AuthForm::Login => AuthForm::Register,
            AuthForm::Register => AuthForm::Login,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AuthForm::Login => "Login",
            AuthForm::Register => "Register",
        }
    }
}

/// Result of a successful login or registration.
///
/// The session is established even when the follow-up prompt fetch fails;
/// that failure is reported here rather than undoing the login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: Option<AuthUser>,
    pub hydration: Result<usize, SyncError>,
}

/// Owns the session token and the Anonymous/Authenticated transitions.
///
/// `login` and `register` both take `&mut self`, so only one sign-in attempt
/// can be running on a controller at a time.
pub struct SessionController {
    api: ApiClient,
    store: Arc<dyn CredentialStore>,
    engine: ResourceSyncEngine,
    token: Option<String>,
    user: Option<AuthUser>,
}

impl SessionController {
    /// Build the controller, resuming a stored session if there is one.
    /// A stored token is trusted without asking the server.
    pub fn restore(api: ApiClient, store: Arc<dyn CredentialStore>, engine: ResourceSyncEngine) -> Self {
        let token = match store.load() {
            Ok(Some(token)) if !token.is_empty() => Some(token),
            Ok(Some(_)) => {
                debug!("Discarding empty stored token");
                if let Err(e) = store.clear() {
                    warn!(error = %e, "Failed to clear empty stored token");
                }
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load stored session, starting signed out");
                None
            }
        };

        match token {
            Some(ref token) => {
                engine.attach(token.clone());
                info!("Resumed stored session");
            }
            None => {
                engine.reset();
                debug!("No stored session");
            }
        }

        Self {
            api,
            store,
            engine,
            token,
            user: None,
        }
    }

    pub fn state(&self) -> AuthState {
        if self.token.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Account returned by the last login/registration in this process
    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn engine(&self) -> &ResourceSyncEngine {
        &self.engine
    }

    /// Sign in with a username or email and password
    pub async fn login(&mut self, identifier: &str, password: &str) -> Result<LoginOutcome, SyncError> {
        self.ensure_anonymous()?;
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(SyncError::AuthFailure("Username and password required".to_string()));
        }

        let response = self.api.login(identifier.trim(), password).await;
        self.establish(response, "login").await
    }

    /// Create an account and sign in with it
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, SyncError> {
        self.ensure_anonymous()?;
        if username.trim().is_empty() || password.is_empty() {
            return Err(SyncError::AuthFailure("Username and password required".to_string()));
        }

        let response = self.api.register(username.trim(), email.trim(), password).await;
        self.establish(response, "registration").await
    }

    /// Drop the session locally. The server is not told.
    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.engine.reset();
        info!("Logged out");
    }

    fn ensure_anonymous(&self) -> Result<(), SyncError> {
        if self.is_authenticated() {
            warn!("Sign-in attempted while already authenticated");
            return Err(SyncError::AlreadyAuthenticated);
        }
        Ok(())
    }

    async fn establish(
        &mut self,
        response: Result<AuthResponse>,
        action: &'static str,
    ) -> Result<LoginOutcome, SyncError> {
        let auth = match response {
            Ok(auth) => auth,
            Err(e) => {
                warn!(action, error = %e, "Authentication request failed");
                return Err(SyncError::AuthFailure(reason(&e)));
            }
        };

        let Some(token) = auth.jwt.filter(|t| !t.is_empty()) else {
            warn!(action, "Authentication response carried no token");
            return Err(SyncError::AuthFailure(format!("{} rejected by server", action)));
        };

        if let Err(e) = self.store.save(&token) {
            warn!(error = %e, "Failed to persist session token");
        }
        self.engine.attach(token.clone());
        self.token = Some(token);
        self.user = auth.user;
        info!(action, user = ?self.user.as_ref().map(|u| u.username.as_str()), "Signed in");

        let hydration = self.engine.hydrate().await;
        Ok(LoginOutcome {
            user: self.user.clone(),
            hydration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{FileCredentialStore, MemoryCredentialStore};
    use crate::models::PromptId;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn controller(server: &MockServer, store: Arc<dyn CredentialStore>) -> SessionController {
        let api = ApiClient::new(&format!("{}/api", server.uri())).unwrap();
        let engine = ResourceSyncEngine::new(api.clone());
        SessionController::restore(api, store, engine)
    }

    async fn mount_prompts(server: &MockServer, token: &str, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/api/prompts"))
            .and(header("Authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 7, "attributes": {"name": "Greeting", "prompt": "Hello"}}]
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[test]
    fn test_auth_form_toggle() {
        assert_eq!(AuthForm::default(), AuthForm::Login);
        assert_eq!(AuthForm::Login.toggle(), AuthForm::Register);
        assert_eq!(AuthForm::Login.toggle().toggle(), AuthForm::Login);
    }

    #[tokio::test]
    async fn test_restore_without_token_is_anonymous() {
        let server = MockServer::start().await;
        let session = controller(&server, Arc::new(MemoryCredentialStore::new()));
        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn test_restore_with_token_is_authenticated_without_network() {
        let server = MockServer::start().await;
        let session = controller(&server, Arc::new(MemoryCredentialStore::with_token("abc123")));

        assert_eq!(session.state(), AuthState::Authenticated);
        assert_eq!(session.token(), Some("abc123"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_with_empty_token_clears_store() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryCredentialStore::with_token(""));
        let session = controller(&server, store.clone());

        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_with_corrupt_store_is_anonymous() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());
        std::fs::write(store.path(), "{broken").unwrap();

        let session = controller(&server, Arc::new(store));
        assert_eq!(session.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_login_success_persists_token_and_hydrates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local"))
            .and(body_json(json!({"identifier": "alice", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "abc123"})))
            .expect(1)
            .mount(&server)
            .await;
        mount_prompts(&server, "abc123", 1).await;
        let store = Arc::new(MemoryCredentialStore::new());
        let mut session = controller(&server, store.clone());

        let outcome = session.login("alice", "secret").await.unwrap();

        assert_eq!(session.state(), AuthState::Authenticated);
        assert_eq!(store.load().unwrap().as_deref(), Some("abc123"));
        assert_eq!(outcome.hydration, Ok(1));
        assert!(session.engine().prompt(&PromptId::from(7)).is_some());
    }

    #[tokio::test]
    async fn test_login_without_jwt_stays_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        mount_prompts(&server, "abc123", 0).await;
        let store = Arc::new(MemoryCredentialStore::new());
        let mut session = controller(&server, store.clone());

        let err = session.login("alice", "secret").await.unwrap_err();

        assert!(matches!(err, SyncError::AuthFailure(_)));
        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_http_error_is_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "data": null,
                "error": {"status": 400, "message": "Invalid identifier or password"}
            })))
            .mount(&server)
            .await;
        let mut session = controller(&server, Arc::new(MemoryCredentialStore::new()));

        let err = session.login("alice", "nope").await.unwrap_err();

        match err {
            SyncError::AuthFailure(msg) => assert!(msg.contains("Invalid identifier or password")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_requires_credentials_locally() {
        let server = MockServer::start().await;
        let mut session = controller(&server, Arc::new(MemoryCredentialStore::new()));

        assert!(matches!(session.login("", "secret").await, Err(SyncError::AuthFailure(_))));
        assert!(matches!(session.login("alice", "").await, Err(SyncError::AuthFailure(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_success_and_hydration_failure_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local/register"))
            .and(body_json(json!({"username": "bob", "email": "bob@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwt": "t0k",
                "user": {"id": 2, "username": "bob", "email": "bob@example.com"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/prompts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let store = Arc::new(MemoryCredentialStore::new());
        let mut session = controller(&server, store.clone());

        let outcome = session.register("bob", "bob@example.com", "pw").await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(store.load().unwrap().as_deref(), Some("t0k"));
        assert_eq!(outcome.user.map(|u| u.username), Some("bob".to_string()));
        assert!(matches!(outcome.hydration, Err(SyncError::FetchFailure(_))));
    }

    #[tokio::test]
    async fn test_register_failure_persists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local/register"))
            .and(body_json(json!({"username": "bob", "email": "bob@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local/register"))
            .and(body_json(json!({"username": "taken", "email": "taken@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "data": null,
                "error": {"status": 400, "message": "Email or Username are already taken"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_prompts(&server, "t0k", 0).await;
        let store = Arc::new(MemoryCredentialStore::new());
        let mut session = controller(&server, store.clone());

        let err = session.register("bob", "bob@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, SyncError::AuthFailure(_)));

        match session.register("taken", "taken@example.com", "pw").await.unwrap_err() {
            SyncError::AuthFailure(msg) => assert!(msg.contains("already taken")),
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(session.user(), None);
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_while_authenticated_is_rejected() {
        let server = MockServer::start().await;
        let mut session = controller(&server, Arc::new(MemoryCredentialStore::with_token("abc123")));

        let err = session.login("alice", "secret").await.unwrap_err();

        assert_eq!(err, SyncError::AlreadyAuthenticated);
        assert_eq!(session.token(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let server = MockServer::start().await;
        mount_prompts(&server, "abc123", 1).await;
        let store = Arc::new(MemoryCredentialStore::with_token("abc123"));
        let mut session = controller(&server, store.clone());
        session.engine().hydrate().await.unwrap();
        session.engine().begin_edit(&PromptId::from(7)).unwrap();

        session.logout();

        assert_eq!(session.state(), AuthState::Anonymous);
        assert!(session.engine().is_empty());
        assert_eq!(session.engine().edit_target(), None);
        assert!(session.engine().draft().is_empty());
        assert_eq!(store.load().unwrap(), None);

        // Logging out again is harmless
        session.logout();
        assert_eq!(session.state(), AuthState::Anonymous);
    }
}
