use crate::domain::errors::DomainError;
use crate::domain::ports::{AuthApi, SessionStore};
use crate::domain::session::{Credentials, Session};
use crate::errors::AppError;

/// Route guard for customer pages: any signed-in user passes.
pub fn require_session(session: Option<&Session>) -> Result<&Session, AppError> {
    session
        .filter(|s| !s.profile.email.is_empty() && !s.token.is_empty())
        .ok_or(AppError::NotAuthenticated)
}

/// Route guard for admin pages.
pub fn require_admin(session: Option<&Session>) -> Result<&Session, AppError> {
    let session = require_session(session)?;
    if session.is_admin() {
        Ok(session)
    } else {
        Err(AppError::NotPermitted(
            "administrator access required".to_string(),
        ))
    }
}

fn auth_error(e: DomainError) -> AppError {
    match e {
        DomainError::Unauthorized => AppError::Backend {
            status: 401,
            message: "Invalid credentials".to_string(),
        },
        other => other.into(),
    }
}

pub struct AuthService<A, S> {
    api: A,
    store: S,
}

impl<A: AuthApi, S: SessionStore> AuthService<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self { api, store }
    }

    /// Session persisted by an earlier login, if any.
    pub fn current(&self) -> Result<Option<Session>, AppError> {
        Ok(self.store.load()?)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AppError> {
        credentials.validate()?;
        let session = self.api.login(credentials).await.map_err(auth_error)?;
        self.store.save(&session)?;
        log::info!(
            "Logged in as {} ({})",
            session.profile.email,
            session.role()
        );
        Ok(session)
    }

    pub async fn register_customer(&self, credentials: &Credentials) -> Result<Session, AppError> {
        credentials.validate()?;
        let session = self
            .api
            .register_customer(credentials)
            .await
            .map_err(auth_error)?;
        log::info!("Registered customer {}", session.profile.email);
        Ok(session)
    }

    pub async fn register_admin(&self, credentials: &Credentials) -> Result<Session, AppError> {
        credentials.validate()?;
        let session = self
            .api
            .register_admin(credentials)
            .await
            .map_err(auth_error)?;
        log::info!("Registered administrator {}", session.profile.email);
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), AppError> {
        self.store.clear()?;
        log::info!("Logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::Role;
    use crate::infrastructure::memory::InMemoryBackend;
    use crate::infrastructure::session_store::FileSessionStore;

    fn service() -> (tempfile::TempDir, AuthService<InMemoryBackend, FileSessionStore>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path().join("session.json"));
        (dir, AuthService::new(InMemoryBackend::new(), store))
    }

    #[test]
    fn guards_check_presence_and_role() {
        let customer = Session::new("t", "ana@example.com", Role::Customer);
        let admin = Session::new("t", "root@example.com", Role::Admin);

        assert!(matches!(require_session(None), Err(AppError::NotAuthenticated)));
        assert!(require_session(Some(&customer)).is_ok());
        assert!(matches!(
            require_admin(Some(&customer)),
            Err(AppError::NotPermitted(_))
        ));
        assert!(require_admin(Some(&admin)).is_ok());
    }

    #[tokio::test]
    async fn login_and_logout_recover_from_corrupt_session_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{{{").unwrap();
        let auth = AuthService::new(InMemoryBackend::new(), FileSessionStore::new(&path));
        let credentials = Credentials::new("ana@example.com", "secret");
        auth.register_customer(&credentials).await.unwrap();

        assert!(auth.current().unwrap().is_none());
        let session = auth.login(&credentials).await.unwrap();
        assert_eq!(auth.current().unwrap(), Some(session));

        std::fs::write(&path, "{{{").unwrap();
        auth.logout().unwrap();
        assert!(auth.current().unwrap().is_none());
    }

    #[tokio::test]
    async fn login_persists_session_and_logout_clears_it() {
        let (_dir, auth) = service();
        let credentials = Credentials::new("ana@example.com", "secret");
        auth.register_customer(&credentials).await.unwrap();
        assert!(auth.current().unwrap().is_none());

        let session = auth.login(&credentials).await.unwrap();
        assert_eq!(auth.current().unwrap(), Some(session));

        auth.logout().unwrap();
        assert!(auth.current().unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_password_reports_invalid_credentials() {
        let (_dir, auth) = service();
        auth.register_customer(&Credentials::new("ana@example.com", "secret"))
            .await
            .unwrap();

        let err = auth
            .login(&Credentials::new("ana@example.com", "guess"))
            .await
            .unwrap_err();
        assert_eq!(err.advisory("Login failed").text, "Login failed: Invalid credentials");
        assert!(auth.current().unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_credentials_never_reach_backend() {
        let (_dir, auth) = service();
        let err = auth
            .login(&Credentials::new("not-an-email", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn register_admin_yields_admin_session() {
        let (_dir, auth) = service();
        let session = auth
            .register_admin(&Credentials::new("root@example.com", "pw"))
            .await
            .unwrap();
        assert!(session.is_admin());
    }
}
