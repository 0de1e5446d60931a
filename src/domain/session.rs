use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "CUSTOMER" | "CLIENTE" => Ok(Role::Customer),
            other => Err(DomainError::InvalidInput(format!(
                "unknown role '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub email: String,
    pub role: Role,
}

/// Authenticated context handed explicitly to every call that needs it.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub profile: UserProfile,
}

impl Session {
    pub fn new(token: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            token: token.into(),
            profile: UserProfile {
                email: email.into(),
                role,
            },
        }
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn is_admin(&self) -> bool {
        self.profile.role == Role::Admin
    }
}

// Keep the bearer token out of log lines.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"***")
            .field("profile", &self.profile)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::InvalidInput(
                "a valid email is required".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(DomainError::InvalidInput("password is required".to_string()));
        }
        Ok(())
    }
}
