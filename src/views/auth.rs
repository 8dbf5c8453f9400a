//! Login and signup forms. Validation happens here and failing input never
//! reaches the backend.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    dto::auth::SignupRequest,
    error::{AppError, AppResult, FieldErrors},
    session::AuthSession,
};

fn check_username(errors: &mut FieldErrors, username: &str) {
    if username.trim().chars().count() < 3 {
        errors.add("username", "Username must be at least 3 characters");
    }
}

fn check_password(errors: &mut FieldErrors, password: &str) {
    if password.chars().count() < 6 {
        errors.add("password", "Password must be at least 6 characters");
    }
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]+@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("static regex is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_username(&mut errors, &self.username);
        check_password(&mut errors, &self.password);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub async fn submit(&self, session: &AuthSession) -> AppResult<()> {
        self.validate().map_err(AppError::Validation)?;
        session.login(self.username.trim(), &self.password).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_username(&mut errors, &self.username);
        if !is_valid_email(self.email.trim()) {
            errors.add("email", "Invalid email address");
        }
        check_password(&mut errors, &self.password);
        if self.password != self.password2 {
            errors.add("password2", "Passwords don't match");
        }
        if self.first_name.trim().is_empty() {
            errors.add("first_name", "First name is required");
        }
        if self.last_name.trim().is_empty() {
            errors.add("last_name", "Last name is required");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn to_request(&self) -> SignupRequest {
        SignupRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            password2: self.password2.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        }
    }

    pub async fn submit(&self, session: &AuthSession) -> AppResult<()> {
        self.validate().map_err(AppError::Validation)?;
        session.signup(self.to_request()).await
    }
}
