//! Registration form checks performed before anything is sent

use taskdeck_core::{validation_error, Role, TaskdeckResult, MIN_PASSWORD_LENGTH};

/// Input collected by the registration form
#[derive(Clone)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl RegistrationForm {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
            role: Role::default(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Check the form using the default minimum password length
    pub fn validate(&self) -> TaskdeckResult<()> {
        self.validate_with(MIN_PASSWORD_LENGTH)
    }

    /// Check the form. Mismatch is reported before length, as the form does.
    pub fn validate_with(&self, min_password_length: usize) -> TaskdeckResult<()> {
        if self.email.trim().is_empty() {
            return Err(validation_error!(
                "Email is required",
                "email",
                "registration"
            ));
        }

        if self.password != self.confirm_password {
            return Err(validation_error!(
                "Passwords do not match",
                "confirm_password",
                "registration"
            ));
        }

        if self.password.chars().count() < min_password_length {
            return Err(validation_error!(
                format!(
                    "Password must be at least {} characters long",
                    min_password_length
                ),
                "password",
                "registration"
            ));
        }

        Ok(())
    }
}
