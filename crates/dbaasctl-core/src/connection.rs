//! Connection strings for the provisioned database
//!
//! The control plane hands out a template such as
//! `postgresql://<username>:<password>@host:5432/testDB`. Resolving it replaces the
//! first occurrence of each placeholder with the literal credential.

use std::fmt;

/// Placeholder for the user name in connection templates
pub const USERNAME_PLACEHOLDER: &str = "<username>";
/// Placeholder for the password in connection templates
pub const PASSWORD_PLACEHOLDER: &str = "<password>";

const REDACTED: &str = "****";

/// Connection template as returned by the database listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    template: String,
}

/// A connection string with literal credentials
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    value: String,
    /// Same template with the password slot masked
    redacted: String,
}

impl ConnectionDescriptor {
    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    fn is_url(&self) -> bool {
        self.template.starts_with("postgres://") || self.template.starts_with("postgresql://")
    }

    /// Substitute the first `<username>` and first `<password>` placeholder
    ///
    /// URL-shaped templates get percent-encoded credentials so reserved
    /// characters survive parsing; key/value templates get literal values.
    pub fn resolve(&self, username: &str, password: &str) -> ConnectionString {
        let (user, pass) = if self.is_url() {
            (
                urlencoding::encode(username).into_owned(),
                urlencoding::encode(password).into_owned(),
            )
        } else {
            (username.to_string(), password.to_string())
        };

        let with_user = self.template.replacen(USERNAME_PLACEHOLDER, &user, 1);

        ConnectionString {
            value: with_user.replacen(PASSWORD_PLACEHOLDER, &pass, 1),
            redacted: with_user.replacen(PASSWORD_PLACEHOLDER, REDACTED, 1),
        }
    }
}

impl ConnectionString {
    /// The literal connection string, credentials included
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionString({})", self)
    }
}
