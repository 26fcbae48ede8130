//! Credential-bearing inputs: registration, login and partial updates.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a caller talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use super::identity::{EmailAddress, IdentityValidationError, Username};

/// Plaintext secret supplied by a user.
///
/// The buffer is zeroed on drop. `Debug` output is redacted and the type is
/// deliberately not serialisable.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Validate and wrap a plaintext secret.
    ///
    /// Whitespace is significant and kept as supplied.
    pub fn new(secret: &str) -> Result<Self, IdentityValidationError> {
        if secret.is_empty() {
            return Err(IdentityValidationError::EmptySecret);
        }
        Ok(Self(Zeroizing::new(secret.to_owned())))
    }

    /// Plaintext secret.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Validated registration input.
///
/// # Examples
/// ```
/// use identity_backend::domain::Registration;
///
/// let registration = Registration::try_from_parts("alice", "a@x.com", "pw1").unwrap();
/// assert_eq!(registration.email().as_ref(), "a@x.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    username: Username,
    email: EmailAddress,
    secret: Secret,
}

impl Registration {
    /// Construct a registration from raw inputs; every field is required.
    pub fn try_from_parts(
        username: &str,
        email: &str,
        secret: &str,
    ) -> Result<Self, IdentityValidationError> {
        Ok(Self {
            username: Username::new(username)?,
            email: EmailAddress::new(email)?,
            secret: Secret::new(secret)?,
        })
    }

    /// Requested display name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Requested login email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Plaintext secret to be hashed.
    pub fn secret(&self) -> &Secret {
        &self.secret
    }
}

/// Validated login credentials used by authentication services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    secret: Secret,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, secret: &str) -> Result<Self, IdentityValidationError> {
        Ok(Self {
            email: EmailAddress::new(email)?,
            secret: Secret::new(secret)?,
        })
    }

    /// Email used as the lookup key.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Secret provided by the caller.
    pub fn secret(&self) -> &Secret {
        &self.secret
    }
}

/// Partial update of an identity.
///
/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityUpdate {
    username: Option<Username>,
    email: Option<EmailAddress>,
    secret: Option<Secret>,
}

impl IdentityUpdate {
    /// Construct an update from optional raw inputs.
    ///
    /// A supplied username or email must be valid. An empty secret counts as
    /// not supplied, so clients that always send the password field do not
    /// have to special-case it.
    ///
    /// # Examples
    /// ```
    /// use identity_backend::domain::IdentityUpdate;
    ///
    /// let update = IdentityUpdate::try_from_parts(Some("bob"), None, Some("")).unwrap();
    /// assert!(update.username().is_some());
    /// assert!(update.secret().is_none());
    /// ```
    pub fn try_from_parts(
        username: Option<&str>,
        email: Option<&str>,
        secret: Option<&str>,
    ) -> Result<Self, IdentityValidationError> {
        Ok(Self {
            username: username.map(Username::new).transpose()?,
            email: email.map(EmailAddress::new).transpose()?,
            secret: secret
                .filter(|value| !value.is_empty())
                .map(Secret::new)
                .transpose()?,
        })
    }

    /// Set the new username.
    #[must_use]
    pub fn username_to(mut self, username: Username) -> Self {
        self.username = Some(username);
        self
    }

    /// Set the new email.
    #[must_use]
    pub fn email_to(mut self, email: EmailAddress) -> Self {
        self.email = Some(email);
        self
    }

    /// Set the new secret.
    #[must_use]
    pub fn secret_to(mut self, secret: Secret) -> Self {
        self.secret = Some(secret);
        self
    }

    /// New username, if supplied.
    pub fn username(&self) -> Option<&Username> {
        self.username.as_ref()
    }

    /// New email, if supplied.
    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    /// New secret, if supplied.
    pub fn secret(&self) -> Option<&Secret> {
        self.secret.as_ref()
    }
}
