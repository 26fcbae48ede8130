//! Identity record data model.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by the identity value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    /// Identifier was empty.
    EmptyId,
    /// Identifier carried leading or trailing whitespace.
    PaddedId,
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email carried leading or trailing whitespace.
    PaddedEmail,
    /// Secret was empty.
    EmptySecret,
    /// Credential digest was empty.
    EmptyDigest,
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "identity id must not be empty"),
            Self::PaddedId => {
                write!(f, "identity id must not have leading or trailing whitespace")
            }
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::PaddedEmail => {
                write!(f, "email must not have leading or trailing whitespace")
            }
            Self::EmptySecret => write!(f, "password must not be empty"),
            Self::EmptyDigest => write!(f, "credential digest must not be empty"),
        }
    }
}

impl std::error::Error for IdentityValidationError {}

/// Stable, opaque identity identifier.
///
/// Any non-empty string without surrounding whitespace is accepted, so
/// snapshot keys written by other tools stay addressable. Fresh identifiers
/// are hyphenated UUID v4 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityId(String);

impl IdentityId {
    /// Validate and construct an [`IdentityId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Wrap an already generated UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.hyphenated().to_string())
    }

    fn from_owned(id: String) -> Result<Self, IdentityValidationError> {
        if id.trim().is_empty() {
            return Err(IdentityValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(IdentityValidationError::PaddedId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for IdentityId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<IdentityId> for String {
    fn from(value: IdentityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdentityId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Display name chosen by the user. Not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`] from owned input.
    pub fn new(username: impl Into<String>) -> Result<Self, IdentityValidationError> {
        Self::from_owned(username.into())
    }

    fn from_owned(username: String) -> Result<Self, IdentityValidationError> {
        if username.trim().is_empty() {
            return Err(IdentityValidationError::EmptyUsername);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Login key of an identity.
///
/// ## Invariants
/// - Compared case-sensitively and byte for byte; no normalisation is applied.
/// - Never blank and never padded with whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`] from owned input.
    pub fn new(email: impl Into<String>) -> Result<Self, IdentityValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, IdentityValidationError> {
        if email.trim().is_empty() {
            return Err(IdentityValidationError::EmptyEmail);
        }
        if email.trim() != email {
            return Err(IdentityValidationError::PaddedEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// One-way digest of a user's secret, as produced by a credential hasher.
///
/// The content is opaque to the domain. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialDigest(String);

impl CredentialDigest {
    /// Wrap a digest string produced by a hasher.
    pub fn new(digest: impl Into<String>) -> Result<Self, IdentityValidationError> {
        Self::from_owned(digest.into())
    }

    fn from_owned(digest: String) -> Result<Self, IdentityValidationError> {
        if digest.is_empty() {
            return Err(IdentityValidationError::EmptyDigest);
        }
        Ok(Self(digest))
    }
}

impl AsRef<str> for CredentialDigest {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for CredentialDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialDigest(<redacted>)")
    }
}

impl From<CredentialDigest> for String {
    fn from(value: CredentialDigest) -> Self {
        value.0
    }
}

impl TryFrom<String> for CredentialDigest {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Stored identity of one user.
///
/// ## Invariants
/// - `id` is assigned once by the identity service and never reassigned.
/// - `email` is unique among live records; the store enforces this.
/// - `credential_digest` is a one-way digest, never the plaintext secret.
///
/// The serialised form is the snapshot record shape:
/// `{ "id", "username", "email", "credentialDigest" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IdentityRecordDto", into = "IdentityRecordDto")]
pub struct IdentityRecord {
    id: IdentityId,
    username: Username,
    email: EmailAddress,
    credential_digest: CredentialDigest,
}

impl IdentityRecord {
    /// Build a new [`IdentityRecord`] from validated components.
    pub fn new(
        id: IdentityId,
        username: Username,
        email: EmailAddress,
        credential_digest: CredentialDigest,
    ) -> Self {
        Self {
            id,
            username,
            email,
            credential_digest,
        }
    }

    /// Fallible constructor enforcing every field invariant.
    ///
    /// Prefer [`IdentityRecord::new`] when components are already validated.
    pub fn try_from_strings(
        id: impl AsRef<str>,
        username: impl Into<String>,
        email: impl Into<String>,
        credential_digest: impl Into<String>,
    ) -> Result<Self, IdentityValidationError> {
        Ok(Self::new(
            IdentityId::new(id)?,
            Username::new(username)?,
            EmailAddress::new(email)?,
            CredentialDigest::new(credential_digest)?,
        ))
    }

    /// Stable identity identifier.
    pub fn id(&self) -> &IdentityId {
        &self.id
    }

    /// Display name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Login email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Stored credential digest.
    pub fn credential_digest(&self) -> &CredentialDigest {
        &self.credential_digest
    }

    /// Return a copy with the given username.
    #[must_use]
    pub fn with_username(mut self, username: Username) -> Self {
        self.username = username;
        self
    }

    /// Return a copy with the given email.
    #[must_use]
    pub fn with_email(mut self, email: EmailAddress) -> Self {
        self.email = email;
        self
    }

    /// Return a copy with the given credential digest.
    #[must_use]
    pub fn with_credential_digest(mut self, credential_digest: CredentialDigest) -> Self {
        self.credential_digest = credential_digest;
        self
    }

    /// Project the record onto the fields safe to expose outside the core.
    pub fn public_view(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Externally presentable identity: an [`IdentityRecord`] without its digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    /// Stable identity identifier.
    pub id: IdentityId,
    /// Display name.
    pub username: Username,
    /// Login email.
    pub email: EmailAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
struct IdentityRecordDto {
    id: String,
    username: String,
    email: String,
    credential_digest: String,
}

impl From<IdentityRecord> for IdentityRecordDto {
    fn from(value: IdentityRecord) -> Self {
        let IdentityRecord {
            id,
            username,
            email,
            credential_digest,
        } = value;
        Self {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            credential_digest: credential_digest.into(),
        }
    }
}

impl TryFrom<IdentityRecordDto> for IdentityRecord {
    type Error = IdentityValidationError;

    fn try_from(value: IdentityRecordDto) -> Result<Self, Self::Error> {
        IdentityRecord::try_from_strings(
            value.id,
            value.username,
            value.email,
            value.credential_digest,
        )
    }
}
