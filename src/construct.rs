// used for the record timestamps
use chrono::{DateTime, Utc};

// used to generate fresh identities
use uuid::Uuid;

// used to print out readable forms of a construct
use std::fmt;

// our own stuff that we need
use crate::datatype::{Email, Name};
use crate::error::{KeystoneError, Result};

// ------------- Identity -------------
pub const MAX_IDENTITY_LENGTH: usize = 64;

/// Opaque identity of a record.
///
/// Identities are either generated when a record is first created or given
/// as input when a record is restored from storage. Generated identities are
/// random UUIDs so they are unique without coordinating with the storage.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Identity(String);

impl Identity {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.len() > MAX_IDENTITY_LENGTH || raw.trim() != raw {
            return Err(KeystoneError::validation(
                "id",
                raw,
                "1 to 64 characters without surrounding whitespace",
            ));
        }
        Ok(Self(raw))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ------------- Entity -------------
/// A record with a stable identity composed of value objects.
pub trait Entity: Clone + fmt::Debug + Send + Sync {
    const KIND: &'static str;
    fn id(&self) -> &Identity;
}

// ------------- User -------------
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct User {
    id: Identity,
    name: Name,
    email: Email,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// A brand new user. The identity is generated here and never supplied
    /// by the caller.
    pub fn create(name: Name, email: Email) -> Self {
        let now = Utc::now();
        Self {
            id: Identity::generate(),
            name,
            email,
            created_at: now,
            updated_at: now,
        }
    }
    /// Rebuilds a user that already has an identity, typically from a stored
    /// row. Every field goes through the same validation as `create`.
    pub fn reconstruct(
        id: &str,
        name: &str,
        email: &str,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let id = Identity::parse(id)?;
        let name = Name::new(name)?;
        let email = Email::new(email)?;
        if updated_at < created_at {
            return Err(KeystoneError::validation(
                "updated_at",
                updated_at.to_rfc3339(),
                "must not precede created_at",
            ));
        }
        Ok(Self {
            id,
            name,
            email,
            created_at,
            updated_at,
        })
    }
    /// A copy carrying new values under the same identity. The receiver is
    /// left as it was.
    pub fn with_changes(&self, name: Name, email: Email) -> Self {
        // clocks can step backwards, updated_at must not
        let updated_at = Utc::now().max(self.created_at);
        Self {
            id: self.id.clone(),
            name,
            email,
            created_at: self.created_at,
            updated_at,
        }
    }
    pub fn name(&self) -> &Name {
        &self.name
    }
    pub fn email(&self) -> &Email {
        &self.email
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
impl Entity for User {
    const KIND: &'static str = "user";
    fn id(&self) -> &Identity {
        &self.id
    }
}
impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.id, self.name, self.email)
    }
}
