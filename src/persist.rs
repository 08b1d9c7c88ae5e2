// used for persistence
use rusqlite::{Connection, OptionalExtension, Row, params};
use chrono::{DateTime, Utc};

// the in-memory adapter keys its map on identities
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;
use std::collections::HashMap;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::construct::{Entity, Identity, User};
use crate::error::{KeystoneError, Result};

pub type IdentityHasher = BuildHasherDefault<SeaHasher>;

// ------------- Storage Abstraction -------------
/// Storage for one kind of record.
///
/// Implementations translate between their persisted form and records, the
/// callers never see the persisted form. Absence is not an error: `find`
/// answers `None` and `delete` answers `false`.
pub trait Repository: Send + Sync {
    type Record: Entity;
    type Criteria;
    fn find(&self, id: &Identity) -> Result<Option<Self::Record>>;
    /// Matching records ordered by creation time, then identity.
    fn find_by(&self, criteria: &Self::Criteria) -> Result<Vec<Self::Record>>;
    /// Creates the record if its identity is unknown, replaces it otherwise.
    fn save(&self, record: &Self::Record) -> Result<()>;
    /// Returns whether anything was removed.
    fn delete(&self, id: &Identity) -> Result<bool>;
}

pub type UserRepository = dyn Repository<Record = User, Criteria = UserCriteria>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserCriteria {
    /// Case-insensitive (ASCII) substring of the name.
    pub name_contains: Option<String>,
    /// Exact email.
    pub email: Option<String>,
    pub limit: Option<usize>,
}

impl UserCriteria {
    pub fn all() -> Self {
        Self::default()
    }
    pub fn matches(&self, user: &User) -> bool {
        let name_ok = self.name_contains.as_ref().is_none_or(|needle| {
            user.name()
                .as_str()
                .to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase())
        });
        let email_ok = self
            .email
            .as_ref()
            .is_none_or(|email| user.email().as_str() == email);
        name_ok && email_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(PathBuf),
}

impl PersistenceMode {
    pub const IN_MEMORY: &'static str = ":memory:";
    pub fn from_location(location: &str) -> Self {
        if location == Self::IN_MEMORY {
            Self::InMemory
        } else {
            Self::File(PathBuf::from(location))
        }
    }
}

/// Picks the adapter for the given mode.
pub fn open(mode: &PersistenceMode) -> Result<Arc<UserRepository>> {
    match mode {
        PersistenceMode::InMemory => Ok(Arc::new(InMemoryRepository::new())),
        PersistenceMode::File(path) => Ok(Arc::new(SqliteRepository::open(path)?)),
    }
}

fn email_taken(email: &str) -> KeystoneError {
    KeystoneError::Storage(format!("email '{email}' already belongs to another user"))
}

// ------------- In-memory -------------
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    kept: Mutex<HashMap<Identity, User, IdentityHasher>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> Result<usize> {
        Ok(self.kept.lock()?.len())
    }
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Repository for InMemoryRepository {
    type Record = User;
    type Criteria = UserCriteria;

    fn find(&self, id: &Identity) -> Result<Option<User>> {
        Ok(self.kept.lock()?.get(id).cloned())
    }
    fn find_by(&self, criteria: &UserCriteria) -> Result<Vec<User>> {
        let kept = self.kept.lock()?;
        let mut users: Vec<User> = kept.values().filter(|u| criteria.matches(u)).cloned().collect();
        users.sort_by(|a, b| (a.created_at(), a.id()).cmp(&(b.created_at(), b.id())));
        if let Some(limit) = criteria.limit {
            users.truncate(limit);
        }
        Ok(users)
    }
    fn save(&self, user: &User) -> Result<()> {
        let mut kept = self.kept.lock()?;
        if kept
            .values()
            .any(|other| other.id() != user.id() && other.email() == user.email())
        {
            return Err(email_taken(user.email().as_str()));
        }
        kept.insert(user.id().clone(), user.clone());
        debug!(id = %user.id(), "user kept in memory");
        Ok(())
    }
    fn delete(&self, id: &Identity) -> Result<bool> {
        Ok(self.kept.lock()?.remove(id).is_some())
    }
}

// ------------- SQLite -------------
pub struct SqliteRepository {
    connection: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let connection = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened sqlite database");
        Self::with_connection(connection)
    }
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }
    pub fn with_connection(connection: Connection) -> Result<Self> {
        // The "STRICT" keyword breaks JDBC connections, which makes debugging
        // using an external tool like DBeaver impossible
        connection.execute_batch(
            "
            create table if not exists User (
                User_Identity text not null,
                Name text not null,
                Email text not null,
                Created_At text not null,
                Updated_At text not null,
                constraint referenceable_User_Identity primary key (
                    User_Identity
                ),
                constraint unique_Email unique (
                    Email
                )
            );-- STRICT;
            create index if not exists User_by_Creation on User (
                Created_At,
                User_Identity
            );
            ",
        )?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }
}

struct UserRow {
    id: String,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
    // A stored row that no longer validates is damaged storage, not bad input.
    fn into_user(self) -> Result<User> {
        User::reconstruct(&self.id, &self.name, &self.email, self.created_at, self.updated_at)
            .map_err(|e| {
                warn!(id = %self.id, error = %e, "corrupt user row");
                KeystoneError::Storage(format!("corrupt row for user {}: {}", self.id, e))
            })
    }
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl Repository for SqliteRepository {
    type Record = User;
    type Criteria = UserCriteria;

    fn find(&self, id: &Identity) -> Result<Option<User>> {
        let connection = self.connection.lock()?;
        let row = connection
            .prepare_cached(
                "
                select User_Identity, Name, Email, Created_At, Updated_At
                    from User
                    where User_Identity = ?
                ",
            )?
            .query_row(params![id.as_str()], UserRow::read)
            .optional()?;
        row.map(UserRow::into_user).transpose()
    }
    fn find_by(&self, criteria: &UserCriteria) -> Result<Vec<User>> {
        let connection = self.connection.lock()?;
        let mut statement = connection.prepare_cached(
            "
            select User_Identity, Name, Email, Created_At, Updated_At
                from User
                where (?1 is null or Name like ?1 escape '\\')
                and (?2 is null or Email = ?2)
                order by Created_At, User_Identity
                limit ?3
            ",
        )?;
        let pattern = criteria.name_contains.as_deref().map(escape_like);
        // a negative limit means no limit to SQLite
        let limit = criteria
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let rows = statement
            .query_map(params![pattern, criteria.email, limit], UserRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(UserRow::into_user).collect()
    }
    fn save(&self, user: &User) -> Result<()> {
        let connection = self.connection.lock()?;
        let owner: Option<String> = connection
            .prepare_cached("select User_Identity from User where Email = ?")?
            .query_row(params![user.email()], |r| r.get(0))
            .optional()?;
        if owner.is_some_and(|owner| owner != user.id().as_str()) {
            return Err(email_taken(user.email().as_str()));
        }
        connection
            .prepare_cached(
                "
                insert into User (
                    User_Identity,
                    Name,
                    Email,
                    Created_At,
                    Updated_At
                ) values (?, ?, ?, ?, ?)
                on conflict (User_Identity) do update set
                    Name = excluded.Name,
                    Email = excluded.Email,
                    Created_At = excluded.Created_At,
                    Updated_At = excluded.Updated_At
                ",
            )?
            .execute(params![
                user.id().as_str(),
                user.name(),
                user.email(),
                user.created_at(),
                user.updated_at()
            ])?;
        debug!(id = %user.id(), "user persisted");
        Ok(())
    }
    fn delete(&self, id: &Identity) -> Result<bool> {
        let connection = self.connection.lock()?;
        let removed = connection
            .prepare_cached("delete from User where User_Identity = ?")?
            .execute(params![id.as_str()])?;
        Ok(removed > 0)
    }
}
