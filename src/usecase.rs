//! Application operations, one type per operation.
//!
//! Every use case takes a plain input record, works through the domain
//! constructors and the [`Repository`](crate::persist::Repository) it was
//! given, and answers with a plain output record. Use cases never touch a
//! persistence technology directly and never swallow errors: validation,
//! not-found and storage failures all reach the caller unchanged.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::construct::{Entity, Identity, User};
use crate::datatype::{Email, Name};
use crate::error::{KeystoneError, Result};
use crate::persist::{UserCriteria, UserRepository};

pub trait UseCase {
    type Input;
    type Output;
    fn execute(&self, input: Self::Input) -> Result<Self::Output>;
}

// ------------- Records -------------
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FindUserInput {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListUsersInput {
    #[serde(default)]
    pub name_contains: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UpdateUserInput {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeleteUserInput {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserOutput {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeleteUserOutput {
    pub id: String,
    pub deleted: bool,
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl From<&User> for UserOutput {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            created_at: timestamp(user.created_at()),
            updated_at: timestamp(user.updated_at()),
        }
    }
}

fn load(repository: &UserRepository, id: &Identity) -> Result<User> {
    repository
        .find(id)?
        .ok_or_else(|| KeystoneError::not_found(User::KIND, id.as_str()))
}

// ------------- Use cases -------------
pub struct CreateUser {
    repository: Arc<UserRepository>,
}

impl CreateUser {
    pub fn new(repository: Arc<UserRepository>) -> Self {
        Self { repository }
    }
}

impl UseCase for CreateUser {
    type Input = CreateUserInput;
    type Output = UserOutput;
    fn execute(&self, input: CreateUserInput) -> Result<UserOutput> {
        let user = User::create(Name::new(input.name)?, Email::new(input.email)?);
        self.repository.save(&user)?;
        debug!(id = %user.id(), "user created");
        Ok(UserOutput::from(&user))
    }
}

pub struct FindUser {
    repository: Arc<UserRepository>,
}

impl FindUser {
    pub fn new(repository: Arc<UserRepository>) -> Self {
        Self { repository }
    }
}

impl UseCase for FindUser {
    type Input = FindUserInput;
    type Output = UserOutput;
    fn execute(&self, input: FindUserInput) -> Result<UserOutput> {
        let id = Identity::parse(input.id)?;
        let user = load(self.repository.as_ref(), &id)?;
        Ok(UserOutput::from(&user))
    }
}

pub struct ListUsers {
    repository: Arc<UserRepository>,
}

impl ListUsers {
    pub fn new(repository: Arc<UserRepository>) -> Self {
        Self { repository }
    }
}

impl UseCase for ListUsers {
    type Input = ListUsersInput;
    type Output = Vec<UserOutput>;
    fn execute(&self, input: ListUsersInput) -> Result<Vec<UserOutput>> {
        let criteria = UserCriteria {
            name_contains: input.name_contains,
            email: input.email,
            limit: input.limit,
        };
        let users = self.repository.find_by(&criteria)?;
        debug!(count = users.len(), "users listed");
        Ok(users.iter().map(UserOutput::from).collect())
    }
}

pub struct UpdateUser {
    repository: Arc<UserRepository>,
}

impl UpdateUser {
    pub fn new(repository: Arc<UserRepository>) -> Self {
        Self { repository }
    }
}

impl UseCase for UpdateUser {
    type Input = UpdateUserInput;
    type Output = UserOutput;
    fn execute(&self, input: UpdateUserInput) -> Result<UserOutput> {
        let id = Identity::parse(input.id)?;
        let name = Name::new(input.name)?;
        let email = Email::new(input.email)?;
        let updated = load(self.repository.as_ref(), &id)?.with_changes(name, email);
        self.repository.save(&updated)?;
        debug!(id = %id, "user updated");
        Ok(UserOutput::from(&updated))
    }
}

pub struct DeleteUser {
    repository: Arc<UserRepository>,
}

impl DeleteUser {
    pub fn new(repository: Arc<UserRepository>) -> Self {
        Self { repository }
    }
}

impl UseCase for DeleteUser {
    type Input = DeleteUserInput;
    type Output = DeleteUserOutput;
    fn execute(&self, input: DeleteUserInput) -> Result<DeleteUserOutput> {
        let id = Identity::parse(input.id)?;
        let deleted = self.repository.delete(&id)?;
        debug!(id = %id, deleted, "user delete requested");
        Ok(DeleteUserOutput {
            id: id.to_string(),
            deleted,
        })
    }
}
