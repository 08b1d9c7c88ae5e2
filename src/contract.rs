//! Narrow, primitive-typed entry points into the user module.
//!
//! Other modules hold user ids as plain strings and only ever ask questions
//! through [`UserContract`], so nothing outside this crate's user code depends
//! on [`User`](crate::construct::User), its value objects or the repository.

use std::sync::Arc;

use crate::construct::{Identity, User};
use crate::error::Result;
use crate::persist::UserRepository;

pub trait UserContract: Send + Sync {
    fn exists(&self, id: &str) -> Result<bool>;
    fn display_name(&self, id: &str) -> Result<Option<String>>;
    fn email_of(&self, id: &str) -> Result<Option<String>>;
}

pub struct UserDirectory {
    repository: Arc<UserRepository>,
}

impl UserDirectory {
    pub fn new(repository: Arc<UserRepository>) -> Self {
        Self { repository }
    }
    // An id that cannot be parsed can never name a stored user.
    fn lookup<T>(&self, id: &str, pick: impl FnOnce(&User) -> T) -> Result<Option<T>> {
        let Ok(id) = Identity::parse(id) else {
            return Ok(None);
        };
        Ok(self.repository.find(&id)?.as_ref().map(pick))
    }
}

impl UserContract for UserDirectory {
    fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.lookup(id, |_| ())?.is_some())
    }
    fn display_name(&self, id: &str) -> Result<Option<String>> {
        self.lookup(id, |user| user.name().to_string())
    }
    fn email_of(&self, id: &str) -> Result<Option<String>> {
        self.lookup(id, |user| user.email().to_string())
    }
}
