//! Keystone – a small CRUD service built from validated value objects,
//! identity-bearing records and single-purpose use cases.
//!
//! Construction always goes through validation:
//! * A [`datatype::ValueObject`] wraps one primitive and can only be built by
//!   its validating `new` (see [`datatype::Name`] and [`datatype::Email`]).
//! * A record such as [`construct::User`] composes value objects under an
//!   [`construct::Identity`] and has two ways in: `create`, which generates a
//!   fresh identity, and `reconstruct`, which takes a known identity (typically
//!   from storage) and validates every field again.
//! * A [`usecase::UseCase`] performs one application operation, taking and
//!   returning plain records of primitives.
//! * A [`persist::Repository`] hides the storage technology from use cases.
//!   [`persist::InMemoryRepository`] and [`persist::SqliteRepository`] are the
//!   provided adapters.
//!
//! ## Modules
//! * [`datatype`] – The [`datatype::ValueObject`] trait and the provided values.
//! * [`construct`] – Identities, the [`construct::Entity`] trait and users.
//! * [`persist`] – The storage abstraction plus in-memory and SQLite adapters.
//! * [`usecase`] – Create, find, list, update and delete operations.
//! * [`contract`] – Primitive-typed facade for other modules.
//! * [`security`] – Security headers added to every HTTP response.
//! * [`server`] – The JSON API over HTTP.
//! * [`settings`] – Layered configuration (defaults, file, environment).
//!
//! ## Errors
//! Everything returns [`error::Result`]. Validation, not-found and storage
//! failures are distinct [`error::KeystoneError`] variants and are never
//! converted into one another.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use keystone::persist::{InMemoryRepository, UserRepository};
//! use keystone::usecase::{CreateUser, CreateUserInput, FindUser, FindUserInput, UseCase};
//! let repository: Arc<UserRepository> = Arc::new(InMemoryRepository::new());
//! let created = CreateUser::new(Arc::clone(&repository))
//!     .execute(CreateUserInput { name: "Taro".into(), email: "taro@example.com".into() })
//!     .unwrap();
//! let found = FindUser::new(repository)
//!     .execute(FindUserInput { id: created.id.clone() })
//!     .unwrap();
//! assert_eq!(found.name, "Taro");
//! ```

pub mod construct;
pub mod contract;
pub mod datatype;
pub mod error;
pub mod persist;
pub mod security;
pub mod server;
pub mod settings;
pub mod usecase;

pub use error::{KeystoneError, Result};
