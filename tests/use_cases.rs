use std::sync::Arc;

use keystone::KeystoneError;
use keystone::construct::{Identity, User};
use keystone::contract::{UserContract, UserDirectory};
use keystone::persist::{InMemoryRepository, Repository, SqliteRepository, UserCriteria, UserRepository};
use keystone::usecase::{
    CreateUser, CreateUserInput, DeleteUser, DeleteUserInput, FindUser, FindUserInput, ListUsers,
    ListUsersInput, UpdateUser, UpdateUserInput, UseCase, UserOutput,
};

// A storage that is always down.
struct Unreachable;

impl Repository for Unreachable {
    type Record = User;
    type Criteria = UserCriteria;
    fn find(&self, _: &Identity) -> keystone::Result<Option<User>> {
        Err(KeystoneError::Storage("connection refused".into()))
    }
    fn find_by(&self, _: &UserCriteria) -> keystone::Result<Vec<User>> {
        Err(KeystoneError::Storage("connection refused".into()))
    }
    fn save(&self, _: &User) -> keystone::Result<()> {
        Err(KeystoneError::Storage("connection refused".into()))
    }
    fn delete(&self, _: &Identity) -> keystone::Result<bool> {
        Err(KeystoneError::Storage("connection refused".into()))
    }
}

fn memory() -> Arc<UserRepository> {
    Arc::new(InMemoryRepository::new())
}

fn create(repository: &Arc<UserRepository>, name: &str, email: &str) -> keystone::Result<UserOutput> {
    CreateUser::new(Arc::clone(repository)).execute(CreateUserInput {
        name: name.into(),
        email: email.into(),
    })
}

#[test]
fn create_then_find_taro() {
    let sqlite: Arc<UserRepository> = Arc::new(SqliteRepository::open_in_memory().unwrap());
    for repository in [memory(), sqlite] {
        let created = create(&repository, "Taro", "taro@example.com").expect("created");
        assert!(!created.id.is_empty());
        let found = FindUser::new(Arc::clone(&repository))
            .execute(FindUserInput { id: created.id.clone() })
            .expect("found");
        assert_eq!(found.name, "Taro");
        assert_eq!(found.email, "taro@example.com");
        assert_eq!(found, created);
    }
}

#[test]
fn create_rejects_invalid_input_before_storage() {
    let repository: Arc<UserRepository> = Arc::new(Unreachable);
    // validation fails first, so the broken storage is never reached
    let err = create(&repository, "Taro", "not-an-email").unwrap_err();
    assert!(err.is_validation(), "{err}");
    let err = create(&repository, "", "taro@example.com").unwrap_err();
    assert!(err.is_validation(), "{err}");
}

#[test]
fn storage_errors_pass_through_unchanged() {
    let repository: Arc<UserRepository> = Arc::new(Unreachable);
    let err = create(&repository, "Taro", "taro@example.com").unwrap_err();
    assert!(err.is_storage(), "{err}");
    let err = FindUser::new(Arc::clone(&repository))
        .execute(FindUserInput { id: "abc".into() })
        .unwrap_err();
    assert!(err.is_storage(), "{err}");
    let err = DeleteUser::new(repository)
        .execute(DeleteUserInput { id: "abc".into() })
        .unwrap_err();
    assert!(err.is_storage(), "{err}");
}

#[test]
fn unknown_identity_is_not_found() {
    let repository = memory();
    let err = FindUser::new(Arc::clone(&repository))
        .execute(FindUserInput { id: Identity::generate().to_string() })
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
    let err = UpdateUser::new(repository)
        .execute(UpdateUserInput {
            id: "missing".into(),
            name: "Taro".into(),
            email: "taro@example.com".into(),
        })
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[test]
fn malformed_identity_is_a_validation_error() {
    let err = FindUser::new(memory())
        .execute(FindUserInput { id: "   ".into() })
        .unwrap_err();
    assert!(err.is_validation(), "{err}");
}

#[test]
fn update_keeps_identity_and_creation_time() {
    let repository = memory();
    let created = create(&repository, "Taro", "taro@example.com").unwrap();
    let updated = UpdateUser::new(Arc::clone(&repository))
        .execute(UpdateUserInput {
            id: created.id.clone(),
            name: "Taro Yamada".into(),
            email: "yamada@example.com".into(),
        })
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.name, "Taro Yamada");
    let found = FindUser::new(repository)
        .execute(FindUserInput { id: created.id })
        .unwrap();
    assert_eq!(found, updated);
}

#[test]
fn update_with_invalid_email_leaves_user_alone() {
    let repository = memory();
    let created = create(&repository, "Taro", "taro@example.com").unwrap();
    let err = UpdateUser::new(Arc::clone(&repository))
        .execute(UpdateUserInput {
            id: created.id.clone(),
            name: "Taro".into(),
            email: "nope".into(),
        })
        .unwrap_err();
    assert!(err.is_validation());
    let found = FindUser::new(repository).execute(FindUserInput { id: created.id }).unwrap();
    assert_eq!(found.email, "taro@example.com");
}

#[test]
fn delete_twice_is_fine() {
    let repository = memory();
    let created = create(&repository, "Taro", "taro@example.com").unwrap();
    let delete = DeleteUser::new(Arc::clone(&repository));
    assert!(delete.execute(DeleteUserInput { id: created.id.clone() }).unwrap().deleted);
    assert!(!delete.execute(DeleteUserInput { id: created.id.clone() }).unwrap().deleted);
    let err = FindUser::new(repository).execute(FindUserInput { id: created.id }).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn list_filters_by_criteria() {
    let repository = memory();
    create(&repository, "Taro", "taro@example.com").unwrap();
    create(&repository, "Hanako", "hanako@example.com").unwrap();
    let list = ListUsers::new(Arc::clone(&repository));
    assert_eq!(list.execute(ListUsersInput::default()).unwrap().len(), 2);
    let hanako = list
        .execute(ListUsersInput { name_contains: Some("han".into()), ..Default::default() })
        .unwrap();
    assert_eq!(hanako.len(), 1);
    assert_eq!(hanako[0].email, "hanako@example.com");
    assert!(list
        .execute(ListUsersInput { email: Some("nobody@example.com".into()), ..Default::default() })
        .unwrap()
        .is_empty());
}

#[test]
fn contract_speaks_in_primitives() {
    let repository = memory();
    let created = create(&repository, "Taro", "taro@example.com").unwrap();
    let directory = UserDirectory::new(repository);
    assert!(directory.exists(&created.id).unwrap());
    assert_eq!(directory.display_name(&created.id).unwrap().as_deref(), Some("Taro"));
    assert_eq!(directory.email_of(&created.id).unwrap().as_deref(), Some("taro@example.com"));
    assert!(!directory.exists("no-such-user").unwrap());
    // an id that could never be valid is simply absent
    assert_eq!(directory.display_name("").unwrap(), None);
}

#[test]
fn contract_does_not_hide_storage_failures() {
    let directory = UserDirectory::new(Arc::new(Unreachable));
    assert!(directory.exists("abc").unwrap_err().is_storage());
}
