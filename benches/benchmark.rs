use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use keystone::construct::Entity;
use keystone::datatype::{Email, Name};
use keystone::persist::{InMemoryRepository, SqliteRepository, UserRepository};
use keystone::usecase::{CreateUser, CreateUserInput, FindUser, FindUserInput, UseCase};

fn create_then_find(repository: &Arc<UserRepository>, n: &mut u64) {
    *n += 1;
    let created = CreateUser::new(Arc::clone(repository))
        .execute(CreateUserInput {
            name: format!("User {n}"),
            email: format!("user{n}@example.com"),
        })
        .unwrap();
    let found = FindUser::new(Arc::clone(repository))
        .execute(FindUserInput { id: created.id })
        .unwrap();
    black_box(found);
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("name", |b| b.iter(|| Name::new(black_box("Taro Yamada")).unwrap()));
    c.bench_function("email", |b| {
        b.iter(|| Email::new(black_box("taro.yamada@example.com")).unwrap())
    });
    c.bench_function("create user", |b| {
        b.iter(|| {
            let user = keystone::construct::User::create(
                Name::new("Taro").unwrap(),
                Email::new("taro@example.com").unwrap(),
            );
            black_box(user.id().clone())
        })
    });

    let memory: Arc<UserRepository> = Arc::new(InMemoryRepository::new());
    let mut n = 0;
    c.bench_function("create+find memory", |b| b.iter(|| create_then_find(&memory, &mut n)));

    let sqlite: Arc<UserRepository> = Arc::new(SqliteRepository::open_in_memory().unwrap());
    c.bench_function("create+find sqlite", |b| b.iter(|| create_then_find(&sqlite, &mut n)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
