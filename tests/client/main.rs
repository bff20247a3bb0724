//! Integration tests for the persistence client: batch CRUD and fetch.

mod models;
mod support;

use models::Todo;
use support::FailingBackend;

use stored_rust::{
    ClientError, FetchSpecification, InMemoryBackend, PersistenceClient, SortDirection,
    ThreadedClient,
};

fn client_with(todos: &[Todo]) -> PersistenceClient<InMemoryBackend> {
    let client = PersistenceClient::new(InMemoryBackend::new());
    client.insert(todos).wait().unwrap();
    client
}

fn fetch_all(client: &PersistenceClient<InMemoryBackend>) -> Vec<Todo> {
    client.execute(&FetchSpecification::new()).wait().unwrap()
}

#[test]
fn insert_then_fetch_round_trips() {
    let todos = vec![
        Todo::new("1", "groceries"),
        Todo::new("2", "laundry"),
        Todo::new("3", "dishes"),
    ];
    let client = client_with(&todos);

    let fetched = fetch_all(&client);
    assert_eq!(fetched, todos);
}

#[test]
fn limit_caps_the_result_set() {
    let client = client_with(&[
        Todo::new("1", "a"),
        Todo::new("2", "b"),
        Todo::new("3", "c"),
    ]);

    let page: Vec<Todo> = client
        .execute(&FetchSpecification::new().limit(2))
        .wait()
        .unwrap();
    assert_eq!(page.len(), 2);
}

#[test]
fn offset_with_unbounded_limit_returns_the_tail() {
    let client = client_with(&[
        Todo::new("1", "a"),
        Todo::new("2", "b"),
        Todo::new("3", "c"),
    ]);

    let tail: Vec<Todo> = client
        .execute(&FetchSpecification::new().offset(2).limit(0))
        .wait()
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].id, "3");
}

#[test]
fn filter_sort_and_paginate_compose_in_that_order() {
    let client = client_with(&[
        Todo::new("1", "delta"),
        Todo::done("2", "echo"),
        Todo::new("3", "alpha"),
        Todo::new("4", "charlie"),
        Todo::new("5", "bravo"),
    ]);

    // Open todos sorted by title descending: delta, charlie, bravo, alpha.
    // The page is a window into that ordered set, not into the raw scan.
    let spec = FetchSpecification::new()
        .filter(|todo: &Todo| !todo.done)
        .sort_by_key(|todo: &Todo| todo.title.clone(), SortDirection::Descending)
        .offset(1)
        .limit(2);

    let page = client.execute(&spec).wait().unwrap();
    let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["charlie", "bravo"]);
}

#[test]
fn update_overwrites_without_duplicating() {
    let a = Todo::new("a", "water plants");
    let b = Todo::new("b", "call mom");
    let client = client_with(&[a.clone(), b.clone()]);

    let changed = Todo::done("a", "water plants");
    client.update(&[changed.clone()]).wait().unwrap();

    let all = fetch_all(&client);
    assert_eq!(all.len(), 2);
    assert!(all.contains(&changed));
    assert!(all.contains(&b));
}

#[test]
fn update_of_a_missing_record_fails_the_whole_batch() {
    let a = Todo::new("a", "original");
    let client = client_with(&[a.clone()]);

    let changed = Todo::done("a", "changed");
    let ghost = Todo::new("ghost", "never inserted");
    let err = client.update(&[changed, ghost]).wait().unwrap_err();
    assert_eq!(
        err,
        ClientError::NotFound {
            collection: "todos".into(),
            id: "ghost".into(),
        }
    );

    // Nothing committed: the existing record kept its original state.
    assert_eq!(fetch_all(&client), vec![a]);
}

#[test]
fn upsert_partitions_new_and_existing_records() {
    let a = Todo::new("a", "existing");
    let client = client_with(&[a]);

    let a_changed = Todo::done("a", "existing");
    let c = Todo::new("c", "brand new");
    let outcome = client.upsert(&[a_changed.clone(), c.clone()]).wait().unwrap();

    assert_eq!(outcome.updated, vec![a_changed.clone()]);
    assert_eq!(outcome.inserted, vec![c.clone()]);

    let all = fetch_all(&client);
    assert_eq!(all.len(), 2);
    assert!(all.contains(&a_changed));
    assert!(all.contains(&c));
}

#[test]
fn upsert_counts_a_repeated_identity_as_an_update() {
    let client = client_with(&[]);

    let first = Todo::new("x", "first");
    let second = Todo::done("x", "second");
    let outcome = client.upsert(&[first.clone(), second.clone()]).wait().unwrap();

    assert_eq!(outcome.inserted, vec![first]);
    assert_eq!(outcome.updated, vec![second.clone()]);
    assert_eq!(fetch_all(&client), vec![second]);
}

#[test]
fn delete_is_idempotent_in_effect() {
    let a = Todo::new("a", "keep");
    let b = Todo::new("b", "remove");
    let client = client_with(&[a.clone(), b.clone()]);

    client.delete(&[b.clone()]).wait().unwrap();
    assert_eq!(fetch_all(&client), vec![a.clone()]);

    // Deleting the already-absent record neither errors nor resurfaces it.
    client.delete(&[b]).wait().unwrap();
    assert_eq!(fetch_all(&client), vec![a]);
}

#[test]
fn refused_commit_fails_the_task_and_leaves_the_store_unchanged() {
    let backend = FailingBackend::new();
    let client = PersistenceClient::new(backend);

    let seeded = vec![Todo::new("1", "seeded")];
    client.insert(&seeded).wait().unwrap();

    client.backend().fail_next_commit();
    let err = client
        .insert(&[Todo::new("2", "doomed"), Todo::new("3", "also doomed")])
        .wait()
        .unwrap_err();
    assert!(matches!(err, ClientError::Backend(_)));

    let all: Vec<Todo> = client.execute(&FetchSpecification::new()).wait().unwrap();
    assert_eq!(all, seeded);
}

#[test]
fn threaded_client_resolves_tasks_from_a_worker() {
    let threaded = ThreadedClient::new(PersistenceClient::new(InMemoryBackend::new()));

    let todos = vec![Todo::new("1", "async"), Todo::new("2", "work")];
    threaded.insert(todos.clone()).wait().unwrap();

    let fetched: Vec<Todo> = threaded.execute(FetchSpecification::new()).wait().unwrap();
    assert_eq!(fetched, todos);

    threaded.delete(todos).wait().unwrap();
    let empty = threaded
        .execute(FetchSpecification::<Todo>::new())
        .wait()
        .unwrap();
    assert!(empty.is_empty());
}
