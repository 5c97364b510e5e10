//! Todo service tests over the in-memory repository

mod common;

use std::sync::Arc;

use taskhub_cache::{MemoryStore, Store};
use taskhub_todo_core::{
    CreateTodoInput, TodoError, TodoQuery, TodoService, UpdateTodoInput,
};
use taskhub_types::{Importance, TodoSort, TodoStatus, UserId};

use common::MockTodoRepository;

struct Fixture {
    service: TodoService<MockTodoRepository>,
    store: Arc<MemoryStore>,
    user: UserId,
    other_user: UserId,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let store_dyn: Arc<dyn Store> = store.clone();
    let service = TodoService::new(Arc::new(MockTodoRepository::new()), store_dyn);
    Fixture {
        service,
        store,
        user: UserId::new(),
        other_user: UserId::new(),
    }
}

fn input(title: &str, importance: Importance, urgency: i16) -> CreateTodoInput {
    CreateTodoInput {
        title: title.to_string(),
        description: None,
        importance,
        urgency,
        due_date: None,
    }
}

#[tokio::test]
async fn create_and_fetch_round_trip() {
    let fx = fixture();

    let todo = fx
        .service
        .create(fx.user, input("write the report", Importance::A, 1))
        .await
        .unwrap();
    assert_eq!(todo.status, TodoStatus::Pending);
    assert!(todo.completed_at.is_none());

    let fetched = fx.service.get(fx.user, todo.id).await.unwrap();
    assert_eq!(fetched.title, "write the report");
}

#[tokio::test]
async fn ownership_is_enforced() {
    let fx = fixture();
    let todo = fx
        .service
        .create(fx.user, input("mine", Importance::B, 2))
        .await
        .unwrap();

    assert!(matches!(
        fx.service.get(fx.other_user, todo.id).await,
        Err(TodoError::Forbidden)
    ));
    assert!(matches!(
        fx.service
            .update(fx.other_user, todo.id, UpdateTodoInput::default())
            .await,
        Err(TodoError::Forbidden)
    ));
    assert!(matches!(
        fx.service.delete(fx.other_user, todo.id).await,
        Err(TodoError::Forbidden)
    ));

    // Unknown id reads as not-found, not forbidden
    assert!(matches!(
        fx.service
            .get(fx.user, taskhub_types::TodoId::new())
            .await,
        Err(TodoError::NotFound)
    ));
}

#[tokio::test]
async fn completing_a_todo_stamps_completed_at_once() {
    let fx = fixture();
    let todo = fx
        .service
        .create(fx.user, input("finish me", Importance::B, 2))
        .await
        .unwrap();

    let done = fx
        .service
        .update(
            fx.user,
            todo.id,
            UpdateTodoInput {
                status: Some(TodoStatus::Completed),
                ..UpdateTodoInput::default()
            },
        )
        .await
        .unwrap();
    let stamped = done.completed_at.expect("completed_at stamped");

    // A second completed update keeps the original stamp
    let again = fx
        .service
        .update(
            fx.user,
            todo.id,
            UpdateTodoInput {
                status: Some(TodoStatus::Completed),
                ..UpdateTodoInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(again.completed_at, Some(stamped));
}

#[tokio::test]
async fn list_filters_and_sorts_by_priority() {
    let fx = fixture();
    fx.service
        .create(fx.user, input("low", Importance::D, 5))
        .await
        .unwrap();
    fx.service
        .create(fx.user, input("urgent", Importance::A, 1))
        .await
        .unwrap();
    fx.service
        .create(fx.user, input("middle", Importance::B, 3))
        .await
        .unwrap();
    // Another user's todo must not leak into the listing
    fx.service
        .create(fx.other_user, input("foreign", Importance::A, 1))
        .await
        .unwrap();

    let page = fx
        .service
        .list(fx.user, TodoQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    let titles: Vec<&str> = page.items.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["urgent", "middle", "low"]);

    let only_a = fx
        .service
        .list(
            fx.user,
            TodoQuery {
                importance: Some(Importance::A),
                sort: TodoSort::CreatedAt,
                ..TodoQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(only_a.total, 1);
    assert_eq!(only_a.items[0].title, "urgent");
}

#[tokio::test]
async fn validation_errors_on_bad_input() {
    let fx = fixture();

    assert!(matches!(
        fx.service.create(fx.user, input("", Importance::C, 3)).await,
        Err(TodoError::Validation(_))
    ));
    assert!(matches!(
        fx.service.create(fx.user, input("ok", Importance::C, 9)).await,
        Err(TodoError::Validation(_))
    ));
}

#[tokio::test]
async fn statistics_reflect_the_current_todo_set() {
    let fx = fixture();
    let a = fx
        .service
        .create(fx.user, input("a", Importance::A, 1))
        .await
        .unwrap();
    fx.service
        .create(fx.user, input("b", Importance::B, 2))
        .await
        .unwrap();

    fx.service
        .update(
            fx.user,
            a.id,
            UpdateTodoInput {
                status: Some(TodoStatus::Completed),
                ..UpdateTodoInput::default()
            },
        )
        .await
        .unwrap();

    let report = fx.service.statistics(fx.user).await.unwrap();
    assert_eq!(report.stats.total, 2);
    assert_eq!(report.stats.completed, 1);
    assert_eq!(report.stats.completion_rate, 50);
    assert_eq!(report.recent_todos.len(), 2);
}

#[tokio::test]
async fn statistics_cache_is_invalidated_on_write() {
    let fx = fixture();
    fx.service
        .create(fx.user, input("first", Importance::C, 3))
        .await
        .unwrap();

    let first = fx.service.statistics(fx.user).await.unwrap();
    assert_eq!(first.stats.total, 1);

    // Cached now
    let cache_key = taskhub_cache::keys::todo_stats(&fx.user.to_string());
    assert!(fx.store.get(&cache_key).await.unwrap().is_some());

    // A write invalidates; the next read recomputes
    fx.service
        .create(fx.user, input("second", Importance::C, 3))
        .await
        .unwrap();
    assert!(fx.store.get(&cache_key).await.unwrap().is_none());

    let second = fx.service.statistics(fx.user).await.unwrap();
    assert_eq!(second.stats.total, 2);
}
