//! Tasks - single-assignment result handles for client operations.
//!
//! A [`Task`] represents the eventual outcome of one persistence operation:
//! it starts `pending` and settles exactly once into `fulfilled(value)` or
//! `failed(error)`, both terminal. The writing half is a separate
//! [`TaskResolver`] consumed by `fulfill`/`fail`, so the settle-once rule is
//! enforced by ownership rather than checked at runtime.
//!
//! Readers can block (`wait`), block with a deadline (`wait_timeout`), or
//! peek without blocking (`try_result`). Handles are cheap to clone; every
//! clone observes the same settlement.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::ClientError;

enum TaskState<T> {
    Pending,
    Fulfilled(T),
    Failed(ClientError),
}

struct Shared<T> {
    state: Mutex<TaskState<T>>,
    wake: Condvar,
}

/// Single-assignment future delivering a success value or an error.
pub struct Task<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Task {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Task<T> {
    /// Create a pending task together with its resolver.
    pub fn pending() -> (Task<T>, TaskResolver<T>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(TaskState::Pending),
            wake: Condvar::new(),
        });
        (
            Task {
                shared: Arc::clone(&shared),
            },
            TaskResolver { shared },
        )
    }

    /// Create a task already settled with `value`.
    pub fn fulfilled(value: T) -> Task<T> {
        Task {
            shared: Arc::new(Shared {
                state: Mutex::new(TaskState::Fulfilled(value)),
                wake: Condvar::new(),
            }),
        }
    }

    /// Create a task already settled with `error`.
    pub fn failed(error: ClientError) -> Task<T> {
        Task {
            shared: Arc::new(Shared {
                state: Mutex::new(TaskState::Failed(error)),
                wake: Condvar::new(),
            }),
        }
    }

    /// Create a task settled from a finished operation.
    pub fn settled(result: Result<T, ClientError>) -> Task<T> {
        match result {
            Ok(value) => Task::fulfilled(value),
            Err(error) => Task::failed(error),
        }
    }

    /// Whether the task has not settled yet.
    pub fn is_pending(&self) -> bool {
        match self.shared.state.lock() {
            Ok(state) => matches!(*state, TaskState::Pending),
            Err(_) => false,
        }
    }
}

impl<T: Clone> Task<T> {
    /// Block until the task settles, then return its outcome.
    pub fn wait(&self) -> Result<T, ClientError> {
        let mut state = self
            .shared
            .state
            .lock()
            .map_err(|_| ClientError::LockPoisoned("task state"))?;

        loop {
            match &*state {
                TaskState::Pending => {
                    state = self
                        .shared
                        .wake
                        .wait(state)
                        .map_err(|_| ClientError::LockPoisoned("task state"))?;
                }
                TaskState::Fulfilled(value) => return Ok(value.clone()),
                TaskState::Failed(error) => return Err(error.clone()),
            }
        }
    }

    /// Block until the task settles or `timeout` elapses.
    /// Returns `None` if the task is still pending at the deadline.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, ClientError>> {
        let deadline = Instant::now() + timeout;
        let mut state = match self.shared.state.lock() {
            Ok(state) => state,
            Err(_) => return Some(Err(ClientError::LockPoisoned("task state"))),
        };

        loop {
            match &*state {
                TaskState::Fulfilled(value) => return Some(Ok(value.clone())),
                TaskState::Failed(error) => return Some(Err(error.clone())),
                TaskState::Pending => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    match self.shared.wake.wait_timeout(state, deadline - now) {
                        Ok((guard, _)) => state = guard,
                        Err(_) => return Some(Err(ClientError::LockPoisoned("task state"))),
                    }
                }
            }
        }
    }

    /// Return the outcome if the task has settled, without blocking.
    pub fn try_result(&self) -> Option<Result<T, ClientError>> {
        let state = match self.shared.state.lock() {
            Ok(state) => state,
            Err(_) => return Some(Err(ClientError::LockPoisoned("task state"))),
        };
        match &*state {
            TaskState::Pending => None,
            TaskState::Fulfilled(value) => Some(Ok(value.clone())),
            TaskState::Failed(error) => Some(Err(error.clone())),
        }
    }
}

/// The writing half of a [`Task`]. Consumed on use: a task can only ever be
/// settled once, and only by the holder of its resolver.
///
/// Dropping a resolver without settling leaves the task pending; waiters
/// that cannot rule that out should prefer [`Task::wait_timeout`].
pub struct TaskResolver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> TaskResolver<T> {
    /// Settle the task with a success value and wake all waiters.
    pub fn fulfill(self, value: T) {
        self.settle(TaskState::Fulfilled(value));
    }

    /// Settle the task with an error and wake all waiters.
    pub fn fail(self, error: ClientError) {
        self.settle(TaskState::Failed(error));
    }

    fn settle(self, next: TaskState<T>) {
        if let Ok(mut state) = self.shared.state.lock() {
            if matches!(*state, TaskState::Pending) {
                *state = next;
            }
            self.shared.wake.notify_all();
        }
    }
}
