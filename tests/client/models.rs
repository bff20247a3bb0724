//! Support models for client integration tests.

use serde::{Deserialize, Serialize};
use stored_rust::Model;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub done: bool,
}

impl Todo {
    pub fn new(id: &str, title: &str) -> Self {
        Todo {
            id: id.into(),
            title: title.into(),
            done: false,
        }
    }

    pub fn done(id: &str, title: &str) -> Self {
        Todo {
            done: true,
            ..Todo::new(id, title)
        }
    }
}

impl Model for Todo {
    const COLLECTION: &'static str = "todos";
    fn id(&self) -> &str {
        &self.id
    }
}
