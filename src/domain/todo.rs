use crate::domain::auth::Caller;
use crate::domain::todo::driven_ports::{TodoReader, TodoWriter};
use crate::domain::todo::driving_ports::TodoError;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// How urgently a todo needs to be taken care of
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Where a todo currently sits in its lifecycle. Any status can transition to any
/// other status via an update; toggling only ever lands on [Status::Completed] or
/// [Status::Pending].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// A single task owned by exactly one user
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(Clone))]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
}

impl Todo {
    /// Builds the stored form of a new todo. The id and timestamps are assigned here,
    /// server-side. `completed_at` always starts out empty, even for todos created
    /// directly in the completed status.
    fn from_new(new_todo: &NewTodo, owner_id: Uuid, now: DateTime<Utc>) -> Todo {
        Todo {
            id: Uuid::new_v4(),
            title: new_todo.title.clone(),
            description: new_todo.description.clone(),
            priority: new_todo.priority,
            status: new_todo.status,
            due_date: new_todo.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
            owner_id,
        }
    }

    /// Applies a partial update. Fields absent from [update] are left untouched, and
    /// an explicit clear (`Some(None)`) empties a nullable field.
    /// `completed_at` is stamped when the status crosses into [Status::Completed] and
    /// cleared when it crosses back out; an update that doesn't mention status leaves
    /// it alone. `updated_at` is always refreshed.
    fn apply_update(&mut self, update: &UpdateTodo, now: DateTime<Utc>) {
        if let Some(ref title) = update.title {
            self.title = title.clone();
        }
        if let Some(ref description) = update.description {
            self.description = description.clone();
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = update.status {
            if status == Status::Completed && self.status != Status::Completed {
                self.completed_at = Some(now);
            } else if status != Status::Completed && self.status == Status::Completed {
                self.completed_at = None;
            }
            self.status = status;
        }

        self.updated_at = now;
    }

    /// Flips a completed todo back to pending and any other todo straight to completed.
    /// An in-progress or cancelled todo toggles directly into the completed status
    /// without passing through pending.
    fn toggle_status(&mut self, now: DateTime<Utc>) {
        if self.status == Status::Completed {
            self.status = Status::Pending;
            self.completed_at = None;
        } else {
            self.status = Status::Completed;
            self.completed_at = Some(now);
        }

        self.updated_at = now;
    }
}

/// Data required to create a todo
#[cfg_attr(test, derive(Clone))]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
}

/// A partial update to a todo. Fields left as [None] are not modified. The nullable
/// fields use a nested [Option] so `Some(None)` clears the stored value while [None]
/// leaves it untouched.
#[derive(Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Exact-match predicates for the list operation. Applied identically to the page
/// query and the total count query.
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoListFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

/// Offset pagination for the list operation. No upper bound is enforced on [limit].
#[derive(Clone, Copy, Debug)]
pub struct Pagination {
    pub skip: i64,
    pub limit: i64,
}

/// One page of todos plus the total number of records matching the active filters,
/// independent of pagination
#[derive(Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoPage {
    pub todos: Vec<Todo>,
    pub filtered_count: i64,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TodoReader {
        async fn todos_for_owner(
            &self,
            owner_id: Uuid,
            filter: &TodoListFilter,
            page: &Pagination,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Todo>, anyhow::Error>;

        async fn count_for_owner(
            &self,
            owner_id: Uuid,
            filter: &TodoListFilter,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, anyhow::Error>;

        async fn todo_by_id(
            &self,
            todo_id: Uuid,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Todo>, anyhow::Error>;
    }

    pub trait TodoWriter {
        async fn insert_todo(
            &self,
            todo: &Todo,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn save_todo(
            &self,
            todo: &Todo,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn delete_todo(
            &self,
            todo_id: Uuid,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TodoError {
        /// No todo exists under the requested id. Checked before the ownership guard
        /// so callers can't probe for other users' record ids.
        #[error("Todo not found")]
        NotFound,
        /// The caller is neither the owner of the todo nor a superuser.
        #[error("Not enough permissions")]
        NotEnoughPermissions,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[cfg(test)]
    mod todo_error_clone {
        use super::TodoError;
        use anyhow::anyhow;

        impl Clone for TodoError {
            fn clone(&self) -> Self {
                match self {
                    Self::NotFound => Self::NotFound,
                    Self::NotEnoughPermissions => Self::NotEnoughPermissions,
                    Self::PortError(err) => Self::PortError(anyhow!(format!("{}", err))),
                }
            }
        }
    }

    pub trait TodoPort {
        async fn list_todos(
            &self,
            caller: &Caller,
            filter: &TodoListFilter,
            page: &Pagination,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_read: &impl driven_ports::TodoReader,
        ) -> Result<TodoPage, anyhow::Error>;

        async fn todo_by_id(
            &self,
            caller: &Caller,
            todo_id: Uuid,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_read: &impl driven_ports::TodoReader,
        ) -> Result<Todo, TodoError>;

        async fn create_todo(
            &self,
            caller: &Caller,
            new_todo: &NewTodo,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_write: &impl driven_ports::TodoWriter,
        ) -> Result<Todo, anyhow::Error>;

        async fn update_todo(
            &self,
            caller: &Caller,
            todo_id: Uuid,
            update: &UpdateTodo,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_read: &impl driven_ports::TodoReader,
            todo_write: &impl driven_ports::TodoWriter,
        ) -> Result<Todo, TodoError>;

        async fn delete_todo(
            &self,
            caller: &Caller,
            todo_id: Uuid,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_read: &impl driven_ports::TodoReader,
            todo_write: &impl driven_ports::TodoWriter,
        ) -> Result<(), TodoError>;

        async fn toggle_todo_status(
            &self,
            caller: &Caller,
            todo_id: Uuid,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_read: &impl driven_ports::TodoReader,
            todo_write: &impl driven_ports::TodoWriter,
        ) -> Result<Todo, TodoError>;
    }
}

/// Fetches a todo and applies the ownership guard, in that order. Existence is
/// always checked before permissions.
async fn owned_todo(
    caller: &Caller,
    todo_id: Uuid,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_read: &impl TodoReader,
) -> Result<Todo, TodoError> {
    let maybe_todo = todo_read
        .todo_by_id(todo_id, &mut *ext_cxn)
        .await
        .context("looking up a todo before acting on it")?;
    let Some(todo) = maybe_todo else {
        return Err(TodoError::NotFound);
    };
    if !caller.can_access(&todo) {
        return Err(TodoError::NotEnoughPermissions);
    }

    Ok(todo)
}

pub struct TodoService {}

impl driving_ports::TodoPort for TodoService {
    async fn list_todos(
        &self,
        caller: &Caller,
        filter: &TodoListFilter,
        page: &Pagination,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_read: &impl TodoReader,
    ) -> Result<TodoPage, anyhow::Error> {
        let filtered_count = todo_read
            .count_for_owner(caller.id, filter, &mut *ext_cxn)
            .await
            .context("counting a user's todos")?;
        let todos = todo_read
            .todos_for_owner(caller.id, filter, page, &mut *ext_cxn)
            .await
            .context("fetching a page of a user's todos")?;

        Ok(TodoPage {
            todos,
            filtered_count,
        })
    }

    async fn todo_by_id(
        &self,
        caller: &Caller,
        todo_id: Uuid,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_read: &impl TodoReader,
    ) -> Result<Todo, TodoError> {
        owned_todo(caller, todo_id, &mut *ext_cxn, todo_read).await
    }

    async fn create_todo(
        &self,
        caller: &Caller,
        new_todo: &NewTodo,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_write: &impl TodoWriter,
    ) -> Result<Todo, anyhow::Error> {
        let todo = Todo::from_new(new_todo, caller.id, Utc::now());
        todo_write
            .insert_todo(&todo, &mut *ext_cxn)
            .await
            .context("persisting a new todo")?;

        Ok(todo)
    }

    async fn update_todo(
        &self,
        caller: &Caller,
        todo_id: Uuid,
        update: &UpdateTodo,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_read: &impl TodoReader,
        todo_write: &impl TodoWriter,
    ) -> Result<Todo, TodoError> {
        let mut todo = owned_todo(caller, todo_id, &mut *ext_cxn, todo_read).await?;
        todo.apply_update(update, Utc::now());
        todo_write
            .save_todo(&todo, &mut *ext_cxn)
            .await
            .context("persisting a todo update")?;

        Ok(todo)
    }

    async fn delete_todo(
        &self,
        caller: &Caller,
        todo_id: Uuid,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_read: &impl TodoReader,
        todo_write: &impl TodoWriter,
    ) -> Result<(), TodoError> {
        let todo = owned_todo(caller, todo_id, &mut *ext_cxn, todo_read).await?;
        todo_write
            .delete_todo(todo.id, &mut *ext_cxn)
            .await
            .context("removing a todo")?;

        Ok(())
    }

    async fn toggle_todo_status(
        &self,
        caller: &Caller,
        todo_id: Uuid,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_read: &impl TodoReader,
        todo_write: &impl TodoWriter,
    ) -> Result<Todo, TodoError> {
        let mut todo = owned_todo(caller, todo_id, &mut *ext_cxn, todo_read).await?;
        todo.toggle_status(Utc::now());
        todo_write
            .save_todo(&todo, &mut *ext_cxn)
            .await
            .context("persisting a todo status toggle")?;

        Ok(todo)
    }
}
