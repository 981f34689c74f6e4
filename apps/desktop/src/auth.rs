//! Local login.

use crate::db::{DbError, SqliteRepository};
use std::cell::Cell;
use std::rc::Rc;
use study_core::{SessionContext, UserId};
use tracing::info;

/// Tracks which local account is using the app.
pub struct LocalSession {
    repository: Rc<SqliteRepository>,
    current: Cell<Option<UserId>>,
}

impl LocalSession {
    pub fn new(repository: Rc<SqliteRepository>) -> Self {
        Self {
            repository,
            current: Cell::new(None),
        }
    }

    /// Log in, creating the account on first use.
    pub fn login(&self, username: &str) -> Result<UserId, DbError> {
        let user_id = self.repository.find_or_create_user(username)?;
        info!(user_id, username, "logged in");
        self.current.set(Some(user_id));
        Ok(user_id)
    }

    pub fn logout(&self) {
        if let Some(user_id) = self.current.take() {
            info!(user_id, "logged out");
        }
    }
}

impl SessionContext for LocalSession {
    fn current_user_id(&self) -> Option<UserId> {
        self.current.get()
    }
}
