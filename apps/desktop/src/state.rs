//! Application state.

use crate::algorithm::FsrsScheduler;
use crate::auth::LocalSession;
use crate::db::SqliteRepository;
use std::rc::Rc;
use study_core::{Clock, ConfigError, SchedulerConfig, StudySessionEngine};

/// Everything a front end needs to drive studying.
pub struct AppState {
    pub repository: Rc<SqliteRepository>,
    pub session: Rc<LocalSession>,
    pub engine: StudySessionEngine<FsrsScheduler>,
}

impl AppState {
    pub fn new(repository: SqliteRepository, scheduler: SchedulerConfig) -> Result<Self, ConfigError> {
        let repository = Rc::new(repository);
        let session = Rc::new(LocalSession::new(Rc::clone(&repository)));
        let engine = StudySessionEngine::new(
            scheduler,
            repository.clone(),
            repository.clone(),
            session.clone(),
        )?;
        Ok(Self {
            repository,
            session,
            engine,
        })
    }

    /// Replace the engine's clock.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.engine = self.engine.with_clock(clock);
        self
    }
}
