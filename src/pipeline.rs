//! A sequence of commands issued together against one connection.

use deadpool_redis::redis::{self, FromRedisValue, Pipeline};

use crate::{error::LeaderboardResult, session::StoreSession};

/// Builds a batch of commands against one borrowed connection and flushes them together.
///
/// Mirrors `redis::pipe().atomic()` usage elsewhere in this codebase: every command queued here
/// executes on the server in submission order, and no individual command is awaited before the
/// whole batch is flushed.
pub struct PipelineBatch<'a> {
    session: &'a mut StoreSession,
    pipe: Pipeline,
}

impl<'a> PipelineBatch<'a> {
    /// Starts an empty atomic pipeline against `session`.
    pub fn new(session: &'a mut StoreSession) -> Self {
        let mut pipe = redis::pipe();
        pipe.atomic();
        Self { session, pipe }
    }

    /// Gives mutable access to the underlying pipeline builder, for queuing a command.
    pub fn pipe(&mut self) -> &mut Pipeline {
        &mut self.pipe
    }

    /// Flushes the queued commands and collects an ordered reply of type `R`.
    pub async fn query<R: FromRedisValue>(self) -> LeaderboardResult<R> {
        let PipelineBatch { session, mut pipe } = self;
        Ok(pipe.query_async(session.conn()).await?)
    }
}
