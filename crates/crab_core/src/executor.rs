//! Drains the command queue at one command per tick.

use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandQueue};
use crate::error::OrderError;
use crate::orders::CrabOrders;

/// Running totals of executed commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutorStats {
    /// Commands the entity layer accepted.
    pub executed: u64,
    /// Commands the entity layer refused.
    pub failed: u64,
}

/// Runs at most one queued command per tick.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    stats: ExecutorStats,
}

impl CommandExecutor {
    /// Create an executor with zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest command, if any, and run it.
    ///
    /// Refused commands are logged and dropped; nobody else is told.
    pub fn execute_next<O: CrabOrders + ?Sized>(
        &mut self,
        queue: &mut CommandQueue,
        orders: &mut O,
    ) -> Option<(Command, Result<(), OrderError>)> {
        let command = queue.pop()?;
        let result = command.execute(orders);
        match &result {
            Ok(()) => {
                self.stats.executed += 1;
                tracing::debug!(command = command.name(), pending = queue.len(), "Command executed");
            }
            Err(error) => {
                self.stats.failed += 1;
                tracing::warn!(command = command.name(), %error, "Command aborted");
            }
        }
        Some((command, result))
    }

    /// Totals so far.
    #[must_use]
    pub const fn stats(&self) -> ExecutorStats {
        self.stats
    }
}
