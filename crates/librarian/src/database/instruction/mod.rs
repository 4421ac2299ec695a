//! Database instructions.
//!
//! Each catalog operation is a small value implementing [`DatabaseInstruction`]. Building
//! the instruction is synchronous and cheap; running it against a [`Database`] is async
//! and happens on the connection's worker thread.

use rusqlite::{params, params_from_iter};

use super::*;

pub mod add;
pub mod batch;
pub mod query;
pub mod remove;
pub mod update;

/// An operation that can be run against the catalog.
#[async_trait]
pub trait DatabaseInstruction {
  /// What the operation yields.
  type Output;

  /// Runs the operation.
  async fn execute(&self, db: &Database) -> Result<Self::Output>;
}
