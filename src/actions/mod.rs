//! File actions module.
//!
//! This module provides functionality for:
//! - Queuing extra files for removal
//! - Resolving a removal policy interactively (or forcing it)
//! - Idempotent deletion, permanent or via the system trash
//!
//! ```no_run
//! use dupemgr::actions::{DeleteConfig, RemovalQueue, RemovalWorkflow, TerminalConfirmer};
//!
//! let queue = RemovalQueue::default();
//! let mut workflow = RemovalWorkflow::new(DeleteConfig::default(), Vec::new());
//! let result = workflow.run(&queue, &mut TerminalConfirmer::stdio()).unwrap();
//! println!("{}", result.summary());
//! ```

pub mod delete;
pub mod prompt;
pub mod queue;

// Re-export commonly used types
pub use delete::{
    delete_to_trash, permanent_delete, remove_empty_parent, remove_file_idempotent,
    BatchDeleteResult, DeleteConfig, DeleteError, DeleteResult,
};
pub use prompt::{Confirmer, TerminalConfirmer};
pub use queue::{PolicyChoice, RemovalQueue, RemovalQueueEntry, RemovalState, RemovalWorkflow};
