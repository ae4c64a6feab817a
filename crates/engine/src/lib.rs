//! `engine` crate — graph model, scheduling math, and the run executor.
//!
//! The engine advances one [`store::WorkflowRun`] at a time: the scheduler
//! fetches due runs, claims each, and the executor performs a single step of
//! the state machine — execute the current node's action, decide success /
//! failure / suspension, and move the cursor along the matching edge.

pub mod branch;
pub mod error;
pub mod executor;
pub mod graph;
pub mod models;
pub mod retry;
pub mod scheduler;
pub mod window;

pub use error::EngineError;
pub use executor::{ExecutorConfig, RunExecutor, StepOutcome};
pub use graph::validate_graph;
pub use models::{Edge, Node, TimeWindow, WeekdayTag, WorkflowGraph};
pub use scheduler::{Scheduler, TickSummary};
