//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which provides a framework for executing work asynchronously across multiple threads.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that can be executed asynchronously
//! - `TaskResult`: Represents the result of a completed task
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the owning thread with mutable
//!    access to the context `C` the manager was created for
//! 5. The result can spawn follow-up tasks
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the owning thread
//! - Tasks own everything they read; the context is only touched by results

/// A unit of work that can be executed on a background worker.
///
/// Tasks should be self-contained and own (or share immutably) all the data they need.
pub trait Task<C>: Send {
    /// Processes the task on a worker thread and returns a result.
    ///
    /// Errors should be captured in the result rather than panicking, since a
    /// panicking worker takes its channel down with it.
    fn process(&self) -> Box<dyn TaskResult<C> + Send>;
}

/// The result of processing a `Task`, applied on the thread that owns the context.
pub trait TaskResult<C>: Send {
    /// Applies the result to `context`.
    ///
    /// # Returns
    /// Follow-up tasks to schedule (can be empty).
    fn handle_result(self: Box<Self>, context: &mut C) -> Vec<Box<dyn Task<C> + Send>>;
}
