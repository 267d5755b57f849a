//! # Task Management System
//!
//! This module provides a small worker pool for executing work off the main thread.
//! The chunk manager uses it to run terrain generation in the background while the
//! live set, meshing and submission stay on the owning thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: distributes tasks to workers and collects their results
//! - `Task`: a unit of work executed on a worker thread
//! - `TaskResult`: the result of a completed task, applied to a context on the owning
//!   thread and able to spawn follow-up tasks
//! - `TaskChannel`: one worker thread plus the channels used to talk to it
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin,
//!    queueing them when every worker is busy
//! 3. Workers process tasks and send results back
//! 4. Results are applied in `process_completed_tasks()`
//! 5. Queued tasks are handed out in `process_queued_tasks()` as workers free up
//!
//! ## Example Usage
//! ```text
//! let mut task_manager = TaskManager::new(num_workers);
//! task_manager.publish_task(Box::new(MyTask::new(...)));
//!
//! // once per frame:
//! task_manager.process_completed_tasks(&mut context);
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use task::{Task, TaskResult};

/// A communication channel between the owning thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from the owning thread to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `worker`: Handle to the worker thread, joined when the manager is dropped
pub struct TaskChannel<C> {
    task_sender: Sender<Box<dyn Task<C> + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult<C> + Send>>,
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating and managing worker threads
/// - Distributing tasks across available workers
/// - Collecting task results and applying them to a context
/// - Queuing tasks when all workers are busy
///
/// Dropping the manager closes every task channel and joins the workers; results
/// still in flight at that point are discarded.
pub struct TaskManager<C: 'static> {
    channels: Vec<TaskChannel<C>>,
    queued_tasks: VecDeque<Box<dyn Task<C> + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Keeping this at 1 leaves the remaining work in the shared queue, where any worker
/// that frees up can pick it.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl<C: 'static> TaskManager<C> {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// A manager with zero workers accepts tasks but only ever queues them.
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        info!(
            "Starting {} task workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        for _ in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task<C> + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult<C> + Send>>();

            let worker = thread::spawn(move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            });

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                worker,
            });
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Number of tasks currently being processed by workers.
    pub fn in_flight(&self) -> usize {
        self.channels.iter().map(|channel| channel.num_tasks_in_flight).sum()
    }

    /// Number of tasks waiting for a free worker.
    pub fn queued(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Whether some worker can take a task right away.
    pub fn has_free_worker(&self) -> bool {
        self.find_available_channel().is_some()
    }

    /// Whether at least one worker thread is still running.
    pub fn has_live_workers(&self) -> bool {
        self.channels.iter().any(|channel| !channel.worker.is_finished())
    }

    /// Whether no task is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.in_flight() == 0
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was successfully sent to the worker
    /// - `Err(task)` if the send failed (the worker has disconnected)
    fn try_send_task(
        &mut self,
        task: Box<dyn Task<C> + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task<C> + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => {
                warn!("Task worker {} disconnected", channel_idx);
                Err(task.0)
            }
        }
    }

    /// Finds an available worker channel using round-robin from the last used channel.
    ///
    /// # Returns
    /// `None` if all channels are busy or there are no channels available
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|step| (self.current_channel + step) % count)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately scheduled on an available worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task<C> + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to workers until the queue is empty or every worker is busy.
    ///
    /// Tasks are scheduled in FIFO order.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // Channel is disconnected, put task back and stop processing
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
    }

    /// Applies every completed result to `context` and publishes the follow-up tasks.
    ///
    /// # Returns
    /// The number of results applied.
    pub fn process_completed_tasks(&mut self, context: &mut C) -> usize {
        let mut tasks_to_queue = Vec::new();
        let mut handled = 0;

        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                handled += 1;
                tasks_to_queue.extend(result.handle_result(context));
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }

        handled
    }
}

impl<C: 'static> Drop for TaskManager<C> {
    fn drop(&mut self) {
        self.queued_tasks.clear();
        for (idx, channel) in self.channels.drain(..).enumerate() {
            let TaskChannel {
                task_sender,
                result_receiver,
                worker,
                ..
            } = channel;
            drop(task_sender);
            drop(result_receiver);
            if worker.join().is_err() {
                warn!("Task worker {} panicked", idx);
            }
        }
        debug!("Task workers stopped");
    }
}
