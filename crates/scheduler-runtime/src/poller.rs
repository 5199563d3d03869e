//! Poller (C7, §4.7): the periodic tick loop that recovers stuck tasks,
//! discovers due tasks, and hands each to a bounded pool of Executor
//! workers. The tick loop itself never executes a task in-line.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use scheduler_kernel::clock::Clock;
use scheduler_kernel::repository::TaskRepository;
use scheduler_kernel::task::{Task, TaskId, TaskPatch, TaskStatus};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, warn};

use crate::executor::Executor;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub tick_interval: StdDuration,
    pub stuck_threshold: ChronoDuration,
    pub batch_limit: u32,
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub shutdown_grace: StdDuration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            tick_interval: StdDuration::from_secs(30),
            stuck_threshold: ChronoDuration::minutes(30),
            batch_limit: 100,
            worker_count: 4,
            queue_capacity: 100,
            shutdown_grace: StdDuration::from_secs(60),
        }
    }
}

pub struct Poller {
    repository: Arc<dyn TaskRepository>,
    executor: Arc<Executor>,
    clock: Arc<dyn Clock>,
    config: PollerConfig,
}

impl Poller {
    pub fn new(repository: Arc<dyn TaskRepository>, executor: Arc<Executor>, clock: Arc<dyn Clock>, config: PollerConfig) -> Self {
        Self {
            repository,
            executor,
            clock,
            config,
        }
    }

    /// Runs the tick loop until `shutdown` signals `true`. Drains the queue
    /// and waits for in-flight executions up to `shutdown_grace` before
    /// returning; aborted executions remain `processing` and are picked up
    /// by recovery on the next start (§5 cancellation contract).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let (tx, rx) = mpsc::channel::<TaskId>(self.config.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = Vec::with_capacity(self.config.worker_count);
        for _ in 0..self.config.worker_count {
            let executor = self.executor.clone();
            let rx = rx.clone();
            workers.push(tokio::spawn(async move {
                loop {
                    let next = rx.lock().await.recv().await;
                    match next {
                        Some(task_id) => executor.execute(task_id).await,
                        None => break,
                    }
                }
            }));
        }

        let mut interval = tokio::time::interval(self.config.tick_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick(&tx).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        drop(tx);
        let grace = self.config.shutdown_grace;
        let _ = tokio::time::timeout(grace, async {
            for worker in workers {
                let _ = worker.await;
            }
        })
        .await;
    }

    /// One tick: recover stuck tasks, then hand off the due batch. Applies
    /// backpressure by blocking on the bounded channel when workers fall
    /// behind, so the repository is not rescanned for the same tasks.
    async fn tick(&self, tx: &mpsc::Sender<TaskId>) {
        let now = self.clock.now();

        match self.repository.find_stuck(now, self.config.stuck_threshold).await {
            Ok(stuck) => {
                debug!(recovered = stuck.len(), "poller tick: stuck tasks found");
                for task in stuck {
                    self.recover(task, now).await;
                }
            }
            Err(err) => error!(error = %err, "failed to query stuck tasks"),
        }

        match self.repository.due_before(now, self.config.batch_limit).await {
            Ok(due) => {
                debug!(due = due.len(), "poller tick: due tasks found");
                for task in due {
                    if tx.send(task.id).await.is_err() {
                        break;
                    }
                }
            }
            Err(err) => error!(error = %err, "failed to query due tasks"),
        }
    }

    async fn recover(&self, task: Task, now: DateTime<Utc>) {
        let retry_count = task.retry_count + 1;
        let patch = if retry_count > task.max_retries {
            warn!(task_id = %task.id, retry_count, max_retries = task.max_retries, "stuck task exceeded max_retries");
            TaskPatch {
                status: Some(TaskStatus::Failed),
                retry_count: Some(retry_count),
                ..Default::default()
            }
        } else {
            warn!(task_id = %task.id, retry_count, "recovering stuck task");
            TaskPatch {
                status: Some(TaskStatus::Active),
                retry_count: Some(retry_count),
                next_run_at: Some(Some(now)),
                ..Default::default()
            }
        };

        if let Err(err) = self.repository.update(task.id, patch).await {
            error!(task_id = %task.id, error = %err, "failed to persist stuck-task recovery");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scheduler_foundation::{DefaultScheduleCalculator, InMemoryTaskRepository};
    use scheduler_kernel::agent::Agent;
    use scheduler_kernel::clock::SystemClock;
    use scheduler_kernel::error::AgentError;
    use scheduler_kernel::notify::{DispatchError, NotificationSink};
    use scheduler_kernel::schedule::ScheduleConfig;
    use scheduler_kernel::task::{NotificationChannel, TaskType, UserId};
    use uuid::Uuid;

    use crate::dispatcher::NotificationDispatcher;
    use crate::executor::ExecutorConfig;

    struct EchoAgent;

    #[async_trait]
    impl Agent for EchoAgent {
        async fn run(&self, _prompt: &str, _deadline: std::time::Duration) -> Result<String, AgentError> {
            Ok("Acknowledged. 1. Done. I'm here to help if you need anything else at all today.".into())
        }
    }

    struct NullSink;

    #[async_trait]
    impl NotificationSink for NullSink {
        async fn send(&self, _channel: NotificationChannel, _user_id: UserId, _payload: &str) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    fn sample_task(now: DateTime<Utc>, status: TaskStatus, last_run_at: Option<DateTime<Utc>>) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Stretch".into(),
            description: None,
            task_type: TaskType::Reminder,
            schedule: ScheduleConfig::once(now),
            next_run_at: Some(now),
            last_run_at,
            status,
            notification_channels: vec![NotificationChannel::Push],
            ai_context: None,
            last_result: None,
            retry_count: 0,
            max_retries: 3,
            created_at: now,
            updated_at: now,
            quality: None,
            delivery_warnings: Vec::new(),
            occurrence_count: 0,
        }
    }

    fn make_poller(repository: Arc<dyn TaskRepository>, config: PollerConfig) -> Poller {
        let executor = Arc::new(Executor::new(
            repository.clone(),
            Arc::new(EchoAgent),
            Arc::new(DefaultScheduleCalculator),
            Arc::new(SystemClock),
            NotificationDispatcher::new(Arc::new(NullSink)),
            ExecutorConfig::default(),
        ));
        Poller::new(repository, executor, Arc::new(SystemClock), config)
    }

    #[tokio::test]
    async fn one_tick_recovers_stuck_task() {
        let repository: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let now = Utc::now();
        let id = repository
            .insert(sample_task(now, TaskStatus::Processing, Some(now - ChronoDuration::minutes(45))))
            .await
            .unwrap();

        let poller = make_poller(repository.clone(), PollerConfig::default());
        let (tx, _rx) = mpsc::channel(10);
        poller.tick(&tx).await;

        let task = repository.get(id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Active);
        assert_eq!(task.retry_count, 1);
    }

    #[tokio::test]
    async fn stuck_task_past_max_retries_fails() {
        let repository: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let now = Utc::now();
        let mut task = sample_task(now, TaskStatus::Processing, Some(now - ChronoDuration::minutes(45)));
        task.retry_count = 3;
        task.max_retries = 3;
        let id = repository.insert(task).await.unwrap();

        let poller = make_poller(repository.clone(), PollerConfig::default());
        let (tx, _rx) = mpsc::channel(10);
        poller.tick(&tx).await;

        let task = repository.get(id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn one_tick_enqueues_due_tasks() {
        let repository: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let now = Utc::now();
        let due_id = repository.insert(sample_task(now, TaskStatus::Active, None)).await.unwrap();

        let poller = make_poller(repository.clone(), PollerConfig::default());
        let (tx, mut rx) = mpsc::channel(10);
        poller.tick(&tx).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received, due_id);
    }

    #[tokio::test]
    async fn run_processes_a_tick_then_shuts_down_cleanly() {
        let repository: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let now = Utc::now();
        let id = repository.insert(sample_task(now, TaskStatus::Active, None)).await.unwrap();

        let config = PollerConfig {
            tick_interval: StdDuration::from_millis(10),
            shutdown_grace: StdDuration::from_secs(2),
            ..PollerConfig::default()
        };
        let poller = make_poller(repository.clone(), config);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let run_handle = tokio::spawn(async move { poller.run(shutdown_rx).await });
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        run_handle.await.unwrap();

        let task = repository.get(id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
    }
}
