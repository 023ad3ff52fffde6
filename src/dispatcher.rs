//! Queue consumer: pulls jobs, runs each under a deadline, publishes one
//! outcome per job.
//!
//! Each job runs on its own execution thread. The dispatcher waits for that
//! thread's completion signal or the deadline, whichever comes first. On
//! deadline expiry a `failed` outcome goes out at once and the thread is left
//! running; if it finishes later it publishes too, so a timed-out task can
//! see a second outcome.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError};

use crate::engine::{EngineError, MatchingEngine};
use crate::publisher::ResultPublisher;
use crate::queue::QueueService;
use crate::task::{ClassificationError, Classifier, Job, JobOutcome, MatchResult};

/// Why a job produced a `failed` outcome.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("classification failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("search failed: {0}")]
    Engine(#[from] EngineError),

    #[error("job crashed: {0}")]
    Crashed(String),

    #[error("job timed out after {0:?}")]
    Timeout(Duration),
}

/// What happened to one dequeued payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    Failed,
    TimedOut,
    /// Undecodable payload; nothing was published
    Discarded,
}

#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub in_key: String,
    /// BRPOP wait; an empty poll just loops
    pub poll_timeout: Duration,
    /// Pause after a dequeue error, before the connectivity check
    pub error_backoff: Duration,
    /// Deadline measured from job receipt
    pub job_timeout: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            in_key: "address_producer".into(),
            poll_timeout: Duration::from_secs(5),
            error_backoff: Duration::from_secs(5),
            job_timeout: Duration::from_secs(30 * 60),
        }
    }
}

pub struct Dispatcher {
    queue: Arc<dyn QueueService>,
    publisher: ResultPublisher,
    classifier: Arc<Classifier>,
    engine: Arc<dyn MatchingEngine>,
    settings: DispatcherSettings,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<dyn QueueService>,
        publisher: ResultPublisher,
        classifier: Classifier,
        engine: Arc<dyn MatchingEngine>,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            queue,
            publisher,
            classifier: Arc::new(classifier),
            engine,
            settings,
        }
    }

    /// Consumes jobs until `shutdown` is raised. Queue errors never end the loop.
    pub fn run(&self, shutdown: &AtomicBool) {
        tracing::info!(
            queue = %self.settings.in_key,
            engine = self.engine.name(),
            timeout_secs = self.settings.job_timeout.as_secs(),
            "listening for jobs"
        );

        while !shutdown.load(Ordering::Relaxed) {
            match self
                .queue
                .pop(&self.settings.in_key, self.settings.poll_timeout)
            {
                Ok(None) => continue,
                Ok(Some(payload)) => {
                    self.handle_payload(&payload);
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        backoff_secs = self.settings.error_backoff.as_secs(),
                        "failed to fetch job"
                    );
                    thread::sleep(self.settings.error_backoff);
                    if let Err(e) = self.queue.ping() {
                        tracing::warn!(error = %e, "queue still unreachable");
                    }
                }
            }
        }

        tracing::info!("dispatcher stopped");
    }

    /// Handles one raw payload end to end.
    pub fn handle_payload(&self, payload: &str) -> DispatchOutcome {
        let received = Instant::now();

        let job = match Job::from_json(payload) {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(error = %e, payload, "discarding undecodable job");
                return DispatchOutcome::Discarded;
            }
        };

        tracing::info!(
            task_id = %job.task_id,
            task_type = %job.task_type,
            custom_format = %job.custom_format,
            "job received"
        );

        let task_id = job.task_id.clone();
        let (done_tx, done_rx) = bounded::<bool>(1);
        let classifier = self.classifier.clone();
        let engine = self.engine.clone();
        let publisher = self.publisher.clone();

        let spawned = thread::Builder::new()
            .name("job-runner".into())
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    process_job(&classifier, engine.as_ref(), &job)
                }))
                .unwrap_or_else(|payload| Err(JobError::Crashed(panic_message(payload))));

                let completed = result.is_ok();
                publisher.publish(&outcome_for(&job.task_id, result));
                let _ = done_tx.try_send(completed);
            });

        if let Err(e) = spawned {
            let error = JobError::Crashed(format!("could not start execution thread: {e}"));
            self.publisher.publish(&outcome_for(&task_id, Err(error)));
            return DispatchOutcome::Failed;
        }

        // A deadline past what `Instant` can represent means no deadline.
        let waited = match received.checked_add(self.settings.job_timeout) {
            Some(deadline) => done_rx.recv_deadline(deadline),
            None => done_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match waited {
            Ok(true) => DispatchOutcome::Completed,
            Ok(false) => DispatchOutcome::Failed,
            Err(RecvTimeoutError::Timeout) => {
                let error = JobError::Timeout(self.settings.job_timeout);
                self.publisher.publish(&outcome_for(&task_id, Err(error)));
                DispatchOutcome::TimedOut
            }
            Err(RecvTimeoutError::Disconnected) => {
                let error = JobError::Crashed("execution thread exited without reporting".into());
                self.publisher.publish(&outcome_for(&task_id, Err(error)));
                DispatchOutcome::Failed
            }
        }
    }
}

/// Classifies a job and runs the search.
pub fn process_job(
    classifier: &Classifier,
    engine: &dyn MatchingEngine,
    job: &Job,
) -> Result<MatchResult, JobError> {
    let spec = classifier.classify(job)?;
    tracing::info!(
        task_id = %job.task_id,
        matching = %spec.template.as_arg(),
        prefix_count = spec.prefix_count,
        suffix_count = spec.suffix_count,
        engine = engine.name(),
        "searching"
    );

    let result = engine.search(&spec)?;
    tracing::info!(
        task_id = %job.task_id,
        address = %result.address,
        total_generated = result.total_generated,
        "address found"
    );
    Ok(result)
}

fn outcome_for(task_id: &str, result: Result<MatchResult, JobError>) -> JobOutcome {
    match result {
        Ok(found) => JobOutcome::completed(task_id, found),
        Err(e) => {
            tracing::error!(task_id = %task_id, reason = %e, "job failed");
            JobOutcome::failed(task_id)
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::memory::MemoryQueue;
    use crate::task::{OutcomeStatus, PatternSpec};

    enum Behaviour {
        Succeed,
        Fail,
        Panic,
        Sleep(Duration),
    }

    struct FakeEngine(Behaviour);

    impl MatchingEngine for FakeEngine {
        fn search(&self, spec: &PatternSpec) -> Result<MatchResult, EngineError> {
            let found = MatchResult {
                private_key: "ab12cd34".into(),
                address: spec.template.as_arg(),
                total_generated: 99,
            };
            match self.0 {
                Behaviour::Succeed => Ok(found),
                Behaviour::Fail => Err(EngineError::NoResult),
                Behaviour::Panic => panic!("engine blew up"),
                Behaviour::Sleep(d) => {
                    thread::sleep(d);
                    Ok(found)
                }
            }
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn settings() -> DispatcherSettings {
        DispatcherSettings {
            in_key: "in".into(),
            poll_timeout: Duration::from_millis(20),
            error_backoff: Duration::from_millis(10),
            job_timeout: Duration::from_secs(10),
        }
    }

    fn dispatcher(queue: &Arc<MemoryQueue>, behaviour: Behaviour, settings: DispatcherSettings) -> Dispatcher {
        let publisher =
            ResultPublisher::new(queue.clone(), "out").with_backoff_unit(Duration::from_millis(1));
        Dispatcher::new(
            queue.clone(),
            publisher,
            Classifier::new("./no-such-template-list.txt"),
            Arc::new(FakeEngine(behaviour)),
            settings,
        )
    }

    fn outcomes(queue: &MemoryQueue) -> Vec<JobOutcome> {
        queue
            .items("out")
            .iter()
            .map(|raw| serde_json::from_str(raw).unwrap())
            .collect()
    }

    const CUSTOM_JOB: &str = r#"{"taskId":"t-1","taskType":"custom_address","customFormat":"TABC-8888"}"#;

    #[test]
    fn test_completed_job_publishes_result() {
        let queue = Arc::new(MemoryQueue::new());
        let dispatcher = dispatcher(&queue, Behaviour::Succeed, settings());

        assert_eq!(dispatcher.handle_payload(CUSTOM_JOB), DispatchOutcome::Completed);

        let published = outcomes(&queue);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].task_id, "t-1");
        assert_eq!(published[0].status, OutcomeStatus::Completed);
        assert_eq!(published[0].result.private_key, "ab12cd34");
        assert_eq!(published[0].result.total_generated, 99);
    }

    #[test]
    fn test_classification_error_publishes_failure() {
        let queue = Arc::new(MemoryQueue::new());
        let dispatcher = dispatcher(&queue, Behaviour::Succeed, settings());

        // Template list does not exist, and the custom format lacks a separator.
        for payload in [
            r#"{"taskId":"a","taskType":"5a"}"#,
            r#"{"taskId":"b","taskType":"custom_address","customFormat":"TABC8888"}"#,
            r#"{"taskId":"c","taskType":"nine"}"#,
        ] {
            assert_eq!(dispatcher.handle_payload(payload), DispatchOutcome::Failed);
        }

        let published = outcomes(&queue);
        let ids: Vec<_> = published.iter().map(|o| o.task_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(published.iter().all(|o| o.status == OutcomeStatus::Failed));
        assert!(published.iter().all(|o| o.result == MatchResult::default()));
    }

    #[test]
    fn test_unmatchable_custom_format_is_not_completed() {
        let queue = Arc::new(MemoryQueue::new());
        let dispatcher = dispatcher(&queue, Behaviour::Succeed, settings());

        for payload in [
            r#"{"taskId":"u1","taskType":"custom_address","customFormat":"T-ä"}"#,
            r#"{"taskId":"u2","taskType":"custom_address","customFormat":"Tä-8"}"#,
        ] {
            assert_eq!(dispatcher.handle_payload(payload), DispatchOutcome::Failed);
        }
        assert!(outcomes(&queue)
            .iter()
            .all(|o| o.status == OutcomeStatus::Failed));
    }

    #[test]
    fn test_unrepresentable_deadline_waits_for_job() {
        let queue = Arc::new(MemoryQueue::new());
        let settings = DispatcherSettings {
            job_timeout: Duration::from_secs(u64::MAX),
            ..settings()
        };
        let dispatcher = dispatcher(&queue, Behaviour::Succeed, settings);

        assert_eq!(dispatcher.handle_payload(CUSTOM_JOB), DispatchOutcome::Completed);
        assert_eq!(outcomes(&queue)[0].status, OutcomeStatus::Completed);
    }

    #[test]
    fn test_engine_error_publishes_failure() {
        let queue = Arc::new(MemoryQueue::new());
        let dispatcher = dispatcher(&queue, Behaviour::Fail, settings());

        assert_eq!(dispatcher.handle_payload(CUSTOM_JOB), DispatchOutcome::Failed);
        assert_eq!(outcomes(&queue)[0].status, OutcomeStatus::Failed);
    }

    #[test]
    fn test_panic_is_contained() {
        let queue = Arc::new(MemoryQueue::new());
        let dispatcher = dispatcher(&queue, Behaviour::Panic, settings());

        assert_eq!(dispatcher.handle_payload(CUSTOM_JOB), DispatchOutcome::Failed);
        assert_eq!(dispatcher.handle_payload(CUSTOM_JOB), DispatchOutcome::Failed);

        let published = outcomes(&queue);
        assert_eq!(published.len(), 2);
        assert!(published.iter().all(|o| o.status == OutcomeStatus::Failed));
    }

    #[test]
    fn test_timeout_publishes_failure_first() {
        let queue = Arc::new(MemoryQueue::new());
        let settings = DispatcherSettings {
            job_timeout: Duration::from_millis(50),
            ..settings()
        };
        let dispatcher = dispatcher(&queue, Behaviour::Sleep(Duration::from_millis(300)), settings);

        assert_eq!(dispatcher.handle_payload(CUSTOM_JOB), DispatchOutcome::TimedOut);

        let published = outcomes(&queue);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].status, OutcomeStatus::Failed);

        // The abandoned execution thread still finishes and publishes.
        let late = queue.wait_for_items("out", 2, Duration::from_secs(5));
        assert_eq!(late.len(), 2);
        let second: JobOutcome = serde_json::from_str(&late[1]).unwrap();
        assert_eq!(second.task_id, "t-1");
        assert_eq!(second.status, OutcomeStatus::Completed);
    }

    #[test]
    fn test_undecodable_payload_is_discarded() {
        let queue = Arc::new(MemoryQueue::new());
        let dispatcher = dispatcher(&queue, Behaviour::Succeed, settings());

        assert_eq!(dispatcher.handle_payload("{oops"), DispatchOutcome::Discarded);
        assert!(queue.items("out").is_empty());
    }

    #[test]
    fn test_loop_survives_bad_payload_and_queue_errors() {
        let queue = Arc::new(MemoryQueue::new());
        let dispatcher = dispatcher(&queue, Behaviour::Succeed, settings());
        queue.fail_pops(1);
        queue.push("in", "not a job").unwrap();
        queue.push("in", CUSTOM_JOB).unwrap();

        let shutdown = AtomicBool::new(false);
        thread::scope(|s| {
            s.spawn(|| dispatcher.run(&shutdown));
            let published = queue.wait_for_items("out", 1, Duration::from_secs(5));
            shutdown.store(true, Ordering::Relaxed);
            assert_eq!(published.len(), 1);
        });

        let published = outcomes(&queue);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].task_id, "t-1");
        assert_eq!(published[0].status, OutcomeStatus::Completed);
        assert!(queue.pings() >= 1);
        assert!(queue.items("in").is_empty());
    }
}
