//! Bounded Concurrency Executor
//!
//! Runs a list of async tasks through a fixed pool of workers that drain a
//! shared queue. Results keep the input order no matter which task finishes
//! first, and one failing task never stops its siblings.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use tracing::debug;

use crate::types::{Result, SeoError};

/// Outcome of one task, stored at the task's input index
#[derive(Debug)]
pub enum TaskOutcome<R> {
    Succeeded(R),
    Failed(SeoError),
}

impl<R> TaskOutcome<R> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn ok(self) -> Option<R> {
        match self {
            Self::Succeeded(value) => Some(value),
            Self::Failed(_) => None,
        }
    }
}

impl<R> From<Result<R>> for TaskOutcome<R> {
    fn from(result: Result<R>) -> Self {
        match result {
            Ok(value) => Self::Succeeded(value),
            Err(err) => Self::Failed(err),
        }
    }
}

/// Completion counter handed to progress observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Progress observer, called once per finished task
pub type ProgressFn<'a> = dyn Fn(Progress) + Send + Sync + 'a;

/// Run `task` over every item with at most `concurrency` tasks in flight.
///
/// The returned vector has one outcome per item, at the item's index.
/// A `concurrency` of zero is treated as one.
pub async fn execute_concurrent<T, R, F, Fut>(
    items: Vec<T>,
    task: F,
    concurrency: usize,
    on_progress: Option<&ProgressFn<'_>>,
) -> Vec<TaskOutcome<R>>
where
    F: Fn(T, usize) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = concurrency.max(1).min(total);
    debug!("Executing {} tasks with {} workers", total, workers);

    let queue: Mutex<VecDeque<(usize, T)>> = Mutex::new(items.into_iter().enumerate().collect());
    let slots: Mutex<Vec<Option<TaskOutcome<R>>>> =
        Mutex::new((0..total).map(|_| None).collect());
    let completed = AtomicUsize::new(0);

    let (queue, slots, completed, task) = (&queue, &slots, &completed, &task);
    let worker = move || async move {
        loop {
            // Guard dropped before the await
            let next = queue
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop_front();
            let Some((index, item)) = next else {
                break;
            };

            let outcome = TaskOutcome::from(task(item, index).await);
            slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())[index] = Some(outcome);

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(callback) = on_progress {
                callback(Progress {
                    completed: done,
                    total,
                });
            }
        }
    };

    join_all((0..workers).map(|_| worker())).await;

    std::mem::take(&mut *slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                TaskOutcome::Failed(SeoError::pipeline("executor", "task was never run"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_preserves_order_with_variable_latency() {
        let items: Vec<u64> = vec![30, 5, 20, 1, 10];
        let results = execute_concurrent(
            items.clone(),
            |delay, _| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(delay * 2)
            },
            2,
            None,
        )
        .await;

        let values: Vec<u64> = results.into_iter().filter_map(TaskOutcome::ok).collect();
        assert_eq!(values, vec![60, 10, 40, 2, 20]);
    }

    #[tokio::test]
    async fn test_single_failure_is_isolated() {
        let results = execute_concurrent(
            (0..6).collect::<Vec<u32>>(),
            |n, _| async move {
                if n == 3 {
                    Err(SeoError::LlmApi("boom".to_string()))
                } else {
                    Ok(n)
                }
            },
            3,
            None,
        )
        .await;

        assert_eq!(results.len(), 6);
        for (i, outcome) in results.iter().enumerate() {
            assert_eq!(outcome.is_success(), i != 3, "index {}", i);
        }
    }

    #[tokio::test]
    async fn test_task_receives_its_index() {
        let results = execute_concurrent(
            vec!["a", "b", "c"],
            |item, index| async move { Ok(format!("{}{}", item, index)) },
            8,
            None,
        )
        .await;
        let values: Vec<String> = results.into_iter().filter_map(TaskOutcome::ok).collect();
        assert_eq!(values, vec!["a0", "b1", "c2"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let (in_flight, peak) = (&in_flight, &peak);

        execute_concurrent(
            (0..10).collect::<Vec<u32>>(),
            move |_, _| async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            },
            3,
            None,
        )
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let results =
            execute_concurrent(vec![1, 2], |n, _| async move { Ok(n) }, 0, None).await;
        assert!(results.iter().all(TaskOutcome::is_success));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let seen = Mutex::new(Vec::new());
        let observer = |p: Progress| seen.lock().unwrap().push(p);

        execute_concurrent(
            vec![3u64, 1, 2, 0],
            |delay, _| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                if delay == 1 {
                    Err(SeoError::LlmApi("fail".to_string()))
                } else {
                    Ok(delay)
                }
            },
            2,
            Some(&observer),
        )
        .await;

        let seen = seen.into_inner().unwrap();
        let completed: Vec<usize> = seen.iter().map(|p| p.completed).collect();
        assert_eq!(completed, vec![1, 2, 3, 4]);
        assert!(seen.iter().all(|p| p.total == 4));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let results: Vec<TaskOutcome<u32>> =
            execute_concurrent(Vec::<u32>::new(), |n, _| async move { Ok(n) }, 5, None).await;
        assert!(results.is_empty());
    }

    proptest! {
        #[test]
        fn prop_identity_task_keeps_order(
            items in proptest::collection::vec(any::<i32>(), 0..40),
            concurrency in 1usize..10,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let results = runtime.block_on(execute_concurrent(
                items.clone(),
                |n, _| async move { Ok(n) },
                concurrency,
                None,
            ));
            prop_assert!(results.iter().all(TaskOutcome::is_success));
            let values: Vec<i32> = results.into_iter().filter_map(TaskOutcome::ok).collect();
            prop_assert_eq!(values, items);
        }

        #[test]
        fn prop_one_failure_at_its_index(
            len in 1usize..30,
            pick in any::<prop::sample::Index>(),
            concurrency in 1usize..8,
        ) {
            let failing = pick.index(len);
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let results = runtime.block_on(execute_concurrent(
                (0..len).collect::<Vec<usize>>(),
                |n, _| async move {
                    if n == failing {
                        Err(SeoError::LlmApi("fail".to_string()))
                    } else {
                        Ok(n)
                    }
                },
                concurrency,
                None,
            ));
            for (i, outcome) in results.iter().enumerate() {
                prop_assert_eq!(outcome.is_success(), i != failing);
            }
        }
    }
}
