#[cfg(test)]
#[path = "timers_test.rs"]
mod tests;

use std::future::Future;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;

/// Process-wide map of per-id scheduled tasks. Scheduling for an id aborts
/// whatever was pending for that id, so rapid repeats (rename after rename)
/// collapse to the latest task and nothing leaks.
#[derive(Default)]
pub struct Timers {
    tasks: DashMap<String, JoinHandle<()>>,
}

impl Timers {
    pub fn schedule<F>(&self, id: &str, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        if let Some(previous) = self.tasks.insert(id.to_string(), handle) {
            previous.abort();
        }
    }

    pub fn cancel(&self, id: &str) {
        if let Some((_, handle)) = self.tasks.remove(id) {
            handle.abort();
        }
    }
}
