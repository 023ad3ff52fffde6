//! In-memory queue used by tests, with scripted failures.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::{QueueError, QueueService};

#[derive(Default)]
struct State {
    lists: HashMap<String, VecDeque<String>>,
    values: HashMap<String, (String, Duration)>,
    failing_pushes: u32,
    failing_pops: u32,
    failing_set_ex: u32,
    push_attempts: u32,
    set_ex_calls: u32,
    pings: u32,
}

#[derive(Default)]
pub(crate) struct MemoryQueue {
    state: Mutex<State>,
    pushed: Condvar,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` pushes fail.
    pub fn fail_pushes(&self, n: u32) {
        self.state.lock().failing_pushes = n;
    }

    /// Make the next `n` pops fail.
    pub fn fail_pops(&self, n: u32) {
        self.state.lock().failing_pops = n;
    }

    /// Make the next `n` `set_ex` calls fail.
    pub fn fail_set_ex(&self, n: u32) {
        self.state.lock().failing_set_ex = n;
    }

    /// Oldest-first contents of a list.
    pub fn items(&self, key: &str) -> Vec<String> {
        self.state
            .lock()
            .lists
            .get(key)
            .map(|list| list.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Blocks until `key` holds at least `count` items or `timeout` passes.
    pub fn wait_for_items(&self, key: &str, count: usize, timeout: Duration) -> Vec<String> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.lists.get(key).map_or(0, VecDeque::len) < count {
            if self.pushed.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        drop(state);
        self.items(key)
    }

    pub fn value(&self, key: &str) -> Option<(String, Duration)> {
        self.state.lock().values.get(key).cloned()
    }

    pub fn push_attempts(&self) -> u32 {
        self.state.lock().push_attempts
    }

    pub fn set_ex_calls(&self) -> u32 {
        self.state.lock().set_ex_calls
    }

    pub fn pings(&self) -> u32 {
        self.state.lock().pings
    }
}

impl QueueService for MemoryQueue {
    fn pop(&self, key: &str, timeout: Duration) -> Result<Option<String>, QueueError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        if state.failing_pops > 0 {
            state.failing_pops -= 1;
            return Err(QueueError::Connection("scripted pop failure".into()));
        }
        loop {
            if let Some(item) = state.lists.get_mut(key).and_then(VecDeque::pop_back) {
                return Ok(Some(item));
            }
            if self.pushed.wait_until(&mut state, deadline).timed_out() {
                return Ok(state.lists.get_mut(key).and_then(VecDeque::pop_back));
            }
        }
    }

    fn push(&self, key: &str, value: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        state.push_attempts += 1;
        if state.failing_pushes > 0 {
            state.failing_pushes -= 1;
            return Err(QueueError::Command("scripted push failure".into()));
        }
        state
            .lists
            .entry(key.to_string())
            .or_default()
            .push_front(value.to_string());
        self.pushed.notify_all();
        Ok(())
    }

    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        state.set_ex_calls += 1;
        if state.failing_set_ex > 0 {
            state.failing_set_ex -= 1;
            return Err(QueueError::Command("scripted set_ex failure".into()));
        }
        state
            .values
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    fn ping(&self) -> Result<(), QueueError> {
        self.state.lock().pings += 1;
        Ok(())
    }
}
