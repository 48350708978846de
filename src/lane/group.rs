use std::sync::{ Arc, Mutex };
use crate::lock;
use crate::corefutures::promise::{ Future, Promise };
use super::lane::Lane;

struct TaskGroupState {
    outstanding: usize,
    watchers: Vec<(Promise<()>,Lane)>
}

/// Counts work in flight. Submitters pair `enter` with a `leave` from the
/// task itself; `future` yields a completion signal for the moment the
/// count next sits at zero. Reusable: entering again re-arms the group.
#[derive(Clone)]
pub struct TaskGroup(Arc<Mutex<TaskGroupState>>);

impl TaskGroup {
    pub fn new() -> TaskGroup {
        TaskGroup(Arc::new(Mutex::new(TaskGroupState {
            outstanding: 0,
            watchers: vec![]
        })))
    }

    pub fn enter(&self) {
        lock!(self.0).outstanding += 1;
    }

    pub fn leave(&self) {
        let watchers = {
            let mut state = lock!(self.0);
            if state.outstanding == 0 {
                drop(state);
                panic!("task group left more often than entered!");
            }
            state.outstanding -= 1;
            if state.outstanding == 0 {
                state.watchers.drain(..).collect()
            } else {
                vec![]
            }
        };
        for (promise,lane) in watchers {
            promise.complete_on((),&lane);
        }
    }

    /// Completion signal, delivered on `lane`. Completes immediately (but
    /// still asynchronously) if nothing is outstanding.
    pub fn future(&self, lane: &Lane) -> Future<()> {
        let promise = Promise::new();
        let out = promise.future();
        let idle = {
            let mut state = lock!(self.0);
            if state.outstanding == 0 {
                true
            } else {
                state.watchers.push((promise.clone(),lane.clone()));
                false
            }
        };
        if idle {
            promise.complete_on((),lane);
        }
        out
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;
    use super::*;

    #[test]
    pub fn test_group_completion() {
        let group = TaskGroup::new();
        let lane = Lane::global();
        group.enter();
        for _ in 0..20 {
            group.enter();
            let group2 = group.clone();
            lane.submit(move || {
                std::thread::sleep(Duration::from_millis(1));
                group2.leave();
            });
        }
        let done = group.future(&lane);
        assert!(done.wait_timeout(Duration::from_millis(50)).is_err());
        group.leave();
        done.wait();
    }

    #[test]
    pub fn test_group_idle_completes_immediately() {
        let group = TaskGroup::new();
        group.future(&Lane::global()).wait();
    }
}
