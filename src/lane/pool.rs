use std::collections::VecDeque;
use std::sync::{ Arc, Condvar, Mutex };
use std::thread;
use hashbrown::HashMap;
use lazy_static::lazy_static;
use crate::{ lock, log_extra };

pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// Sizing for the worker pool behind a concurrent root lane. `None` means
/// one worker per unit of available parallelism.
pub struct PoolConfig {
    threads: Option<usize>
}

impl PoolConfig {
    pub fn new(threads: Option<usize>) -> PoolConfig {
        PoolConfig { threads }
    }

    pub(crate) fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            thread::available_parallelism().map(|x| x.get()).unwrap_or(4)
        }).max(2)
    }
}

pub(crate) struct Pool {
    queue: Mutex<VecDeque<Task>>,
    available: Condvar
}

impl Pool {
    pub(crate) fn new(config: &PoolConfig, name: &str) -> Arc<Pool> {
        let pool = Arc::new(Pool {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new()
        });
        let workers = config.thread_count();
        log_extra!("lane pool '{}' starting with {} workers",name,workers);
        for index in 0..workers {
            let pool = pool.clone();
            thread::Builder::new()
                .name(format!("{}-{}",name,index))
                .spawn(move || pool.work())
                .expect("cannot spawn lane worker");
        }
        pool
    }

    pub(crate) fn submit(&self, task: Task) {
        lock!(self.queue).push_back(task);
        self.available.notify_one();
    }

    fn work(&self) {
        loop {
            let task = {
                let mut queue = lock!(self.queue);
                loop {
                    if let Some(task) = queue.pop_front() { break task; }
                    queue = self.available.wait(queue).unwrap();
                }
            };
            task();
        }
    }
}

pub(crate) struct LaneStats {
    name: String,
    kind: &'static str,
    submitted: u64,
    executed: u64
}

impl LaneStats {
    pub(crate) fn note_submitted(&mut self) { self.submitted += 1; }
    pub(crate) fn note_executed(&mut self) { self.executed += 1; }
}

/// A snapshot of one lane's counters, see `Lane::summarize_all`.
#[derive(Clone,Debug)]
pub struct LaneSummary {
    identity: u64,
    name: String,
    kind: &'static str,
    submitted: u64,
    executed: u64
}

impl LaneSummary {
    pub fn identity(&self) -> u64 { self.identity }
    pub fn get_name(&self) -> &str { &self.name }
    pub fn get_kind(&self) -> &str { self.kind }
    pub fn get_submitted(&self) -> u64 { self.submitted }
    pub fn get_executed(&self) -> u64 { self.executed }
}

lazy_static! {
    static ref NEXT_IDENTITY : Arc<Mutex<u64>> = Arc::new(Mutex::new(0));
    static ref LANE_STATS : Arc<Mutex<HashMap<u64,Arc<Mutex<LaneStats>>>>> = Arc::new(Mutex::new(HashMap::new()));
}

pub(crate) fn register_lane(name: &str, kind: &'static str) -> (u64,Arc<Mutex<LaneStats>>) {
    let identity = {
        let mut id = lock!(NEXT_IDENTITY);
        *id += 1;
        *id
    };
    let stats = Arc::new(Mutex::new(LaneStats {
        name: name.to_string(),
        kind,
        submitted: 0,
        executed: 0
    }));
    lock!(LANE_STATS).insert(identity,stats.clone());
    (identity,stats)
}

pub(crate) fn summarize_all_lanes() -> Vec<LaneSummary> {
    let mut out = vec![];
    for (identity,stats) in lock!(LANE_STATS).iter() {
        let stats = lock!(stats);
        out.push(LaneSummary {
            identity: *identity,
            name: stats.name.to_string(),
            kind: stats.kind,
            submitted: stats.submitted,
            executed: stats.executed
        });
    }
    out.sort_by_key(|summary| summary.identity);
    out
}
