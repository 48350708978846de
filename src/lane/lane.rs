use std::collections::VecDeque;
use std::sync::{ Arc, Mutex };
use lazy_static::lazy_static;
use crate::{ lock, warn };
use super::pool::{ self, LaneStats, Pool, PoolConfig, Task };

lazy_static! {
    static ref GLOBAL : Lane = Lane::new_pool(&PoolConfig::new(None),"global");
}

struct SerialState {
    backlog: VecDeque<Task>,
    draining: bool
}

enum LaneKind {
    Pool(Arc<Pool>),
    Concurrent(Mutex<Lane>),
    Serial(Mutex<Lane>,Mutex<SerialState>)
}

struct LaneData {
    identity: u64,
    stats: Arc<Mutex<LaneStats>>,
    kind: LaneKind
}

/// An execution context to which units of work are submitted. Serial lanes
/// run their backlog strictly in submission order, one task at a time.
/// Concurrent lanes impose no ordering. Either sort ultimately delivers onto
/// the root pool it targets; do not create targeting cycles between lanes.
#[derive(Clone)]
pub struct Lane(Arc<LaneData>);

impl Lane {
    fn new(name: &str, kind: &'static str, lane_kind: LaneKind) -> Lane {
        let (identity,stats) = pool::register_lane(name,kind);
        Lane(Arc::new(LaneData { identity, stats, kind: lane_kind }))
    }

    /// The process-wide concurrent lane. A root: nothing can target back into it.
    pub fn global() -> Lane { GLOBAL.clone() }

    /// A concurrent root lane with its own dedicated workers.
    pub fn new_pool(config: &PoolConfig, name: &str) -> Lane {
        Lane::new(name,"pool",LaneKind::Pool(Pool::new(config,name)))
    }

    /// A concurrent lane delegating execution to its target (the global lane
    /// until retargeted).
    pub fn concurrent(name: &str) -> Lane {
        Lane::new(name,"concurrent",LaneKind::Concurrent(Mutex::new(Lane::global())))
    }

    /// A serial lane: strict submission-order execution, one task at a time,
    /// draining onto its target (the global lane until retargeted).
    pub fn serial(name: &str) -> Lane {
        Lane::new(name,"serial",LaneKind::Serial(Mutex::new(Lane::global()),Mutex::new(SerialState {
            backlog: VecDeque::new(),
            draining: false
        })))
    }

    pub fn identity(&self) -> u64 { self.0.identity }

    /// Redirect execution onto another lane. Root pool lanes cannot be retargeted.
    pub fn set_target(&self, target: &Lane) {
        match &self.0.kind {
            LaneKind::Pool(_) => { warn!("cannot retarget a root pool lane"); },
            LaneKind::Concurrent(slot) => { *lock!(slot) = target.clone(); },
            LaneKind::Serial(slot,_) => { *lock!(slot) = target.clone(); }
        }
    }

    /// Non-blocking: enqueue a task and return immediately.
    pub fn submit<F>(&self, cb: F) where F: FnOnce() + Send + 'static {
        lock!(self.0.stats).note_submitted();
        let stats = self.0.stats.clone();
        self.enqueue(Box::new(move || {
            cb();
            lock!(stats).note_executed();
        }));
    }

    fn enqueue(&self, task: Task) {
        match &self.0.kind {
            LaneKind::Pool(pool) => { pool.submit(task); },
            LaneKind::Concurrent(target) => {
                let target = lock!(target).clone();
                target.enqueue(task);
            },
            LaneKind::Serial(_,state) => {
                let start = {
                    let mut state = lock!(state);
                    state.backlog.push_back(task);
                    if state.draining { false } else { state.draining = true; true }
                };
                if start { self.start_drain(); }
            }
        }
    }

    fn start_drain(&self) {
        let target = match &self.0.kind {
            LaneKind::Serial(target,_) => lock!(target).clone(),
            _ => { return; }
        };
        let me = self.clone();
        target.enqueue(Box::new(move || me.run_backlog()));
    }

    fn run_backlog(&self) {
        let state = match &self.0.kind {
            LaneKind::Serial(_,state) => state,
            _ => { return; }
        };
        loop {
            let task = {
                let mut state = lock!(state);
                match state.backlog.pop_front() {
                    Some(task) => task,
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };
            task();
        }
    }

    /// Counter snapshots for every lane created so far.
    pub fn summarize_all() -> Vec<super::pool::LaneSummary> {
        pool::summarize_all_lanes()
    }
}

#[cfg(test)]
mod test {
    use std::sync::{ Arc, Mutex };
    use crate::lane::semaphore::Semaphore;
    use crate::lock;
    use super::*;

    fn submission_order_kept(lane: &Lane, count: usize) {
        let report = Arc::new(Mutex::new(vec![]));
        let finished = Semaphore::new(0);
        for i in 0..count {
            let report = report.clone();
            lane.submit(move || { lock!(report).push(i); });
        }
        let finished2 = finished.clone();
        lane.submit(move || { finished2.signal(); });
        finished.wait();
        let seen = lock!(report).clone();
        assert_eq!((0..count).collect::<Vec<_>>(),seen);
    }

    #[test]
    pub fn test_serial_order_smoke() {
        submission_order_kept(&Lane::serial("test-serial"),200);
    }

    #[test]
    pub fn test_serial_order_retargeted() {
        let pool = Lane::new_pool(&PoolConfig::new(Some(3)),"test-pool");
        let lane = Lane::serial("test-serial-retargeted");
        lane.set_target(&pool);
        submission_order_kept(&lane,200);
    }

    #[test]
    pub fn test_concurrent_runs_everything() {
        let lane = Lane::concurrent("test-concurrent");
        let finished = Semaphore::new(0);
        for _ in 0..50 {
            let finished = finished.clone();
            lane.submit(move || { finished.signal(); });
        }
        for _ in 0..50 { finished.wait(); }
    }

    #[test]
    pub fn test_lane_stats() {
        let lane = Lane::serial("test-stats");
        let finished = Semaphore::new(0);
        for _ in 0..10 {
            lane.submit(|| {});
        }
        let finished2 = finished.clone();
        lane.submit(move || { finished2.signal(); });
        finished.wait();
        let summary = Lane::summarize_all().into_iter()
            .find(|summary| summary.identity() == lane.identity())
            .expect("missing lane summary");
        assert_eq!("test-stats",summary.get_name());
        assert_eq!("serial",summary.get_kind());
        assert_eq!(11,summary.get_submitted());
        /* the sentinel task's own counter lands after it signals */
        assert!(summary.get_executed() >= 10);
    }
}
