use std::sync::{ Arc, Condvar, Mutex };
use std::time::{ Duration, Instant };
use crate::lock;
use super::lane::Lane;

struct SemaphoreState {
    count: Mutex<usize>,
    posted: Condvar
}

/// Counting semaphore. `wait` parks the calling thread until a unit is
/// available; everything else in this crate is non-blocking.
#[derive(Clone)]
pub struct Semaphore(Arc<SemaphoreState>);

impl Semaphore {
    pub fn new(initial: usize) -> Semaphore {
        Semaphore(Arc::new(SemaphoreState {
            count: Mutex::new(initial),
            posted: Condvar::new()
        }))
    }

    pub fn signal(&self) {
        *lock!(self.0.count) += 1;
        self.0.posted.notify_one();
    }

    pub fn wait(&self) {
        let mut count = lock!(self.0.count);
        while *count == 0 {
            count = self.0.posted.wait(count).unwrap();
        }
        *count -= 1;
    }

    /// True if a unit was taken, false if the deadline passed first.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = lock!(self.0.count);
        while *count == 0 {
            let now = Instant::now();
            if now >= deadline { return false; }
            let (guard,_) = self.0.posted.wait_timeout(count,deadline-now).unwrap();
            count = guard;
        }
        *count -= 1;
        true
    }
}

/// Run `cb` for each index in `0..count` on the given lane, returning once
/// every invocation has finished. Blocks the calling thread: do not call
/// from a task already running on the joined-on lane's workers.
pub fn parallel_for<F>(count: usize, lane: &Lane, cb: F) where F: Fn(usize) + Send + Sync + 'static {
    let finished = Semaphore::new(0);
    let cb = Arc::new(cb);
    for index in 0..count {
        let finished = finished.clone();
        let cb = cb.clone();
        lane.submit(move || {
            cb(index);
            finished.signal();
        });
    }
    for _ in 0..count { finished.wait(); }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::time::Duration;
    use super::*;

    #[test]
    pub fn test_semaphore_smoke() {
        let semaphore = Semaphore::new(2);
        semaphore.wait();
        semaphore.wait();
        assert!(!semaphore.wait_timeout(Duration::from_millis(20)));
        semaphore.signal();
        assert!(semaphore.wait_timeout(Duration::from_millis(1000)));
    }

    #[test]
    pub fn test_parallel_for() {
        let total = Arc::new(AtomicUsize::new(0));
        let total2 = total.clone();
        parallel_for(100,&Lane::global(),move |index| {
            total2.fetch_add(index,Ordering::SeqCst);
        });
        assert_eq!((0..100).sum::<usize>(),total.load(Ordering::SeqCst));
    }
}
