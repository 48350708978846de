use std::sync::{ Arc, Mutex };
use crate::lock;
use crate::corefutures::promise::{ Future, Promise };
use crate::lane::lane::Lane;

/// A mutual-exclusion cell. All observation and mutation of the protected
/// value rides a private serial lane, so operations on one `Lock` never
/// overlap and run in submission order. Writes are fire-and-forget; reads
/// and `acquire` hand back futures.
pub struct Lock<T> {
    value: Arc<Mutex<T>>,
    barrier: Lane
}

// can't derive Clone on polymorphic types
impl<T> Clone for Lock<T> {
    fn clone(&self) -> Self {
        Lock {
            value: self.value.clone(),
            barrier: self.barrier.clone()
        }
    }
}

impl<T> Lock<T> where T: Send + 'static {
    pub fn new(value: T) -> Lock<T> {
        Lock {
            value: Arc::new(Mutex::new(value)),
            barrier: Lane::serial("lock")
        }
    }

    /// Snapshot the protected value.
    pub fn get(&self) -> Future<T> where T: Clone {
        let result = Promise::new();
        let out = result.future();
        let value = self.value.clone();
        self.barrier.submit(move || {
            let snapshot = lock!(value).clone();
            result.complete(snapshot);
        });
        out
    }

    /// Replace the protected value.
    pub fn set(&self, replacement: T) {
        let value = self.value.clone();
        self.barrier.submit(move || {
            *lock!(value) = replacement;
        });
    }

    /// Replace the protected value with `cb` of it.
    pub fn mutate<F>(&self, cb: F) where F: FnOnce(&T) -> T + Send + 'static {
        let value = self.value.clone();
        self.barrier.submit(move || {
            let mut guard = lock!(value);
            let replacement = cb(&*guard);
            *guard = replacement;
        });
    }

    /// Exclusive read-modify access; the future carries whatever `cb`
    /// returns. `cb` must not wait on another operation of this same Lock,
    /// even transitively: the barrier does not release until it returns.
    pub fn acquire<U,F>(&self, cb: F) -> Future<U>
            where U: Clone + Send + 'static, F: FnOnce(&mut T) -> U + Send + 'static {
        let result = Promise::new();
        let out = result.future();
        let value = self.value.clone();
        self.barrier.submit(move || {
            let computed = cb(&mut *lock!(value));
            result.complete(computed);
        });
        out
    }
}

#[cfg(test)]
mod test {
    use std::thread;
    use super::*;

    #[test]
    pub fn test_lock_smoke() {
        let cell = Lock::new(1);
        cell.set(2);
        cell.mutate(|v| v+10);
        assert_eq!(12,cell.get().wait());
    }

    #[test]
    pub fn test_lock_no_lost_updates() {
        let cell = Lock::new(0);
        let mut joins = vec![];
        for _ in 0..16 {
            let cell = cell.clone();
            joins.push(thread::spawn(move || {
                for _ in 0..50 {
                    cell.acquire(|v| { *v += 1; }).wait();
                }
            }));
        }
        for join in joins {
            join.join().expect("incrementer thread panicked");
        }
        assert_eq!(16*50,cell.get().wait());
    }

    #[test]
    pub fn test_lock_reads_never_tear() {
        /* writes keep the pair equal; a torn read would see them differ */
        let cell = Lock::new((0u64,0u64));
        let writer_cell = cell.clone();
        let writer = thread::spawn(move || {
            for i in 1..200 {
                writer_cell.mutate(move |_| (i,i));
            }
        });
        for _ in 0..100 {
            let (a,b) = cell.get().wait();
            assert_eq!(a,b);
        }
        writer.join().expect("writer thread panicked");
    }

    #[test]
    pub fn test_lock_fifo_between_threads_and_ops() {
        let cell = Lock::new(0);
        for i in 1..100 {
            cell.set(i);
            assert_eq!(i,cell.get().wait());
        }
    }
}
