use futures::task::{ Context, Waker };
use std::mem;
use std::pin::Pin;
use std::sync::{ Arc, Mutex };
use std::task::Poll;
use std::time::Duration;
use std::fmt;
use crate::{ error, lock };
use crate::error::WaitTimeout;
use crate::lane::lane::Lane;
use crate::lane::semaphore::Semaphore;

type WaiterFn<T> = Box<dyn FnOnce(T) + Send + 'static>;

/* The cell is a tagged variant behind one exclusive gate. Pending->Completed
 * is the only transition and happens by swapping the variant while the gate
 * is held; a second completion attempt is a protocol violation and faults.
 * The gate is never held across a waiter invocation and never schedules
 * work itself, so no lane topology can close a wait cycle through it.
 */
enum PromiseState<T> {
    Pending(Vec<WaiterFn<T>>,Vec<Waker>),
    Completed(T)
}

/// The writable side of a one-shot completion cell. Completes at most once;
/// waiters always hear about it asynchronously, on a lane.
pub struct Promise<T>(Arc<Mutex<PromiseState<T>>>);

// can't derive Clone on polymorphic types
impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise(self.0.clone())
    }
}

#[cfg(debug_assertions)]
impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,"...Promise...")
    }
}

/// Read-only view of a `Promise`. Observes the cell, never owns it.
pub struct Future<T>(Arc<Mutex<PromiseState<T>>>);

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Future(self.0.clone())
    }
}

#[cfg(debug_assertions)]
impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,"...Future...")
    }
}

impl<T> Promise<T> where T: Clone + Send + 'static {
    /// Create a cell in the Pending state with no waiters.
    pub fn new() -> Promise<T> {
        Promise(Arc::new(Mutex::new(PromiseState::Pending(vec![],vec![]))))
    }

    /// The read-only capability for this cell.
    pub fn future(&self) -> Future<T> {
        Future(self.0.clone())
    }

    /// Complete, dispatching waiters on the global lane.
    pub fn complete(&self, value: T) {
        self.complete_on(value,&Lane::global());
    }

    /// Complete, dispatching every registered waiter asynchronously on the
    /// given lane. Never invokes a waiter on the caller's stack. Completing
    /// an already-completed cell is a protocol violation and faults the
    /// process; the cell keeps its first value.
    pub fn complete_on(&self, value: T, lane: &Lane) {
        let (waiters,wakers) = {
            let mut state = lock!(self.0);
            match mem::replace(&mut *state,PromiseState::Completed(value.clone())) {
                PromiseState::Pending(waiters,wakers) => (waiters,wakers),
                PromiseState::Completed(first) => {
                    *state = PromiseState::Completed(first);
                    drop(state);
                    error!("promise completed twice!");
                    panic!("promise completed twice!");
                }
            }
        };
        for waiter in waiters {
            let value = value.clone();
            lane.submit(move || waiter(value));
        }
        for waker in wakers {
            waker.wake();
        }
    }
}

impl<T> Future<T> where T: Clone + Send + 'static {
    /// Register a waiter. If the cell is still Pending the waiter joins the
    /// list under the gate, so registration races safely with a concurrent
    /// complete. If already Completed the waiter is scheduled on the global
    /// lane: still asynchronous, never inline.
    pub fn on_complete<F>(&self, cb: F) where F: FnOnce(T) + Send + 'static {
        let mut state = lock!(self.0);
        match &mut *state {
            PromiseState::Pending(waiters,_) => {
                waiters.push(Box::new(cb));
            },
            PromiseState::Completed(value) => {
                let value = value.clone();
                Lane::global().submit(move || cb(value));
            }
        }
    }

    /// A future holding `cb` of this one's value. No thread blocks.
    pub fn map<U,F>(&self, cb: F) -> Future<U>
            where U: Clone + Send + 'static, F: FnOnce(T) -> U + Send + 'static {
        let derived = Promise::new();
        let out = derived.future();
        self.on_complete(move |value| derived.complete(cb(value)));
        out
    }

    /// Sequence a future-returning `cb` after this future.
    pub fn flat_map<U,F>(&self, cb: F) -> Future<U>
            where U: Clone + Send + 'static, F: FnOnce(T) -> Future<U> + Send + 'static {
        let derived = Promise::new();
        let out = derived.future();
        self.on_complete(move |value| {
            cb(value).on_complete(move |inner| derived.complete(inner));
        });
        out
    }

    /// Applicative: apply an eventual function to this eventual value.
    pub fn apply<U>(&self, cb: &Future<Arc<dyn Fn(T) -> U + Send + Sync + 'static>>) -> Future<U>
            where U: Clone + Send + 'static {
        let derived = Promise::new();
        let out = derived.future();
        let value_future = self.clone();
        cb.on_complete(move |func| {
            value_future.on_complete(move |value| derived.complete(func(value)));
        });
        out
    }

    /// Blocking adapter: park the calling thread until completion.
    pub fn wait(&self) -> T {
        let ready = Semaphore::new(0);
        let slot = Arc::new(Mutex::new(None));
        let (ready2,slot2) = (ready.clone(),slot.clone());
        self.on_complete(move |value| {
            *lock!(slot2) = Some(value);
            ready2.signal();
        });
        ready.wait();
        let mut guard = lock!(slot);
        guard.take().unwrap()
    }

    /// Blocking adapter with a deadline. A timeout abandons observation
    /// only: whatever will complete the cell still runs.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T,WaitTimeout> {
        let ready = Semaphore::new(0);
        let slot = Arc::new(Mutex::new(None));
        let (ready2,slot2) = (ready.clone(),slot.clone());
        self.on_complete(move |value| {
            *lock!(slot2) = Some(value);
            ready2.signal();
        });
        if ready.wait_timeout(timeout) {
            Ok(lock!(slot).take().unwrap())
        } else {
            Err(WaitTimeout)
        }
    }
}

impl<T> std::future::Future for Future<T> where T: Clone + Send + 'static {
    type Output = T;

    fn poll(self: Pin<&mut Self>, ctx: &mut Context) -> Poll<T> {
        let mut state = lock!(self.0);
        match &mut *state {
            PromiseState::Completed(value) => Poll::Ready(value.clone()),
            PromiseState::Pending(_,wakers) => {
                // every poll's waker is kept: with multiple observers,
                // waking only the latest loses wakeups
                wakers.push(ctx.waker().clone());
                Poll::Pending
            }
        }
    }
}
