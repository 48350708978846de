use std::sync::Arc;
use crate::corefutures::promise::Future;
use crate::lane::group::TaskGroup;
use crate::lane::lane::Lane;
use crate::sync::lock::Lock;

/// Per-element delivery callback for a driven stream.
pub type StreamHandler<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

type DriveFn<T> = Arc<dyn Fn(&StreamHandler<T>,&Lane,&TaskGroup) + Send + Sync + 'static>;

/* A stream is continuation-passing glue over a traversal: driving it hands
 * every element to the handler as an independently schedulable task on the
 * chosen lane, inside the caller's task group. The group only reaches zero
 * once every element task (nested sub-streams included) has run, which is
 * what lets the terminal operations hand back an honest completion future.
 */

/// A lazy push-based sequence. Stateless and reusable: nothing runs until a
/// terminal operation drives it, and driving twice re-runs the source twice.
pub struct Stream<T: 'static>(DriveFn<T>);

// can't derive Clone on polymorphic types
impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream(self.0.clone())
    }
}

impl<T> Stream<T> where T: Clone + Send + Sync + 'static {
    fn new(drive: DriveFn<T>) -> Stream<T> {
        Stream(drive)
    }

    /// One element per member of the collection; the lane chosen at drive
    /// time decides whether they run in parallel or strictly serially.
    pub fn from_collection<I>(items: I) -> Stream<T> where I: IntoIterator<Item=T> {
        let items : Arc<Vec<T>> = Arc::new(items.into_iter().collect());
        Stream::new(Arc::new(move |handler,lane,group| {
            for item in items.iter() {
                group.enter();
                let handler = handler.clone();
                let group = group.clone();
                let item = item.clone();
                lane.submit(move || {
                    handler(item);
                    group.leave();
                });
            }
        }))
    }

    /// The stream with no elements.
    pub fn empty() -> Stream<T> {
        Stream::new(Arc::new(|_,_,_| {}))
    }

    /// The one-element stream.
    pub fn of(item: T) -> Stream<T> {
        Stream::from_collection(vec![item])
    }

    /// Both streams' elements; on a serial lane `self` runs first.
    pub fn concat(&self, other: &Stream<T>) -> Stream<T> {
        let first = self.clone();
        let second = other.clone();
        Stream::new(Arc::new(move |handler,lane,group| {
            (first.0)(handler,lane,group);
            (second.0)(handler,lane,group);
        }))
    }

    /// Transform each element.
    pub fn map<U,F>(&self, cb: F) -> Stream<U>
            where U: Clone + Send + Sync + 'static, F: Fn(T) -> U + Send + Sync + 'static {
        let source = self.clone();
        let cb = Arc::new(cb);
        Stream::new(Arc::new(move |handler,lane,group| {
            let handler = handler.clone();
            let cb = cb.clone();
            let inner : StreamHandler<T> = Arc::new(move |item| handler(cb(item)));
            (source.0)(&inner,lane,group);
        }))
    }

    /// Substitute a whole sub-stream per element. Sub-streams inherit the
    /// lane the traversal is driven on, so the source's concurrency policy
    /// carries through.
    pub fn flat_map<U,F>(&self, cb: F) -> Stream<U>
            where U: Clone + Send + Sync + 'static, F: Fn(T) -> Stream<U> + Send + Sync + 'static {
        let source = self.clone();
        let cb = Arc::new(cb);
        Stream::new(Arc::new(move |handler,lane,group| {
            let handler = handler.clone();
            let cb = cb.clone();
            let lane2 = lane.clone();
            let group2 = group.clone();
            let inner : StreamHandler<T> = Arc::new(move |item| {
                (cb(item).0)(&handler,&lane2,&group2);
            });
            (source.0)(&inner,lane,group);
        }))
    }

    /// Keep elements satisfying the predicate: flat_map into a one-element
    /// or empty sub-stream.
    pub fn filter<F>(&self, predicate: F) -> Stream<T>
            where F: Fn(&T) -> bool + Send + Sync + 'static {
        self.flat_map(move |item| {
            if predicate(&item) { Stream::of(item) } else { Stream::empty() }
        })
    }

    fn drive(&self, handler: StreamHandler<T>, lane: &Lane) -> Future<()> {
        let group = TaskGroup::new();
        /* the driver's own enter spans submission, so the group cannot
         * touch zero while the traversal is still producing tasks */
        group.enter();
        (self.0)(&handler,lane,&group);
        group.leave();
        group.future(lane)
    }

    /// Terminal: deliver every element to `handler` on `lane`. The future
    /// completes once every handler invocation has returned. No delivery
    /// ordering beyond what the lane provides.
    pub fn for_each<F>(&self, handler: F, lane: &Lane) -> Future<()>
            where F: Fn(T) + Send + Sync + 'static {
        self.drive(Arc::new(handler),lane)
    }

    /// Terminal: pseudo-serial reduction. Elements arrive concurrently but
    /// fold into one barrier-protected accumulator one at a time, so only
    /// commutativity of `combine` is required.
    pub fn reduce<R,F>(&self, initial: R, combine: F) -> Future<R>
            where R: Clone + Send + Sync + 'static, F: Fn(&R,T) -> R + Send + Sync + 'static {
        let accumulator = Lock::new(initial);
        let folder = accumulator.clone();
        let combine = Arc::new(combine);
        let driven = self.for_each(move |item| {
            let combine = combine.clone();
            folder.mutate(move |current| combine(current,item));
        },&Lane::global());
        driven.flat_map(move |_| accumulator.get())
    }

    /// Terminal: fully concurrent reduction over a pool of interchangeable
    /// partial accumulators. Each element takes a partial out of the pool
    /// (seeding a fresh identity if it is momentarily empty), combines
    /// outside the barrier, and returns it; leftovers fold via `merger`.
    /// Requires identity, commutativity of `combine` and `merger`, and
    /// `combine(merger(a,b),x) == merger(a,combine(b,x))`: the number of
    /// live partials and the arrival order are both unspecified, so any
    /// valid fold order must agree.
    pub fn reduce_merge<R,M,C>(&self, identity: R, merger: M, combine: C) -> Future<R>
            where R: Clone + Send + Sync + 'static,
                  M: Fn(R,R) -> R + Send + 'static,
                  C: Fn(R,T) -> R + Send + Sync + 'static {
        let lane = Lane::global();
        let partials : Lock<Vec<R>> = Lock::new(vec![identity.clone()]);
        let group = TaskGroup::new();
        let combine = Arc::new(combine);
        let handler = {
            let partials = partials.clone();
            let group = group.clone();
            let identity = identity.clone();
            let handler : StreamHandler<T> = Arc::new(move |item| {
                /* the element's chain is asynchronous, so it holds its own
                 * group membership until the partial is back in the pool */
                group.enter();
                let combine = combine.clone();
                let identity = identity.clone();
                let returned = partials.clone();
                let group = group.clone();
                partials.acquire(move |pool| pool.pop().unwrap_or(identity))
                    .on_complete(move |partial| {
                        let updated = combine(partial,item);
                        returned.acquire(move |pool| { pool.push(updated); })
                            .on_complete(move |_| group.leave());
                    });
            });
            handler
        };
        group.enter();
        (self.0)(&handler,&lane,&group);
        group.leave();
        let folder = partials.clone();
        group.future(&lane).flat_map(move |_| {
            folder.acquire(move |pool| {
                let mut merged = pool.pop().unwrap_or(identity);
                while let Some(partial) = pool.pop() {
                    merged = merger(merged,partial);
                }
                merged
            })
        })
    }
}
