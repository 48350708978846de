use std::sync::Arc;
use std::sync::atomic::{ AtomicBool, Ordering };
use crate::corefutures::promise::{ Future, Promise };
use crate::derivedfutures::stream::{ Stream, StreamHandler };
use crate::lane::group::TaskGroup;
use crate::lane::lane::Lane;
use crate::sync::lock::Lock;

type Registry<T> = Lock<Vec<StreamHandler<T>>>;

fn add_to_registry<T,F>(registry: &Registry<T>, handler: F)
        where T: Clone + Send + Sync + 'static, F: Fn(T) + Send + Sync + 'static {
    let handler : StreamHandler<T> = Arc::new(handler);
    registry.acquire(move |handlers| { handlers.push(handler); });
}

/// The writable side of a live multicast source: a growing, barrier-protected
/// registry of handlers, each fed every published value. Handlers are never
/// auto-removed.
pub struct ChannelWriter<T: 'static> {
    handlers: Registry<T>
}

// can't derive Clone on polymorphic types
impl<T> Clone for ChannelWriter<T> {
    fn clone(&self) -> Self {
        ChannelWriter { handlers: self.handlers.clone() }
    }
}

impl<T> ChannelWriter<T> where T: Clone + Send + Sync + 'static {
    pub fn new() -> ChannelWriter<T> {
        ChannelWriter { handlers: Lock::new(vec![]) }
    }

    pub fn add_handler<F>(&self, handler: F) where F: Fn(T) + Send + Sync + 'static {
        add_to_registry(&self.handlers,handler);
    }

    /// Deliver `value` to a snapshot of the current registry, one task per
    /// handler on `lane`. Completes once every handler has returned.
    /// Handlers registered after the snapshot do not receive this value.
    pub fn publish(&self, value: T, lane: &Lane) -> Future<()> {
        let lane = lane.clone();
        self.handlers.acquire(|handlers| handlers.clone())
            .flat_map(move |snapshot| {
                let group = TaskGroup::new();
                group.enter();
                for handler in snapshot {
                    group.enter();
                    let group2 = group.clone();
                    let value = value.clone();
                    lane.submit(move || {
                        handler(value);
                        group2.leave();
                    });
                }
                group.leave();
                group.future(&lane)
            })
    }

    /// The read-only capability on the same registry.
    pub fn channel(&self) -> Channel<T> {
        Channel { handlers: self.handlers.clone() }
    }
}

/// Read-only capability on a multicast source: registration and derived
/// pipelines, no publishing.
pub struct Channel<T: 'static> {
    handlers: Registry<T>
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel { handlers: self.handlers.clone() }
    }
}

impl<T> Channel<T> where T: Clone + Send + Sync + 'static {
    pub fn add_handler<F>(&self, handler: F) where F: Fn(T) + Send + Sync + 'static {
        add_to_registry(&self.handlers,handler);
    }

    /// A channel fed `cb` of every value this one receives.
    pub fn map<U,F>(&self, cb: F) -> Channel<U>
            where U: Clone + Send + Sync + 'static, F: Fn(T) -> U + Send + Sync + 'static {
        let writer = ChannelWriter::new();
        let out = writer.channel();
        let lane = Lane::global();
        self.add_handler(move |value| {
            writer.publish(cb(value),&lane);
        });
        out
    }

    /// A channel fed every element of the sub-stream `cb` builds per value.
    pub fn flat_map<U,F>(&self, cb: F) -> Channel<U>
            where U: Clone + Send + Sync + 'static, F: Fn(T) -> Stream<U> + Send + Sync + 'static {
        let writer = ChannelWriter::new();
        let out = writer.channel();
        let lane = Lane::global();
        self.add_handler(move |value| {
            let writer = writer.clone();
            let publish_lane = lane.clone();
            cb(value).for_each(move |item| {
                writer.publish(item,&publish_lane);
            },&lane);
        });
        out
    }

    /// A channel fed the values satisfying the predicate.
    pub fn filter<F>(&self, predicate: F) -> Channel<T>
            where F: Fn(&T) -> bool + Send + Sync + 'static {
        let writer = ChannelWriter::new();
        let out = writer.channel();
        let lane = Lane::global();
        self.add_handler(move |value| {
            if predicate(&value) {
                writer.publish(value,&lane);
            }
        });
        out
    }

    /// A channel fed by both sources.
    pub fn concat(&self, other: &Channel<T>) -> Channel<T> {
        let writer = ChannelWriter::new();
        let out = writer.channel();
        let lane = Lane::global();
        let writer2 = writer.clone();
        let lane2 = lane.clone();
        self.add_handler(move |value| { writer.publish(value,&lane); });
        other.add_handler(move |value| { writer2.publish(value,&lane2); });
        out
    }

    /// One-shot view of the next published value. The registered handler
    /// disarms itself after first delivery: later publishes pass it by
    /// rather than faulting the writer.
    pub fn next(&self) -> Future<T> {
        let result = Promise::new();
        let out = result.future();
        let spent = Arc::new(AtomicBool::new(false));
        self.add_handler(move |value| {
            if !spent.swap(true,Ordering::SeqCst) {
                result.complete(value);
            }
        });
        out
    }
}
