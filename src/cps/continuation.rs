use std::sync::Arc;

/// A consumer takes the produced value and yields the overall result.
pub type Consumer<R,A> = Arc<dyn Fn(A) -> R + Send + Sync + 'static>;

type RunFn<R,A> = Arc<dyn Fn(&Consumer<R,A>) -> R + Send + Sync + 'static>;

/// Continuation-passing composition glue: a value that, given a consumer,
/// produces a result by handing the consumer its value. No state and no
/// concurrency of its own; whatever the wrapped function does when invoked
/// supplies both. Reusable: running twice runs the producer twice.
pub struct Continuation<R: 'static, A: 'static>(RunFn<R,A>);

// can't derive Clone on polymorphic types
impl<R,A> Clone for Continuation<R,A> {
    fn clone(&self) -> Self {
        Continuation(self.0.clone())
    }
}

impl<R: 'static, A: 'static> Continuation<R,A> {
    pub fn new<F>(run: F) -> Continuation<R,A>
            where F: Fn(&Consumer<R,A>) -> R + Send + Sync + 'static {
        Continuation(Arc::new(run))
    }

    /// An already-resolved continuation: hands `value` straight to the consumer.
    pub fn of(value: A) -> Continuation<R,A> where A: Clone + Send + Sync {
        Continuation::new(move |consumer| consumer(value.clone()))
    }

    pub fn run(&self, consumer: &Consumer<R,A>) -> R {
        (self.0)(consumer)
    }

    pub fn run_with<F>(&self, consumer: F) -> R
            where F: Fn(A) -> R + Send + Sync + 'static {
        self.run(&(Arc::new(consumer) as Consumer<R,A>))
    }

    /// Transform the eventual value without altering control flow.
    pub fn map<B,F>(&self, cb: F) -> Continuation<R,B>
            where B: 'static, F: Fn(A) -> B + Send + Sync + 'static {
        let source = self.clone();
        let cb = Arc::new(cb);
        Continuation::new(move |consumer: &Consumer<R,B>| {
            let consumer = consumer.clone();
            let cb = cb.clone();
            source.run(&(Arc::new(move |value| consumer(cb(value))) as Consumer<R,A>))
        })
    }

    /// Sequence: the second continuation begins only once the first has
    /// handed its value to a consumer.
    pub fn flat_map<B,F>(&self, cb: F) -> Continuation<R,B>
            where B: 'static, F: Fn(A) -> Continuation<R,B> + Send + Sync + 'static {
        let source = self.clone();
        let cb = Arc::new(cb);
        Continuation::new(move |consumer: &Consumer<R,B>| {
            let consumer = consumer.clone();
            let cb = cb.clone();
            source.run(&(Arc::new(move |value| cb(value).run(&consumer)) as Consumer<R,A>))
        })
    }
}

#[cfg(test)]
mod test {
    use crate::corefutures::promise::Promise;
    use crate::lane::lane::Lane;
    use super::*;

    #[test]
    pub fn test_continuation_smoke() {
        let doubled = Continuation::<i32,i32>::of(3).map(|v| v+1);
        assert_eq!(8,doubled.run_with(|v| v*2));
        /* reusable: same pipeline, second run */
        assert_eq!(8,doubled.run_with(|v| v*2));
    }

    #[test]
    pub fn test_continuation_flat_map_sequences() {
        let chained = Continuation::<String,i32>::of(2)
            .flat_map(|v| Continuation::of(v*10))
            .map(|v| v+1);
        assert_eq!("21",chained.run_with(|v: i32| v.to_string()));
    }

    #[test]
    pub fn test_continuation_defers_to_lane() {
        /* a continuation whose result is a future: the consumer is only
         * handed the value by a lane task */
        let deferred = Continuation::new(|consumer: &Consumer<crate::corefutures::promise::Future<i32>,i32>| {
            let consumer = consumer.clone();
            let result = Promise::new();
            let out = result.future();
            Lane::global().submit(move || {
                result.complete(consumer(5).wait());
            });
            out
        });
        let answer = deferred.map(|v| v*2);
        assert_eq!(100,answer.run_with(|v: i32| {
            let inner = Promise::new();
            inner.complete(v*10);
            inner.future()
        }).wait());
    }
}
