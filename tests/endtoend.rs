use std::collections::HashMap;
use std::panic::{ catch_unwind, AssertUnwindSafe };
use std::sync::{ Arc, Barrier, Mutex };
use std::thread;
use std::time::Duration;
use signalman::{ lock, ChannelWriter, Lane, Lock, Promise, Semaphore, Stream };

#[test]
pub fn test_exactly_once_completion() {
    /* setup */
    let promise : Promise<usize> = Promise::new();
    let observed = promise.future();
    let racers = 8;
    let start = Arc::new(Barrier::new(racers));
    /* simulate: every racer attempts to complete */
    let mut joins = vec![];
    for index in 0..racers {
        let promise = promise.clone();
        let start = start.clone();
        joins.push(thread::spawn(move || {
            start.wait();
            catch_unwind(AssertUnwindSafe(|| promise.complete(index))).is_ok()
        }));
    }
    let outcomes = joins.into_iter()
        .map(|join| join.join().expect("racer thread died outside the completion call"))
        .collect::<Vec<_>>();
    /* verify: one success, the rest are protocol violations */
    let successes = outcomes.iter().filter(|ok| **ok).count();
    assert_eq!(1,successes);
    assert_eq!(racers-1,outcomes.iter().filter(|ok| !**ok).count());
    assert!(observed.wait() < racers);
}

#[test]
pub fn test_registration_order_independence() {
    let promise = Promise::new();
    let future = promise.future();
    let deliveries = Arc::new(Mutex::new(vec![]));
    let arrived = Semaphore::new(0);
    let (deliveries2,arrived2) = (deliveries.clone(),arrived.clone());
    future.on_complete(move |value| {
        lock!(deliveries2).push(("before",value));
        arrived2.signal();
    });
    promise.complete(17);
    let (deliveries3,arrived3) = (deliveries.clone(),arrived.clone());
    future.on_complete(move |value| {
        lock!(deliveries3).push(("after",value));
        arrived3.signal();
    });
    arrived.wait();
    arrived.wait();
    /* both handlers saw the same value exactly once */
    let mut report = lock!(deliveries).clone();
    report.sort();
    assert_eq!(vec![("after",17),("before",17)],report);
    assert_eq!(17,future.wait());
}

#[test]
pub fn test_wait_timeout_boundaries() {
    let promise : Promise<u8> = Promise::new();
    let future = promise.future();
    /* completion well after the deadline: absent */
    assert!(future.wait_timeout(Duration::from_millis(40)).is_err());
    let completer = {
        let promise = promise.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(80));
            promise.complete(3);
        })
    };
    /* completion well before the deadline: present */
    assert_eq!(Ok(3),future.wait_timeout(Duration::from_secs(30)));
    completer.join().expect("completer thread panicked");
}

fn fidelity_on(lane: &Lane, count: usize) {
    let seen = Arc::new(Mutex::new(HashMap::new()));
    let seen2 = seen.clone();
    Stream::from_collection(0..count)
        .for_each(move |item| { *lock!(seen2).entry(item).or_insert(0u32) += 1; },lane)
        .wait();
    let seen = lock!(seen);
    assert_eq!(count,seen.len());
    assert!(seen.values().all(|arrivals| *arrivals == 1));
}

#[test]
pub fn test_stream_fidelity_concurrent() {
    fidelity_on(&Lane::global(),20000);
}

#[test]
pub fn test_stream_fidelity_serial() {
    fidelity_on(&Lane::serial("fidelity-serial"),20000);
}

#[test]
pub fn test_sequential_reduction_determinism() {
    let total = Stream::from_collection(0..50000i64)
        .reduce(0,|total,item| total+item)
        .wait();
    assert_eq!(1249975000,total);
}

#[test]
pub fn test_concurrent_reduction_matches_sequential() {
    let total = Stream::from_collection(0..50000i64)
        .reduce_merge(0,|a,b| a+b,|partial,item| partial+item)
        .wait();
    assert_eq!(1249975000,total);
}

#[test]
pub fn test_filter_equivalent_to_flat_map() {
    let collect = |stream: &Stream<i32>| {
        let seen = Arc::new(Mutex::new(vec![]));
        let seen2 = seen.clone();
        stream.for_each(move |item| { lock!(seen2).push(item); },&Lane::global()).wait();
        let mut out = lock!(seen).clone();
        out.sort();
        out
    };
    let keep_odd = collect(&Stream::from_collection(0..500).filter(|v| v%2 == 1));
    let via_flat_map = collect(&Stream::from_collection(0..500)
        .flat_map(|v| if v%2 == 1 { Stream::of(v) } else { Stream::empty() }));
    assert_eq!(keep_odd,via_flat_map);
}

#[test]
pub fn test_lock_has_no_lost_updates() {
    let counter = Lock::new(0u32);
    let workers = 8u32;
    let per_worker = 100u32;
    let mut joins = vec![];
    for _ in 0..workers {
        let counter = counter.clone();
        joins.push(thread::spawn(move || {
            for _ in 0..per_worker {
                counter.acquire(|value| { *value += 1; }).wait();
            }
        }));
    }
    for join in joins {
        join.join().expect("incrementer thread panicked");
    }
    assert_eq!(workers*per_worker,counter.get().wait());
}

#[test]
pub fn test_channel_snapshot_end_to_end() {
    let writer = ChannelWriter::new();
    let early = Arc::new(Mutex::new(vec![]));
    let early2 = early.clone();
    writer.add_handler(move |value| { lock!(early2).push(value); });
    writer.publish("first",&Lane::global()).wait();
    let late = Arc::new(Mutex::new(vec![]));
    let late2 = late.clone();
    writer.add_handler(move |value| { lock!(late2).push(value); });
    writer.publish("second",&Lane::global()).wait();
    assert_eq!(vec!["first","second"],*lock!(early));
    assert_eq!(vec!["second"],*lock!(late));
}
