//! End-to-end delivery tests across threads: completeness, no duplicate
//! delivery, and the main-thread guarantee.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use beacon_core::{ActionId, Notice, Observer, payload};
use beacon_runtime::{MainThread, Subject};

struct Counter {
    accepts: Option<&'static str>,
    hits: AtomicUsize,
    seen_on: Mutex<Vec<thread::ThreadId>>,
}

impl Counter {
    fn new() -> Arc<Self> {
        Self::accepting(None)
    }

    fn accepting(accepts: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            accepts,
            hits: AtomicUsize::new(0),
            seen_on: Mutex::new(Vec::new()),
        })
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Observer for Counter {
    fn can_handle(&self, action: &ActionId) -> bool {
        self.accepts.is_none_or(|name| action.as_str() == name)
    }

    fn on_notify(&self, _action: &ActionId, _notice: &Notice) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.seen_on.lock().unwrap().push(thread::current().id());
    }
}

#[test]
fn every_live_observer_is_attempted_exactly_once() {
    let subject = Subject::new("feed");
    let observers: Vec<Arc<Counter>> = (0..32).map(|_| Counter::new()).collect();
    let dyns: Vec<Arc<dyn Observer>> = observers
        .iter()
        .map(|o| -> Arc<dyn Observer> { o.clone() })
        .collect();
    for obs in &dyns {
        subject.register(obs);
    }

    subject.notify("tick", Some(payload(1u64)));

    for obs in &observers {
        assert_eq!(obs.hits(), 1);
    }
}

#[test]
fn notifications_from_many_threads_deliver_once_each() {
    let subject = Subject::new("feed");
    let counter = Counter::new();
    let counter_dyn: Arc<dyn Observer> = counter.clone();
    subject.register(&counter_dyn);

    let notifiers = 8;
    let per_thread = 25;
    thread::scope(|s| {
        for _ in 0..notifiers {
            let subject = subject.clone();
            s.spawn(move || {
                for _ in 0..per_thread {
                    subject.notify("tick", None);
                }
            });
        }
    });

    assert_eq!(counter.hits(), notifiers * per_thread);
}

#[test]
fn notify_on_runs_handlers_on_the_designated_thread() {
    let mt = MainThread::start();
    let handle = mt.handle();

    let subject = Subject::new("feed");
    let counter = Counter::new();
    let counter_dyn: Arc<dyn Observer> = counter.clone();
    subject.register(&counter_dyn);

    // From the test thread.
    subject.notify_on(&handle, "tick", Some(payload(9i32))).unwrap();

    // From a few worker threads concurrently.
    thread::scope(|s| {
        for _ in 0..4 {
            let subject = subject.clone();
            let handle = handle.clone();
            s.spawn(move || {
                subject.notify_on(&handle, "tick", None).unwrap();
            });
        }
    });

    assert_eq!(counter.hits(), 5);
    let seen = counter.seen_on.lock().unwrap();
    assert!(seen.iter().all(|id| *id == handle.thread_id()));
}

#[test]
fn handler_can_reenter_notify_on_without_deadlock() {
    struct Chain {
        subject: Subject,
        handle: beacon_runtime::MainThreadHandle,
        downstream: Arc<Counter>,
        depth: AtomicUsize,
    }

    impl Observer for Chain {
        fn can_handle(&self, action: &ActionId) -> bool {
            action.as_str() == "first"
        }

        fn on_notify(&self, _action: &ActionId, _notice: &Notice) {
            // Already on the designated thread here; the fast path must
            // take over or this would deadlock against our own queue.
            if self.depth.fetch_add(1, Ordering::SeqCst) == 0 {
                self.subject.notify_on(&self.handle, "second", None).unwrap();
            }
        }
    }

    let mt = MainThread::start();
    let handle = mt.handle();
    let subject = Subject::new("feed");

    let downstream = Counter::accepting(Some("second"));
    let downstream_dyn: Arc<dyn Observer> = downstream.clone();
    subject.register(&downstream_dyn);

    let chain = Arc::new(Chain {
        subject: subject.clone(),
        handle: handle.clone(),
        downstream: Arc::clone(&downstream),
        depth: AtomicUsize::new(0),
    });
    let chain_dyn: Arc<dyn Observer> = chain.clone();
    subject.register(&chain_dyn);

    subject.notify_on(&handle, "first", None).unwrap();

    // "first" reached only Chain; its re-entrant "second" reached Counter.
    assert_eq!(chain.downstream.hits(), 1);
    assert_eq!(chain.depth.load(Ordering::SeqCst), 1);
}

#[test]
fn registration_during_marshalled_notify_does_not_deadlock() {
    let mt = MainThread::start();
    let handle = mt.handle();
    let subject = Subject::new("feed");

    struct Registrar {
        subject: Subject,
        late: Mutex<Option<Arc<dyn Observer>>>,
    }

    impl Observer for Registrar {
        fn on_notify(&self, _action: &ActionId, _notice: &Notice) {
            if let Some(late) = self.late.lock().unwrap().take() {
                // Mutating the registry mid-dispatch must be safe; the
                // in-flight snapshot does not include the newcomer.
                self.subject.register(&late);
            }
        }
    }

    let late = Counter::new();
    let late_dyn: Arc<dyn Observer> = late.clone();
    let registrar = Arc::new(Registrar {
        subject: subject.clone(),
        late: Mutex::new(Some(late_dyn)),
    });
    let registrar_dyn: Arc<dyn Observer> = registrar.clone();
    subject.register(&registrar_dyn);

    subject.notify_on(&handle, "tick", None).unwrap();
    // The observer registered during dispatch was not in the snapshot.
    assert_eq!(late.hits(), 0);

    subject.notify_on(&handle, "tick", None).unwrap();
    assert_eq!(late.hits(), 1);
}
