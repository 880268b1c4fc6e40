// tests/join_counter.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use branchflow::dag::JoinCounter;

#[test]
fn last_notification_wins() {
    let counter = JoinCounter::new(3);
    assert_eq!(counter.strong(), 3);

    assert!(!counter.notify_strong());
    assert!(!counter.notify_strong());
    assert!(counter.notify_strong());
    assert_eq!(counter.load(), 0);
}

#[test]
fn init_restores_static_count() {
    let counter = JoinCounter::new(2);
    counter.notify_strong();
    counter.notify_strong();
    assert_eq!(counter.load(), 0);

    counter.init();
    assert_eq!(counter.load(), 2);
    assert!(!counter.notify_strong());
    assert!(counter.notify_strong());
}

#[test]
fn notification_past_zero_is_ignored() {
    let counter = JoinCounter::new(1);
    assert!(counter.notify_strong());
    assert!(!counter.notify_strong());
    assert_eq!(counter.load(), 0);

    let no_deps = JoinCounter::new(0);
    assert!(!no_deps.notify_strong());
    assert_eq!(no_deps.load(), 0);
}

#[test]
fn exactly_one_thread_observes_zero() {
    const THREADS: usize = 16;
    const ROUNDS: usize = 200;

    let counter = Arc::new(JoinCounter::new(THREADS as u32));

    for _ in 0..ROUNDS {
        counter.init();
        let barrier = Arc::new(Barrier::new(THREADS));
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let counter = Arc::clone(&counter);
                let barrier = Arc::clone(&barrier);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    barrier.wait();
                    if counter.notify_strong() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(counter.load(), 0);
    }
}
