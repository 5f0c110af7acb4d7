//! Worker Registry Tests
//!
//! Tests for worker bookkeeping and broadcast cancellation.

use std::sync::Arc;
use std::thread;

use srpcf::network::WorkerRegistry;

#[test]
fn test_add_remove() {
    let registry = WorkerRegistry::new();
    let a = registry.add("127.0.0.1:1000");
    let b = registry.add("127.0.0.1:1001");
    assert_ne!(a, b);
    assert_eq!(registry.len(), 2);

    assert!(registry.remove(a));
    assert!(!registry.remove(a));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_cancel_reaches_tokens() {
    let registry = WorkerRegistry::new();
    let token = registry.token();
    registry.add("peer");
    assert!(!token.is_cancelled());

    registry.cancel_all();
    assert!(token.is_cancelled());
    assert!(registry.token().is_cancelled());
    assert!(registry.is_empty());
}

#[test]
fn test_cancel_seen_from_other_threads() {
    let registry = Arc::new(WorkerRegistry::new());
    let tokens: Vec<_> = (0..4).map(|_| registry.token()).collect();

    registry.cancel_all();

    let handles: Vec<_> = tokens
        .into_iter()
        .map(|token| thread::spawn(move || token.is_cancelled()))
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
