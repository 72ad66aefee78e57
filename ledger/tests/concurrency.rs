//! Concurrent access to the same accounts.

mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{amount, id, memory_engine};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deposits_converge() {
    let engine = Arc::new(memory_engine());
    let tasks = 100;

    let handles: Vec<_> = (0..tasks)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.deposit(&id("shared"), amount(dec!(1.50))).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(
        engine.get_balance(&id("shared")).await.unwrap(),
        dec!(1.50) * Decimal::from(tasks)
    );
    assert_eq!(
        engine.transactions(&id("shared"), Some(1_000)).await.unwrap().len(),
        100
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposite_transfers_do_not_deadlock() {
    let engine = Arc::new(memory_engine());
    engine.deposit(&id("a"), amount(dec!(1000))).await.unwrap();
    engine.deposit(&id("b"), amount(dec!(1000))).await.unwrap();

    let handles: Vec<_> = (0..200)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let (from, to) = if i % 2 == 0 { ("a", "b") } else { ("b", "a") };
                engine.transfer(&id(from), &id(to), amount(dec!(3))).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let a = engine.get_balance(&id("a")).await.unwrap();
    let b = engine.get_balance(&id("b")).await.unwrap();
    assert_eq!(a + b, dec!(2000));
    assert_eq!(a, dec!(1000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw() {
    let engine = Arc::new(memory_engine());
    engine.deposit(&id("acc1"), amount(dec!(10))).await.unwrap();

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.withdraw(&id("acc1"), amount(dec!(1))).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(engine.get_balance(&id("acc1")).await.unwrap(), dec!(0));
}
