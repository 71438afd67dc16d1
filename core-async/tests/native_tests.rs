//! Integration tests for the primitives the playback core relies on.

use core_async::{sync, task, time};
use std::sync::Arc;

#[core_async::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    assert_eq!(handle.await.unwrap(), 42);
}

#[core_async::test]
async fn test_abort_handle_cancels_sleeping_task() {
    let fired = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = fired.clone();

    let handle = task::spawn(async move {
        time::sleep(time::Duration::from_millis(50)).await;
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
    });
    let abort = handle.abort_handle();
    abort.abort();

    let result = handle.await;
    assert!(result.unwrap_err().is_cancelled());
    assert!(!fired.load(std::sync::atomic::Ordering::SeqCst));
}

#[core_async::test]
async fn test_timeout_failure() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(100)).await;
        42
    })
    .await;

    assert!(result.is_err());
}

#[core_async::test]
async fn test_mutex_held_across_await() {
    let mutex = Arc::new(sync::Mutex::new(Vec::new()));
    let contender = mutex.clone();

    let mut guard = mutex.lock().await;
    let handle = task::spawn(async move {
        contender.lock().await.push("second");
    });
    time::sleep(time::Duration::from_millis(10)).await;
    guard.push("first");
    drop(guard);

    handle.await.unwrap();
    assert_eq!(*mutex.lock().await, vec!["first", "second"]);
}

#[core_async::test]
async fn test_unbounded_channel_preserves_order() {
    let (tx, mut rx) = sync::mpsc::unbounded_channel();

    task::spawn(async move {
        for i in 0..5 {
            tx.send(i).unwrap();
        }
    });

    let mut received = Vec::new();
    while let Some(value) = rx.recv().await {
        received.push(value);
    }
    assert_eq!(received, vec![0, 1, 2, 3, 4]);
}

#[core_async::test]
async fn test_watch_wait_for_with_timeout() {
    let (tx, mut rx) = sync::watch::channel(0u8);

    task::spawn(async move {
        time::sleep(time::Duration::from_millis(10)).await;
        tx.send_replace(3);
    });

    let reached = time::timeout(time::Duration::from_secs(1), rx.wait_for(|v| *v == 3)).await;
    assert!(matches!(reached, Ok(Ok(_))));
}

#[test]
fn test_block_on_runs_future() {
    let value = core_async::runtime::block_on(async {
        time::sleep(time::Duration::from_millis(1)).await;
        7
    });
    assert_eq!(value, 7);
}
