use std::time::Duration;

use tokio::sync::mpsc;

use super::Timers;

#[tokio::test]
async fn it_fires_a_scheduled_task() {
    let timers = Timers::default();
    let (tx, mut rx) = mpsc::unbounded_channel::<u8>();

    timers.schedule("a", Duration::from_millis(10), async move {
        tx.send(1).unwrap();
    });

    assert_eq!(rx.recv().await, Some(1));
}

#[tokio::test]
async fn it_replaces_a_pending_task_for_the_same_id() {
    let timers = Timers::default();
    let (tx, mut rx) = mpsc::unbounded_channel::<u8>();

    let tx_first = tx.clone();
    timers.schedule("a", Duration::from_millis(200), async move {
        tx_first.send(1).unwrap();
    });
    timers.schedule("a", Duration::from_millis(10), async move {
        tx.send(2).unwrap();
    });

    assert_eq!(rx.recv().await, Some(2));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn it_keeps_tasks_for_distinct_ids_independent() {
    let timers = Timers::default();
    let (tx, mut rx) = mpsc::unbounded_channel::<u8>();

    let tx_a = tx.clone();
    timers.schedule("a", Duration::from_millis(10), async move {
        tx_a.send(1).unwrap();
    });
    timers.schedule("b", Duration::from_millis(20), async move {
        tx.send(2).unwrap();
    });

    assert_eq!(rx.recv().await, Some(1));
    assert_eq!(rx.recv().await, Some(2));
}

#[tokio::test]
async fn it_cancels_a_pending_task() {
    let timers = Timers::default();
    let (tx, mut rx) = mpsc::unbounded_channel::<u8>();

    timers.schedule("a", Duration::from_millis(50), async move {
        tx.send(1).unwrap();
    });
    timers.cancel("a");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(rx.try_recv().is_err());
}
