//! Lifecycle coordinator tests: both shutdown triggers lead to a single,
//! bounded exit from the run loop.

use std::time::Duration;

use green_proxy::{Server, ServerConfig, Shutdown};

fn test_config(port: u16) -> ServerConfig {
    ServerConfig {
        address: format!("127.0.0.1:{port}"),
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn run_returns_when_cancelled() {
    let server = Server::setup(test_config(28491)).await.unwrap();

    let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel::<()>();
    let run = tokio::spawn(server.run(async move {
        let _ = cancel_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel_tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .expect("run loop should exit after cancellation")
        .unwrap();
}

#[tokio::test]
async fn run_returns_when_done_channel_closes() {
    let server = Server::setup(test_config(28492)).await.unwrap();
    let shutdown = server.shutdown_handle();

    let run = tokio::spawn(server.run(std::future::pending::<()>()));

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(shutdown.trigger());
    // A second trigger is a guarded no-op.
    assert!(!shutdown.trigger());

    tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .expect("run loop should exit after the done-channel closes")
        .unwrap();
}

#[tokio::test]
async fn listener_failure_does_not_stop_the_run_loop() {
    // Two servers on the same port: the second listener fails to bind, but
    // its run loop keeps waiting for a real shutdown trigger.
    let first = Server::setup(test_config(28493)).await.unwrap();
    let first_shutdown = first.shutdown_handle();
    let first_run = tokio::spawn(first.run(std::future::pending::<()>()));

    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = Server::setup(test_config(28493)).await.unwrap();
    let second_shutdown = second.shutdown_handle();
    let second_run = tokio::spawn(second.run(std::future::pending::<()>()));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!second_run.is_finished());

    second_shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), second_run)
        .await
        .expect("run loop should still respond to its shutdown trigger")
        .unwrap();

    first_shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), first_run)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn shutdown_broadcasts_to_every_waiter() {
    let shutdown = Shutdown::new();

    let waiters: Vec<_> = (0..4).map(|_| tokio::spawn(shutdown.wait())).collect();

    shutdown.trigger();

    for waiter in waiters {
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should resolve after trigger")
            .unwrap();
    }
}
