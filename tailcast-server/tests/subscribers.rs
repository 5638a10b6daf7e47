//! Subscriber lifecycle integration tests
//!
//! Validates registration on connect, unregistration on disconnect, and that
//! one subscriber going away never disturbs the others.

mod common;

use common::client::Recv;

#[tokio::test]
async fn connect_registers_subscriber() {
    let server = common::create_test_server().await;
    assert!(server.fanout.is_empty().await);

    let _client = server.connect().await;
    assert_eq!(server.fanout.len().await, 1);
}

#[tokio::test]
async fn disconnect_unregisters_subscriber() {
    let server = common::create_test_server().await;
    let client = server.connect().await;
    let _other = server.connect().await;

    drop(client);
    server.wait_for_subscribers(1).await;
}

#[tokio::test]
async fn remaining_subscribers_unaffected_by_disconnect() {
    let server = common::create_test_server().await;
    let mut staying = server.connect().await;
    let mut leaving = server.connect().await;
    server.sync(&mut [&mut staying, &mut leaving]).await;

    drop(leaving);
    server.append("one\n");
    server.append("two\n");

    assert_eq!(staying.expect_line().await, "one\n");
    assert_eq!(staying.expect_line().await, "two\n");
    server.wait_for_subscribers(1).await;
}

#[tokio::test]
async fn inbound_bytes_are_ignored() {
    let server = common::create_test_server().await;
    let mut client = server.connect().await;
    server.sync(&mut [&mut client]).await;

    client.send(b"please filter on ERROR\n").await;
    server.append("INFO still unfiltered\n");

    assert_eq!(client.expect_line().await, "INFO still unfiltered\n");
    assert_eq!(server.fanout.len().await, 1);
}

#[tokio::test]
async fn server_shutdown_closes_connections() {
    let server = common::create_test_server().await;
    let mut client = server.connect().await;

    drop(server);

    let mut closed = false;
    for _ in 0..20 {
        if client.recv(std::time::Duration::from_millis(100)).await == Recv::Closed {
            closed = true;
            break;
        }
    }
    assert!(closed, "connection stayed open after server shutdown");
}
