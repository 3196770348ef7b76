//! Integration tests for the session handshake against a scripted server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{server_config, FakeIrcd};
use skuzzy::dispatch::Dispatcher;
use skuzzy::features::FeatureQueues;
use skuzzy::network::{ConnectionRegistry, Outbound, Supervisor};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const CHANNELS: &str = r##"
[sasl]
user = "skuzzy"
password = "hunter2"

[[channels]]
name = "#a"
llm = "local"

[[channels]]
name = "#b"

[[channels]]
name = "#c"
"##;

#[tokio::test]
async fn test_sasl_registration_joins_in_order() {
    let ircd = FakeIrcd::bind().await.expect("bind");
    let config = Arc::new(server_config(ircd.port(), CHANNELS));
    let registry = Arc::new(ConnectionRegistry::new());
    let shutdown = CancellationToken::new();
    let (queues, mut receivers) = FeatureQueues::new(8);

    let dispatcher = Dispatcher::new(Arc::clone(&config), queues).expect("dispatcher");
    let supervisor = Supervisor::new(
        Arc::clone(&config),
        Arc::clone(&registry),
        dispatcher,
        shutdown.clone(),
    );
    let task = tokio::spawn(supervisor.run());

    let mut peer = ircd.accept().await.expect("accept");
    assert_eq!(peer.recv_line().await.unwrap(), "CAP REQ :sasl");
    peer.send_line(":irc.test CAP * ACK :sasl").await.unwrap();
    assert_eq!(peer.recv_line().await.unwrap(), "AUTHENTICATE PLAIN");
    peer.send_line("AUTHENTICATE +").await.unwrap();
    assert_eq!(
        peer.recv_line().await.unwrap(),
        "AUTHENTICATE AHNrdXp6eQBodW50ZXIy"
    );
    peer.send_line(":irc.test 903 skuzzy :SASL authentication successful")
        .await
        .unwrap();
    assert_eq!(peer.recv_line().await.unwrap(), "CAP END");
    peer.register("skuzzy").await.unwrap();

    assert_eq!(peer.recv_line().await.unwrap(), "JOIN #a");
    assert_eq!(peer.recv_line().await.unwrap(), "JOIN #b");
    assert_eq!(peer.recv_line().await.unwrap(), "JOIN #c");
    assert!(registry.lookup("test").is_some());

    peer.send_line("PING :irc.test").await.unwrap();
    assert_eq!(peer.recv_line().await.unwrap(), "PONG :irc.test");

    peer.send_line(":alice!a@host PRIVMSG #a :hello there")
        .await
        .unwrap();
    let event = timeout(Duration::from_secs(5), receivers.chat_relay.recv())
        .await
        .expect("event in time")
        .expect("queue open");
    assert_eq!(event.channel.as_deref(), Some("#a"));
    assert_eq!(event.user, "alice");
    assert_eq!(event.text, "hello there");
    assert_eq!(event.backlog.to_vec(), vec!["<alice> hello there".to_string()]);

    shutdown.cancel();
    let attempts = timeout(Duration::from_secs(5), task)
        .await
        .expect("supervisor stops")
        .expect("supervisor task");
    assert_eq!(attempts, 1);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_nick_collision_and_outbound_say() {
    let ircd = FakeIrcd::bind().await.expect("bind");
    let config = Arc::new(server_config(
        ircd.port(),
        "[[channels]]\nname = \"#rust\"\n",
    ));
    let registry = Arc::new(ConnectionRegistry::new());
    let shutdown = CancellationToken::new();
    let (queues, _receivers) = FeatureQueues::new(8);

    let dispatcher = Dispatcher::new(Arc::clone(&config), queues).expect("dispatcher");
    let task = tokio::spawn(
        Supervisor::new(
            Arc::clone(&config),
            Arc::clone(&registry),
            dispatcher,
            shutdown.clone(),
        )
        .run(),
    );

    let mut peer = ircd.accept().await.expect("accept");
    assert_eq!(peer.recv_line().await.unwrap(), "NICK skuzzy");
    assert!(peer.recv_line().await.unwrap().starts_with("USER skuzzy 0 *"));
    peer.send_line(":irc.test 433 * skuzzy :Nickname is already in use")
        .await
        .unwrap();
    assert_eq!(peer.recv_line().await.unwrap(), "NICK skuzzy_");
    peer.send_line(":irc.test 001 skuzzy_ :Welcome").await.unwrap();
    peer.send_line(":skuzzy_ MODE skuzzy_ :+i").await.unwrap();
    assert_eq!(peer.recv_line().await.unwrap(), "JOIN #rust");

    let outbound = Outbound::new(Arc::clone(&registry), Duration::ZERO);
    outbound.say("test", "#rust", "hi\r\nthere").await.unwrap();
    assert_eq!(peer.recv_line().await.unwrap(), "PRIVMSG #rust :hithere");

    shutdown.cancel();
    timeout(Duration::from_secs(5), task)
        .await
        .expect("supervisor stops")
        .expect("supervisor task");
}

#[tokio::test]
async fn test_server_error_ends_attempt_and_reconnects() {
    let ircd = FakeIrcd::bind().await.expect("bind");
    let config = Arc::new(server_config(ircd.port(), ""));
    let registry = Arc::new(ConnectionRegistry::new());
    let shutdown = CancellationToken::new();
    let (queues, _receivers) = FeatureQueues::new(8);

    let dispatcher = Dispatcher::new(Arc::clone(&config), queues).expect("dispatcher");
    let task = tokio::spawn(
        Supervisor::new(
            Arc::clone(&config),
            Arc::clone(&registry),
            dispatcher,
            shutdown.clone(),
        )
        .run(),
    );

    let mut first = ircd.accept().await.expect("accept");
    first.register("skuzzy").await.unwrap();
    first.send_line("ERROR :Closing link").await.unwrap();
    first.wait_closed().await.unwrap();

    let mut second = ircd.accept().await.expect("reconnect");
    second.expect("NICK skuzzy").await.unwrap();

    shutdown.cancel();
    let attempts = timeout(Duration::from_secs(5), task)
        .await
        .expect("supervisor stops")
        .expect("supervisor task");
    assert_eq!(attempts, 2);
}
