//! End-to-end client scenarios against an in-process server peer.

use std::sync::{Arc, Mutex};

use stomp_events_client::Dispatcher;
use stomp_events_core::{Event, Frame, Transport};
use stomp_events_session::{Session, run_inbound, storage::MemoryStore};
use stomp_events_transport::{ChannelPeer, ChannelTransport};
use tokio::task::JoinHandle;

type TestSession = Session<ChannelTransport, MemoryStore>;

struct Client {
    dispatcher: Dispatcher<ChannelTransport, MemoryStore>,
    notices: Arc<Mutex<Vec<String>>>,
    inbound: JoinHandle<()>,
}

impl Client {
    fn start() -> (Self, ChannelPeer) {
        let (transport, peer) = ChannelTransport::pair();
        let session: Arc<TestSession> = Arc::new(Session::new(transport, MemoryStore::new()));
        let notices = Arc::new(Mutex::new(Vec::new()));

        let inbound = tokio::spawn({
            let session = Arc::clone(&session);
            let notices = Arc::clone(&notices);
            async move {
                run_inbound(&session, |outcome| {
                    if let Some(text) = outcome.notice() {
                        notices.lock().unwrap().push(text);
                    }
                })
                .await;
            }
        });

        let client = Self {
            dispatcher: Dispatcher::new(session),
            notices,
            inbound,
        };
        (client, peer)
    }

    fn session(&self) -> &TestSession {
        self.dispatcher.session()
    }

    async fn run(&self, line: &str) -> Option<String> {
        self.dispatcher.execute(line).await
    }

    fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    /// Wait until the inbound loop has produced `count` notices.
    async fn wait_for_notices(&self, count: usize) -> Vec<String> {
        for _ in 0..1000 {
            let notices = self.notices();
            if notices.len() >= count {
                return notices;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {count} notices, got {:?}", self.notices());
    }
}

fn event(time: u64, name: &str) -> Event {
    Event {
        team_a: "italy".to_string(),
        team_b: "france".to_string(),
        name: name.to_string(),
        time,
        description: format!("{name} happened"),
        ..Event::default()
    }
}

fn broadcast(user: &str, event: &Event) -> Frame {
    Frame::new("MESSAGE")
        .header("subscription", "0")
        .header("message-id", "1")
        .header("destination", "/italy_france")
        .body(event.to_wire_body(user))
}

async fn logged_in(user: &str) -> (Client, ChannelPeer) {
    let (client, mut peer) = Client::start();
    assert_eq!(client.run(&format!("login localhost:7777 {user} pw")).await, None);
    assert_eq!(peer.recv().await.unwrap().command(), "CONNECT");
    peer.deliver(&Frame::new("CONNECTED").header("version", "1.2"))
        .unwrap();
    client.wait_for_notices(1).await;
    (client, peer)
}

#[tokio::test]
async fn login_then_join() {
    let (client, mut peer) = Client::start();

    client.run("login localhost:7777 alice pw").await;
    let connect = peer.recv().await.unwrap();
    assert_eq!(connect.get_header("accept-version"), "1.2");
    assert_eq!(connect.get_header("host"), "localhost");
    assert_eq!(connect.get_header("login"), "alice");
    assert_eq!(connect.get_header("passcode"), "pw");

    peer.deliver(&Frame::new("CONNECTED").header("version", "1.2"))
        .unwrap();
    assert_eq!(client.wait_for_notices(1).await, vec!["Login successful"]);
    assert!(client.session().is_connected());

    client.run("join italy_france").await;
    let subscribe = peer.recv().await.unwrap();
    assert_eq!(subscribe.command(), "SUBSCRIBE");
    assert_eq!(subscribe.get_header("destination"), "/italy_france");
    let receipt = subscribe.get_header("receipt").to_string();
    assert!(subscribe.get_header("id").parse::<u64>().is_ok());

    peer.deliver(&Frame::new("RECEIPT").header("receipt-id", receipt))
        .unwrap();
    assert_eq!(
        client.wait_for_notices(2).await[1],
        "Joined channel italy_france"
    );
}

#[tokio::test]
async fn double_join_sends_one_frame() {
    let (client, mut peer) = logged_in("alice").await;

    assert_eq!(client.run("join italy_france").await, None);
    assert_eq!(
        client.run("join italy_france").await.as_deref(),
        Some("Already subscribed to italy_france")
    );
    assert_eq!(peer.drain().len(), 1);
    assert_eq!(client.session().subscription_id("italy_france"), Some(0));
}

#[tokio::test]
async fn unknown_receipt_is_harmless() {
    let (client, peer) = logged_in("alice").await;

    peer.deliver(&Frame::new("RECEIPT").header("receipt-id", "77"))
        .unwrap();
    peer.deliver(&broadcast("bob", &event(5, "kickoff"))).unwrap();
    assert_eq!(
        client.wait_for_notices(2).await[1],
        "Received message from bob in channel italy_france"
    );
    assert!(client.session().is_connected());
}

#[tokio::test]
async fn self_echo_is_dropped() {
    let (client, peer) = logged_in("alice").await;

    peer.deliver(&broadcast("alice", &event(5, "kickoff")))
        .unwrap();
    peer.deliver(&broadcast("bob", &event(6, "foul"))).unwrap();
    client.wait_for_notices(2).await;

    assert!(client.session().events("italy_france", "alice").is_empty());
    assert_eq!(client.session().events("italy_france", "bob").len(), 1);
    assert!(!client.session().is_terminated());
}

#[tokio::test]
async fn error_frame_ends_session() {
    let (client, mut peer) = Client::start();
    client.run("login localhost:7777 alice wrong").await;
    peer.recv().await.unwrap();

    peer.deliver(
        &Frame::new("ERROR")
            .header("message", "bad credentials")
            .body("Wrong password"),
    )
    .unwrap();
    let Client {
        dispatcher,
        notices,
        inbound,
    } = client;
    inbound.await.unwrap();

    assert_eq!(
        *notices.lock().unwrap(),
        vec!["Received Error: bad credentials\nWrong password"]
    );
    assert!(dispatcher.session().is_terminated());

    dispatcher.execute("login localhost:7777 alice pw").await;
    dispatcher.execute("join italy_france").await;
    assert!(peer.try_recv().is_none());
}

#[tokio::test]
async fn summary_is_ordered_by_time() {
    let (client, peer) = logged_in("alice").await;
    for (time, name) in [(30, "second"), (10, "first"), (45, "third")] {
        peer.deliver(&broadcast("bob", &event(time, name))).unwrap();
    }
    client.wait_for_notices(4).await;

    assert_eq!(
        client.run("summary italy_france bob report.txt").await.as_deref(),
        Some("Summary written to report.txt")
    );
    let report = client.session().store().report("report.txt").unwrap();
    let first = report.find("10 - first:").unwrap();
    let second = report.find("30 - second:").unwrap();
    let third = report.find("45 - third:").unwrap();
    assert!(first < second && second < third);
}

#[tokio::test]
async fn report_publishes_batch() {
    let (client, mut peer) = logged_in("alice").await;
    client.session().store().insert_batch(
        "events.json",
        r#"{
            "team a": "italy",
            "team b": "france",
            "events": [
                {"event name": "kickoff", "time": 0, "description": "Go"},
                {"event name": "goal", "time": 600, "team a updates": {"goals": 1}}
            ]
        }"#,
    );

    assert_eq!(
        client.run("report events.json").await.as_deref(),
        Some("Error: Not subscribed to italy_france")
    );
    assert!(peer.try_recv().is_none());

    client.run("join italy_france").await;
    peer.recv().await.unwrap();
    assert_eq!(
        client.run("report events.json").await.as_deref(),
        Some("Reported 2 events to italy_france")
    );

    let sent = peer.drain();
    assert_eq!(sent.len(), 2);
    let goal = Event::from_wire_body(sent[1].get_body()).unwrap();
    assert_eq!(goal.name, "goal");
    assert_eq!(goal.team_a_updates["goals"], "1");
    assert_eq!(client.session().events("italy_france", "alice").len(), 2);
}

#[tokio::test]
async fn logout_waits_for_receipt() {
    let (client, mut peer) = logged_in("alice").await;

    client.run("logout").await;
    let disconnect = peer.recv().await.unwrap();
    assert_eq!(disconnect.command(), "DISCONNECT");
    assert!(client.session().is_connected());

    peer.deliver(
        &Frame::new("RECEIPT").header("receipt-id", disconnect.get_header("receipt")),
    )
    .unwrap();
    let Client {
        dispatcher,
        notices,
        inbound,
    } = client;
    inbound.await.unwrap();

    assert_eq!(
        *notices.lock().unwrap(),
        vec!["Login successful", "Disconnected properly."]
    );
    assert!(dispatcher.session().is_terminated());
}

#[tokio::test]
async fn transport_loss_ends_session() {
    let (client, peer) = logged_in("alice").await;
    drop(peer);

    let Client {
        dispatcher,
        notices,
        inbound,
    } = client;
    inbound.await.unwrap();

    assert_eq!(
        notices.lock().unwrap().last().map(String::as_str),
        Some("Disconnected from server.")
    );
    assert!(dispatcher.session().is_terminated());
}

#[tokio::test]
async fn closing_transport_stops_inbound_loop() {
    let (client, _peer) = logged_in("alice").await;

    client.session().transport().close().await;
    let Client {
        dispatcher,
        inbound,
        ..
    } = client;
    inbound.await.unwrap();
    assert!(dispatcher.session().is_terminated());
}
