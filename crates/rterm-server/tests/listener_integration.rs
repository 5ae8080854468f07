//! Integration tests: real TCP listener, real sockets, rterm clients written
//! directly against `MessageStream`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use rterm_core::{Message, MessageStream, Response};
use rterm_server::domain::ServerConfig;
use rterm_server::infrastructure::Listener;

const LIMIT: Duration = Duration::from_secs(2);

struct RunningServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

async fn start_server() -> RunningServer {
    let config = ServerConfig {
        bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        response_delay_ms: 0,
        negotiation_timeout_ms: 300,
    };
    let listener = Listener::bind(config).await.expect("bind loopback");
    let addr = listener.local_addr();
    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(listener.run(async move {
        let _ = stopped.await;
    }));
    RunningServer { addr, stop, task }
}

async fn connect(addr: SocketAddr) -> MessageStream<TcpStream> {
    let socket = TcpStream::connect(addr).await.expect("connect");
    MessageStream::negotiate(socket, LIMIT).await.expect("negotiate")
}

async fn ask(stream: &mut MessageStream<TcpStream>, command: &str) -> Message {
    stream
        .send(&Message::Command(command.to_string()))
        .await
        .unwrap();
    stream.recv().await.unwrap().expect("a response")
}

fn data(text: &str) -> Message {
    Message::Response(Response::Data(text.to_string()))
}

#[tokio::test]
async fn test_client_conversation_over_tcp() {
    // Arrange
    let server = start_server().await;
    let mut client = connect(server.addr).await;

    // Act / Assert
    assert_eq!(ask(&mut client, "-echo-hello world").await, data("ECHO:hello world"));
    assert_eq!(ask(&mut client, "foobar").await, data("ERROR: Unrecognized command."));
    match ask(&mut client, "-date").await {
        Message::Response(Response::Data(text)) => assert!(text.starts_with("DATE: ")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        ask(&mut client, "-end").await,
        Message::Response(Response::EndSignal)
    );
    assert!(client.recv().await.unwrap().is_none());

    server.stop.send(()).unwrap();
    server.task.await.unwrap();
}

#[tokio::test]
async fn test_silent_connection_does_not_block_other_clients() {
    // Arrange: one peer connects but never negotiates
    let server = start_server().await;
    let _silent = TcpStream::connect(server.addr).await.unwrap();

    // Act
    let mut client = connect(server.addr).await;

    // Assert
    assert_eq!(ask(&mut client, "-echo-still here").await, data("ECHO:still here"));

    drop(client);
    server.stop.send(()).unwrap();
    server.task.await.unwrap();
}

#[tokio::test]
async fn test_concurrent_clients_are_served_independently() {
    let server = start_server().await;

    let mut tasks = Vec::new();
    for n in 0..8 {
        let addr = server.addr;
        tasks.push(tokio::spawn(async move {
            let mut client = connect(addr).await;
            for i in 0..5 {
                let text = format!("{n}-{i}");
                assert_eq!(
                    ask(&mut client, &format!("-echo-{text}")).await,
                    data(&format!("ECHO:{text}"))
                );
            }
            ask(&mut client, "-end").await
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), Message::Response(Response::EndSignal));
    }
    server.stop.send(()).unwrap();
    server.task.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_lets_open_connections_finish() {
    // Arrange
    let server = start_server().await;
    let mut client = connect(server.addr).await;
    assert_eq!(ask(&mut client, "-echo-before").await, data("ECHO:before"));

    // Act: stop accepting while the client is mid-session
    server.stop.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Assert: the existing session still works and the listener waits for it
    assert!(!server.task.is_finished());
    assert_eq!(ask(&mut client, "-echo-after").await, data("ECHO:after"));
    assert_eq!(
        ask(&mut client, "-end").await,
        Message::Response(Response::EndSignal)
    );
    let result = tokio::time::timeout(LIMIT, server.task).await.unwrap();
    result.unwrap();
}

#[tokio::test]
async fn test_non_rterm_peer_is_dropped_after_negotiation_timeout() {
    use tokio::io::AsyncReadExt;

    // Arrange
    let server = start_server().await;
    let mut raw = TcpStream::connect(server.addr).await.unwrap();

    // Act: read the server preamble, never answer, then wait for the close
    let mut preamble = [0u8; 5];
    raw.read_exact(&mut preamble).await.unwrap();
    let mut rest = Vec::new();
    let closed = tokio::time::timeout(LIMIT, raw.read_to_end(&mut rest)).await;

    // Assert
    assert_eq!(&preamble, b"RTRM\x01");
    assert!(closed.is_ok(), "server must close a peer that never negotiates");

    server.stop.send(()).unwrap();
    server.task.await.unwrap();
}
