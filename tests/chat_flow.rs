//! End-to-end chat scenario over real TCP sockets

use std::collections::HashSet;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use line_chat::{handle_connection, ChatServer, ServerConfig, ServerHandle};

const WAIT: Duration = Duration::from_secs(5);

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer,
        };
        let mut prompt = [0u8; 12];
        timeout(WAIT, client.reader.read_exact(&mut prompt))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&prompt, b"Enter name: ");
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();
    }

    async fn line(&mut self) -> String {
        let mut line = String::new();
        timeout(WAIT, self.reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();
        line
    }

    async fn expect_eof(&mut self) {
        let mut rest = Vec::new();
        let n = timeout(WAIT, self.reader.read_to_end(&mut rest))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);
    }
}

async fn start_server(config: ServerConfig) -> (String, ServerHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let (server, handle) = ChatServer::channel(&config);
    tokio::spawn(server.run());

    let accept_handle = handle.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle_connection(
                stream,
                accept_handle.clone(),
                config.clone(),
            ));
        }
    });

    (addr, handle)
}

#[tokio::test]
async fn test_three_user_scenario() {
    let (addr, handle) = start_server(ServerConfig::default()).await;

    let mut alice = TestClient::connect(&addr).await;
    alice.send("alice").await;
    assert_eq!(alice.line().await, "alice joined\n");

    let mut bob = TestClient::connect(&addr).await;
    bob.send("bob").await;
    assert_eq!(alice.line().await, "bob joined\n");
    assert_eq!(bob.line().await, "bob joined\n");

    let mut carol = TestClient::connect(&addr).await;
    carol.send("carol").await;
    assert_eq!(alice.line().await, "carol joined\n");
    assert_eq!(bob.line().await, "carol joined\n");
    assert_eq!(carol.line().await, "carol joined\n");

    alice.send("hi all").await;
    assert!(bob.line().await.ends_with("[alice]: hi all\n"));
    assert!(carol.line().await.ends_with("[alice]: hi all\n"));

    bob.send("/nick bobby").await;
    // alice's next line is the rename, so her own chat was never echoed
    assert_eq!(alice.line().await, "bob is now bobby\n");
    assert_eq!(carol.line().await, "bob is now bobby\n");
    assert_eq!(bob.line().await, "bob is now bobby\n");

    carol.send("/list").await;
    assert_eq!(carol.line().await, "Online users: alice, bobby, carol\n");

    carol.send("/quit").await;
    assert_eq!(alice.line().await, "carol left\n");
    assert_eq!(bob.line().await, "carol left\n");
    carol.expect_eof().await;

    assert_eq!(handle.count().await.unwrap(), 2);

    bob.send("still here").await;
    assert!(alice.line().await.ends_with("[bobby]: still here\n"));
}

#[tokio::test]
async fn test_capacity_rejection_closes_connection() {
    let config = ServerConfig {
        max_clients: 1,
        ..ServerConfig::default()
    };
    let (addr, handle) = start_server(config).await;

    let mut alice = TestClient::connect(&addr).await;
    alice.send("alice").await;
    assert_eq!(alice.line().await, "alice joined\n");

    let stream = TcpStream::connect(&addr).await.unwrap();
    let mut reader = BufReader::new(stream);
    let mut rest = Vec::new();
    let n = timeout(WAIT, reader.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n, 0, "rejected connection must not receive a prompt");
    assert_eq!(handle.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_shutdown_closes_all_sessions() {
    let (addr, handle) = start_server(ServerConfig::default()).await;

    let mut alice = TestClient::connect(&addr).await;
    alice.send("alice").await;
    assert_eq!(alice.line().await, "alice joined\n");
    let mut bob = TestClient::connect(&addr).await;
    bob.send("bob").await;
    assert_eq!(alice.line().await, "bob joined\n");
    assert_eq!(bob.line().await, "bob joined\n");

    handle.announce("going down").await.unwrap();
    assert!(alice.line().await.ends_with("[Server]: going down\n"));
    assert!(bob.line().await.ends_with("[Server]: going down\n"));

    handle.shutdown().await.unwrap();
    alice.expect_eof().await;
    bob.expect_eof().await;
    assert_eq!(handle.count().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_list_consistent_during_concurrent_joins() {
    const USERS: usize = 8;
    let (addr, _handle) = start_server(ServerConfig::default()).await;

    let mut watcher = TestClient::connect(&addr).await;
    watcher.send("watcher").await;
    assert_eq!(watcher.line().await, "watcher joined\n");

    let expected: HashSet<String> = std::iter::once("watcher".to_string())
        .chain((0..USERS).map(|i| format!("user{i}")))
        .collect();

    let joins: Vec<_> = (0..USERS)
        .map(|i| {
            let addr = addr.clone();
            tokio::spawn(async move {
                let name = format!("user{i}");
                let mut client = TestClient::connect(&addr).await;
                client.send(&name).await;
                let own = format!("{name} joined\n");
                while client.line().await != own {}
                client
            })
        })
        .collect();

    let mut responses = Vec::new();
    for _ in 0..USERS {
        watcher.send("/list").await;
        loop {
            let line = watcher.line().await;
            if let Some(names) = line.strip_prefix("Online users: ") {
                responses.push(names.trim_end().to_string());
                break;
            }
            assert!(line.ends_with(" joined\n"), "unexpected line {line:?}");
        }
    }

    let mut clients = Vec::new();
    for join in joins {
        clients.push(join.await.unwrap());
    }

    for names in &responses {
        let listed: Vec<&str> = names.split(", ").collect();
        let unique: HashSet<&str> = listed.iter().copied().collect();
        assert_eq!(unique.len(), listed.len(), "duplicate in {names:?}");
        assert!(unique.contains("watcher"), "{names:?}");
        for name in &listed {
            assert!(expected.contains(*name), "unexpected name in {names:?}");
        }
    }

    watcher.send("/list").await;
    let last = loop {
        let line = watcher.line().await;
        if let Some(names) = line.strip_prefix("Online users: ") {
            break names.trim_end().to_string();
        }
    };
    let listed: Vec<String> = last.split(", ").map(str::to_string).collect();
    assert_eq!(listed.len(), USERS + 1);
    assert_eq!(listed.into_iter().collect::<HashSet<_>>(), expected);
    drop(clients);
}
