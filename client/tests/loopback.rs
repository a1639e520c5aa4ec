//! The shim against a scripted peer socket.

use std::{os::unix::net::UnixDatagram, process, thread};

use tfs_client::{ClientError, TfsClient};
use tfs_proto::{ErrorCode, NodeKind};

fn mock_server(name: &str) -> (UnixDatagram, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("tfs-mock-{name}-{}", process::id()));
    let _ = std::fs::remove_file(&path);
    let socket = UnixDatagram::bind(&path).unwrap();
    (socket, path)
}

#[test]
fn requests_and_replies_round_trip() {
    let (server, server_path) = mock_server("rt");

    let handle = thread::spawn(move || {
        let mut buf = [0_u8; 256];
        let mut seen = Vec::new();
        for reply in ["0", "3", "-3", "-4"] {
            let (len, peer) = server.recv_from(&mut buf).unwrap();
            seen.push(String::from_utf8(buf[..len].to_vec()).unwrap());
            let peer_path = peer.as_pathname().unwrap().to_path_buf();
            server.send_to(reply.as_bytes(), &peer_path).unwrap();
        }
        seen
    });

    let client = TfsClient::mount(&server_path).unwrap();
    client.create("/a", NodeKind::Directory).unwrap();
    assert_eq!(client.lookup("/a").unwrap(), 3);
    assert!(matches!(
        client.lookup("/b"),
        Err(ClientError::Server(ErrorCode::NotFound))
    ));
    assert!(matches!(
        client.delete("/a"),
        Err(ClientError::Server(ErrorCode::NotEmpty))
    ));

    let seen = handle.join().unwrap();
    assert_eq!(seen, ["c /a d", "l /a", "l /b", "d /a"]);

    std::fs::remove_file(&server_path).unwrap();
}

#[test]
fn garbage_replies_are_a_protocol_error() {
    let (server, server_path) = mock_server("garbage");

    let handle = thread::spawn(move || {
        let mut buf = [0_u8; 256];
        for reply in ["banana", "-9999"] {
            let (_, peer) = server.recv_from(&mut buf).unwrap();
            let peer_path = peer.as_pathname().unwrap().to_path_buf();
            server.send_to(reply.as_bytes(), &peer_path).unwrap();
        }
    });

    let client = TfsClient::mount(&server_path).unwrap();
    assert!(matches!(client.lookup("/a"), Err(ClientError::Protocol)));
    assert!(matches!(client.lookup("/a"), Err(ClientError::Protocol)));

    handle.join().unwrap();
    std::fs::remove_file(&server_path).unwrap();
}
