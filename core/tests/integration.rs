//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background runtime, then
//! drives every `Crowd` operation over real HTTP through `UreqTransport`.

use std::io::{Read, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crowd_core::{
    Attribute, Attributes, ClientConfig, Crowd, CrowdError, DomainError, PasswordValue, TransportError,
    User, UserUpdate,
};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// Serve every connection with the same canned bytes, recording each request line.
fn start_raw_server(response: &'static [u8], hold: Duration) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let head = read_request_head(&mut stream);
            let line = head.lines().next().unwrap_or_default().to_string();
            log.lock().unwrap().push(line);
            let _ = stream.write_all(response);
            let _ = stream.flush();
            std::thread::sleep(hold);
        }
    });

    (addr, seen)
}

/// Read the request head and any `Content-Length` body.
fn read_request_head(stream: &mut std::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    while !buf.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(1) => buf.push(byte[0]),
            _ => break,
        }
    }
    let head = String::from_utf8_lossy(&buf).to_string();
    let length = head
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    let _ = stream.read_exact(&mut body);
    head
}

fn connect(addr: SocketAddr) -> Crowd {
    Crowd::new(&format!("http://{addr}"), "testapp", "password").unwrap()
}

fn bob() -> User {
    User {
        name: "bob".to_string(),
        first_name: "Bob".to_string(),
        last_name: "Builder".to_string(),
        display_name: "a".to_string(),
        email: "b".to_string(),
        active: true,
        password: Some(PasswordValue {
            value: "pw".to_string(),
        }),
        ..User::default()
    }
}

#[test]
fn user_lifecycle() {
    let crowd = connect(start_server());

    // Step 1: unknown user.
    let err = crowd.get_user("bob").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::UserNotFound));

    // Step 2: create, then create again.
    crowd.add_user(&bob()).unwrap();
    let err = crowd.add_user(&bob()).unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::InvalidUser));
    match err {
        CrowdError::Domain { message, .. } => {
            assert_eq!(message.as_deref(), Some("User <bob> already exists"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Step 3: fetch.
    let fetched = crowd.get_user("bob").unwrap();
    assert_eq!(fetched.display_name, "a");
    assert_eq!(fetched.email, "b");
    assert!(fetched.password.is_none());
    assert!(fetched.key.is_some());

    // Step 4: update with empty email keeps it.
    let update = UserUpdate {
        display_name: "Bob B.".to_string(),
        ..UserUpdate::default()
    };
    crowd.update_user("bob", &update).unwrap();
    let fetched = crowd.get_user("bob").unwrap();
    assert_eq!(fetched.display_name, "Bob B.");
    assert_eq!(fetched.email, "b");
    assert_eq!(fetched.first_name, "Bob");

    // Step 5: update with a new email replaces it.
    let update = UserUpdate {
        email: "c".to_string(),
        active: Some(false),
        ..UserUpdate::default()
    };
    crowd.update_user("bob", &update).unwrap();
    let fetched = crowd.get_user("bob").unwrap();
    assert_eq!(fetched.email, "c");
    assert!(!fetched.active);

    // Step 6: password.
    crowd.set_user_password("bob", "n3w").unwrap();
    let err = crowd.set_user_password("bob", "").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::InvalidPassword));

    // Step 7: rename.
    let renamed = crowd.rename_user("bob", "robert").unwrap();
    assert_eq!(renamed.name, "robert");
    let err = crowd.get_user("bob").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::UserNotFound));

    // Step 8: remove, then remove again.
    crowd.remove_user("robert").unwrap();
    let err = crowd.remove_user("robert").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::UserNotFound));

    // Step 9: updating a missing user fails on the fetch.
    let err = crowd.update_user("robert", &UserUpdate::default()).unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::UserNotFound));
}

#[test]
fn attribute_lifecycle() {
    let crowd = connect(start_server());
    crowd.add_user(&bob()).unwrap();

    let attributes = Attributes {
        attributes: vec![Attribute {
            name: "team".to_string(),
            values: vec!["core".to_string(), "infra".to_string()],
        }],
    };
    crowd.store_user_attributes("bob", &attributes).unwrap();
    assert_eq!(crowd.get_user_attributes("bob").unwrap(), attributes);

    crowd.remove_user_attribute("bob", "team").unwrap();
    assert!(crowd.get_user_attributes("bob").unwrap().attributes.is_empty());

    let err = crowd.get_user_attributes("ghost").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::UserNotFound));
}

#[test]
fn membership_lifecycle() {
    let crowd = connect(start_server());
    crowd.add_user(&bob()).unwrap();

    // Group does not exist yet: 400 means "group not found" here.
    let err = crowd.add_user_to_group("bob", "eng").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::GroupNotFound));

    crowd.create_group("eng", "Engineering", true).unwrap();
    let err = crowd.create_group("eng", "", true).unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::GroupAlreadyExists));

    let group = crowd.get_group("eng").unwrap();
    assert_eq!(group.description, "Engineering");
    assert_eq!(group.group_type, "GROUP");

    crowd.add_user_to_group("bob", "eng").unwrap();
    let err = crowd.add_user_to_group("bob", "eng").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::UserAlreadyInGroup));

    let err = crowd.add_user_to_group("ghost", "eng").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::UserNotFound));

    let groups = crowd.get_user_groups("bob").unwrap();
    assert_eq!(groups.groups.len(), 1);
    assert_eq!(groups.groups[0].name, "eng");

    crowd.remove_user_from_group("bob", "eng").unwrap();
    assert!(crowd.get_user_groups("bob").unwrap().groups.is_empty());

    // The remote answers 404 for a missing membership too, so an existing
    // non-member surfaces as "user not found".
    let err = crowd.remove_user_from_group("bob", "eng").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::UserNotFound));
    match err {
        CrowdError::Domain { message, .. } => {
            assert_eq!(message.as_deref(), Some("User <bob> is not a direct member of <eng>"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    crowd.remove_group("eng").unwrap();
    let err = crowd.remove_group("eng").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::GroupNotFound));
    let err = crowd.get_group("eng").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::GroupNotFound));
}

#[test]
fn nested_group_lifecycle() {
    let crowd = connect(start_server());
    crowd.create_group("all", "", true).unwrap();
    crowd.create_group("eng", "", true).unwrap();
    crowd.create_group("backend", "", true).unwrap();

    crowd.add_child_group_membership("all", "eng").unwrap();
    crowd.add_parent_group_membership("eng", "backend").unwrap();

    // backend -> all would close the loop all > eng > backend.
    let err = crowd.add_child_group_membership("backend", "all").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::InvalidGroupMembership));

    let err = crowd.add_child_group_membership("all", "ghost").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::InvalidGroupMembership));

    let err = crowd.add_child_group_membership("ghost", "eng").unwrap_err();
    assert_eq!(err.domain(), Some(DomainError::GroupNotFound));
}

#[test]
fn names_with_reserved_characters_round_trip() {
    let crowd = connect(start_server());
    let user = User {
        name: "o'brien & co".to_string(),
        ..bob()
    };
    crowd.add_user(&user).unwrap();
    assert_eq!(crowd.get_user("o'brien & co").unwrap().name, "o'brien & co");

    crowd.create_group("R&D team", "", true).unwrap();
    crowd.add_user_to_group("o'brien & co", "R&D team").unwrap();
    crowd.remove_user_from_group("o'brien & co", "R&D team").unwrap();
}

#[test]
fn wrong_credentials_are_an_unknown_response() {
    let addr = start_server();
    let crowd = Crowd::new(&format!("http://{addr}"), "testapp", "wrong").unwrap();
    let err = crowd.get_user("bob").unwrap_err();
    assert!(matches!(err, CrowdError::UnknownResponse(401)));
}

#[test]
fn connection_refused_is_a_transport_error() {
    // Bind and immediately drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let config = ClientConfig {
        connect_timeout: Duration::from_millis(500),
        ..ClientConfig::default()
    };
    let crowd = Crowd::with_config(&format!("http://{addr}"), "testapp", "password", config).unwrap();
    let err = crowd.remove_user("bob").unwrap_err();
    match err {
        CrowdError::Transport(TransportError::Connection(io)) => {
            assert_eq!(io.kind(), std::io::ErrorKind::ConnectionRefused);
        }
        other => panic!("expected a connection error, got {other:?}"),
    }
}

#[test]
fn concurrent_calls_share_one_client() {
    let crowd = Arc::new(connect(start_server()));
    crowd.create_group("eng", "", true).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let crowd = Arc::clone(&crowd);
            std::thread::spawn(move || {
                let user = User {
                    name: format!("user{i}"),
                    ..bob()
                };
                crowd.add_user(&user).unwrap();
                crowd.add_user_to_group(&user.name, "eng").unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..8 {
        let groups = crowd.get_user_groups(&format!("user{i}")).unwrap();
        assert_eq!(groups.groups.len(), 1);
    }
}

#[test]
fn redirect_is_an_unknown_response() {
    let (addr, seen) = start_raw_server(
        b"HTTP/1.1 302 Found\r\nLocation: /ok\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        Duration::ZERO,
    );
    let crowd = connect(addr);

    let err = crowd.add_user_to_group("bob", "eng").unwrap_err();
    assert!(matches!(err, CrowdError::UnknownResponse(302)), "got {err:?}");

    let err = crowd.get_group("eng").unwrap_err();
    assert!(matches!(err, CrowdError::UnknownResponse(302)), "got {err:?}");

    // Nothing followed the Location header.
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].starts_with("POST /rest/usermanagement/1/user/group/direct?username=bob "));
    assert!(seen[1].starts_with("GET /rest/usermanagement/1/group?groupname=eng "));
}

#[test]
fn stalled_body_is_a_timeout() {
    // Promises 50 bytes, sends 4, then goes quiet.
    let (addr, _) = start_raw_server(
        b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 50\r\n\r\n{\"na",
        Duration::from_secs(3),
    );
    let config = ClientConfig {
        read_timeout: Duration::from_millis(300),
        ..ClientConfig::default()
    };
    let crowd = Crowd::with_config(&format!("http://{addr}"), "testapp", "password", config).unwrap();

    let err = crowd.get_user("bob").unwrap_err();
    assert!(
        matches!(
            err,
            CrowdError::Transport(TransportError::Timeout(ureq::Timeout::RecvBody))
        ),
        "got {err:?}"
    );
}
