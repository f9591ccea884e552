/// Scan client tests against a local `tiny_http` server.
///
/// Each test binds an ephemeral port, answers one request with a canned
/// response, and checks how the client classifies it.
use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::{Duration, Instant};

use dupdash::client::{DuplicatesSource, FetchError, ScanClient};
use dupdash::config::schema::ApiConfig;
use tiny_http::{Response, Server};

/// Serve exactly one request with the given status and body.
fn serve_once(status: u16, body: &'static str) -> SocketAddr {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let response = Response::from_string(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });
    addr
}

fn client_for(addr: SocketAddr, timeout_ms: u64) -> ScanClient {
    ScanClient::from_config(&ApiConfig {
        base_url: format!("http://{addr}"),
        timeout_ms,
        ..ApiConfig::default()
    })
}

#[test]
fn scan_decodes_categorized_groups() {
    let addr = serve_once(
        200,
        r#"{
            "All Categories": [{"similarity_score_percentage": 97, "number_of_apis": 2, "pairs": [
                {"source": {"name": "Pay", "version": "1.0"},
                 "destination": {"name": "Payments", "version": "2.0"},
                 "similarity_full_explanation_text": "Overall similarity: 97% (paths match)"}
            ]}],
            "Payment": [{"similarity_score_percentage": 97, "pairs": []}]
        }"#,
    );

    let data = client_for(addr, 5_000).scan_api_duplicates().unwrap();
    let categories: Vec<&str> = data.categories().collect();
    assert_eq!(categories, vec!["All Categories", "Payment"]);

    let group = &data.get("All Categories").unwrap()[0];
    assert_eq!(group.api_count(), 2);
    assert_eq!(group.pairs[0].effective_score(), 97);
    assert_eq!(group.pairs[0].source.as_ref().unwrap().display_version(), "1.0");
}

#[test]
fn not_found_status_is_classified() {
    let addr = serve_once(404, "no such route");
    let err = client_for(addr, 5_000).fetch().unwrap_err();
    assert_eq!(err, FetchError::NotFound);
    assert_eq!(err.to_string(), "API endpoint not found.");
}

#[test]
fn server_errors_are_classified() {
    let addr = serve_once(503, "unavailable");
    let err = client_for(addr, 5_000).fetch().unwrap_err();
    assert_eq!(err, FetchError::Server);
}

#[test]
fn other_statuses_keep_their_code() {
    let addr = serve_once(401, "unauthorized");
    let err = client_for(addr, 5_000).fetch().unwrap_err();
    assert_eq!(
        err,
        FetchError::Unknown("Request failed with status code 401".into())
    );
}

#[test]
fn undecodable_body_is_unknown() {
    let addr = serve_once(200, "<html>not json</html>");
    let err = client_for(addr, 5_000).fetch().unwrap_err();
    assert!(matches!(err, FetchError::Unknown(_)));
}

#[test]
fn refused_connection_is_network_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let err = client_for(addr, 2_000).fetch().unwrap_err();
    assert_eq!(err, FetchError::Network);
    assert_eq!(err.kind(), "network");
}

#[test]
fn slow_server_times_out() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        if let Ok(request) = server.recv() {
            thread::sleep(Duration::from_secs(2));
            drop(request);
        }
    });

    let err = client_for(addr, 200).fetch().unwrap_err();
    assert_eq!(err, FetchError::Timeout);
}

#[test]
fn health_check_reports_status() {
    let addr = serve_once(200, "ok");
    assert!(client_for(addr, 5_000).health_check());

    let addr = serve_once(500, "down");
    assert!(!client_for(addr, 5_000).health_check());
}

#[test]
fn stalled_health_check_gives_up_early() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        if let Ok(request) = server.recv() {
            thread::sleep(Duration::from_secs(6));
            drop(request);
        }
    });

    let started = Instant::now();
    assert!(!client_for(addr, 30_000).health_check());
    assert!(started.elapsed() < Duration::from_secs(5));
}
