//! HTTP transport behaviour against a mock Engage endpoint.

use engage_transport::{
    HttpTransport, HttpTransportConfig, LimitsConfig, TimeoutConfig, Transport, TransportError,
    TransportRequest,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGOUT: &str = "<Envelope><Body><Logout/></Body></Envelope>";
const OK_BODY: &str = "<Envelope><Body><RESULT><SUCCESS>TRUE</SUCCESS></RESULT></Body></Envelope>";

fn transport_for(server: &MockServer) -> HttpTransport {
    let config = HttpTransportConfig::new(format!("{}/XMLAPI", server.uri()))
        .with_timeouts(TimeoutConfig::fast());
    HttpTransport::new(config).expect("transport")
}

#[tokio::test]
async fn test_posts_xml_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/XMLAPI"))
        .and(header("content-type", "text/xml;charset=UTF-8"))
        .and(body_string_contains("<Logout/>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let body = transport
        .send(TransportRequest::new(LOGOUT))
        .await
        .expect("send");

    assert_eq!(body, OK_BODY.as_bytes());
    let metrics = transport.metrics();
    assert_eq!(metrics.requests_sent, 1);
    assert_eq!(metrics.responses_received, 1);
    assert_eq!(metrics.bytes_received, OK_BODY.len() as u64);
}

#[tokio::test]
async fn test_session_encoding_travels_on_the_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/XMLAPI;jsessionid=ABC123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let request = TransportRequest::new(LOGOUT).with_session_encoding(";jsessionid=ABC123");
    let body = transport.send(request).await.expect("send");

    // The envelope itself is untouched
    assert_eq!(body, OK_BODY.as_bytes());
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport
        .send(TransportRequest::new(LOGOUT))
        .await
        .unwrap_err();

    match err {
        TransportError::HttpStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.metrics().failed_requests, 1);
}

#[tokio::test]
async fn test_oversized_request_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = HttpTransportConfig::new(format!("{}/XMLAPI", server.uri())).with_limits(
        LimitsConfig {
            max_request_size: Some(8),
            max_response_size: None,
        },
    );
    let transport = HttpTransport::new(config).expect("transport");

    let err = transport
        .send(TransportRequest::new(LOGOUT))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::RequestTooLarge { max: 8, .. }));
}

#[tokio::test]
async fn test_oversized_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
        .mount(&server)
        .await;

    let config = HttpTransportConfig::new(format!("{}/XMLAPI", server.uri())).with_limits(
        LimitsConfig {
            max_request_size: None,
            max_response_size: Some(16),
        },
    );
    let transport = HttpTransport::new(config).expect("transport");

    let err = transport
        .send(TransportRequest::new(LOGOUT))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::ResponseTooLarge { max: 16, .. }));
}

#[tokio::test]
async fn test_connection_refused_is_connection_failure() {
    // Port 9 (discard) on localhost is expected to refuse connections
    let config =
        HttpTransportConfig::new("http://127.0.0.1:9/XMLAPI").with_timeouts(TimeoutConfig::fast());
    let transport = HttpTransport::new(config).expect("transport");

    let err = transport
        .send(TransportRequest::new(LOGOUT))
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            TransportError::ConnectionFailed(_) | TransportError::SendFailed(_)
        ),
        "unexpected error: {err:?}"
    );
}
