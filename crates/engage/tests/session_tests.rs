//! Login, logout and session encoding behaviour.

mod common;

use common::{MockTransport, client, fault, login_ok, ok};
use engage::{Credentials, EngageError, RequestBody};

#[tokio::test]
async fn test_login_stores_session() {
    let transport = MockTransport::new();
    transport.reply(login_ok("ABC123"));
    let client = client(&transport);

    client.login().await.unwrap();

    assert!(client.is_logged_in());
    let session = client.session().unwrap();
    assert_eq!(session.id(), "ABC123");
    assert_eq!(session.encoding(), ";jsessionid=ABC123");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].session_encoding, None);
    assert!(requests[0].body_text().contains("<USERNAME>api-user</USERNAME>"));
}

#[tokio::test]
async fn test_calls_carry_session_encoding() {
    let transport = MockTransport::new();
    transport.reply(login_ok("ABC123")).reply(ok("<LIST/>"));
    let client = client(&transport);

    client.login().await.unwrap();
    client.get_lists(0, 2).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[1].session_encoding.as_deref(), Some(";jsessionid=ABC123"));
    // Encoding is metadata, never part of the envelope
    assert!(!requests[1].body_text().contains("jsessionid"));
}

#[tokio::test]
async fn test_rejected_login_is_authentication_error() {
    let transport = MockTransport::new();
    transport.reply(fault("Invalid user name or password."));
    let client = client(&transport);

    let err = client.login().await.unwrap_err();

    match err {
        EngageError::Authentication(reason) => {
            assert_eq!(reason, "Invalid user name or password.")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_login_without_session_fields_is_rejected() {
    let transport = MockTransport::new();
    transport.reply(ok("<SESSIONID>ABC123</SESSIONID>"));
    let client = client(&transport);

    let err = client.login().await.unwrap_err();

    assert!(matches!(err, EngageError::Authentication(_)));
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_login_without_credentials_sends_nothing() {
    let transport = MockTransport::new();
    let client = engage::EngageClient::new(transport.clone());

    let err = client.login().await.unwrap_err();

    assert!(matches!(err, EngageError::Authentication(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_relogin_logs_out_first() {
    let transport = MockTransport::new();
    transport
        .reply(login_ok("FIRST"))
        .reply(ok(""))
        .reply(login_ok("SECOND"));
    let client = client(&transport);

    client.login().await.unwrap();
    client
        .login_with(&Credentials::new("other-user", "secret"))
        .await
        .unwrap();

    assert_eq!(transport.operations(), vec!["Login", "Logout", "Login"]);
    let requests = transport.requests();
    assert_eq!(requests[1].session_encoding.as_deref(), Some(";jsessionid=FIRST"));
    assert_eq!(requests[2].session_encoding, None);
    assert_eq!(client.session().unwrap().id(), "SECOND");
}

#[tokio::test]
async fn test_relogin_proceeds_when_logout_is_rejected() {
    let transport = MockTransport::new();
    transport
        .reply(login_ok("FIRST"))
        .reply(fault("Session has expired."))
        .reply(login_ok("SECOND"));
    let client = client(&transport);

    client.login().await.unwrap();
    client.login().await.unwrap();

    assert_eq!(transport.operations(), vec!["Login", "Logout", "Login"]);
    assert_eq!(client.session().unwrap().id(), "SECOND");
}

#[tokio::test]
async fn test_relogin_proceeds_when_logout_transport_fails() {
    let transport = MockTransport::new();
    transport
        .reply(login_ok("FIRST"))
        .fail("connection reset")
        .reply(login_ok("SECOND"));
    let client = client(&transport);

    client.login().await.unwrap();
    client.login().await.unwrap();

    assert_eq!(transport.count("Login"), 2);
    assert_eq!(client.session().unwrap().id(), "SECOND");
}

#[tokio::test]
async fn test_logout_without_session_makes_no_call() {
    let transport = MockTransport::new();
    let client = client(&transport);

    assert!(!client.logout().await.unwrap());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_logout_clears_session() {
    let transport = MockTransport::new();
    transport.reply(login_ok("ABC123")).reply(ok(""));
    let client = client(&transport);

    client.login().await.unwrap();
    assert!(client.logout().await.unwrap());

    assert!(!client.is_logged_in());
    assert_eq!(client.session(), None);
}

#[tokio::test]
async fn test_rejected_logout_keeps_stale_session() {
    let transport = MockTransport::new();
    transport
        .reply(login_ok("ABC123"))
        .reply(fault("Logout failed"));
    let client = client(&transport);

    client.login().await.unwrap();
    assert!(!client.logout().await.unwrap());

    assert!(client.is_logged_in());
    assert_eq!(client.session().unwrap().id(), "ABC123");
}

#[tokio::test]
async fn test_calls_without_session_fail_locally() {
    let transport = MockTransport::new();
    let client = client(&transport);

    let err = client
        .execute(RequestBody::new("GetLists").field("VISIBILITY", 0))
        .await
        .unwrap_err();

    assert!(matches!(err, EngageError::NotLoggedIn { ref operation } if operation == "GetLists"));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_clones_share_the_session() {
    let transport = MockTransport::new();
    transport.reply(login_ok("ABC123")).reply(ok(""));
    let client = client(&transport);
    let other = client.clone();

    client.login().await.unwrap();
    assert!(other.is_logged_in());

    assert!(other.logout().await.unwrap());
    assert!(!client.is_logged_in());
}
