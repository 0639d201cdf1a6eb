//! Integration tests using wiremock to simulate HTTP servers.

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use restline::{
    delete, get, in_parallel_calls, post, put, Backoff, CallError, Caller, Error,
    ReqwestTransport, ResilientCall, Transport, TransportError, TransportRequest,
    TransportResponse,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq, Default)]
struct TestData {
    id: u32,
    name: String,
}

fn transport() -> Arc<ReqwestTransport> {
    Arc::new(ReqwestTransport::new().unwrap())
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[tokio::test]
async fn get_decodes_json_into_map() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get_ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"name":"aName"}"#))
        .mount(&mock_server)
        .await;

    let mut entity = HashMap::<String, String>::new();
    let response = get(transport(), format!("{}/get_ok", mock_server.uri()))
        .execute(&mut entity)
        .await;

    assert_eq!(response.status_code, 200);
    assert!(response.error.is_none());
    assert_eq!(entity.get("name").map(String::as_str), Some("aName"));
}

#[tokio::test]
async fn get_404_leaves_entity_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let mut entity = TestData {
        id: 42,
        name: "sentinel".to_string(),
    };
    let response = get(transport(), format!("{}/missing", mock_server.uri()))
        .execute(&mut entity)
        .await;

    assert_eq!(response.status_code, 404);
    assert!(response.error.is_none());
    assert_eq!(entity.id, 42);
    assert_eq!(entity.name, "sentinel");
}

#[tokio::test]
async fn transport_failure_reports_zero_status() {
    struct RefusingTransport;

    #[async_trait]
    impl Transport for RefusingTransport {
        async fn send(
            &self,
            _request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            Err(TransportError::new("connection refused"))
        }
    }

    let mut entity = TestData::default();
    let response = get(Arc::new(RefusingTransport), "http://test/down")
        .execute(&mut entity)
        .await;

    assert_eq!(response.status_code, 0);
    match response.error {
        Some(Error::Transport(e)) => assert_eq!(e.to_string(), "connection refused"),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn basic_authorization_header_is_exact() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get_basic_auth"))
        .and(header("Authorization", "Basic YWRtaW46YWRtaW4="))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .mount(&mock_server)
        .await;

    let mut entity = HashMap::<String, String>::new();
    let response = get(transport(), format!("{}/get_basic_auth", mock_server.uri()))
        .with_json_content_type()
        .with_basic_authorization("admin", "admin")
        .execute(&mut entity)
        .await;

    assert_eq!(response.status_code, 200);
    assert!(response.error.is_none());
    assert_eq!(entity.get("status").map(String::as_str), Some("ok"));
}

#[tokio::test]
async fn gzip_response_is_inflated() {
    let mock_server = MockServer::start().await;

    let compressed = gzip(br#"{"status":"ok"}"#);
    Mock::given(method("GET"))
        .and(path("/get_with_gzip"))
        .and(header("Accept-Encoding", "gzip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed)
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let mut entity = HashMap::<String, String>::new();
    let response = get(transport(), format!("{}/get_with_gzip", mock_server.uri()))
        .accept_gzip_encoding()
        .with_json_content_type()
        .log_request_body()
        .log_response_body()
        .execute(&mut entity)
        .await;

    assert_eq!(response.status_code, 200);
    assert!(response.error.is_none());
    assert_eq!(entity.get("status").map(String::as_str), Some("ok"));
}

#[tokio::test]
async fn corrupt_gzip_body_keeps_true_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bad_gzip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"not gzip at all".to_vec())
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let mut entity = HashMap::<String, String>::new();
    let response = get(transport(), format!("{}/bad_gzip", mock_server.uri()))
        .execute(&mut entity)
        .await;

    assert_eq!(response.status_code, 200);
    assert!(matches!(response.error, Some(Error::Decompress { .. })));
    assert!(entity.is_empty());
}

#[tokio::test]
async fn xml_round_trips_over_the_wire() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/xml"))
        .and(header("Content-Type", "application/xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<TestData><id>7</id><name>aName</name></TestData>"),
        )
        .mount(&mock_server)
        .await;

    let mut entity = TestData::default();
    let response = post(transport(), format!("{}/xml", mock_server.uri()))
        .with_xml_content_type()
        .with_body(TestData {
            id: 7,
            name: "aName".to_string(),
        })
        .execute(&mut entity)
        .await;

    assert_eq!(response.status_code, 200);
    assert!(response.error.is_none());
    assert_eq!(
        entity,
        TestData {
            id: 7,
            name: "aName".to_string()
        }
    );
}

#[tokio::test]
async fn query_params_and_body_reach_the_server() {
    let mock_server = MockServer::start().await;

    let sent = TestData {
        id: 0,
        name: "New".to_string(),
    };
    Mock::given(method("PUT"))
        .and(path("/update"))
        .and(query_param("page", "2"))
        .and(body_json(&sent))
        .respond_with(ResponseTemplate::new(200).set_body_json(&TestData {
            id: 1,
            name: "New".to_string(),
        }))
        .mount(&mock_server)
        .await;

    let mut entity = TestData::default();
    let response = put(transport(), format!("{}/update", mock_server.uri()))
        .with_query_param("page", "1")
        .with_query_param("page", "2")
        .with_json_content_type()
        .with_body(sent)
        .execute(&mut entity)
        .await;

    assert_eq!(response.status_code, 200);
    assert!(response.error.is_none());
    assert_eq!(entity.id, 1);
}

#[tokio::test]
async fn delete_reports_2xx_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/resource"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let mut entity = serde_json::Value::Null;
    let response = delete(transport(), format!("{}/resource", mock_server.uri()))
        .execute(&mut entity)
        .await;

    // A 204 has no body; the JSON codec rejects the empty payload while the
    // status still reflects the outcome.
    assert_eq!(response.status_code, 204);
    assert!(matches!(response.error, Some(Error::Unmarshal { .. })));
}

#[tokio::test]
async fn custom_json_unmarshal_is_applied() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/custom"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":1,"name":"plain"}"#))
        .mount(&mock_server)
        .await;

    let mut entity = TestData::default();
    let response = get(transport(), format!("{}/custom", mock_server.uri()))
        .with_custom_json_unmarshal(|bytes, out: &mut TestData| {
            *out = serde_json::from_slice(bytes)
                .map_err(|e| Error::unmarshal(restline::APPLICATION_JSON, e))?;
            out.name = out.name.to_uppercase();
            Ok(())
        })
        .execute(&mut entity)
        .await;

    assert!(response.is_success());
    assert_eq!(entity.name, "PLAIN");
}

#[tokio::test]
async fn resilient_call_recovers_after_retryable_failures() {
    let mock_server = MockServer::start().await;
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(move |_req: &wiremock::Request| {
            if hits_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_string(r#"{"id":1,"name":"recovered"}"#)
            }
        })
        .mount(&mock_server)
        .await;

    let request = get(transport(), format!("{}/flaky", mock_server.uri()));
    let mut call = ResilientCall::new(request, TestData::default(), |response| {
        match response.status_code {
            200..=299 => Ok(()),
            503 => Err(CallError::retryable("service unavailable")),
            status => Err(CallError::fatal(format!("unexpected status {status}"))),
        }
    })
    .retries(3)
    .backoff(Backoff::Fixed {
        delay: Duration::from_millis(10),
    });

    call.execute_call().await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(call.entity().name, "recovered");
}

#[tokio::test]
async fn resilient_call_spends_budget_and_returns_last_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/always_down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let request = get(transport(), format!("{}/always_down", mock_server.uri()));
    let mut call = ResilientCall::new(
        request,
        HashMap::<String, String>::new(),
        |response| match response.status_code {
            200..=299 => Ok(()),
            _ => Err(CallError::retryable("still down")),
        },
    )
    .retries(2);

    let err = call.execute_call().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.to_string(), "still down");
}

#[tokio::test]
async fn parallel_calls_run_all_to_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":1,"name":"fine"}"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let handler = |response: &restline::CallResponse| match response.status_code {
        200..=299 => Ok(()),
        status => Err(CallError::fatal(format!("status {status}"))),
    };

    let completed = Arc::new(AtomicUsize::new(0));

    struct CountingCall {
        inner: ResilientCall<TestData, restline::RequestBuilder<TestData>>,
        completed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Caller for CountingCall {
        async fn execute_call(&mut self) -> Result<(), CallError> {
            let outcome = self.inner.execute_call().await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            outcome
        }
    }

    let make_call = |route: &str| CountingCall {
        inner: ResilientCall::new(
            get(transport(), format!("{}{}", mock_server.uri(), route)),
            TestData::default(),
            handler,
        ),
        completed: completed.clone(),
    };

    let callers: Vec<Box<dyn Caller>> = vec![
        Box::new(make_call("/ok")),
        Box::new(make_call("/broken")),
        Box::new(make_call("/ok")),
    ];

    let err = in_parallel_calls(callers).await.unwrap_err();
    assert_eq!(err.to_string(), "status 500");
    assert_eq!(completed.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn parallel_calls_succeed_when_every_call_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":1,"name":"fine"}"#))
        .mount(&mock_server)
        .await;

    let handler = |response: &restline::CallResponse| match response.status_code {
        200..=299 => Ok(()),
        status => Err(CallError::retryable(format!("status {status}"))),
    };

    let callers: Vec<Box<dyn Caller>> = (0..3)
        .map(|_| {
            Box::new(ResilientCall::new(
                get(transport(), format!("{}/ok", mock_server.uri())),
                TestData::default(),
                handler,
            )) as Box<dyn Caller>
        })
        .collect();

    assert!(in_parallel_calls(callers).await.is_ok());
}
