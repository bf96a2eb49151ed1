//! Integration tests for the OpenCage client (wiremock-based)

use std::sync::{Arc, Mutex};

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use integration_opencage::{
    EventLogger, Geocoder, OpenCageClient, OpenCageConfig, OpenCageError, QueryParams,
    RATE_LIMIT_LIMIT_EVENT, RATE_LIMIT_REMAINING_EVENT, RATE_LIMIT_RESET_EVENT,
};

type Events = Arc<Mutex<Vec<(String, Option<String>)>>>;

fn config_for_mock(server: &MockServer) -> OpenCageConfig {
    OpenCageConfig {
        api_key: Some("test-key".to_string()),
        api_domain: server.address().ip().to_string(),
        port: server.address().port(),
        use_tls: false,
        timeout_secs: 5,
        ..OpenCageConfig::default()
    }
}

fn client_for_mock(server: &MockServer) -> (OpenCageClient, Events) {
    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let config = config_for_mock(server).with_logger(EventLogger::new(move |event, value| {
        sink.lock()
            .unwrap()
            .push((event.to_string(), value.map(str::to_string)));
    }));
    (OpenCageClient::new(&config).unwrap(), events)
}

const fn sample_search_json() -> &'static str {
    r#"{
        "documentation": "https://opencagedata.com/api",
        "status": { "code": 200, "message": "OK" },
        "total_results": 2,
        "rate": { "limit": 2500, "remaining": 2499, "reset": 1402185600 },
        "results": [
            {
                "confidence": 5,
                "formatted": "New York, United States of America",
                "components": { "city": "New York", "country_code": "us" },
                "geometry": { "lat": 40.7127281, "lng": -74.0060152 }
            },
            {
                "confidence": 8,
                "formatted": "New York County, NY, United States of America",
                "components": { "county": "New York County", "country_code": "us" },
                "geometry": { "lat": 40.7830603, "lng": -73.9712488 }
            }
        ]
    }"#
}

const fn sample_reverse_json() -> &'static str {
    r#"{
        "status": { "code": 200, "message": "OK" },
        "total_results": 1,
        "results": [
            {
                "confidence": 10,
                "formatted": "Pariser Platz 1, 10117 Berlin, Germany",
                "components": { "city": "Berlin", "road": "Pariser Platz" },
                "geometry": { "lat": 52.5163, "lng": 13.3777 }
            }
        ]
    }"#
}

#[tokio::test]
async fn test_search_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("q", "New York, NY"))
        .and(query_param("key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-RateLimit-Limit", "2500")
                .insert_header("X-RateLimit-Remaining", "2499")
                .set_body_string(sample_search_json()),
        )
        .mount(&server)
        .await;

    let (client, events) = client_for_mock(&server);
    let results = client.search("New York, NY", None).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].confidence, Some(8));
    assert!((results[0].confidence_in_m - 1_000.0).abs() < f64::EPSILON);
    assert_eq!(
        results[0].formatted(),
        Some("New York County, NY, United States of America")
    );
    assert_eq!(results[1].confidence, Some(5));
    assert!((results[1].confidence_in_m - 10_000.0).abs() < f64::EPSILON);

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            (RATE_LIMIT_LIMIT_EVENT.to_string(), Some("2500".to_string())),
            (
                RATE_LIMIT_REMAINING_EVENT.to_string(),
                Some("2499".to_string())
            ),
        ]
    );
}

#[tokio::test]
async fn test_search_sends_escaped_address_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_search_json()))
        .mount(&server)
        .await;

    let (client, _) = client_for_mock(&server);
    client.search("New York, NY", None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url.query(),
        Some("q=New+York%2C+NY&key=test-key")
    );
}

#[tokio::test]
async fn test_search_address_with_hash_keeps_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("q", "Unit #5, 10 Main St"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_search_json()))
        .mount(&server)
        .await;

    let (client, _) = client_for_mock(&server);
    let results = client.search("Unit #5, 10 Main St", None).await.unwrap();
    assert_eq!(results.len(), 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url.query(),
        Some("q=Unit+%235%2C+10+Main+St&key=test-key")
    );
}

#[tokio::test]
async fn test_search_with_extra_options() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("language", "de"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_search_json()))
        .mount(&server)
        .await;

    let (client, _) = client_for_mock(&server);
    let options = QueryParams::new().with("language", "de").with("limit", 1);
    let results = client.search("Berlin", Some(&options)).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_reverse_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("q", "52.5163,13.3777"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_reverse_json()))
        .mount(&server)
        .await;

    let (client, _) = client_for_mock(&server);
    let results = client
        .reverse(52.5163.into(), 13.3777.into(), None)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].formatted(),
        Some("Pariser Platz 1, 10117 Berlin, Germany")
    );
    assert!((results[0].confidence_in_m - 250.0).abs() < f64::EPSILON);
    let geometry = results[0].geometry().unwrap();
    assert!((geometry.lat - 52.5163).abs() < 1e-9);
}

#[tokio::test]
async fn test_quota_exceeded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .respond_with(ResponseTemplate::new(402).set_body_string(
            r#"{"status": {"code": 402, "message": "quota exceeded"}, "results": []}"#,
        ))
        .mount(&server)
        .await;

    let (client, _) = client_for_mock(&server);
    let err = client.search("Berlin", None).await.unwrap_err();

    assert_eq!(err.to_string(), "quota exceeded");
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_too_many_requests_reports_reset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("X-RateLimit-Reset", "60")
                .set_body_string(
                    r#"{"status": {"code": 429, "message": "Too Many Requests"}, "results": []}"#,
                ),
        )
        .mount(&server)
        .await;

    let (client, events) = client_for_mock(&server);
    let err = client.search("Berlin", None).await.unwrap_err();

    assert!(matches!(
        err,
        OpenCageError::ServiceStatus { code: 429, .. }
    ));
    assert!(
        events
            .lock()
            .unwrap()
            .contains(&(RATE_LIMIT_RESET_EVENT.to_string(), Some("60".to_string())))
    );
}

#[tokio::test]
async fn test_server_error_without_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let (client, _) = client_for_mock(&server);
    let err = client.search("Berlin", None).await.unwrap_err();

    assert!(matches!(err, OpenCageError::HttpStatus { status: 503 }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_empty_address_makes_no_request() {
    let server = MockServer::start().await;

    let (client, _) = client_for_mock(&server);
    let err = client.search("", None).await.unwrap_err();
    assert!(matches!(err, OpenCageError::InvalidAddress));

    let err = client
        .reverse("".into(), 13.0.into(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, OpenCageError::InvalidAddress));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_refused() {
    // reserve a free port, then release it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = OpenCageConfig {
        api_key: Some("test-key".to_string()),
        api_domain: "127.0.0.1".to_string(),
        port,
        use_tls: false,
        timeout_secs: 5,
        ..OpenCageConfig::default()
    };
    let client = OpenCageClient::new(&config).unwrap();
    let err = client.search("Berlin", None).await.unwrap_err();

    assert!(matches!(err, OpenCageError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_concurrent_requests_complete_independently() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("q", "Berlin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_reverse_json()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("q", "Hamburg"))
        .respond_with(ResponseTemplate::new(402).set_body_string(
            r#"{"status": {"code": 402, "message": "quota exceeded"}}"#,
        ))
        .mount(&server)
        .await;

    let (client, _) = client_for_mock(&server);
    let (berlin, hamburg) = tokio::join!(
        client.search("Berlin", None),
        client.search("Hamburg", None)
    );

    assert_eq!(berlin.unwrap().len(), 1);
    assert_eq!(hamburg.unwrap_err().to_string(), "quota exceeded");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
