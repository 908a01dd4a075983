//! Failover tests against local HTTP mirrors

use grbrowser::{Error, FailureCause, RadioBrowserClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn station_json(uuid: &str, name: &str, clicks: i64) -> serde_json::Value {
    json!({
        "stationuuid": uuid,
        "name": name,
        "url": format!("http://streams.example/{}", uuid),
        "url_resolved": format!("http://streams.example/{}.mp3", uuid),
        "countrycode": "US",
        "codec": "MP3",
        "bitrate": 128,
        "clickcount": clicks,
        "tags": "jazz,smooth jazz",
        "geo_lat": null
    })
}

/// Mirror answering every request with `status`
async fn failing_mirror(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

/// Mirror that must never be contacted
async fn untouched_mirror() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    server
}

fn client(mirrors: Vec<String>, timeout: Duration) -> RadioBrowserClient {
    RadioBrowserClient::builder()
        .mirrors(mirrors)
        .timeout(timeout)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_third_mirror_answers_and_fourth_is_not_contacted() {
    // A: too slow, B: 500, C: success, D: must stay untouched
    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([station_json("slow", "Slow", 1)]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&slow)
        .await;

    let broken = failing_mirror(500).await;

    let good = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/stations/search"))
        .and(query_param("order", "clickcount"))
        .and(query_param("reverse", "true"))
        .and(query_param("hidebroken", "true"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            station_json("c1", "Jazz FM", 900),
            station_json("c2", "Swing Radio", 300),
        ])))
        .expect(1)
        .mount(&good)
        .await;

    let never = untouched_mirror().await;

    let client = client(
        vec![slow.uri(), broken.uri(), good.uri(), never.uri()],
        Duration::from_millis(500),
    );

    let stations = client.popular(2).await.unwrap();
    assert_eq!(stations.len(), 2);
    assert_eq!(stations[0].name(), Some("Jazz FM"));
    assert!(stations[0].clickcount() >= stations[1].clickcount());
    assert_eq!(stations[0].as_value(), &station_json("c1", "Jazz FM", 900));
}

#[tokio::test]
async fn test_all_mirrors_failing_is_unavailable() {
    let first = failing_mirror(502).await;
    let second = failing_mirror(503).await;

    let client = client(vec![first.uri(), second.uri()], Duration::from_secs(2));

    let err = client.countries().await.unwrap_err();
    assert!(matches!(err, Error::Unavailable { .. }));

    let failures = err.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].cause, FailureCause::Status(502));
    assert_eq!(failures[1].cause, FailureCause::Status(503));
    assert!(err.to_string().contains("HTTP status 503"));
}

#[tokio::test]
async fn test_connection_refused_moves_to_next_mirror() {
    let good = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "pop", "stationcount": 10},
            {"name": "jazz", "stationcount": 40},
            {"name": "rock", "stationcount": 25}
        ])))
        .mount(&good)
        .await;

    let client = client(
        vec!["http://127.0.0.1:1".to_string(), good.uri()],
        Duration::from_secs(2),
    );

    let tags = client.tags(2).await.unwrap();
    let names: Vec<&str> = tags.iter().filter_map(|t| t.name()).collect();
    assert_eq!(names, vec!["jazz", "rock"]);
}

#[tokio::test]
async fn test_malformed_body_is_a_mirror_failure() {
    let garbage = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>down for maintenance</html>"))
        .mount(&garbage)
        .await;

    let good = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/stations/byuuid"))
        .and(query_param("uuid", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([station_json("abc", "ABC", 7)])))
        .mount(&good)
        .await;

    let client = client(vec![garbage.uri(), good.uri()], Duration::from_secs(2));

    let station = client.station("abc").await.unwrap();
    assert_eq!(station.uuid(), Some("abc"));
}

#[tokio::test]
async fn test_empty_byuuid_result_is_not_found() {
    let mirror = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/stations/byuuid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mirror)
        .await;

    let client = client(vec![mirror.uri()], Duration::from_secs(2));

    assert!(matches!(
        client.station("missing").await,
        Err(Error::StationNotFound(id)) if id == "missing"
    ));
}

#[tokio::test]
async fn test_click_hits_url_endpoint() {
    let mirror = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/url/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "message": "retrieved station url",
            "stationuuid": "abc"
        })))
        .expect(1)
        .mount(&mirror)
        .await;

    let client = client(vec![mirror.uri()], Duration::from_secs(2));
    let response = client.click("abc").await;
    assert!(response.success);
    assert!(response.error.is_none());
}
