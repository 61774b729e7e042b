//! Redirect service tests
//!
//! Tests for the core redirect path: short code → 302 redirect, plus expiry
//! handling and the click side effects (referrer, client IP, geolocation).

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use snaplink::api::middleware::RequestLogMiddleware;
use snaplink::api::services::{redirect_routes, shorturl_routes};
use snaplink::registry::{ShortUrlEntry, ShortcodeRegistry};
use snaplink::services::{
    GeoInfo, GeoIpLookup, LinkService, LinkSettings, LogLevel, LogNotifier, NullLogSink,
};
use snaplink::utils::{Clock, ManualClock};

// =============================================================================
// Test Doubles
// =============================================================================

/// Records every IP it is asked about
#[derive(Default)]
struct RecordingGeo {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl GeoIpLookup for RecordingGeo {
    async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        self.seen.lock().push(ip.to_string());
        Some(GeoInfo {
            country: Some("AU".to_string()),
            region: Some("NSW".to_string()),
            city: Some("Sydney".to_string()),
        })
    }

    fn name(&self) -> &'static str {
        "Recording"
    }
}

struct StalledGeo;

#[async_trait]
impl GeoIpLookup for StalledGeo {
    async fn lookup(&self, _ip: &str) -> Option<GeoInfo> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        None
    }

    fn name(&self) -> &'static str {
        "Stalled"
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<(LogLevel, String, String)>>,
}

impl RecordingSink {
    fn contains(&self, level: LogLevel, component: &str, message: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|(l, c, m)| *l == level && c == component && m == message)
    }
}

impl LogNotifier for RecordingSink {
    fn notify(&self, level: LogLevel, component: &str, message: &str) {
        self.events
            .lock()
            .push((level, component.to_string(), message.to_string()));
    }
}

// =============================================================================
// Test Setup
// =============================================================================

struct Fixture {
    clock: Arc<ManualClock>,
    registry: Arc<ShortcodeRegistry>,
    service: Arc<LinkService>,
}

fn fixture(
    geoip: Option<Arc<dyn GeoIpLookup>>,
    notifier: Arc<dyn LogNotifier>,
    settings: LinkSettings,
) -> Fixture {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let registry = Arc::new(ShortcodeRegistry::new(clock.clone()));
    let service = Arc::new(LinkService::new(
        registry.clone(),
        geoip,
        notifier,
        settings,
    ));
    Fixture {
        clock,
        registry,
        service,
    }
}

fn plain_fixture() -> Fixture {
    fixture(None, Arc::new(NullLogSink), LinkSettings::default())
}

macro_rules! redirect_app {
    ($service:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($service.clone()))
                .service(shorturl_routes())
                .service(redirect_routes()),
        )
        .await
    };
}

fn seed(fx: &Fixture, code: &str, target: &str, validity_minutes: u64) {
    fx.registry
        .insert(ShortUrlEntry::new(
            code,
            target,
            fx.clock.now_millis(),
            validity_minutes,
        ))
        .unwrap();
}

// =============================================================================
// Redirects
// =============================================================================

#[tokio::test]
async fn test_redirect_to_target() {
    let fx = plain_fixture();
    seed(&fx, "go", "https://www.rust-lang.org/", 30);
    let app = redirect_app!(fx.service);

    let req = TestRequest::get().uri("/go").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "https://www.rust-lang.org/"
    );
}

#[tokio::test]
async fn test_unknown_code_is_not_found() {
    let fx = plain_fixture();
    let app = redirect_app!(fx.service);

    let resp =
        test::call_service(&app, TestRequest::get().uri("/doesnotexist").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Shortcode not found" }));
}

#[tokio::test]
async fn test_invalid_code_syntax_is_not_found() {
    let fx = plain_fixture();
    let app = redirect_app!(fx.service);

    let resp = test::call_service(&app, TestRequest::get().uri("/bad.code").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_zero_validity_expires_then_disappears() {
    let fx = plain_fixture();
    let app = redirect_app!(fx.service);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/shorturls")
            .set_json(json!({ "url": "example.com", "validity": 0 }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let code = body["shortcode"].as_str().unwrap().to_string();

    fx.clock.advance(1);

    let uri = format!("/{}", code);
    let first = test::call_service(&app, TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(first.status(), StatusCode::GONE);
    let body: Value = test::read_body_json(first).await;
    assert_eq!(body["error"], "Shortcode expired");

    let second = test::call_service(&app, TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    assert!(fx.registry.is_empty());
}

#[tokio::test]
async fn test_expiry_boundary_is_still_live() {
    let fx = plain_fixture();
    seed(&fx, "edge", "http://example.com", 1);
    let app = redirect_app!(fx.service);

    fx.clock.advance_minutes(1);
    let resp = test::call_service(&app, TestRequest::get().uri("/edge").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    fx.clock.advance(1);
    let resp = test::call_service(&app, TestRequest::get().uri("/edge").to_request()).await;
    assert_eq!(resp.status(), StatusCode::GONE);
}

// =============================================================================
// Click recording
// =============================================================================

#[tokio::test]
async fn test_each_redirect_appends_one_click() {
    let fx = plain_fixture();
    seed(&fx, "count", "http://example.com", 30);
    let app = redirect_app!(fx.service);

    for i in 0..3 {
        fx.clock.advance(10);
        let req = TestRequest::get()
            .uri("/count")
            .insert_header(("Referer", format!("https://ref{}.example/", i)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    let entry = fx.registry.get("count").unwrap();
    assert_eq!(entry.click_count(), 3);
    let referrers: Vec<_> = entry
        .clicks
        .iter()
        .map(|c| c.referrer.clone().unwrap())
        .collect();
    assert_eq!(
        referrers,
        vec![
            "https://ref0.example/",
            "https://ref1.example/",
            "https://ref2.example/"
        ]
    );
    assert!(entry.clicks.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(entry.clicks[2].timestamp, fx.clock.now_millis());
}

#[tokio::test]
async fn test_head_reports_target_without_recording_a_click() {
    let geo = Arc::new(RecordingGeo::default());
    let fx = fixture(Some(geo.clone()), Arc::new(NullLogSink), LinkSettings::default());
    seed(&fx, "peek", "http://example.com", 30);
    let app = redirect_app!(fx.service);

    let req = TestRequest::default()
        .method(actix_web::http::Method::HEAD)
        .uri("/peek")
        .insert_header(("X-Forwarded-For", "8.8.8.8"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get("location").unwrap(), "http://example.com");
    assert_eq!(fx.registry.get("peek").unwrap().click_count(), 0);
    assert!(geo.seen.lock().is_empty());

    let resp = test::call_service(&app, TestRequest::get().uri("/peek").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(fx.registry.get("peek").unwrap().click_count(), 1);
}

#[tokio::test]
async fn test_head_on_unknown_code_is_not_found() {
    let fx = plain_fixture();
    let app = redirect_app!(fx.service);

    let req = TestRequest::default()
        .method(actix_web::http::Method::HEAD)
        .uri("/nothing")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_first_forwarded_address_is_geolocated() {
    let geo = Arc::new(RecordingGeo::default());
    let fx = fixture(Some(geo.clone()), Arc::new(NullLogSink), LinkSettings::default());
    seed(&fx, "geo", "http://example.com", 30);
    let app = redirect_app!(fx.service);

    let req = TestRequest::get()
        .uri("/geo")
        .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
        .to_request();
    test::call_service(&app, req).await;

    let req = TestRequest::get()
        .uri("/geo")
        .insert_header(("X-Forwarded-For", "::ffff:8.8.4.4"))
        .to_request();
    test::call_service(&app, req).await;

    assert_eq!(*geo.seen.lock(), vec!["203.0.113.7", "8.8.4.4"]);

    let entry = fx.registry.get("geo").unwrap();
    let location = entry.clicks[0].location.clone().unwrap();
    assert_eq!(location.country.as_deref(), Some("AU"));
    assert_eq!(location.city.as_deref(), Some("Sydney"));
}

#[tokio::test]
async fn test_private_addresses_are_not_geolocated() {
    let geo = Arc::new(RecordingGeo::default());
    let fx = fixture(Some(geo.clone()), Arc::new(NullLogSink), LinkSettings::default());
    seed(&fx, "lan", "http://example.com", 30);
    let app = redirect_app!(fx.service);

    let req = TestRequest::get()
        .uri("/lan")
        .insert_header(("X-Forwarded-For", "192.168.1.20"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    assert!(geo.seen.lock().is_empty());
    let entry = fx.registry.get("lan").unwrap();
    assert_eq!(entry.click_count(), 1);
    assert!(entry.clicks[0].location.is_none());
}

#[tokio::test]
async fn test_stalled_geolocation_does_not_hold_the_redirect() {
    let settings = LinkSettings {
        geo_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let fx = fixture(Some(Arc::new(StalledGeo)), Arc::new(NullLogSink), settings);
    seed(&fx, "slow", "http://example.com", 30);
    let app = redirect_app!(fx.service);

    let started = Instant::now();
    let req = TestRequest::get()
        .uri("/slow")
        .insert_header(("X-Forwarded-For", "8.8.8.8"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(started.elapsed() < Duration::from_secs(5));

    let entry = fx.registry.get("slow").unwrap();
    assert_eq!(entry.click_count(), 1);
    assert!(entry.clicks[0].location.is_none());
}

// =============================================================================
// Log notifications
// =============================================================================

#[tokio::test]
async fn test_log_events_for_create_redirect_and_miss() {
    let sink = Arc::new(RecordingSink::default());
    let fx = fixture(None, sink.clone(), LinkSettings::default());
    let app = test::init_service(
        App::new()
            .wrap(RequestLogMiddleware::new(sink.clone()))
            .app_data(web::Data::new(fx.service.clone()))
            .service(shorturl_routes())
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/shorturls")
            .set_json(json!({ "url": "example.com", "shortcode": "logged" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    test::call_service(&app, TestRequest::get().uri("/logged").to_request()).await;
    test::call_service(&app, TestRequest::get().uri("/missing").to_request()).await;

    assert!(sink.contains(LogLevel::Info, "middleware", "Incoming POST /shorturls"));
    assert!(sink.contains(LogLevel::Info, "middleware", "Incoming GET /logged"));
    assert!(sink.contains(LogLevel::Info, "controller", "Short URL created: logged"));
    assert!(sink.contains(
        LogLevel::Info,
        "handler",
        "Redirecting logged -> http://example.com"
    ));
    assert!(sink.contains(LogLevel::Warn, "handler", "Not found: missing"));
}
