use apotek_tools::api::{ApiClient, PriceListSource, DEFAULT_TIMEOUT};
use apotek_tools::credentials::CredentialBlob;
use apotek_tools::model::RawValue;
use apotek_tools::transform::{normalize, SkipReason};
use apotek_tools::ApotekError;
use httpmock::prelude::*;
use serde_json::json;

fn session() -> CredentialBlob {
    CredentialBlob::parse(r#"{"laravel_session": "abc123"}"#).unwrap()
}

#[test]
fn fetch_sends_cookie_and_parses_sections() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/drugs")
            .header("cookie", "laravel_session=abc123")
            .header("accept", "application/json");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "drugs": [
                    {
                        "vmedisCode": "OB001",
                        "name": "Paracetamol 500mg",
                        "sections": [
                            {"title": "Harga Diskon", "rows": ["Rp 5.000 / Strip"]},
                            {"title": "Sisa Stok", "rows": ["12 Strip"]}
                        ]
                    },
                    {"name": "Vitamin C", "price": 2500, "stock": "30 Tablet", "extra": true}
                ]
            }));
    });

    let client = ApiClient::new(server.url("/api/"), DEFAULT_TIMEOUT).unwrap();
    let result = client.fetch_price_list(&session()).unwrap();

    mock.assert();
    assert_eq!(result.drugs.len(), 2);
    assert_eq!(result.drugs[0].name.as_deref(), Some("Paracetamol 500mg"));
    assert_eq!(result.drugs[0].sections.len(), 2);
    assert_eq!(result.drugs[1].price, Some(RawValue::Number(2500.0)));
    assert!(result.refreshed_cookies.is_empty());
}

#[test]
fn fetch_accepts_bare_array() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/drugs");
        then.status(200).json_body(json!([{"name": "A"}]));
    });

    let client = ApiClient::new(server.url("/api"), DEFAULT_TIMEOUT).unwrap();
    let result = client.fetch_price_list(&session()).unwrap();
    assert_eq!(result.drugs.len(), 1);
}

#[test]
fn odd_entries_do_not_sink_the_batch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/drugs");
        then.status(200).json_body(json!({"drugs": [
            {"name": "Good", "price": 5000, "stock": 12},
            {"name": "Coded", "vmedisCode": 12345, "price": 1, "stock": 1},
            {"name": "Untitled", "sections": [{"title": null, "rows": ["x"]}]},
            42
        ]}));
    });

    let client = ApiClient::new(server.url("/api/"), DEFAULT_TIMEOUT).unwrap();
    let result = client.fetch_price_list(&session()).unwrap();
    assert_eq!(result.drugs.len(), 4);

    let out = normalize(&result.drugs);
    let names: Vec<_> = out.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Good", "Coded"]);
    assert_eq!(out.warnings.len(), 2);
    assert_eq!(out.warnings[0].reason, SkipReason::MissingStock);
    assert!(matches!(out.warnings[1].reason, SkipReason::Malformed(_)));
    assert_eq!(out.warnings[1].index, 3);
}

#[test]
fn fetch_reports_refreshed_cookies() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/drugs");
        then.status(200)
            .header("set-cookie", "laravel_session=rotated; Path=/; HttpOnly")
            .json_body(json!({"drugs": []}));
    });

    let client = ApiClient::new(server.url("/api/"), DEFAULT_TIMEOUT).unwrap();
    let result = client.fetch_price_list(&session()).unwrap();
    assert_eq!(result.refreshed_cookies.to_cookie_header(), "laravel_session=rotated");
}

#[test]
fn unauthorized_is_authentication_error() {
    for status in [401u16, 403] {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/drugs");
            then.status(status).body("Unauthenticated.");
        });

        let client = ApiClient::new(server.url("/api/"), DEFAULT_TIMEOUT).unwrap();
        let err = client.fetch_price_list(&session()).unwrap_err();
        assert!(
            matches!(err, ApotekError::Authentication { status: s, .. } if s == status),
            "got {:?}",
            err
        );
    }
}

#[test]
fn server_error_is_unexpected_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/drugs");
        then.status(500).body("boom");
    });

    let client = ApiClient::new(server.url("/api/"), DEFAULT_TIMEOUT).unwrap();
    let err = client.fetch_price_list(&session()).unwrap_err();
    match err {
        ApotekError::UnexpectedResponse(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("boom"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn html_login_page_is_unexpected_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/drugs");
        then.status(200)
            .header("content-type", "text/html")
            .body("<html><body>Login</body></html>");
    });

    let client = ApiClient::new(server.url("/api/"), DEFAULT_TIMEOUT).unwrap();
    let err = client.fetch_price_list(&session()).unwrap_err();
    assert!(matches!(err, ApotekError::UnexpectedResponse(_)));
}

#[test]
fn connection_refused_is_network_error() {
    // Nothing listens on port 1.
    let client = ApiClient::new("http://127.0.0.1:1/api/", DEFAULT_TIMEOUT).unwrap();
    let err = client.fetch_price_list(&session()).unwrap_err();
    assert!(matches!(err, ApotekError::Network(_)));
}
