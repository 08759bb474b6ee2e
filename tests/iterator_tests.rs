//! Integration tests for lazy pagination.
//!
//! Pages are served by a scripted transport so the exact requests issued by
//! the iterator can be inspected.

mod common;

use std::sync::Arc;

use common::{charge_page, scripted_client, ScriptedTransport};
use serde_json::{json, Value};
use stripe_api::manifest::InMemorySource;
use stripe_api::{ApiKey, ClientError, ErrorKind, IteratorOptions, ResourceIterator, StripeClient};

fn ids(items: &[Value]) -> Vec<&str> {
    items.iter().map(|item| item["id"].as_str().unwrap()).collect()
}

fn charges_iterator(
    client: &StripeClient<ScriptedTransport>,
    arguments: Vec<Value>,
) -> ResourceIterator<ScriptedTransport> {
    client
        .call("chargesIterator", arguments)
        .unwrap()
        .into_iterator()
        .unwrap()
}

// ============================================================================
// Page Traversal
// ============================================================================

#[tokio::test]
async fn test_yields_items_across_pages_in_order() {
    let (client, transport) = scripted_client();
    transport
        .respond(200, charge_page(&["ch_1", "ch_2"], true))
        .respond(200, charge_page(&["ch_3", "ch_4"], true))
        .respond(200, charge_page(&["ch_5"], false));

    let mut charges = charges_iterator(&client, vec![json!({}), json!({"pageSize": 2})]);
    let items = charges.collect_all().await.unwrap();

    assert_eq!(ids(&items), ["ch_1", "ch_2", "ch_3", "ch_4", "ch_5"]);
    assert_eq!(charges.request_count(), 3);
    assert_eq!(charges.yielded_count(), 5);

    // Exhausted: no further requests, ever
    assert!(charges.next().await.is_none());
    assert!(charges.next().await.is_none());
    assert_eq!(transport.request_count(), 3);
    assert!(charges.is_done());
}

#[tokio::test]
async fn test_nothing_is_fetched_until_first_item_is_requested() {
    let (client, transport) = scripted_client();
    transport.respond(200, charge_page(&["ch_1"], false));

    let mut charges = charges_iterator(&client, vec![]);
    assert_eq!(transport.request_count(), 0);

    let first = charges.next().await.unwrap().unwrap();
    assert_eq!(first["id"], "ch_1");
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_cursor_is_last_item_id_and_params_are_preserved() {
    let (client, transport) = scripted_client();
    transport
        .respond(200, charge_page(&["ch_1", "ch_2"], true))
        .respond(200, charge_page(&["ch_3"], false));

    let mut charges = charges_iterator(
        &client,
        vec![json!({"customer": "cus_9", "limit": 2}), Value::Null],
    );
    charges.collect_all().await.unwrap();

    let first = transport.query(0);
    assert_eq!(first.get("customer").unwrap(), "cus_9");
    assert_eq!(first.get("limit").unwrap(), "2");
    assert!(!first.contains_key("starting_after"));

    let second = transport.query(1);
    assert_eq!(second.get("customer").unwrap(), "cus_9");
    assert_eq!(second.get("limit").unwrap(), "2");
    assert_eq!(second.get("starting_after").unwrap(), "ch_2");

    let requests = transport.requests();
    assert!(requests
        .iter()
        .all(|r| r.url == "https://api.stripe.com/v1/charges"));
}

#[tokio::test]
async fn test_starting_after_option_seeds_the_first_request() {
    let (client, transport) = scripted_client();
    transport.respond(200, charge_page(&["ch_11"], false));

    let mut charges = client
        .iterator(
            "charges",
            Value::Null,
            IteratorOptions::default().with_starting_after("ch_10"),
        )
        .unwrap();
    charges.collect_all().await.unwrap();

    assert_eq!(transport.query(0).get("starting_after").unwrap(), "ch_10");
}

#[tokio::test]
async fn test_single_page_from_call_arguments() {
    let (client, transport) = scripted_client();
    transport.respond(200, charge_page(&["ch_1", "ch_2"], false));

    let mut charges = charges_iterator(&client, vec![json!({"limit": 2})]);

    assert_eq!(charges.next().await.unwrap().unwrap()["id"], "ch_1");
    assert_eq!(charges.next().await.unwrap().unwrap()["id"], "ch_2");
    assert!(charges.next().await.is_none());
    assert_eq!(transport.request_count(), 1);
}

// ============================================================================
// Limits
// ============================================================================

#[tokio::test]
async fn test_limit_stops_fetching() {
    let (client, transport) = scripted_client();
    transport
        .respond(200, charge_page(&["ch_1", "ch_2"], true))
        .respond(200, charge_page(&["ch_3"], true));

    let mut charges = charges_iterator(&client, vec![json!({}), json!({"limit": 3})]);
    let items = charges.collect_all().await.unwrap();

    assert_eq!(ids(&items), ["ch_1", "ch_2", "ch_3"]);
    assert_eq!(transport.request_count(), 2);
    // The page size never asks for more than is still wanted
    assert_eq!(transport.query(0).get("limit").unwrap(), "3");
    assert_eq!(transport.query(1).get("limit").unwrap(), "1");
}

#[tokio::test]
async fn test_limit_discards_rest_of_page() {
    let (client, transport) = scripted_client();
    transport.respond(200, charge_page(&["ch_1", "ch_2", "ch_3"], true));

    let mut charges = client
        .iterator(
            "chargesIterator",
            json!({"limit": 10}),
            IteratorOptions::default().with_limit(2),
        )
        .unwrap();
    let items = charges.collect_all().await.unwrap();

    assert_eq!(ids(&items), ["ch_1", "ch_2"]);
    assert_eq!(transport.request_count(), 1);
    assert_eq!(transport.query(0).get("limit").unwrap(), "2");
}

#[tokio::test]
async fn test_page_size_is_capped_when_only_limit_is_given() {
    let (client, transport) = scripted_client();
    transport.respond(200, charge_page(&[], false));

    let mut charges = charges_iterator(&client, vec![Value::Null, json!({"limit": 500})]);
    assert!(charges.next().await.is_none());

    assert_eq!(transport.query(0).get("limit").unwrap(), "100");
}

// ============================================================================
// Termination And Errors
// ============================================================================

#[tokio::test]
async fn test_empty_page_with_has_more_terminates() {
    let (client, transport) = scripted_client();
    transport.respond(200, charge_page(&[], true));

    let mut charges = charges_iterator(&client, vec![]);

    assert!(charges.next().await.is_none());
    assert!(charges.next().await.is_none());
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_error_is_yielded_after_earlier_items() {
    let (client, transport) = scripted_client();
    transport
        .respond(200, charge_page(&["ch_1", "ch_2"], true))
        .respond_with_headers(
            500,
            &[("Request-Id", "req_500")],
            json!({"error": {"type": "api_error", "message": "boom"}}),
        );

    let mut charges = charges_iterator(&client, vec![]);

    assert_eq!(charges.next().await.unwrap().unwrap()["id"], "ch_1");
    assert_eq!(charges.next().await.unwrap().unwrap()["id"], "ch_2");

    let error = charges.next().await.unwrap().unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::Api));
    assert_eq!(error.request_id(), Some("req_500"));
    assert_eq!(error.to_string(), "Stripe API error (500): boom");

    assert!(charges.next().await.is_none());
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_collect_into_keeps_items_before_error() {
    let (client, transport) = scripted_client();
    transport
        .respond(200, charge_page(&["ch_1", "ch_2"], true))
        .respond(503, json!({"error": {"type": "api_error", "message": "unavailable"}}));

    let mut charges = charges_iterator(&client, vec![]);
    let mut items = Vec::new();
    let error = charges.collect_into(&mut items).await.unwrap_err();

    assert_eq!(ids(&items), ["ch_1", "ch_2"]);
    assert_eq!(error.kind(), Some(ErrorKind::Api));
    assert!(charges.is_done());

    // Nothing more arrives once done
    assert_eq!(charges.collect_into(&mut items).await.unwrap(), 0);
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_malformed_page_is_an_error() {
    let (client, transport) = scripted_client();
    transport.respond(200, json!({"object": "list"}));

    let mut charges = charges_iterator(&client, vec![]);

    assert!(matches!(
        charges.next().await,
        Some(Err(ClientError::UnexpectedResponse { .. }))
    ));
    assert!(charges.next().await.is_none());
}

#[tokio::test]
async fn test_invalid_params_fail_on_first_fetch() {
    let (client, transport) = scripted_client();

    let mut charges = charges_iterator(&client, vec![json!({"customer": 42})]);

    assert!(matches!(
        charges.next().await,
        Some(Err(ClientError::InvalidParameter { .. }))
    ));
    assert_eq!(transport.request_count(), 0);
}

// ============================================================================
// Custom Pagination Policy
// ============================================================================

#[tokio::test]
async fn test_response_field_cursor() {
    let base = r#"{"name": "Stripe", "baseUrl": "https://api.example.com"}"#;
    let events = r#"{
        "pagination": {"cursor": {"responseField": "next_page"}, "cursorParam": "page"},
        "operations": {"all": {"httpMethod": "GET", "uri": "/v1/events/search"}}
    }"#;
    let source = InMemorySource::new()
        .with_document("2014-07-26", "Manifest", base)
        .with_document("2014-07-26", "Events", events);

    let transport = Arc::new(ScriptedTransport::new());
    let client = StripeClient::builder()
        .api_key(ApiKey::new("sk_test_123").unwrap())
        .manifest_source(source)
        .build_with_transport(Arc::clone(&transport))
        .unwrap();

    transport
        .respond(
            200,
            json!({"data": [{"id": "evt_1"}], "has_more": true, "next_page": "p2"}),
        )
        .respond(
            200,
            json!({"data": [{"id": "evt_2"}], "has_more": false, "next_page": null}),
        );

    let mut events = client
        .call("eventsIterator", vec![json!({"type": "charge.succeeded"})])
        .unwrap()
        .into_iterator()
        .unwrap();
    let items = events.collect_all().await.unwrap();

    assert_eq!(ids(&items), ["evt_1", "evt_2"]);
    assert!(!transport.query(0).contains_key("page"));
    assert_eq!(transport.query(1).get("page").unwrap(), "p2");
    assert_eq!(transport.query(1).get("type").unwrap(), "charge.succeeded");
    assert!(transport.requests()[0]
        .url
        .starts_with("https://api.example.com/v1/events/search"));
}
