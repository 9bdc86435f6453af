//! Token lifecycle through the backend client: cache-first authentication,
//! the single refresh-and-replay on an expired token, and the hard failure
//! when the refreshed token also expires.

use kiosk_core::{CartLine, Fulfillment, Order};
use kiosk_integration_tests::{BackendScript, OrderScript, TestHarness};
use kiosk_storefront::ApiError;

fn sample_order() -> Order {
    let (item, variant) = TestHarness::sample_item();
    let line = CartLine::new(&item, &variant);
    Order::from_cart(&[line], "", &Fulfillment::Pickup)
}

#[tokio::test]
async fn test_held_token_skips_network_auth() {
    let h = TestHarness::start(BackendScript::default()).await;

    h.gateway.authenticate(false).await.expect("first auth");
    h.gateway.authenticate(false).await.expect("second auth");

    // The second call was answered from the vault.
    assert_eq!(h.backend.state.auth_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_expired_token_refreshes_and_replays_once() {
    let script = BackendScript {
        order: OrderScript::ExpireFirst { times: 1 },
        ..BackendScript::default()
    };
    let h = TestHarness::start(script).await;

    h.gateway.authenticate(false).await.expect("auth");
    h.gateway
        .create_order(&sample_order())
        .await
        .expect("order accepted after one replay");

    let state = &h.backend.state;
    assert_eq!(state.auth_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(state.order_calls.load(std::sync::atomic::Ordering::SeqCst), 2);

    // The replay carried the freshly issued token, not the expired one.
    assert_eq!(
        state.recorded_order_tokens(),
        vec![Some("token-1".to_string()), Some("token-2".to_string())]
    );
}

#[tokio::test]
async fn test_second_expiry_fails_without_further_retries() {
    let script = BackendScript {
        order: OrderScript::ExpireFirst { times: 10 },
        ..BackendScript::default()
    };
    let h = TestHarness::start(script).await;

    h.gateway.authenticate(false).await.expect("auth");
    let err = h
        .gateway
        .create_order(&sample_order())
        .await
        .expect_err("second expiry must fail");

    assert!(matches!(err, ApiError::AuthFailed(_)));

    let state = &h.backend.state;
    // Exactly one refresh, exactly one replay.
    assert_eq!(state.auth_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(state.order_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_catalog_reads_attach_no_token_and_are_cached() {
    let h = TestHarness::start(BackendScript::default()).await;

    let page = h.gateway.list_catalog(None).await.expect("catalog page");
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].variants[0].unit_price, 800);

    // No authentication happened for a public read.
    assert_eq!(h.backend.state.auth_calls.load(std::sync::atomic::Ordering::SeqCst), 0);

    // The second read is served from the cache.
    h.gateway.list_catalog(None).await.expect("cached page");
    assert_eq!(h.backend.state.catalog_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_detail_is_cached_per_product() {
    let h = TestHarness::start(BackendScript::default()).await;

    let detail = h.gateway.get_detail("p1").await.expect("detail");
    assert_eq!(detail.product_ref, "p1");

    h.gateway.get_detail("p1").await.expect("cached detail");
    h.gateway.get_detail("p2").await.expect("other detail");

    // p1 twice hits the backend once; p2 is a distinct key.
    assert_eq!(h.backend.state.catalog_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}
