use chaos_shop::fault::{
    DelayRange, Effect, FaultCategory, FaultProfile, OperationKind, Scenario, ScenarioSet,
};
use chaos_shop::lifecycle::{Shop, ShopSystem};
use chaos_shop::model::{Order, ProductId};
use chaos_shop::simulator::TokioSleeper;
use chaos_shop::telemetry::RecordingReporter;
use chaos_shop::ShopError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

/// Payments that always succeed after a real delay, so orders overlap in time.
fn slow_payments(min_ms: u64, max_ms: u64) -> FaultProfile {
    let payment = ScenarioSet::new(vec![
        Scenario::new("success", 1.0).with_delay(DelayRange::between(min_ms, max_ms))
    ])
    .expect("valid scenarios");
    FaultProfile::quiet().with_scenarios(OperationKind::OrderPayment, payment)
}

async fn start(profile: FaultProfile) -> ShopSystem {
    ShopSystem::builder()
        .profile(profile)
        .seed(3)
        .sleeper(Arc::new(TokioSleeper))
        .reporter(Arc::new(RecordingReporter::new()))
        .start()
        .await
        .expect("shop starts")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_competing_whole_stock_orders_exactly_one_wins() {
    let system = start(slow_payments(5, 20)).await;
    let shop = system.shop();

    let attempts: Vec<_> = (0..16)
        .map(|_| {
            let shop = shop.clone();
            tokio::spawn(async move { shop.create_order(Order::single(1, 10)).await })
        })
        .collect();

    let mut confirmed = 0;
    let mut rejected = 0;
    for attempt in attempts {
        match attempt.await.expect("task completes") {
            Ok(_) => confirmed += 1,
            Err(ShopError::InsufficientStock(id)) => {
                assert_eq!(id, ProductId(1));
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(confirmed, 1);
    assert_eq!(rejected, 15);
    assert_eq!(shop.get_product(ProductId(1)).await.unwrap().stock, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_small_orders_never_oversell() {
    let system = start(slow_payments(1, 5)).await;
    let shop = system.shop();

    // 40 orders of 2 keyboards against 25 in stock
    let attempts: Vec<_> = (0..40)
        .map(|_| {
            let shop = shop.clone();
            tokio::spawn(async move { shop.create_order(Order::single(3, 2)).await })
        })
        .collect();

    let mut confirmed = 0u32;
    for attempt in attempts {
        if attempt.await.expect("task completes").is_ok() {
            confirmed += 1;
        }
    }

    assert_eq!(confirmed, 12);
    assert_eq!(shop.get_product(ProductId(3)).await.unwrap().stock, 1);
}

#[tokio::test]
async fn test_abandoned_order_releases_its_reservation() {
    let system = start(slow_payments(10_000, 10_000)).await;
    let shop = system.shop();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        shop.create_order(Order::single(4, 5)),
    )
    .await;
    assert!(abandoned.is_err(), "payment should still be pending");

    // the compensating release is spawned when the order future is dropped
    let mut stock = 0;
    for _ in 0..100 {
        stock = shop.get_product(ProductId(4)).await.unwrap().stock;
        if stock == 15 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stock, 15);
}

#[tokio::test]
async fn test_slow_payment_does_not_block_other_reservations() {
    let system = start(slow_payments(300, 300)).await;
    let shop = system.shop();

    let slow = {
        let shop = shop.clone();
        tokio::spawn(async move { shop.create_order(Order::single(1, 1)).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // reserved before payment, while the first order is still paying
    let started = std::time::Instant::now();
    let stock = shop.get_product(ProductId(1)).await.unwrap().stock;
    assert_eq!(stock, 9);
    assert!(started.elapsed() < Duration::from_millis(200));

    slow.await.unwrap().expect("slow order confirmed");
}

/// Polls `future` once; `Some` with its output if it finished.
async fn poll_once<F: Future + Unpin>(future: &mut F) -> Option<F::Output> {
    std::future::poll_fn(|cx| match Pin::new(&mut *future).poll(cx) {
        Poll::Ready(output) => Poll::Ready(Some(output)),
        Poll::Pending => Poll::Ready(None),
    })
    .await
}

/// Waits for the compensating releases to land, returning the last stock seen.
async fn settled_stock(shop: &Shop, id: ProductId, expected: u32) -> u32 {
    let mut stock = 0;
    for _ in 0..100 {
        stock = shop.get_product(id).await.unwrap().stock;
        if stock == expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    stock
}

/// Drops `Order::single(4, 5)` after `polls` polls, wherever it happens to be suspended.
/// Returns whether it had already finished, and with what.
async fn abandon_after(shop: &Shop, polls: usize) -> Option<Result<(), ShopError>> {
    let mut order = Box::pin(shop.create_order(Order::single(4, 5)));
    for _ in 0..polls {
        if let Some(result) = poll_once(&mut order).await {
            return Some(result.map(|_| ()));
        }
        tokio::task::yield_now().await;
    }
    None
}

#[tokio::test]
async fn test_order_abandoned_at_any_await_point_leaves_stock_whole() {
    for polls in 0..30 {
        let system = start(FaultProfile::quiet()).await;
        let shop = system.shop();

        let expected = match abandon_after(&shop, polls).await {
            Some(Ok(())) => 10,
            Some(Err(e)) => panic!("unexpected error after {polls} polls: {e:?}"),
            None => 15,
        };

        assert_eq!(
            settled_stock(&shop, ProductId(4), expected).await,
            expected,
            "abandoned after {polls} polls"
        );
    }
}

#[tokio::test]
async fn test_order_abandoned_during_rollback_still_restores_stock() {
    let declined = ScenarioSet::new(vec![Scenario::new("failure", 1.0).with_effect(
        Effect::Fail {
            category: FaultCategory::Payment,
            severity: Default::default(),
        },
    )])
    .expect("valid scenarios");
    let profile = FaultProfile::quiet().with_scenarios(OperationKind::OrderPayment, declined);

    for polls in 0..30 {
        let system = start(profile.clone()).await;
        let shop = system.shop();

        match abandon_after(&shop, polls).await {
            Some(Err(ShopError::PaymentFailed(_))) | None => {}
            Some(other) => panic!("unexpected outcome after {polls} polls: {other:?}"),
        }

        assert_eq!(
            settled_stock(&shop, ProductId(4), 15).await,
            15,
            "abandoned after {polls} polls"
        );
    }
}
