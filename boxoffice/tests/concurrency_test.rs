//! Concurrency integration tests.
//!
//! Many buyers race for the same seats on a multi-threaded runtime. The
//! coordinator must serialize them so that no seat is ever granted twice.
//!
//! Run with: `cargo test --test concurrency_test`

#![allow(clippy::unwrap_used)]

use boxoffice::coordinator::{EventCoordinator, EventEnvironment};
use boxoffice::ledger::InMemoryLedger;
use boxoffice::mocks::RecordingFanout;
use boxoffice::{BoxOfficeError, BuyerId, EventDefinition, Notification, Seat, SeatStatus};
use seatlease_runtime::StoreConfig;
use std::collections::HashMap;
use std::sync::Arc;

fn open(definition: EventDefinition, fanout: &Arc<RecordingFanout>) -> Arc<EventCoordinator> {
    let env = EventEnvironment::new(fanout.clone(), Arc::new(InMemoryLedger::new()));
    Arc::new(EventCoordinator::new(definition, env, StoreConfig::default()).unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_seat_goes_to_exactly_one_buyer() {
    let fanout = Arc::new(RecordingFanout::new());
    let event = open(EventDefinition::new("Last Seat", 1, 1), &fanout);

    let attempts: Vec<_> = (0..50)
        .map(|i| {
            let event = Arc::clone(&event);
            tokio::spawn(async move { event.hold(&BuyerId::new(format!("buyer-{i}")), vec![Seat::new(0, 0)]).await })
        })
        .collect();

    let mut winners = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert_eq!(err, BoxOfficeError::SeatUnavailable(Seat::new(0, 0))),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(fanout.notifications().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_group_purchases_never_double_sell() {
    let fanout = Arc::new(RecordingFanout::new());
    let event = open(EventDefinition::new("Big Room", 4, 8), &fanout);

    // Each buyer wants a window of three adjacent seats in row `i % 4`.
    let attempts: Vec<_> = (0..40_u32)
        .map(|i| {
            let event = Arc::clone(&event);
            let row = i % 4;
            let start = i % 6;
            let seats: Vec<Seat> = (start..start + 3).map(|col| Seat::new(row, col)).collect();
            tokio::spawn(async move {
                let buyer = BuyerId::new(format!("buyer-{i}"));
                (buyer.clone(), seats.clone(), event.purchase(&buyer, seats).await)
            })
        })
        .collect();

    let mut owners: HashMap<Seat, BuyerId> = HashMap::new();
    for attempt in attempts {
        let (buyer, seats, result) = attempt.await.unwrap();
        if result.is_ok() {
            for seat in seats {
                assert!(owners.insert(seat, buyer.clone()).is_none(), "{seat} sold twice");
            }
        }
    }

    let detail = event.detail().await;
    let sold = detail.seats.iter().flatten().filter(|s| **s == SeatStatus::Sold).count();
    assert_eq!(sold, owners.len());
    assert_eq!(detail.summary.sold, owners.len());

    // One `sold` notification per sold seat, none for failed groups.
    let sold_updates = fanout
        .notifications()
        .into_iter()
        .filter(|(_, n)| matches!(n, Notification::SeatUpdate { status: SeatStatus::Sold, .. }))
        .count();
    assert_eq!(sold_updates, owners.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joiners_respect_the_active_limit() {
    let fanout = Arc::new(RecordingFanout::new());
    let event = open(
        EventDefinition::new("Presale", 2, 2).gated(true).with_max_active(5),
        &fanout,
    );

    let joins: Vec<_> = (0..30)
        .map(|i| {
            let event = Arc::clone(&event);
            tokio::spawn(async move { event.join_queue(&BuyerId::new(format!("fan-{i}"))).await })
        })
        .collect();

    let mut admitted = 0;
    let mut positions = Vec::new();
    for join in joins {
        let status = join.await.unwrap().unwrap();
        if status.admitted {
            admitted += 1;
        } else {
            positions.push(status.position);
        }
    }

    assert_eq!(admitted, 5);
    positions.sort_unstable();
    assert_eq!(positions, (1..=25).collect::<Vec<_>>());
}
