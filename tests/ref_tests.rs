#![cfg(feature = "concurrent")]
//! Integration tests for `Ref` under concurrent use.

mod common;

use common::init_tracing;
use effio::concurrent::{ContentionPolicy, Ref};
use effio::effect::{Effect, Outcome, par_sequence, par_traverse};
use rstest::rstest;

type Io<A> = Effect<String, A>;

#[rstest]
#[case(ContentionPolicy::Spin)]
#[case(ContentionPolicy::Yield)]
#[case(ContentionPolicy::Backoff { max_spins: 128 })]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_not_lost(#[case] policy: ContentionPolicy) {
    init_tracing();
    let counter = Ref::with_policy(0_u64, policy);

    let increments: Vec<Io<()>> = (0..100).map(|_| counter.update(|n| n + 1)).collect();
    let outcome = par_sequence(increments).then(counter.get()).await;

    assert_eq!(outcome, Outcome::Succeeded(100));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn get_and_update_hands_out_distinct_tickets() {
    let next_ticket = Ref::new(0_u32);

    let outcome = par_traverse(0..50, |_| next_ticket.get_and_update::<String, _>(|n| n + 1)).await;

    let mut tickets = match outcome {
        Outcome::Succeeded(tickets) => tickets,
        other => panic!("ticket dispenser failed: {other:?}"),
    };
    tickets.sort_unstable();
    assert_eq!(tickets, (0..50).collect::<Vec<_>>());
}

#[rstest]
#[tokio::test]
async fn operations_are_deferred_until_run() {
    let cell = Ref::new(1);
    let write: Io<()> = cell.set(2);

    assert_eq!(cell.get::<String>().await, Outcome::Succeeded(1));
    let _ = write.await;
    assert_eq!(cell.get::<String>().await, Outcome::Succeeded(2));
}

#[rstest]
#[tokio::test]
async fn of_allocates_a_fresh_ref_per_run() {
    let program = || {
        Ref::of::<String>(10).flat_map(|cell| cell.update_and_get(|n: i32| n * 3))
    };

    assert_eq!(program().await, Outcome::Succeeded(30));
    assert_eq!(program().await, Outcome::Succeeded(30));
}

#[rstest]
#[tokio::test]
async fn modify_returns_the_side_output() {
    let stack = Ref::new(vec![1, 2, 3]);
    let pop: Io<Option<i32>> = stack.modify(|mut items: Vec<i32>| {
        let top = items.pop();
        (items, top)
    });

    assert_eq!(pop.await, Outcome::Succeeded(Some(3)));
    assert_eq!(stack.get::<String>().await, Outcome::Succeeded(vec![1, 2]));
}

// =============================================================================
// Access
// =============================================================================

#[rstest]
#[tokio::test]
async fn setter_is_single_use() {
    let cell = Ref::new(5);
    let program: Io<(bool, bool)> = cell
        .access()
        .flat_map(|(value, setter)| setter.set(value * 2).product(setter.set(value * 3)));

    assert_eq!(program.await, Outcome::Succeeded((true, false)));
    assert_eq!(cell.get::<String>().await, Outcome::Succeeded(10));
}

#[rstest]
#[tokio::test]
async fn setter_fails_after_an_intervening_write() {
    let cell = Ref::new(5);
    let writer = cell.clone();
    let program: Io<bool> = cell.access().flat_map(move |(value, setter)| {
        writer.set(100).then(setter.set(value + 1))
    });

    assert_eq!(program.await, Outcome::Succeeded(false));
    assert_eq!(cell.get::<String>().await, Outcome::Succeeded(100));
}

#[rstest]
#[tokio::test]
async fn setter_fails_after_a_write_of_the_same_value() {
    let cell = Ref::new(5);
    let writer = cell.clone();
    let program: Io<bool> = cell.access().flat_map(move |(value, setter)| {
        writer.set(value).then(setter.set(value + 1))
    });

    assert_eq!(program.await, Outcome::Succeeded(false));
}
