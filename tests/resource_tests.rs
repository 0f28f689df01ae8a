#![cfg(feature = "resource")]
//! Integration tests for `Resource` composition and release order.

mod common;

use std::time::Duration;

use common::{Journal, init_tracing};
use effio::effect::{Effect, Outcome};
use effio::resource::Resource;
use effio::typeclass::{Monoid, Semigroup};
use rstest::rstest;

type Io<A> = Effect<String, A>;

fn tracked(name: &'static str, journal: &Journal) -> Resource<String, &'static str> {
    let on_acquire = journal.clone();
    let on_release = journal.clone();
    Resource::make(
        move || {
            let journal = on_acquire.clone();
            Io::delay(move || {
                journal.record(format!("acquire {name}"));
                name
            })
        },
        move |name, case| {
            let journal = on_release.clone();
            Io::delay(move || journal.record(format!("release {name} {case:?}")))
        },
    )
}

fn broken(name: &'static str, journal: &Journal) -> Resource<String, &'static str> {
    let on_acquire = journal.clone();
    let on_release = journal.clone();
    Resource::make(
        move || {
            let journal = on_acquire.clone();
            Io::delay(move || journal.record(format!("acquire {name} failed")))
                .flat_map(move |()| Io::fail(format!("{name} unavailable")))
        },
        move |name, _| {
            let journal = on_release.clone();
            Io::delay(move || journal.record(format!("release {name}")))
        },
    )
}

fn chain(
    first: Resource<String, &'static str>,
    second: Resource<String, &'static str>,
    third: Resource<String, &'static str>,
) -> Resource<String, Vec<&'static str>> {
    first.flat_map(move |a| {
        let third = third.clone();
        second.clone().flat_map(move |b| third.clone().map(move |c| vec![a, b, c]))
    })
}

// =============================================================================
// Release Order
// =============================================================================

#[rstest]
#[tokio::test]
async fn chained_resources_release_in_reverse_order() {
    init_tracing();
    let journal = Journal::default();
    let resources = chain(
        tracked("R1", &journal),
        tracked("R2", &journal),
        tracked("R3", &journal),
    );

    let outcome = resources.use_resource(|names| Io::succeed(names.join(","))).await;

    assert_eq!(outcome, Outcome::Succeeded("R1,R2,R3".to_string()));
    assert_eq!(
        journal.entries(),
        vec![
            "acquire R1",
            "acquire R2",
            "acquire R3",
            "release R3 Completed",
            "release R2 Completed",
            "release R1 Completed",
        ]
    );
}

#[rstest]
#[tokio::test]
async fn failed_acquisition_releases_everything_acquired_before_it() {
    let journal = Journal::default();
    let resources = chain(
        tracked("R1", &journal),
        tracked("R2", &journal),
        broken("R3", &journal),
    );

    let outcome = resources.use_resource(|_| Io::succeed(())).await;

    assert_eq!(outcome, Outcome::Errored("R3 unavailable".to_string()));
    assert_eq!(
        journal.entries(),
        vec![
            "acquire R1",
            "acquire R2",
            "acquire R3 failed",
            "release R2 Error(\"R3 unavailable\")",
            "release R1 Error(\"R3 unavailable\")",
        ]
    );
}

#[rstest]
#[tokio::test]
async fn every_release_observes_the_body_failure() {
    let journal = Journal::default();
    let resources = chain(
        tracked("R1", &journal),
        tracked("R2", &journal),
        tracked("R3", &journal),
    );

    let outcome: Outcome<String, ()> = resources
        .use_resource(|_| Io::fail("body".to_string()))
        .await;

    assert_eq!(outcome, Outcome::Errored("body".to_string()));
    let releases: Vec<String> = journal
        .entries()
        .into_iter()
        .filter(|entry| entry.starts_with("release"))
        .collect();
    assert_eq!(
        releases,
        vec![
            "release R3 Error(\"body\")",
            "release R2 Error(\"body\")",
            "release R1 Error(\"body\")",
        ]
    );
}

#[rstest]
#[tokio::test]
async fn canceled_use_releases_every_resource() {
    let journal = Journal::default();
    let resources = chain(
        tracked("R1", &journal),
        tracked("R2", &journal),
        tracked("R3", &journal),
    );

    let fiber = resources.use_resource(|_| Io::<()>::never()).start();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(fiber.cancel_and_join().await, Outcome::Canceled);
    let releases: Vec<String> = journal
        .entries()
        .into_iter()
        .filter(|entry| entry.starts_with("release"))
        .collect();
    assert_eq!(
        releases,
        vec!["release R3 Canceled", "release R2 Canceled", "release R1 Canceled"]
    );
}

// =============================================================================
// Algebra
// =============================================================================

#[rstest]
#[tokio::test]
async fn combine_all_acquires_left_to_right() {
    let journal = Journal::default();
    let parts = ["a", "b", "c"].map(|name| tracked(name, &journal).map(String::from));

    let combined = Resource::combine_all(parts);
    let outcome = combined.use_resource(Io::succeed).await;

    assert_eq!(outcome, Outcome::Succeeded("abc".to_string()));
    assert_eq!(journal.entries()[..3], ["acquire a", "acquire b", "acquire c"]);
}

#[rstest]
#[tokio::test]
async fn combine_is_associative_in_value_and_order() {
    let left_journal = Journal::default();
    let right_journal = Journal::default();
    let build = |journal: &Journal| {
        (
            tracked("x", journal).map(String::from),
            tracked("y", journal).map(String::from),
            tracked("z", journal).map(String::from),
        )
    };

    let (x, y, z) = build(&left_journal);
    let left = x.combine(y).combine(z).use_resource(Io::succeed).await;
    let (x, y, z) = build(&right_journal);
    let right = x.combine(y.combine(z)).use_resource(Io::succeed).await;

    assert_eq!(left, right);
    assert_eq!(left_journal.entries(), right_journal.entries());
}
