#![cfg(feature = "effect")]
//! Integration tests for parallel composition.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{Journal, init_tracing};
use effio::effect::{Effect, ExitCase, Outcome, par_map2, par_map3, par_sequence, par_traverse, par_tupled4};
use rstest::rstest;

type Io<A> = Effect<String, A>;

fn after<A: Send + 'static>(millis: u64, value: A) -> Io<A> {
    Io::sleep(Duration::from_millis(millis)).map(move |()| value)
}

// =============================================================================
// Results
// =============================================================================

#[rstest]
#[tokio::test]
async fn par_map2_combines_both_values() {
    let effect = par_map2(Io::succeed(2), Io::succeed(3), |a, b| a + b);

    assert_eq!(effect.await, Outcome::Succeeded(5));
}

#[rstest]
#[tokio::test]
async fn results_keep_operand_order_regardless_of_finish_order() {
    let effect = par_tupled4(after(30, 'a'), after(1, 'b'), after(20, 'c'), after(10, 'd'));

    assert_eq!(effect.await, Outcome::Succeeded(('a', 'b', 'c', 'd')));
}

#[rstest]
#[tokio::test]
async fn operands_run_concurrently() {
    let started = std::time::Instant::now();
    let effect = par_map3(after(100, 1), after(100, 2), after(100, 3), |a, b, c| a + b + c);

    assert_eq!(effect.await, Outcome::Succeeded(6));
    assert!(started.elapsed() < Duration::from_millis(280));
}

#[rstest]
#[tokio::test]
async fn par_traverse_preserves_input_order() {
    let effect = par_traverse(vec![30_u64, 1, 15], |millis| after(millis, millis * 2));

    assert_eq!(effect.await, Outcome::Succeeded(vec![60, 2, 30]));
}

#[rstest]
#[tokio::test]
async fn par_sequence_of_nothing_is_empty() {
    let effect = par_sequence(Vec::<Io<i32>>::new());

    assert_eq!(effect.await, Outcome::Succeeded(vec![]));
}

// =============================================================================
// Failures
// =============================================================================

#[rstest]
#[tokio::test]
async fn failing_operand_fails_the_group() {
    let effect = par_map2(Io::succeed(2), Io::<i32>::fail("E".to_string()), |a, b| a + b);

    assert_eq!(effect.await, Outcome::Errored("E".to_string()));
}

#[rstest]
#[tokio::test]
async fn failure_cancels_siblings_and_runs_their_finalizers() {
    init_tracing();
    let journal = Journal::default();
    let recorder = journal.clone();

    let sibling = Io::succeed("worker").bracket_case(
        move |name, case: ExitCase<String>| Io::delay(move || recorder.record(format!("{name} {case:?}"))),
        |_| Io::<i32>::never(),
    );
    let failing = after(10, ()).flat_map(|()| Io::<i32>::fail("stop".to_string()));

    let effect = par_map2(sibling, failing, |a, b| a + b);

    assert_eq!(effect.await, Outcome::Errored("stop".to_string()));
    assert_eq!(journal.entries(), vec!["worker Canceled"]);
}

#[rstest]
#[tokio::test]
async fn continuation_does_not_run_after_failure() {
    let combined = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&combined);

    let effect = par_map2(Io::succeed(1), Io::<i32>::fail("E".to_string()), move |a, b| {
        counter.fetch_add(1, Ordering::SeqCst);
        a + b
    });

    let _ = effect.await;
    assert_eq!(combined.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn par_zip_reports_right_failure_when_left_is_canceled() {
    let left = Io::sleep(Duration::from_secs(5)).map(|()| 1);
    let right = Io::sleep(Duration::from_millis(5))
        .flat_map(|()| Io::<i32>::fail("right".to_string()));

    let outcome = left.par_zip(right).await;

    assert_eq!(outcome, Outcome::Errored("right".to_string()));
}

#[rstest]
#[tokio::test]
async fn par_zip_reports_left_failure_when_both_fail() {
    let effect = Io::<i32>::fail("left".to_string()).par_zip(Io::<i32>::fail("right".to_string()));

    assert_eq!(effect.await, Outcome::Errored("left".to_string()));
}
