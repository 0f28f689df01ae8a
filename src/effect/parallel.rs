//! N-ary parallel composition.
//!
//! `par_tupledN` runs N effects concurrently and collects their values in a
//! tuple; `par_mapN` additionally combines them with a function. Operand `i`
//! always maps to tuple position (or function parameter) `i`, whichever
//! operand finishes first.
//!
//! When operands fail, the remaining ones are canceled and the failure of the
//! lowest-indexed failing operand is reported.
//!
//! # Examples
//!
//! ```rust
//! use effio::effect::{Effect, Outcome, par_map3, runtime};
//!
//! let total = par_map3(
//!     Effect::<String, i32>::succeed(1),
//!     Effect::succeed(2),
//!     Effect::succeed(3),
//!     |a, b, c| a + b + c,
//! );
//! assert_eq!(runtime::run_blocking(total), Outcome::Succeeded(6));
//! ```

use super::io::{Effect, next_operand};
use super::node::{Erased, Node, unerase};

macro_rules! define_parallel_arity {
    ($arity:literal; $($effect:ident : $value:ident),+) => {
        paste::paste! {
            #[doc = concat!("Runs ", stringify!($arity), " effects concurrently and collects their values in order.")]
            #[allow(clippy::too_many_arguments, clippy::many_single_char_names)]
            pub fn [<par_tupled $arity>]<E, $($value),+>(
                $($effect: Effect<E, $value>),+
            ) -> Effect<E, ($($value,)+)>
            where
                E: Send + 'static,
                $($value: Send + 'static),+
            {
                Effect::<E, Vec<Erased>>::from_node(Node::Parallel(vec![$($effect.into_node()),+]))
                    .map(|values| {
                        let mut values = values.into_iter();
                        ($(next_operand::<$value>(&mut values),)+)
                    })
            }

            #[doc = concat!("Runs ", stringify!($arity), " effects concurrently and combines their values.")]
            #[allow(clippy::too_many_arguments, clippy::many_single_char_names)]
            pub fn [<par_map $arity>]<E, $($value,)+ R, F>(
                $($effect: Effect<E, $value>,)+
                combine: F,
            ) -> Effect<E, R>
            where
                E: Send + 'static,
                $($value: Send + 'static,)+
                R: Send + 'static,
                F: FnOnce($($value),+) -> R + Send + 'static,
            {
                [<par_tupled $arity>]($($effect),+).map(move |($($effect,)+)| combine($($effect),+))
            }
        }
    };
}

define_parallel_arity!(2; a: A, b: B);
define_parallel_arity!(3; a: A, b: B, c: C);
define_parallel_arity!(4; a: A, b: B, c: C, d: D);
define_parallel_arity!(5; a: A, b: B, c: C, d: D, e: G);
define_parallel_arity!(6; a: A, b: B, c: C, d: D, e: G, f: H);
define_parallel_arity!(7; a: A, b: B, c: C, d: D, e: G, f: H, g: I);
define_parallel_arity!(8; a: A, b: B, c: C, d: D, e: G, f: H, g: I, h: J);
define_parallel_arity!(9; a: A, b: B, c: C, d: D, e: G, f: H, g: I, h: J, i: K);

/// Runs every effect concurrently and collects the values in input order.
///
/// # Examples
///
/// ```rust
/// use effio::effect::{Effect, Outcome, par_sequence, runtime};
///
/// let effects: Vec<Effect<String, i32>> = (1..=3).map(Effect::succeed).collect();
/// assert_eq!(runtime::run_blocking(par_sequence(effects)), Outcome::Succeeded(vec![1, 2, 3]));
/// ```
pub fn par_sequence<E, A>(effects: Vec<Effect<E, A>>) -> Effect<E, Vec<A>>
where
    E: Send + 'static,
    A: Send + 'static,
{
    let operands = effects.into_iter().map(Effect::into_node).collect();
    Effect::<E, Vec<Erased>>::from_node(Node::Parallel(operands)).map(|values| {
        values
            .into_iter()
            .map(unerase::<A>)
            .collect()
    })
}

/// Builds one effect per item and runs them all concurrently.
pub fn par_traverse<E, T, A, I, F>(items: I, function: F) -> Effect<E, Vec<A>>
where
    E: Send + 'static,
    A: Send + 'static,
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Effect<E, A>,
{
    par_sequence(items.into_iter().map(function).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Outcome;
    use rstest::rstest;
    use std::time::Duration;

    type Io<A> = Effect<String, A>;

    fn after<A: Send + 'static>(millis: u64, value: A) -> Io<A> {
        Io::sleep(Duration::from_millis(millis)).map(move |()| value)
    }

    #[rstest]
    #[tokio::test]
    async fn par_tupled_preserves_positions() {
        let effect = par_tupled3(after(15, 1), after(1, "two"), after(5, 3.0));
        assert_eq!(effect.await, Outcome::Succeeded((1, "two", 3.0)));
    }

    #[rstest]
    #[tokio::test]
    async fn par_map9_combines_all_operands() {
        let effect = par_map9(
            Io::succeed(1),
            Io::succeed(2),
            Io::succeed(3),
            Io::succeed(4),
            Io::succeed(5),
            Io::succeed(6),
            Io::succeed(7),
            Io::succeed(8),
            Io::succeed(9),
            |a, b, c, d, e, f, g, h, i| a + b + c + d + e + f + g + h + i,
        );
        assert_eq!(effect.await, Outcome::Succeeded(45));
    }

    #[rstest]
    #[tokio::test]
    async fn par_map2_reports_failure() {
        let effect = par_map2(Io::succeed(2), Io::<i32>::fail("E".to_string()), |a, b| a + b);
        assert_eq!(effect.await, Outcome::Errored("E".to_string()));
    }

    #[rstest]
    #[tokio::test]
    async fn par_sequence_of_nothing_is_empty() {
        assert_eq!(par_sequence(Vec::<Io<i32>>::new()).await, Outcome::Succeeded(vec![]));
    }

    #[rstest]
    #[tokio::test]
    async fn par_traverse_keeps_input_order() {
        let effect = par_traverse(vec![30_u64, 10, 20], |millis| after(millis, millis));
        assert_eq!(effect.await, Outcome::Succeeded(vec![30, 10, 20]));
    }
}
