//! Reducer composition utilities
//!
//! The application state is a tree of slices, each owned by one reducer.
//! This module provides the two combinators the composition root uses:
//!
//! - **[`combine_reducers`]**: run several reducers over the same state and action
//! - **[`scope_reducer`]**: embed a slice reducer into a parent state/action/environment
//!
//! # Example
//!
//! ```
//! use dashboard_state_core::composition::{combine_reducers, scope_reducer};
//! use dashboard_state_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Default)]
//! struct Counter {
//!     value: i32,
//! }
//!
//! #[derive(Clone)]
//! enum CounterAction {
//!     Add(i32),
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = Counter;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Counter, action: CounterAction, _env: &()) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Add(n) => state.value += n,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct App {
//!     left: Counter,
//!     right: Counter,
//! }
//!
//! #[derive(Clone)]
//! enum AppAction {
//!     Left(CounterAction),
//!     Right(CounterAction),
//! }
//!
//! let root = combine_reducers(vec![
//!     Box::new(scope_reducer(
//!         CounterReducer,
//!         |app: &mut App| &mut app.left,
//!         |action| match action { AppAction::Left(a) => Some(a), AppAction::Right(_) => None },
//!         AppAction::Left,
//!         |env: &()| env,
//!     )),
//!     Box::new(scope_reducer(
//!         CounterReducer,
//!         |app: &mut App| &mut app.right,
//!         |action| match action { AppAction::Right(a) => Some(a), AppAction::Left(_) => None },
//!         AppAction::Right,
//!         |env: &()| env,
//!     )),
//! ]);
//!
//! let mut state = App::default();
//! let _ = root.reduce(&mut state, AppAction::Right(CounterAction::Add(2)), &());
//! assert_eq!(state.left.value, 0);
//! assert_eq!(state.right.value, 2);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// A boxed reducer over a shared state/action/environment triple.
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in registration order with its own clone of the action,
/// and all effects are concatenated.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    A: Clone,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E> {
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E> {
    /// Number of reducers in the combination
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether the combination is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    A: Clone,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            all_effects.extend(reducer.reduce(state, action.clone(), env));
        }

        all_effects
    }
}

/// Embeds a slice reducer into a parent state, action and environment.
///
/// - `state`: focuses the parent state on the slice (borrowed mutably, never cloned,
///   so copy-on-write data inside the slice keeps its identity when untouched)
/// - `extract`: picks the slice's actions out of the parent action; anything else
///   is ignored and leaves the slice untouched
/// - `embed`: lifts the slice's effect output back into the parent action
/// - `env`: focuses the parent environment on the slice's dependencies
pub fn scope_reducer<S, A, E, R>(
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    extract: fn(A) -> Option<R::Action>,
    embed: fn(R::Action) -> A,
    env: fn(&E) -> &R::Environment,
) -> ScopedReducer<S, A, E, R>
where
    R: Reducer,
{
    ScopedReducer {
        reducer,
        state,
        extract,
        embed,
        env,
    }
}

/// A reducer operating on one slice of a larger state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, A, E, R>
where
    R: Reducer,
{
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    extract: fn(A) -> Option<R::Action>,
    embed: fn(R::Action) -> A,
    env: fn(&E) -> &R::Environment,
}

impl<S, A, E, R> Reducer for ScopedReducer<S, A, E, R>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(local) = (self.extract)(action) else {
            return SmallVec::new();
        };

        self.reducer
            .reduce((self.state)(state), local, (self.env)(env))
            .into_iter()
            .map(|effect| effect.map(self.embed))
            .collect()
    }
}
