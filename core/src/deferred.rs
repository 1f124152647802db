//! Callback-driven deferred computations.
//!
//! # Design
//! A `Deferred<T, E>` wraps an operation that, when handed a completion
//! callback, does some work and eventually invokes that callback once with a
//! `Result<T, E>`. Nothing runs until `start` is called, and every call to
//! `start` runs the operation again: there is no memoization, buffering or
//! cancellation.
//!
//! Composition is done with `map` (infallible transform of the success
//! value) and `and_then` (run another `Deferred` built from the success
//! value). Failures short-circuit both combinators unchanged.
//!
//! The operation is stored behind an `Arc`, so a `Deferred` is cheap to
//! clone and can be started from any thread.

use std::sync::Arc;

/// Callback receiving the single outcome of a started `Deferred`.
pub type Completion<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

type Operation<T, E> = dyn Fn(Completion<T, E>) + Send + Sync;

/// The future value of an asynchronous computation.
pub struct Deferred<T, E> {
    operation: Arc<Operation<T, E>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
        }
    }
}

impl<T, E> std::fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

impl<T: 'static, E: 'static> Deferred<T, E> {
    /// Wrap `operation`. It must call the completion it receives exactly once.
    pub fn new<F>(operation: F) -> Self
    where
        F: Fn(Completion<T, E>) + Send + Sync + 'static,
    {
        Self {
            operation: Arc::new(operation),
        }
    }

    /// A `Deferred` that completes immediately with `value` on every start.
    pub fn resolved(value: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Self::new(move |completion| completion(Ok(value.clone())))
    }

    /// A `Deferred` that fails immediately with `error` on every start.
    pub fn rejected(error: E) -> Self
    where
        E: Clone + Send + Sync,
    {
        Self::new(move |completion| completion(Err(error.clone())))
    }

    /// Run the wrapped operation now, forwarding its outcome to `completion`.
    pub fn start<C>(&self, completion: C)
    where
        C: FnOnce(Result<T, E>) + Send + 'static,
    {
        (self.operation)(Box::new(completion));
    }

    /// Transform the success value with `f`. Errors pass through untouched.
    pub fn map<U, F>(self, f: F) -> Deferred<U, E>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Deferred::new(move |completion: Completion<U, E>| {
            let f = Arc::clone(&f);
            self.start(move |result| completion(result.map(|value| f(value))));
        })
    }

    /// Chain a dependent computation. `f` is only invoked on success; its
    /// `Deferred` is started and its outcome becomes the outcome of the chain.
    pub fn and_then<U, F>(self, f: F) -> Deferred<U, E>
    where
        U: 'static,
        F: Fn(T) -> Deferred<U, E> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Deferred::new(move |completion: Completion<U, E>| {
            let f = Arc::clone(&f);
            self.start(move |result| match result {
                Ok(value) => f(value).start(completion),
                Err(error) => completion(Err(error)),
            });
        })
    }

    /// Transform the error value with `f`. Successes pass through untouched.
    pub fn map_err<G, F>(self, f: F) -> Deferred<T, G>
    where
        G: 'static,
        F: Fn(E) -> G + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Deferred::new(move |completion: Completion<T, G>| {
            let f = Arc::clone(&f);
            self.start(move |result| completion(result.map_err(|error| f(error))));
        })
    }
}
