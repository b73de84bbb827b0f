//! Deadlines and cancellation for network-bound operations.

use crate::Error;
use commonware_macros::select;
use commonware_runtime::Clock;
use futures::{
    channel::oneshot,
    future::{self, Shared},
    FutureExt,
};
use std::{
    future::Future,
    time::{Duration, SystemTime},
};

/// Resolves the cancellation signal of a [Request].
///
/// Dropping the [Canceller] without calling [Canceller::cancel] leaves the request live.
pub struct Canceller {
    sender: oneshot::Sender<()>,
}

impl Canceller {
    /// Cancels the associated request (and every clone of it).
    pub fn cancel(self) {
        let _ = self.sender.send(());
    }
}

/// The scope a network-bound operation executes within.
///
/// A [Request] carries the runtime context used to read the clock and draw nonces, an optional
/// deadline, and an optional cancellation signal. Every remote call made on behalf of an
/// operation is bounded by both.
#[derive(Clone)]
pub struct Request<E: Clock> {
    context: E,
    deadline: Option<SystemTime>,
    cancel: Option<Shared<oneshot::Receiver<()>>>,
}

impl<E: Clock> Request<E> {
    /// Creates a request with no deadline that cannot be cancelled.
    pub fn new(context: E) -> Self {
        Self {
            context,
            deadline: None,
            cancel: None,
        }
    }

    /// Fails the request once `deadline` passes.
    pub fn with_deadline(mut self, deadline: SystemTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fails the request once `timeout` elapses (measured from now).
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match self.context.current().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Makes the request cancellable, returning the handle that cancels it.
    pub fn cancellable(mut self) -> (Self, Canceller) {
        let (sender, receiver) = oneshot::channel();
        self.cancel = Some(receiver.shared());
        (self, Canceller { sender })
    }

    pub fn context(&self) -> &E {
        &self.context
    }

    pub fn deadline(&self) -> Option<SystemTime> {
        self.deadline
    }

    /// Returns true if the [Canceller] has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|signal| matches!(signal.clone().now_or_never(), Some(Ok(()))))
    }

    /// Returns an error if the request has already been cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self
            .deadline
            .is_some_and(|deadline| deadline <= self.context.current())
        {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drives `future` to completion unless the request is cancelled or times out first.
    ///
    /// Once either fires, `future` is dropped without being polled again.
    pub async fn run<T, F>(&self, future: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        self.check()?;
        select! {
            _ = self.cancelled() => {
                Err(Error::Cancelled)
            },
            _ = self.expired() => {
                Err(Error::DeadlineExceeded)
            },
            result = future => {
                result
            },
        }
    }

    async fn cancelled(&self) {
        if let Some(signal) = &self.cancel {
            // A dropped canceller can never fire
            if signal.clone().await.is_ok() {
                return;
            }
        }
        future::pending::<()>().await
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => self.context.sleep_until(deadline).await,
            None => future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_macros::test_traced;
    use commonware_runtime::{deterministic, Runner};

    #[test_traced]
    fn test_run_completes() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let request = Request::new(context).with_timeout(Duration::from_secs(1));
            let result = request.run(async { Ok::<_, Error>(7) }).await;
            assert!(matches!(result, Ok(7)));
        });
    }

    #[test_traced]
    fn test_run_deadline_exceeded() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let request = Request::new(context.clone()).with_timeout(Duration::from_millis(500));
            let result = request
                .run(future::pending::<Result<(), Error>>())
                .await;
            assert!(matches!(result, Err(Error::DeadlineExceeded)));
            assert!(context.current() >= request.deadline().unwrap());

            // Once the deadline has passed, nothing is attempted
            let result = request.run(async { Ok::<_, Error>(()) }).await;
            assert!(matches!(result, Err(Error::DeadlineExceeded)));
        });
    }

    #[test_traced]
    fn test_run_cancelled() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let (request, canceller) = Request::new(context.clone()).cancellable();
            assert!(!request.is_cancelled());

            let pending = request.clone();
            let result = pending
                .run(async move {
                    canceller.cancel();
                    future::pending::<Result<(), Error>>().await
                })
                .await;
            assert!(matches!(result, Err(Error::Cancelled)));
            assert!(request.is_cancelled());
            assert!(matches!(request.check(), Err(Error::Cancelled)));
        });
    }

    #[test_traced]
    fn test_dropped_canceller() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let (request, canceller) = Request::new(context.clone()).cancellable();
            drop(canceller);
            assert!(!request.is_cancelled());

            let result = request
                .run(async {
                    context.sleep(Duration::from_millis(10)).await;
                    Ok::<_, Error>(1)
                })
                .await;
            assert!(matches!(result, Ok(1)));
        });
    }
}
