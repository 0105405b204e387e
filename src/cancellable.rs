use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// A request that can be cancelled.
pub trait Cancellable {
    /// Whether [`cancel`](Cancellable::cancel) was called.
    fn is_cancelled(&self) -> bool;

    /// Cancel the request. Calling it again, or after the request finished, does nothing.
    fn cancel(&self);
}

/// Cancellation state shared between a request and its handles.
///
/// Cancelling before the request started still marks it cancelled, and starting it afterwards
/// performs no network call.
#[derive(Debug, Default)]
pub(crate) struct CancellableToken {
    token: CancellationToken,
}

impl CancellableToken {
    pub(crate) fn new() -> Arc<CancellableToken> {
        Arc::new(CancellableToken::default())
    }

    /// Resolves once the request is cancelled.
    pub(crate) async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

impl Cancellable for CancellableToken {
    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn cancel(&self) {
        if self.token.is_cancelled() {
            return;
        }
        log::debug!(target: "appspanel", "cancelling request");
        self.token.cancel();
    }
}

/// Handle on a request started with a completion handler.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    token: Arc<CancellableToken>,
}

impl RequestHandle {
    pub(crate) fn new(token: Arc<CancellableToken>) -> RequestHandle {
        RequestHandle { token }
    }
}

impl Cancellable for RequestHandle {
    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn cancel(&self) {
        self.token.cancel()
    }
}
