//! Thread-local association between the current thread and a request.
//!
//! Web frameworks enter a scope when they start serving a request; records
//! created through the `log` or `tracing` bridges on that thread pick the
//! request up automatically.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use super::RequestSource;

thread_local! {
    static CURRENT: RefCell<Option<Arc<dyn RequestSource>>> = const { RefCell::new(None) };
}

/// Guard returned by [`enter_request`]. Restores the previous request on drop.
///
/// The guard is `!Send` because it must be dropped on the thread that
/// created it.
#[must_use = "the request is only current while the guard is alive"]
pub struct RequestScope {
    previous: Option<Arc<dyn RequestSource>>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}

/// Make `request` the current request for this thread.
pub fn enter_request(request: Arc<dyn RequestSource>) -> RequestScope {
    let previous = CURRENT.with(|current| current.borrow_mut().replace(request));
    RequestScope {
        previous,
        _not_send: PhantomData,
    }
}

/// Run `f` with `request` as the current request.
pub fn with_request<R>(request: Arc<dyn RequestSource>, f: impl FnOnce() -> R) -> R {
    let _scope = enter_request(request);
    f()
}

/// The request currently associated with this thread, if any.
pub fn current_request() -> Option<Arc<dyn RequestSource>> {
    CURRENT.with(|current| current.borrow().clone())
}
