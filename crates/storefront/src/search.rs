//! Debounced catalog search.
//!
//! [`SearchDispatcher`] receives *every* change of the search box and
//! decides when to actually query the backend:
//!
//! 1. A keystroke cancels the pending timer, if any, and starts a new one.
//! 2. When a timer fires uncancelled the dispatcher is idle again and the
//!    query for that keystroke's text is sent.
//! 3. The result replaces the published [`CatalogView`].
//!
//! So only the last keystroke of a burst reaches the backend. A query that
//! has already been sent is not cancelled by later keystrokes; overlapping
//! results are applied in the order they arrive.
//!
//! Result policy: success replaces the view and marks it available; a 4xx
//! marks it unavailable without raising an error; any other failure leaves
//! the view as it was and is only logged.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use qkart_core::Product;

use crate::api::{ApiClient, ApiError};
use crate::error::StorefrontError;

/// Catalog queries used by the dispatcher.
///
/// Implemented by [`ApiClient`]; tests substitute a recording fake.
pub trait CatalogSource: Send + Sync + 'static {
    /// The full catalog.
    fn products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Products matching `text`.
    fn search(&self, text: &str) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;
}

impl CatalogSource for ApiClient {
    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        ApiClient::products(self).await
    }

    async fn search(&self, text: &str) -> Result<Vec<Product>, ApiError> {
        ApiClient::search(self, text).await
    }
}

/// The catalog currently on display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogView {
    pub products: Vec<Product>,
    /// `false` means "No products found" should be shown instead of
    /// `products`.
    pub available: bool,
}

/// Dispatcher state, guarded by one mutex.
///
/// `pending` is `Some` exactly while a timer is running.
#[derive(Default)]
struct DispatchState {
    pending: Option<PendingQuery>,
    /// Incremented per keystroke; lets a firing timer tell whether it is
    /// still the current one.
    generation: u64,
    /// Queries whose timer has fired but whose result is not applied yet.
    in_flight: usize,
}

struct PendingQuery {
    generation: u64,
    text: String,
    timer: JoinHandle<()>,
}

/// Debounces search-box input into catalog queries.
///
/// Must be used from within a Tokio runtime. Dropping the dispatcher
/// cancels a pending timer.
pub struct SearchDispatcher<S: CatalogSource> {
    source: Arc<S>,
    delay: Duration,
    state: Arc<Mutex<DispatchState>>,
    view: Arc<watch::Sender<CatalogView>>,
}

impl<S: CatalogSource> SearchDispatcher<S> {
    /// Create a dispatcher that waits `delay` after the last keystroke.
    #[must_use]
    pub fn new(source: S, delay: Duration) -> Self {
        let (view, _) = watch::channel(CatalogView::default());
        Self {
            source: Arc::new(source),
            delay,
            state: Arc::new(Mutex::new(DispatchState::default())),
            view: Arc::new(view),
        }
    }

    /// Subscribe to catalog view changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogView> {
        self.view.subscribe()
    }

    /// Snapshot of the current view.
    #[must_use]
    pub fn view(&self) -> CatalogView {
        self.view.borrow().clone()
    }

    /// Whether a timer is waiting to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Whether a fired query is still waiting for the backend.
    #[must_use]
    pub fn is_searching(&self) -> bool {
        lock(&self.state).in_flight > 0
    }

    /// Text of the pending query, if a timer is waiting.
    #[must_use]
    pub fn pending_text(&self) -> Option<String> {
        lock(&self.state).pending.as_ref().map(|p| p.text.clone())
    }

    /// Handle one change of the search text.
    ///
    /// Cancels any pending timer and schedules a query for `text` after the
    /// configured delay.
    pub fn on_keystroke(&self, text: impl Into<String>) {
        let text = text.into();
        let mut st = lock(&self.state);

        if let Some(previous) = st.pending.take() {
            debug!(superseded = %previous.text, "Cancelling pending search");
            previous.timer.abort();
        }

        st.generation += 1;
        let generation = st.generation;

        // The lock is held until `pending` is set, so the timer cannot fire
        // and find a stale generation.
        let timer = tokio::spawn(fire_after(
            Arc::clone(&self.source),
            Arc::clone(&self.state),
            Arc::clone(&self.view),
            self.delay,
            generation,
            text.clone(),
        ));

        st.pending = Some(PendingQuery {
            generation,
            text,
            timer,
        });
    }

    /// Cancel the pending timer, if any.
    ///
    /// Returns `true` if a timer was cancelled.
    pub fn cancel(&self) -> bool {
        lock(&self.state).pending.take().is_some_and(|pending| {
            pending.timer.abort();
            true
        })
    }

    /// Cancel any pending timer and query `text` right away.
    pub async fn search_now(&self, text: &str) {
        self.cancel();
        run_search(self.source.as_ref(), &self.view, text).await;
    }

    /// Load the full catalog into the view.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::RemoteUnknown`] with
    /// [`crate::error::CATALOG_UNAVAILABLE`] for any failure, including a
    /// 4xx with a message. The view is marked unavailable in that case.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<CatalogView, StorefrontError> {
        match self.source.products().await {
            Ok(products) => {
                let view = CatalogView {
                    products,
                    available: true,
                };
                self.view.send_replace(view.clone());
                Ok(view)
            }
            Err(e) => {
                self.view.send_modify(|view| view.available = false);
                Err(StorefrontError::catalog_unavailable(&e))
            }
        }
    }
}

impl<S: CatalogSource> Drop for SearchDispatcher<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Timer task body: wait, then run the query if still current.
async fn fire_after<S: CatalogSource>(
    source: Arc<S>,
    state: Arc<Mutex<DispatchState>>,
    view: Arc<watch::Sender<CatalogView>>,
    delay: Duration,
    generation: u64,
    text: String,
) {
    tokio::time::sleep(delay).await;

    {
        let mut st = lock(&state);
        let current = st
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == generation);
        if !current {
            return;
        }
        st.pending = None;
        st.in_flight += 1;
    }

    run_search(source.as_ref(), &view, &text).await;
    let mut st = lock(&state);
    st.in_flight = st.in_flight.saturating_sub(1);
}

/// Query `text` and apply the result policy to `view`.
#[instrument(skip(source, view))]
async fn run_search<S: CatalogSource>(source: &S, view: &watch::Sender<CatalogView>, text: &str) {
    match source.search(text).await {
        Ok(products) => {
            debug!(count = products.len(), "Search results available");
            view.send_replace(CatalogView {
                products,
                available: true,
            });
        }
        Err(e) if e.is_client_error() => {
            debug!(error = %e, "No search results");
            view.send_modify(|view| view.available = false);
        }
        Err(e) => {
            // Prior view stays on display
            warn!(error = %e, "Search failed");
        }
    }
}

fn lock(state: &Mutex<DispatchState>) -> MutexGuard<'_, DispatchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
