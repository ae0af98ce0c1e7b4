//! Client-side cart state and mutation policy.
//!
//! The backend owns the cart. [`CartState`] caches the backend's latest
//! answer and decides whether a requested change is sent at all:
//!
//! 1. No session: rejected with [`StorefrontError::Unauthenticated`].
//! 2. Duplicate prevention requested and the product is already in the
//!    cart: rejected with [`StorefrontError::DuplicateItem`].
//! 3. Otherwise the quantity is upserted and the cached cart is replaced
//!    by the backend's response. Nothing is merged locally.
//!
//! Mutations are not serialized against each other; whichever response
//! arrives last wins.

use std::future::Future;

use secrecy::SecretString;
use tracing::{debug, instrument, warn};

use qkart_core::{CartEntry, CartLineItem, Product, ProductId, reconcile};

use crate::api::{ApiClient, ApiError};
use crate::error::{
    BACKEND_UNREACHABLE, CART_UNAVAILABLE, PRODUCT_NOT_FOUND, StorefrontError, add_breadcrumb,
};
use crate::session::SessionStore;

/// Remote cart operations.
///
/// Implemented by [`ApiClient`]; tests substitute a recording fake.
pub trait CartBackend: Send + Sync {
    /// Fetch the full cart.
    fn fetch_cart(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<CartEntry>, ApiError>> + Send;

    /// Set a product's quantity and return the full, updated cart.
    fn upsert_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<Vec<CartEntry>, ApiError>> + Send;
}

impl CartBackend for ApiClient {
    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<CartEntry>, ApiError> {
        self.cart(token).await
    }

    async fn upsert_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Vec<CartEntry>, ApiError> {
        ApiClient::upsert_cart_item(self, token, product_id, quantity).await
    }
}

/// Per-call mutation policy.
///
/// Adding from the catalog prevents duplicates; `+`/`-` adjustments in the
/// cart do not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutateOptions {
    pub prevent_duplicate: bool,
}

impl MutateOptions {
    /// Options for the catalog "add to cart" action.
    pub const ADD: Self = Self {
        prevent_duplicate: true,
    };

    /// Options for quantity adjustments from the cart itself.
    pub const ADJUST: Self = Self {
        prevent_duplicate: false,
    };
}

/// Whether `product_id` has a nonzero-quantity entry in `entries`.
#[must_use]
pub fn is_in_cart(entries: &[CartEntry], product_id: &ProductId) -> bool {
    entries
        .iter()
        .any(|entry| entry.product_id == *product_id && entry.quantity > 0)
}

/// Decide whether a mutation may be sent to the backend.
///
/// # Errors
///
/// Returns [`StorefrontError::Unauthenticated`] if `session` has no token,
/// or [`StorefrontError::DuplicateItem`] if duplicates are prevented and the
/// product is already in `entries`.
pub fn check_mutation<'a>(
    session: &'a SessionStore,
    entries: &[CartEntry],
    product_id: &ProductId,
    options: MutateOptions,
) -> Result<&'a SecretString, StorefrontError> {
    let token = session.token().ok_or(StorefrontError::Unauthenticated)?;

    if options.prevent_duplicate && is_in_cart(entries, product_id) {
        return Err(StorefrontError::DuplicateItem);
    }

    Ok(token)
}

/// Cached copy of the user's cart.
pub struct CartState<B = ApiClient> {
    backend: B,
    entries: Vec<CartEntry>,
}

impl<B: CartBackend> CartState<B> {
    /// An empty cart backed by `backend`.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            entries: Vec::new(),
        }
    }

    /// The cached entries, in backend order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Cached quantity of `product_id` (0 if absent).
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.entries
            .iter()
            .find(|entry| entry.product_id == *product_id)
            .map_or(0, |entry| entry.quantity)
    }

    /// Join the cached entries with `catalog` for display.
    #[must_use]
    pub fn line_items(&self, catalog: &[Product]) -> Vec<CartLineItem> {
        reconcile(&self.entries, catalog)
    }

    /// Reload the cart from the backend.
    ///
    /// Without a session the cart is empty and no request is made.
    ///
    /// # Errors
    ///
    /// A 400 with a message becomes [`StorefrontError::RemoteClient`];
    /// anything else becomes [`StorefrontError::RemoteUnknown`]. The cached
    /// cart is unchanged on error.
    #[instrument(skip_all)]
    pub async fn fetch(&mut self, session: &SessionStore) -> Result<&[CartEntry], StorefrontError> {
        let Some(token) = session.token() else {
            debug!("No session, skipping cart fetch");
            self.entries.clear();
            return Ok(&self.entries);
        };

        match self.backend.fetch_cart(token).await {
            Ok(entries) => {
                debug!(count = entries.len(), "Fetched cart");
                self.entries = entries;
                Ok(&self.entries)
            }
            Err(ApiError::Client {
                status: 400,
                message: Some(message),
            }) => Err(StorefrontError::RemoteClient(message)),
            Err(e) => {
                warn!(error = %e, "Cart fetch failed");
                Err(StorefrontError::RemoteUnknown(CART_UNAVAILABLE.to_string()))
            }
        }
    }

    /// Set `product_id` to `quantity` in the cart.
    ///
    /// On success the cached cart is replaced by the backend's response.
    /// A quantity of 0 is sent as-is; the backend decides whether the entry
    /// disappears.
    ///
    /// # Errors
    ///
    /// - [`StorefrontError::Unauthenticated`] / [`StorefrontError::DuplicateItem`]
    ///   without any request, see [`check_mutation`]
    /// - [`StorefrontError::ProductNotFound`] if the backend answers 404
    /// - [`StorefrontError::RemoteClient`] for other 4xx answers with a message
    /// - [`StorefrontError::RemoteUnknown`] with [`BACKEND_UNREACHABLE`]
    ///   otherwise
    ///
    /// The cached cart is unchanged on error.
    #[instrument(skip(self, session), fields(product_id = %product_id, qty = quantity))]
    pub async fn mutate(
        &mut self,
        session: &SessionStore,
        product_id: &ProductId,
        quantity: u32,
        options: MutateOptions,
    ) -> Result<&[CartEntry], StorefrontError> {
        let token = check_mutation(session, &self.entries, product_id, options)?;

        let qty = quantity.to_string();
        add_breadcrumb(
            "cart",
            "Updating cart item",
            Some(&[("product_id", product_id.as_str()), ("qty", qty.as_str())]),
        );

        match self
            .backend
            .upsert_cart_item(token, product_id, quantity)
            .await
        {
            Ok(entries) => {
                debug!(count = entries.len(), "Cart replaced from backend");
                self.entries = entries;
                Ok(&self.entries)
            }
            Err(ApiError::Client {
                status: 404,
                message,
            }) => Err(StorefrontError::ProductNotFound(
                message.unwrap_or_else(|| PRODUCT_NOT_FOUND.to_string()),
            )),
            Err(e) => Err(StorefrontError::from_api(e, BACKEND_UNREACHABLE)),
        }
    }

    /// Add one unit of `product_id` from the catalog, refusing duplicates.
    ///
    /// # Errors
    ///
    /// See [`Self::mutate`].
    pub async fn add(
        &mut self,
        session: &SessionStore,
        product_id: &ProductId,
    ) -> Result<&[CartEntry], StorefrontError> {
        self.mutate(session, product_id, 1, MutateOptions::ADD).await
    }

    /// Raise the cached quantity of `product_id` by one.
    ///
    /// # Errors
    ///
    /// See [`Self::mutate`].
    pub async fn increment(
        &mut self,
        session: &SessionStore,
        product_id: &ProductId,
    ) -> Result<&[CartEntry], StorefrontError> {
        let quantity = self.quantity_of(product_id).saturating_add(1);
        self.mutate(session, product_id, quantity, MutateOptions::ADJUST)
            .await
    }

    /// Lower the cached quantity of `product_id` by one, stopping at 0.
    ///
    /// # Errors
    ///
    /// See [`Self::mutate`].
    pub async fn decrement(
        &mut self,
        session: &SessionStore,
        product_id: &ProductId,
    ) -> Result<&[CartEntry], StorefrontError> {
        let quantity = self.quantity_of(product_id).saturating_sub(1);
        self.mutate(session, product_id, quantity, MutateOptions::ADJUST)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use secrecy::ExposeSecret;

    use super::*;

    type Responder = Box<dyn Fn(&ProductId, u32) -> Result<Vec<CartEntry>, ApiError> + Send + Sync>;

    /// Records every request and answers from a closure.
    struct FakeBackend {
        calls: Mutex<Vec<(String, ProductId, u32)>>,
        fetch_calls: Mutex<u32>,
        respond: Responder,
        fetch_response: Mutex<Option<Result<Vec<CartEntry>, ApiError>>>,
    }

    impl FakeBackend {
        fn new(respond: Responder) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fetch_calls: Mutex::new(0),
                respond,
                fetch_response: Mutex::new(None),
            }
        }

        /// Backend that stores quantities like the real one: 0 removes the entry.
        fn echoing() -> Self {
            let cart = Mutex::new(Vec::<CartEntry>::new());
            Self::new(Box::new(move |id, qty| {
                let mut cart = cart.lock().unwrap();
                cart.retain(|e| e.product_id != *id);
                if qty > 0 {
                    cart.push(CartEntry::new(id.clone(), qty));
                }
                Ok(cart.clone())
            }))
        }

        fn upsert_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl CartBackend for FakeBackend {
        async fn fetch_cart(&self, _token: &SecretString) -> Result<Vec<CartEntry>, ApiError> {
            *self.fetch_calls.lock().unwrap() += 1;
            self.fetch_response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn upsert_cart_item(
            &self,
            token: &SecretString,
            product_id: &ProductId,
            quantity: u32,
        ) -> Result<Vec<CartEntry>, ApiError> {
            self.calls.lock().unwrap().push((
                token.expose_secret().to_string(),
                product_id.clone(),
                quantity,
            ));
            (self.respond)(product_id, quantity)
        }
    }

    fn logged_in() -> SessionStore {
        let mut store = SessionStore::in_memory();
        store
            .login(SecretString::from("testtoken"), "criodo", 5000)
            .unwrap();
        store
    }

    fn p1() -> ProductId {
        ProductId::new("P1")
    }

    #[tokio::test]
    async fn test_unauthenticated_makes_no_request() {
        let mut cart = CartState::new(FakeBackend::echoing());
        let session = SessionStore::in_memory();

        let result = cart
            .mutate(&session, &p1(), 1, MutateOptions::default())
            .await;

        assert!(matches!(result, Err(StorefrontError::Unauthenticated)));
        assert_eq!(cart.backend.upsert_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_prevented_makes_no_request() {
        let mut cart = CartState::new(FakeBackend::echoing());
        cart.entries = vec![CartEntry::new("P1", 1)];
        let session = logged_in();

        let result = cart.mutate(&session, &p1(), 2, MutateOptions::ADD).await;

        assert!(matches!(result, Err(StorefrontError::DuplicateItem)));
        assert_eq!(cart.backend.upsert_count(), 0);
        assert_eq!(cart.entries(), &[CartEntry::new("P1", 1)]);
    }

    #[tokio::test]
    async fn test_zero_quantity_entry_is_not_a_duplicate() {
        let mut cart = CartState::new(FakeBackend::echoing());
        cart.entries = vec![CartEntry::new("P1", 0)];
        let session = logged_in();

        let entries = cart.add(&session, &p1()).await.unwrap();
        assert_eq!(entries, &[CartEntry::new("P1", 1)]);
    }

    #[tokio::test]
    async fn test_adjust_ignores_duplicates_and_sends_token() {
        let mut cart = CartState::new(FakeBackend::echoing());
        let session = logged_in();

        cart.add(&session, &p1()).await.unwrap();
        let entries = cart.increment(&session, &p1()).await.unwrap();
        assert_eq!(entries, &[CartEntry::new("P1", 2)]);

        let calls = cart.backend.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("testtoken".to_string(), p1(), 1),
                ("testtoken".to_string(), p1(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_decrement_to_zero_lets_backend_drop_entry() {
        let mut cart = CartState::new(FakeBackend::echoing());
        let session = logged_in();

        cart.add(&session, &p1()).await.unwrap();
        let entries = cart.decrement(&session, &p1()).await.unwrap();
        assert!(entries.is_empty());

        let last = cart.backend.calls.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.2, 0);
    }

    #[tokio::test]
    async fn test_decrement_absent_product_saturates() {
        let mut cart = CartState::new(FakeBackend::echoing());
        let session = logged_in();

        cart.decrement(&session, &p1()).await.unwrap();
        let last = cart.backend.calls.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.2, 0);
    }

    #[tokio::test]
    async fn test_cart_replaced_by_backend_response() {
        // Backend answers with a cart that differs from what a local merge would give
        let backend = FakeBackend::new(Box::new(|_, _| {
            Ok(vec![CartEntry::new("P9", 4), CartEntry::new("P1", 1)])
        }));
        let mut cart = CartState::new(backend);
        cart.entries = vec![CartEntry::new("P2", 3)];
        let session = logged_in();

        let entries = cart.add(&session, &p1()).await.unwrap();
        assert_eq!(
            entries,
            &[CartEntry::new("P9", 4), CartEntry::new("P1", 1)]
        );
    }

    #[tokio::test]
    async fn test_not_found_keeps_cache() {
        let backend = FakeBackend::new(Box::new(|_, _| {
            Err(ApiError::Client {
                status: 404,
                message: Some("Product doesn't exist".to_string()),
            })
        }));
        let mut cart = CartState::new(backend);
        cart.entries = vec![CartEntry::new("P2", 3)];
        let session = logged_in();

        let result = cart.add(&session, &ProductId::new("nope")).await;

        assert!(
            matches!(result, Err(StorefrontError::ProductNotFound(m)) if m == "Product doesn't exist")
        );
        assert_eq!(cart.entries(), &[CartEntry::new("P2", 3)]);
    }

    #[tokio::test]
    async fn test_not_found_without_body_uses_default_message() {
        let backend = FakeBackend::new(Box::new(|_, _| {
            Err(ApiError::Client {
                status: 404,
                message: None,
            })
        }));
        let mut cart = CartState::new(backend);
        let session = logged_in();

        let result = cart.add(&session, &p1()).await;
        assert!(matches!(result, Err(StorefrontError::ProductNotFound(m)) if m == PRODUCT_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_server_error_is_unknown() {
        let backend = FakeBackend::new(Box::new(|_, _| Err(ApiError::Server { status: 500 })));
        let mut cart = CartState::new(backend);
        let session = logged_in();

        let result = cart.add(&session, &p1()).await;
        assert!(matches!(result, Err(StorefrontError::RemoteUnknown(m)) if m == BACKEND_UNREACHABLE));
        assert!(cart.entries().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_without_session_skips_request() {
        let mut cart = CartState::new(FakeBackend::echoing());
        cart.entries = vec![CartEntry::new("P1", 1)];

        let entries = cart.fetch(&SessionStore::in_memory()).await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(*cart.backend.fetch_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetch_errors() {
        let mut cart = CartState::new(FakeBackend::echoing());
        cart.entries = vec![CartEntry::new("P1", 1)];
        let session = logged_in();

        *cart.backend.fetch_response.lock().unwrap() = Some(Err(ApiError::Client {
            status: 400,
            message: Some("Protected route, Oauth2 Bearer token not found".to_string()),
        }));
        let result = cart.fetch(&session).await;
        assert!(matches!(result, Err(StorefrontError::RemoteClient(_))));

        *cart.backend.fetch_response.lock().unwrap() = Some(Err(ApiError::Server { status: 502 }));
        let result = cart.fetch(&session).await;
        assert!(matches!(result, Err(StorefrontError::RemoteUnknown(m)) if m == CART_UNAVAILABLE));

        assert_eq!(cart.entries(), &[CartEntry::new("P1", 1)]);
    }

    #[tokio::test]
    async fn test_fetch_replaces_cache() {
        let mut cart = CartState::new(FakeBackend::echoing());
        let session = logged_in();

        *cart.backend.fetch_response.lock().unwrap() =
            Some(Ok(vec![CartEntry::new("P3", 2)]));
        let entries = cart.fetch(&session).await.unwrap();
        assert_eq!(entries, &[CartEntry::new("P3", 2)]);
        assert_eq!(cart.quantity_of(&ProductId::new("P3")), 2);
        assert_eq!(cart.quantity_of(&p1()), 0);
    }

    #[test]
    fn test_is_in_cart() {
        let entries = vec![CartEntry::new("P1", 2), CartEntry::new("P2", 0)];
        assert!(is_in_cart(&entries, &p1()));
        assert!(!is_in_cart(&entries, &ProductId::new("P2")));
        assert!(!is_in_cart(&entries, &ProductId::new("P3")));
    }
}
