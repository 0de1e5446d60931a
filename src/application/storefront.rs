//! Customer workflows: catalog browsing, cart, checkout and own orders.
//!
//! The service owns the cart and the catalog cursor for one session. Local
//! state only changes after a call succeeds; failures leave the last good
//! state in place and post an advisory.

use std::time::Duration;

use crate::domain::advisory::{Advisory, AdvisoryBoard};
use crate::domain::cart::{Cart, CartNotice};
use crate::domain::edit::EditDraft;
use crate::domain::errors::DomainError;
use crate::domain::lifecycle::{self, ActionSet, OrderAction};
use crate::domain::order::Order;
use crate::domain::pagination::{Page, PageCursor};
use crate::domain::ports::{CatalogApi, OrderApi};
use crate::domain::product::{Category, Product};
use crate::domain::query::{ProductFilters, QueryParams};
use crate::domain::session::{Role, Session};
use crate::errors::AppError;

pub const CATALOG_PAGE_SIZE: u32 = 12;
/// Customers see their recent orders on a single page.
pub const MY_ORDERS_PAGE_SIZE: u32 = 100;
/// Page size used when the whole active catalog is needed at once.
pub const FULL_CATALOG_SIZE: u32 = 1000;

pub struct StorefrontService<B> {
    backend: B,
    session: Option<Session>,
    cart: Cart,
    filters: ProductFilters,
    cursor: PageCursor,
    products: Vec<Product>,
    categories: Vec<Category>,
    advisories: AdvisoryBoard,
}

impl<B: CatalogApi + OrderApi> StorefrontService<B> {
    pub fn new(backend: B, session: Option<Session>) -> Self {
        Self {
            backend,
            session,
            cart: Cart::new(),
            filters: ProductFilters::default(),
            cursor: PageCursor::new(CATALOG_PAGE_SIZE),
            products: Vec::new(),
            categories: Vec::new(),
            advisories: AdvisoryBoard::default(),
        }
    }

    pub fn with_advisory_ttl(mut self, ttl: Duration) -> Self {
        self.advisories = AdvisoryBoard::new(ttl);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn filters(&self) -> &ProductFilters {
        &self.filters
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn advisory(&self) -> Option<&Advisory> {
        self.advisories.current()
    }

    pub fn dismiss_advisory(&mut self) {
        self.advisories.dismiss();
    }

    fn fail(&mut self, err: AppError, context: &str) -> AppError {
        log::warn!("{}: {}", context, err);
        self.advisories.post(err.advisory(context));
        err
    }

    fn notify(&mut self, notice: CartNotice) -> CartNotice {
        if let Some(advisory) = notice.advisory() {
            self.advisories.post(advisory);
        }
        notice
    }

    fn require_session(&mut self) -> Result<Session, AppError> {
        match &self.session {
            Some(session) => Ok(session.clone()),
            None => Err(self.fail(AppError::NotAuthenticated, "Login required")),
        }
    }

    /// Fetches the current catalog page. Cart lines are refreshed against
    /// the returned snapshots.
    pub async fn load_products(&mut self) -> Result<&[Product], AppError> {
        let params = self
            .filters
            .to_storefront_params(self.cursor.page(), self.cursor.size());
        log::debug!("Loading products: {:?}", params.as_pairs());

        match self.backend.list_products(self.session.as_ref(), &params).await {
            Ok(page) => {
                self.cursor.update_from(&page);
                self.products = page.items;
                for notice in self.cart.reconcile(&self.products) {
                    if let Some(advisory) = notice.advisory() {
                        self.advisories.post(advisory);
                    }
                }
                Ok(&self.products)
            }
            Err(e) => {
                self.products.clear();
                self.cursor.clear_totals();
                Err(self.fail(e.into(), "Could not load products"))
            }
        }
    }

    pub async fn apply_filters(&mut self, filters: ProductFilters) -> Result<&[Product], AppError> {
        self.filters = filters;
        self.cursor.reset();
        self.load_products().await
    }

    pub async fn clear_filters(&mut self) -> Result<&[Product], AppError> {
        self.advisories.post(Advisory::info("Filters cleared"));
        self.apply_filters(ProductFilters::default()).await
    }

    /// Returns whether the page changed; nothing is fetched at a boundary.
    pub async fn next_page(&mut self) -> Result<bool, AppError> {
        if !self.cursor.next() {
            return Ok(false);
        }
        self.load_products().await.map(|_| true)
    }

    pub async fn prev_page(&mut self) -> Result<bool, AppError> {
        if !self.cursor.prev() {
            return Ok(false);
        }
        self.load_products().await.map(|_| true)
    }

    pub async fn go_to_page(&mut self, page: u32) -> Result<bool, AppError> {
        if !self.cursor.go_to(page) {
            return Ok(false);
        }
        self.load_products().await.map(|_| true)
    }

    /// Category list for the filter form. Anonymous visitors get none, and a
    /// failed fetch only empties the list.
    pub async fn load_categories(&mut self) -> &[Category] {
        let Some(session) = self.session.as_ref() else {
            self.categories.clear();
            return &self.categories;
        };
        let params = QueryParams::paged(0, FULL_CATALOG_SIZE);
        match self.backend.list_categories(Some(session), &params).await {
            Ok(page) => self.categories = page.items,
            Err(e) => {
                log::warn!("Could not load categories: {}", e);
                self.categories.clear();
            }
        }
        &self.categories
    }

    pub fn add_to_cart(&mut self, product: &Product) -> CartNotice {
        let notice = self.cart.add(product);
        self.notify(notice)
    }

    /// Adds a product from the loaded catalog page by id.
    pub fn add_to_cart_by_id(&mut self, product_id: i64) -> Result<CartNotice, AppError> {
        let product = self
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or(AppError::NotFound)?;
        Ok(self.add_to_cart(&product))
    }

    /// Fetches a product and puts `quantity` of it in the cart, clamped to
    /// its stock. Quantities below one are refused before any request.
    pub async fn add_product(
        &mut self,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartNotice, AppError> {
        if quantity < 1 {
            return Err(self.fail(
                AppError::Validation(format!("quantity must be at least 1, got {}", quantity)),
                "Could not add the product",
            ));
        }
        let product = match self
            .backend
            .get_product(self.session.as_ref(), product_id)
            .await
        {
            Ok(product) => product,
            Err(e) => return Err(self.fail(e.into(), "Could not add the product")),
        };
        let notice = self.cart.add(&product);
        if notice.is_rejection() || quantity == 1 {
            return Ok(self.notify(notice));
        }
        let notice = self.cart.set_quantity(product_id, quantity);
        Ok(self.notify(notice))
    }

    pub fn remove_from_cart(&mut self, product_id: i64) -> CartNotice {
        let notice = self.cart.remove(product_id);
        self.notify(notice)
    }

    pub fn increase_quantity(&mut self, product_id: i64) -> CartNotice {
        let notice = self.cart.increase(product_id);
        self.notify(notice)
    }

    pub fn decrease_quantity(&mut self, product_id: i64) -> CartNotice {
        let notice = self.cart.decrease(product_id);
        self.notify(notice)
    }

    pub fn set_quantity(&mut self, product_id: i64, quantity: i64) -> CartNotice {
        let notice = self.cart.set_quantity(product_id, quantity);
        self.notify(notice)
    }

    /// Submits the cart as an order. The cart is only cleared once the
    /// backend has accepted it.
    pub async fn checkout(&mut self) -> Result<Order, AppError> {
        let session = self.require_session()?;
        if self.cart.is_empty() {
            return Err(self.fail(
                AppError::Validation("your cart is empty".to_string()),
                "Could not place the order",
            ));
        }

        let items = self.cart.to_order_items();
        match self.backend.create_order(&session, &items).await {
            Ok(order) => {
                log::info!("Order {} placed with {} item(s)", order.id, items.len());
                self.cart.clear();
                self.advisories
                    .post(Advisory::success(format!("Order placed. ID: {}", order.id)));
                Ok(order)
            }
            Err(DomainError::Unauthorized) => {
                Err(self.fail(AppError::SessionExpired, "Could not place the order"))
            }
            Err(e) => Err(self.fail(e.into(), "Could not place the order")),
        }
    }

    pub async fn my_orders(&mut self) -> Result<Page<Order>, AppError> {
        let session = self.require_session()?;
        let params = QueryParams::paged(0, MY_ORDERS_PAGE_SIZE);
        match self.backend.list_my_orders(&session, &params).await {
            Ok(page) => {
                if page.items.is_empty() {
                    self.advisories.post(Advisory::info("No orders found"));
                }
                Ok(page)
            }
            Err(DomainError::Unauthorized) => {
                Err(self.fail(AppError::SessionExpired, "Could not load your orders"))
            }
            Err(e) => Err(self.fail(e.into(), "Could not load your orders")),
        }
    }

    pub async fn order(&mut self, order_id: i64) -> Result<Order, AppError> {
        let session = self.require_session()?;
        match self.backend.get_order(&session, order_id).await {
            Ok(order) => Ok(order),
            Err(DomainError::Unauthorized) => {
                Err(self.fail(AppError::SessionExpired, "Could not load the order"))
            }
            Err(e) => Err(self.fail(e.into(), "Could not load the order")),
        }
    }

    /// Actions the signed-in customer may take on `order`.
    pub fn allowed_actions(&self, order: &Order) -> ActionSet {
        match &self.session {
            Some(session) => lifecycle::allowed_actions(order.status, session.role()),
            None => ActionSet::NONE,
        }
    }

    /// Cancels one of the customer's own orders. The lifecycle guard runs
    /// before any request is made.
    pub async fn cancel_order(&mut self, order: &Order) -> Result<(), AppError> {
        let session = self.require_session()?;
        if let Err(e) = lifecycle::check(order.status, Role::Customer, OrderAction::Cancel) {
            return Err(self.fail(e.into(), "Could not cancel the order"));
        }
        match self
            .backend
            .transition(&session, order.id, OrderAction::Cancel)
            .await
        {
            Ok(()) => {
                log::info!("Order {} cancelled", order.id);
                self.advisories.post(Advisory::success("Order cancelled"));
                Ok(())
            }
            Err(DomainError::Unauthorized) => {
                Err(self.fail(AppError::SessionExpired, "Could not cancel the order"))
            }
            Err(e) => Err(self.fail(e.into(), "Could not cancel the order")),
        }
    }

    /// Opens an edit draft for a pending order, with stock taken from the
    /// active catalog. If the catalog cannot be fetched the draft falls back
    /// to its default ceiling.
    pub async fn begin_edit(&mut self, order: &Order) -> Result<EditDraft, AppError> {
        let session = self.require_session()?;
        let params = ProductFilters::default().to_storefront_params(0, FULL_CATALOG_SIZE);
        let catalog = match self.backend.list_products(Some(&session), &params).await {
            Ok(page) => page.items,
            Err(e) => {
                log::warn!("Editing order {} without stock data: {}", order.id, e);
                Vec::new()
            }
        };
        EditDraft::open(order, &catalog).map_err(|e| self.fail(e.into(), "Cannot edit the order"))
    }

    /// Replaces the order's items with the draft's.
    pub async fn save_edit(&mut self, draft: &EditDraft) -> Result<Order, AppError> {
        let session = self.require_session()?;
        match self
            .backend
            .replace_items(&session, draft.order_id(), draft.items())
            .await
        {
            Ok(order) => {
                log::info!("Order {} updated", order.id);
                self.advisories.post(Advisory::success("Order updated"));
                Ok(order)
            }
            Err(DomainError::Unauthorized) => {
                Err(self.fail(AppError::SessionExpired, "Could not update the order"))
            }
            Err(e) => Err(self.fail(e.into(), "Could not update the order")),
        }
    }

    /// Drops the session and everything tied to it.
    pub fn logout(&mut self) {
        self.session = None;
        self.cart.clear();
        self.categories.clear();
        self.advisories.post(Advisory::info("Logged out"));
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::order::OrderStatus;
    use crate::infrastructure::memory::InMemoryBackend;

    fn shop() -> (StorefrontService<InMemoryBackend>, Session) {
        let backend = InMemoryBackend::new();
        let session = backend
            .seed_account("ana@example.com", "pw", Role::Customer)
            .unwrap();
        backend.seed_product("Lamp", BigDecimal::from(20), 5).unwrap();
        backend.seed_product("Desk", BigDecimal::from(150), 1).unwrap();
        (StorefrontService::new(backend, Some(session.clone())), session)
    }

    #[tokio::test]
    async fn load_products_fills_cursor() {
        let (mut shop, _) = shop();
        let products = shop.load_products().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(shop.cursor().total_elements(), 2);
        assert!(!shop.cursor().has_next());
    }

    #[tokio::test]
    async fn checkout_without_session_never_calls_backend() {
        let (mut shop, _) = shop();
        shop.load_products().await.unwrap();
        shop.add_to_cart_by_id(shop.products()[0].id).unwrap();
        shop.set_session(None);

        let err = shop.checkout().await.unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));
        assert_eq!(shop.cart().len(), 1);
        assert_eq!(shop.advisory().unwrap().text, "Please log in first");
    }

    #[tokio::test]
    async fn empty_cart_is_a_validation_error() {
        let (mut shop, _) = shop();
        let err = shop.checkout().await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(shop.advisory().unwrap().text, "Your cart is empty");
    }

    #[tokio::test]
    async fn add_product_refuses_quantities_below_one() {
        let (mut shop, _) = shop();
        shop.load_products().await.unwrap();
        let lamp = shop
            .products()
            .iter()
            .find(|p| p.name == "Lamp")
            .map(|p| p.id)
            .unwrap();

        for quantity in [0, -4] {
            let err = shop.add_product(lamp, quantity).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
            assert!(err.is_local());
        }
        assert!(shop.cart().is_empty());
        assert_eq!(
            shop.advisory().unwrap().text,
            "Quantity must be at least 1, got -4"
        );

        shop.add_product(lamp, 3).await.unwrap();
        assert_eq!(shop.cart().quantity_of(lamp), 3);
    }

    #[tokio::test]
    async fn cart_actions_post_advisories() {
        let (mut shop, _) = shop();
        shop.load_products().await.unwrap();
        let desk = shop
            .products()
            .iter()
            .find(|p| p.name == "Desk")
            .cloned()
            .unwrap();

        assert_eq!(shop.add_to_cart(&desk), CartNotice::Added { name: "Desk".into() });
        assert_eq!(
            shop.add_to_cart(&desk),
            CartNotice::StockLimitReached { stock: 1 }
        );
        assert!(shop.advisory().unwrap().is_error());
    }

    #[tokio::test]
    async fn cancel_guard_runs_before_request() {
        let (mut shop, _) = shop();
        let mut order = Order {
            id: 999,
            user_id: None,
            user_email: None,
            status: OrderStatus::Confirmed,
            total: BigDecimal::from(0),
            created_at: None,
            lines: Vec::new(),
        };
        // Unknown id: reaching the backend would give NotFound instead.
        let err = shop.cancel_order(&order).await.unwrap_err();
        assert!(matches!(err, AppError::NotPermitted(_)));

        order.status = OrderStatus::Pending;
        let err = shop.cancel_order(&order).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn logout_empties_cart() {
        let (mut shop, _) = shop();
        shop.load_products().await.unwrap();
        shop.add_to_cart_by_id(shop.products()[0].id).unwrap();
        shop.logout();
        assert!(shop.cart().is_empty());
        assert!(shop.session().is_none());
        assert!(shop.allowed_actions(&Order {
            id: 1,
            user_id: None,
            user_email: None,
            status: OrderStatus::Pending,
            total: BigDecimal::from(0),
            created_at: None,
            lines: Vec::new(),
        })
        .is_empty());
    }
}
