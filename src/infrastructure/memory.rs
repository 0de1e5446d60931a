use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;

use crate::domain::errors::DomainError;
use crate::domain::lifecycle::{self, OrderAction};
use crate::domain::order::{Order, OrderItem, OrderLine, OrderStatus};
use crate::domain::pagination::Page;
use crate::domain::ports::{AuthApi, CatalogApi, OrderApi};
use crate::domain::product::{Category, CategoryDraft, Product, ProductDraft};
use crate::domain::query::QueryParams;
use crate::domain::session::{Credentials, Role, Session};

struct Account {
    id: i64,
    password: String,
    role: Role,
}

#[derive(Default)]
struct State {
    products: BTreeMap<i64, Product>,
    categories: BTreeMap<i64, Category>,
    orders: BTreeMap<i64, Order>,
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn caller(&self, session: &Session) -> Result<(i64, Role), DomainError> {
        let email = self
            .tokens
            .get(&session.token)
            .ok_or(DomainError::Unauthorized)?;
        let account = self.accounts.get(email).ok_or(DomainError::Unauthorized)?;
        Ok((account.id, account.role))
    }

    fn require_admin(&self, session: &Session) -> Result<(), DomainError> {
        match self.caller(session)? {
            (_, Role::Admin) => Ok(()),
            _ => Err(forbidden()),
        }
    }

    fn add_account(&mut self, email: &str, password: &str, role: Role) -> Session {
        let id = self.next_id();
        self.accounts.insert(
            email.to_string(),
            Account {
                id,
                password: password.to_string(),
                role,
            },
        );
        self.issue_token(email, role)
    }

    fn issue_token(&mut self, email: &str, role: Role) -> Session {
        let token = format!("mem-token-{}", self.next_id());
        self.tokens.insert(token.clone(), email.to_string());
        Session::new(token, email, role)
    }

    /// Checks stock for `items` and builds priced lines, without reserving.
    fn price_items(&self, items: &[OrderItem]) -> Result<Vec<OrderLine>, DomainError> {
        if items.is_empty() {
            return Err(bad_request("an order needs at least one product"));
        }
        let mut requested: BTreeMap<i64, u32> = BTreeMap::new();
        for item in items {
            if item.quantity == 0 {
                return Err(bad_request("quantities must be positive"));
            }
            let total = requested.entry(item.product_id).or_default();
            *total = total.saturating_add(item.quantity);
        }
        for (product_id, quantity) in &requested {
            let product = self
                .products
                .get(product_id)
                .ok_or_else(|| bad_request(&format!("unknown product {}", product_id)))?;
            if *quantity > product.stock {
                return Err(DomainError::Rejected {
                    status: 409,
                    message: format!("insufficient stock for {}", product.name),
                });
            }
        }
        Ok(items
            .iter()
            .filter_map(|item| {
                let product = self.products.get(&item.product_id)?;
                Some(OrderLine {
                    product_id: Some(product.id),
                    product_name: product.name.clone(),
                    quantity: item.quantity,
                    unit_price: product.price.clone(),
                })
            })
            .collect())
    }

    fn adjust_stock(&mut self, lines: &[OrderLine], restore: bool) {
        for line in lines {
            let Some(product) = line.product_id.and_then(|id| self.products.get_mut(&id)) else {
                continue;
            };
            product.stock = if restore {
                product.stock.saturating_add(line.quantity)
            } else {
                product.stock.saturating_sub(line.quantity)
            };
        }
    }
}

fn forbidden() -> DomainError {
    DomainError::Rejected {
        status: 403,
        message: "forbidden".to_string(),
    }
}

fn bad_request(message: &str) -> DomainError {
    DomainError::Rejected {
        status: 400,
        message: message.to_string(),
    }
}

fn total_of(lines: &[OrderLine]) -> BigDecimal {
    lines
        .iter()
        .fold(BigDecimal::from(0), |acc, l| acc + l.subtotal())
}

fn param_u32(params: &QueryParams, key: &str, default: u32) -> u32 {
    params
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn paginate<T>(items: Vec<T>, params: &QueryParams) -> Page<T> {
    let page = param_u32(params, "page", 0);
    let size = param_u32(params, "size", 10).max(1);
    let total_elements = items.len() as u64;
    let total_pages = total_elements.div_ceil(u64::from(size)) as u32;
    let start = (page as usize).saturating_mul(size as usize);
    Page {
        items: items.into_iter().skip(start).take(size as usize).collect(),
        number: page,
        size,
        total_elements,
        total_pages,
    }
}

/// Simulated backend holding everything in memory. Applies the same
/// transition table and stock checks the real service enforces, so client
/// workflows can run offline. Clones share the same state.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Internal("backend state poisoned".to_string()))
    }

    /// Registers an account and returns a live session for it.
    pub fn seed_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Session, DomainError> {
        Ok(self.lock()?.add_account(email, password, role))
    }

    pub fn seed_category(&self, name: &str, description: &str) -> Result<Category, DomainError> {
        let mut state = self.lock()?;
        let category = Category {
            id: state.next_id(),
            name: name.to_string(),
            description: description.to_string(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    pub fn seed_product(
        &self,
        name: &str,
        price: BigDecimal,
        stock: u32,
    ) -> Result<Product, DomainError> {
        let mut state = self.lock()?;
        let product = Product::new(state.next_id(), name, price, stock);
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    pub fn stock_of(&self, product_id: i64) -> Option<u32> {
        self.lock()
            .ok()?
            .products
            .get(&product_id)
            .map(|p| p.stock)
    }

    /// Forces an order into `status`, bypassing the lifecycle checks.
    pub fn force_status(&self, order_id: i64, status: OrderStatus) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        let order = state.orders.get_mut(&order_id).ok_or(DomainError::NotFound)?;
        order.status = status;
        Ok(())
    }

    /// Invalidates every issued token.
    pub fn expire_sessions(&self) -> Result<(), DomainError> {
        self.lock()?.tokens.clear();
        Ok(())
    }
}

fn product_from_draft(
    id: i64,
    draft: &ProductDraft,
    categories: &BTreeMap<i64, Category>,
) -> Result<Product, DomainError> {
    draft.validate().map_err(|e| bad_request(&e.to_string()))?;
    let category = categories
        .get(&draft.category_id)
        .ok_or_else(|| bad_request("unknown category"))?;
    Ok(Product {
        id,
        name: draft.name.trim().to_string(),
        description: Some(draft.description.clone()).filter(|d| !d.is_empty()),
        price: draft.price.clone(),
        // validate() guarantees a non-negative stock
        stock: u32::try_from(draft.stock).unwrap_or(u32::MAX),
        category_id: Some(category.id),
        category_name: Some(category.name.clone()),
        active: true,
        image_url: None,
    })
}

#[async_trait]
impl CatalogApi for InMemoryBackend {
    async fn list_products(
        &self,
        _session: Option<&Session>,
        params: &QueryParams,
    ) -> Result<Page<Product>, DomainError> {
        let state = self.lock()?;
        let name = params.get("name").map(str::to_lowercase);
        let category = params.get("categoryId").and_then(|v| v.parse::<i64>().ok());
        let status = params.get("status").and_then(|v| v.parse::<bool>().ok());
        let min = params.get("minPrice").and_then(|v| v.parse::<BigDecimal>().ok());
        let max = params.get("maxPrice").and_then(|v| v.parse::<BigDecimal>().ok());

        let matching: Vec<Product> = state
            .products
            .values()
            .filter(|p| name.as_ref().map_or(true, |n| p.name.to_lowercase().contains(n)))
            .filter(|p| category.map_or(true, |c| p.category_id == Some(c)))
            .filter(|p| status.map_or(true, |s| p.active == s))
            .filter(|p| min.as_ref().map_or(true, |m| p.price >= *m))
            .filter(|p| max.as_ref().map_or(true, |m| p.price <= *m))
            .cloned()
            .collect();
        Ok(paginate(matching, params))
    }

    async fn get_product(
        &self,
        _session: Option<&Session>,
        id: i64,
    ) -> Result<Product, DomainError> {
        self.lock()?
            .products
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    async fn create_product(
        &self,
        session: &Session,
        draft: &ProductDraft,
    ) -> Result<Product, DomainError> {
        let mut state = self.lock()?;
        state.require_admin(session)?;
        let id = state.next_id();
        let product = product_from_draft(id, draft, &state.categories)?;
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        session: &Session,
        id: i64,
        draft: &ProductDraft,
    ) -> Result<Product, DomainError> {
        let mut state = self.lock()?;
        state.require_admin(session)?;
        if !state.products.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        let product = product_from_draft(id, draft, &state.categories)?;
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, session: &Session, id: i64) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        state.require_admin(session)?;
        state
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::NotFound)
    }

    async fn list_categories(
        &self,
        _session: Option<&Session>,
        params: &QueryParams,
    ) -> Result<Page<Category>, DomainError> {
        let state = self.lock()?;
        Ok(paginate(state.categories.values().cloned().collect(), params))
    }

    async fn get_category(&self, session: &Session, id: i64) -> Result<Category, DomainError> {
        let state = self.lock()?;
        state.caller(session)?;
        state.categories.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    async fn create_category(
        &self,
        session: &Session,
        draft: &CategoryDraft,
    ) -> Result<Category, DomainError> {
        draft.validate().map_err(|e| bad_request(&e.to_string()))?;
        let mut state = self.lock()?;
        state.require_admin(session)?;
        let category = Category {
            id: state.next_id(),
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        session: &Session,
        id: i64,
        draft: &CategoryDraft,
    ) -> Result<Category, DomainError> {
        draft.validate().map_err(|e| bad_request(&e.to_string()))?;
        let mut state = self.lock()?;
        state.require_admin(session)?;
        let category = state.categories.get_mut(&id).ok_or(DomainError::NotFound)?;
        category.name = draft.name.trim().to_string();
        category.description = draft.description.trim().to_string();
        Ok(category.clone())
    }

    async fn delete_category(&self, session: &Session, id: i64) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        state.require_admin(session)?;
        state
            .categories
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::NotFound)
    }
}

#[async_trait]
impl OrderApi for InMemoryBackend {
    async fn create_order(
        &self,
        session: &Session,
        items: &[OrderItem],
    ) -> Result<Order, DomainError> {
        let mut state = self.lock()?;
        let (user_id, _) = state.caller(session)?;
        let lines = state.price_items(items)?;
        state.adjust_stock(&lines, false);

        let order = Order {
            id: state.next_id(),
            user_id: Some(user_id),
            user_email: Some(session.profile.email.clone()),
            status: OrderStatus::Pending,
            total: total_of(&lines),
            created_at: Some(Utc::now()),
            lines,
        };
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn replace_items(
        &self,
        session: &Session,
        order_id: i64,
        items: &[OrderItem],
    ) -> Result<Order, DomainError> {
        let mut state = self.lock()?;
        let (user_id, role) = state.caller(session)?;
        let current = state.orders.get(&order_id).cloned().ok_or(DomainError::NotFound)?;
        if current.user_id != Some(user_id) {
            return Err(forbidden());
        }
        lifecycle::check(current.status, role, OrderAction::Edit)
            .map_err(|e| bad_request(&e.to_string()))?;

        // Price against stock with the current lines handed back first.
        state.adjust_stock(&current.lines, true);
        let lines = match state.price_items(items) {
            Ok(lines) => lines,
            Err(e) => {
                state.adjust_stock(&current.lines, false);
                return Err(e);
            }
        };
        state.adjust_stock(&lines, false);

        let order = state.orders.get_mut(&order_id).ok_or(DomainError::NotFound)?;
        order.total = total_of(&lines);
        order.lines = lines;
        Ok(order.clone())
    }

    async fn transition(
        &self,
        session: &Session,
        order_id: i64,
        action: OrderAction,
    ) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        let (user_id, role) = state.caller(session)?;
        let order = state.orders.get(&order_id).ok_or(DomainError::NotFound)?;
        if role == Role::Customer && order.user_id != Some(user_id) {
            return Err(forbidden());
        }
        let from = order.status;
        lifecycle::check(from, role, action).map_err(|e| bad_request(&e.to_string()))?;
        let next = action
            .target(from)
            .filter(|_| action.is_transition())
            .ok_or_else(|| bad_request(&format!("'{}' is not a status transition", action)))?;

        let released = (next == OrderStatus::Cancelled).then(|| order.lines.clone());
        if let Some(lines) = released {
            state.adjust_stock(&lines, true);
        }
        if let Some(order) = state.orders.get_mut(&order_id) {
            order.status = next;
        }
        Ok(())
    }

    async fn get_order(&self, session: &Session, order_id: i64) -> Result<Order, DomainError> {
        let state = self.lock()?;
        let (user_id, role) = state.caller(session)?;
        let order = state.orders.get(&order_id).ok_or(DomainError::NotFound)?;
        if role == Role::Customer && order.user_id != Some(user_id) {
            return Err(DomainError::NotFound);
        }
        Ok(order.clone())
    }

    async fn list_all_orders(
        &self,
        session: &Session,
        params: &QueryParams,
    ) -> Result<Page<Order>, DomainError> {
        let state = self.lock()?;
        state.require_admin(session)?;
        let user = params.get("userId").and_then(|v| v.parse::<i64>().ok());
        let status = params
            .get("status")
            .and_then(|v| v.parse::<OrderStatus>().ok());
        let orders: Vec<Order> = state
            .orders
            .values()
            .rev()
            .filter(|o| user.map_or(true, |u| o.user_id == Some(u)))
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        Ok(paginate(orders, params))
    }

    async fn list_my_orders(
        &self,
        session: &Session,
        params: &QueryParams,
    ) -> Result<Page<Order>, DomainError> {
        let state = self.lock()?;
        let (user_id, _) = state.caller(session)?;
        let orders: Vec<Order> = state
            .orders
            .values()
            .rev()
            .filter(|o| o.user_id == Some(user_id))
            .cloned()
            .collect();
        Ok(paginate(orders, params))
    }
}

#[async_trait]
impl AuthApi for InMemoryBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Session, DomainError> {
        let mut state = self.lock()?;
        let role = match state.accounts.get(credentials.email.trim()) {
            Some(account) if account.password == credentials.password => account.role,
            _ => return Err(DomainError::Unauthorized),
        };
        Ok(state.issue_token(credentials.email.trim(), role))
    }

    async fn register_customer(&self, credentials: &Credentials) -> Result<Session, DomainError> {
        register(self, credentials, Role::Customer)
    }

    async fn register_admin(&self, credentials: &Credentials) -> Result<Session, DomainError> {
        register(self, credentials, Role::Admin)
    }
}

fn register(
    backend: &InMemoryBackend,
    credentials: &Credentials,
    role: Role,
) -> Result<Session, DomainError> {
    let email = credentials.email.trim();
    let mut state = backend.lock()?;
    if state.accounts.contains_key(email) {
        return Err(DomainError::Rejected {
            status: 409,
            message: "email already registered".to_string(),
        });
    }
    Ok(state.add_account(email, &credentials.password, role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_order_reserves_stock_and_cancel_restores_it() {
        let backend = InMemoryBackend::new();
        let customer = backend
            .seed_account("ana@example.com", "pw", Role::Customer)
            .unwrap();
        let lamp = backend.seed_product("Lamp", BigDecimal::from(20), 4).unwrap();

        let order = backend
            .create_order(
                &customer,
                &[OrderItem {
                    product_id: lamp.id,
                    quantity: 3,
                }],
            )
            .await
            .unwrap();
        assert_eq!(order.total, BigDecimal::from(60));
        assert_eq!(backend.stock_of(lamp.id), Some(1));

        backend
            .transition(&customer, order.id, OrderAction::Cancel)
            .await
            .unwrap();
        assert_eq!(backend.stock_of(lamp.id), Some(4));
    }

    #[tokio::test]
    async fn create_order_rejects_excess_quantity() {
        let backend = InMemoryBackend::new();
        let customer = backend
            .seed_account("ana@example.com", "pw", Role::Customer)
            .unwrap();
        let lamp = backend.seed_product("Lamp", BigDecimal::from(20), 1).unwrap();

        let err = backend
            .create_order(
                &customer,
                &[OrderItem {
                    product_id: lamp.id,
                    quantity: 2,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Rejected { status: 409, .. }));
        assert_eq!(backend.stock_of(lamp.id), Some(1));
    }

    #[tokio::test]
    async fn duplicate_huge_lines_are_rejected_on_stock() {
        let backend = InMemoryBackend::new();
        let customer = backend
            .seed_account("ana@example.com", "pw", Role::Customer)
            .unwrap();
        let lamp = backend.seed_product("Lamp", BigDecimal::from(20), 4).unwrap();
        let huge = OrderItem {
            product_id: lamp.id,
            quantity: u32::MAX,
        };

        let err = backend
            .create_order(&customer, &[huge, huge])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Rejected { status: 409, .. }));
        assert_eq!(backend.stock_of(lamp.id), Some(4));
    }

    #[tokio::test]
    async fn backend_revalidates_transitions() {
        let backend = InMemoryBackend::new();
        let customer = backend
            .seed_account("ana@example.com", "pw", Role::Customer)
            .unwrap();
        let admin = backend
            .seed_account("root@example.com", "pw", Role::Admin)
            .unwrap();
        let lamp = backend.seed_product("Lamp", BigDecimal::from(20), 4).unwrap();
        let order = backend
            .create_order(
                &customer,
                &[OrderItem {
                    product_id: lamp.id,
                    quantity: 1,
                }],
            )
            .await
            .unwrap();

        let err = backend
            .transition(&admin, order.id, OrderAction::Deliver)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Rejected { status: 400, .. }));

        backend
            .transition(&admin, order.id, OrderAction::Confirm)
            .await
            .unwrap();
        let err = backend
            .transition(&customer, order.id, OrderAction::Cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let backend = InMemoryBackend::new();
        let session = Session::new("forged", "eve@example.com", Role::Admin);
        let err = backend
            .list_my_orders(&session, &QueryParams::paged(0, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }

    #[tokio::test]
    async fn login_checks_password() {
        let backend = InMemoryBackend::new();
        backend
            .register_customer(&Credentials::new("ana@example.com", "pw"))
            .await
            .unwrap();
        assert!(backend
            .login(&Credentials::new("ana@example.com", "nope"))
            .await
            .is_err());
        let session = backend
            .login(&Credentials::new("ana@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(session.role(), Role::Customer);
    }

    #[test]
    fn paginate_slices_and_counts() {
        let page = paginate((0..25).collect::<Vec<i32>>(), &QueryParams::paged(2, 10));
        assert_eq!(page.items, (20..25).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_elements, 25);
    }
}
