use async_trait::async_trait;

use super::errors::DomainError;
use super::lifecycle::OrderAction;
use super::order::{Order, OrderItem};
use super::pagination::Page;
use super::product::{Category, CategoryDraft, Product, ProductDraft};
use super::query::QueryParams;
use super::session::{Credentials, Session};

/// Products and categories. Reads accept an optional session because the
/// storefront browses anonymously.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_products(
        &self,
        session: Option<&Session>,
        params: &QueryParams,
    ) -> Result<Page<Product>, DomainError>;
    async fn get_product(&self, session: Option<&Session>, id: i64)
        -> Result<Product, DomainError>;
    async fn create_product(
        &self,
        session: &Session,
        draft: &ProductDraft,
    ) -> Result<Product, DomainError>;
    async fn update_product(
        &self,
        session: &Session,
        id: i64,
        draft: &ProductDraft,
    ) -> Result<Product, DomainError>;
    async fn delete_product(&self, session: &Session, id: i64) -> Result<(), DomainError>;

    async fn list_categories(
        &self,
        session: Option<&Session>,
        params: &QueryParams,
    ) -> Result<Page<Category>, DomainError>;
    async fn get_category(&self, session: &Session, id: i64) -> Result<Category, DomainError>;
    async fn create_category(
        &self,
        session: &Session,
        draft: &CategoryDraft,
    ) -> Result<Category, DomainError>;
    async fn update_category(
        &self,
        session: &Session,
        id: i64,
        draft: &CategoryDraft,
    ) -> Result<Category, DomainError>;
    async fn delete_category(&self, session: &Session, id: i64) -> Result<(), DomainError>;
}

#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn create_order(&self, session: &Session, items: &[OrderItem])
        -> Result<Order, DomainError>;
    /// Replaces the order's items wholesale.
    async fn replace_items(
        &self,
        session: &Session,
        order_id: i64,
        items: &[OrderItem],
    ) -> Result<Order, DomainError>;
    /// `action` must be a transition; `Edit` goes through `replace_items`.
    async fn transition(
        &self,
        session: &Session,
        order_id: i64,
        action: OrderAction,
    ) -> Result<(), DomainError>;
    async fn get_order(&self, session: &Session, order_id: i64) -> Result<Order, DomainError>;
    async fn list_all_orders(
        &self,
        session: &Session,
        params: &QueryParams,
    ) -> Result<Page<Order>, DomainError>;
    async fn list_my_orders(
        &self,
        session: &Session,
        params: &QueryParams,
    ) -> Result<Page<Order>, DomainError>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session, DomainError>;
    async fn register_customer(&self, credentials: &Credentials) -> Result<Session, DomainError>;
    async fn register_admin(&self, credentials: &Credentials) -> Result<Session, DomainError>;
}

/// Local key/value persistence of the session between runs.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, DomainError>;
    fn save(&self, session: &Session) -> Result<(), DomainError>;
    fn clear(&self) -> Result<(), DomainError>;
}
