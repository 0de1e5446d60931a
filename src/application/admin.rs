use std::time::Duration;

use crate::application::auth::require_admin;
use crate::domain::advisory::{Advisory, AdvisoryBoard};
use crate::domain::errors::DomainError;
use crate::domain::lifecycle::{self, ActionSet, OrderAction};
use crate::domain::order::Order;
use crate::domain::pagination::{Page, PageCursor};
use crate::domain::ports::{CatalogApi, OrderApi};
use crate::domain::product::{Category, CategoryDraft, Product, ProductDraft};
use crate::domain::query::{OrderFilters, ProductFilters, QueryParams};
use crate::domain::session::{Role, Session};
use crate::errors::AppError;

const ALL_CATEGORIES_SIZE: u32 = 1000;

/// Local search over a loaded category list, by name or description.
pub fn search_categories<'a>(categories: &'a [Category], query: &str) -> Vec<&'a Category> {
    let query = query.trim().to_lowercase();
    categories
        .iter()
        .filter(|c| {
            query.is_empty()
                || c.name.to_lowercase().contains(&query)
                || c.description.to_lowercase().contains(&query)
        })
        .collect()
}

fn action_done(action: OrderAction) -> &'static str {
    match action {
        OrderAction::Confirm => "Order confirmed",
        OrderAction::Cancel => "Order cancelled",
        OrderAction::Send => "Order shipped",
        OrderAction::Deliver => "Order delivered",
        OrderAction::Edit => "Order updated",
    }
}

/// Admin workflows. List cursors belong to the caller so several lists can
/// be paged independently.
pub struct AdminService<B> {
    backend: B,
    session: Session,
    advisories: AdvisoryBoard,
}

impl<B: CatalogApi + OrderApi> AdminService<B> {
    pub fn new(backend: B, session: Session) -> Result<Self, AppError> {
        require_admin(Some(&session))?;
        Ok(Self {
            backend,
            session,
            advisories: AdvisoryBoard::default(),
        })
    }

    pub fn with_advisory_ttl(mut self, ttl: Duration) -> Self {
        self.advisories = AdvisoryBoard::new(ttl);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn advisory(&self) -> Option<&Advisory> {
        self.advisories.current()
    }

    fn fail(&mut self, err: DomainError, context: &str) -> AppError {
        let err = match err {
            DomainError::Unauthorized => AppError::SessionExpired,
            other => AppError::from(other),
        };
        log::warn!("{}: {}", context, err);
        self.advisories.post(err.advisory(context));
        err
    }

    fn done(&mut self, text: impl Into<String>) {
        let advisory = Advisory::success(text);
        log::info!("{}", advisory.text);
        self.advisories.post(advisory);
    }

    pub async fn list_products(
        &mut self,
        filters: &ProductFilters,
        cursor: &mut PageCursor,
    ) -> Result<Page<Product>, AppError> {
        let params = filters.to_params(cursor.page(), cursor.size());
        match self.backend.list_products(Some(&self.session), &params).await {
            Ok(page) => {
                cursor.update_from(&page);
                Ok(page)
            }
            Err(e) => {
                cursor.clear_totals();
                Err(self.fail(e, "Could not load products"))
            }
        }
    }

    /// Form prefill for editing a product.
    pub async fn product_draft(&mut self, id: i64) -> Result<ProductDraft, AppError> {
        let product = match self.backend.get_product(Some(&self.session), id).await {
            Ok(product) => product,
            Err(e) => return Err(self.fail(e, "Could not load the product")),
        };
        let categories = self.all_categories().await;
        Ok(ProductDraft::from_product(&product, &categories))
    }

    pub async fn create_product(&mut self, draft: &ProductDraft) -> Result<Product, AppError> {
        if let Err(e) = draft.validate() {
            return Err(self.fail(e, "Could not create the product"));
        }
        match self.backend.create_product(&self.session, draft).await {
            Ok(product) => {
                self.done(format!("Product '{}' created", product.name));
                Ok(product)
            }
            Err(e) => Err(self.fail(e, "Could not create the product")),
        }
    }

    pub async fn update_product(
        &mut self,
        id: i64,
        draft: &ProductDraft,
    ) -> Result<Product, AppError> {
        if let Err(e) = draft.validate() {
            return Err(self.fail(e, "Could not update the product"));
        }
        match self.backend.update_product(&self.session, id, draft).await {
            Ok(product) => {
                self.done(format!("Product '{}' updated", product.name));
                Ok(product)
            }
            Err(e) => Err(self.fail(e, "Could not update the product")),
        }
    }

    pub async fn delete_product(&mut self, id: i64) -> Result<(), AppError> {
        match self.backend.delete_product(&self.session, id).await {
            Ok(()) => {
                self.done("Product deleted");
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Could not delete the product")),
        }
    }

    pub async fn list_categories(
        &mut self,
        cursor: &mut PageCursor,
    ) -> Result<Page<Category>, AppError> {
        let params = QueryParams::paged(cursor.page(), cursor.size());
        match self.backend.list_categories(Some(&self.session), &params).await {
            Ok(page) => {
                cursor.update_from(&page);
                Ok(page)
            }
            Err(e) => {
                cursor.clear_totals();
                Err(self.fail(e, "Could not load categories"))
            }
        }
    }

    /// Every category, for select boxes. Failures yield an empty list.
    pub async fn all_categories(&self) -> Vec<Category> {
        let params = QueryParams::paged(0, ALL_CATEGORIES_SIZE);
        match self.backend.list_categories(Some(&self.session), &params).await {
            Ok(page) => page.items,
            Err(e) => {
                log::warn!("Could not load categories: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn category(&mut self, id: i64) -> Result<Category, AppError> {
        match self.backend.get_category(&self.session, id).await {
            Ok(category) => Ok(category),
            Err(e) => Err(self.fail(e, "Could not load the category")),
        }
    }

    pub async fn create_category(&mut self, draft: &CategoryDraft) -> Result<Category, AppError> {
        if let Err(e) = draft.validate() {
            return Err(self.fail(e, "Could not create the category"));
        }
        match self.backend.create_category(&self.session, draft).await {
            Ok(category) => {
                self.done(format!("Category '{}' created", category.name));
                Ok(category)
            }
            Err(e) => Err(self.fail(e, "Could not create the category")),
        }
    }

    pub async fn update_category(
        &mut self,
        id: i64,
        draft: &CategoryDraft,
    ) -> Result<Category, AppError> {
        if let Err(e) = draft.validate() {
            return Err(self.fail(e, "Could not update the category"));
        }
        match self.backend.update_category(&self.session, id, draft).await {
            Ok(category) => {
                self.done(format!("Category '{}' updated", category.name));
                Ok(category)
            }
            Err(e) => Err(self.fail(e, "Could not update the category")),
        }
    }

    pub async fn delete_category(&mut self, id: i64) -> Result<(), AppError> {
        match self.backend.delete_category(&self.session, id).await {
            Ok(()) => {
                self.done("Category deleted");
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Could not delete the category")),
        }
    }

    pub async fn list_orders(
        &mut self,
        filters: &OrderFilters,
        cursor: &mut PageCursor,
    ) -> Result<Page<Order>, AppError> {
        let params = filters.to_params(cursor.page(), cursor.size());
        log::debug!("Loading orders: {:?}", params.as_pairs());
        match self.backend.list_all_orders(&self.session, &params).await {
            Ok(page) => {
                cursor.update_from(&page);
                Ok(page)
            }
            Err(e) => {
                cursor.clear_totals();
                Err(self.fail(e, "Could not load orders"))
            }
        }
    }

    pub async fn order(&mut self, order_id: i64) -> Result<Order, AppError> {
        match self.backend.get_order(&self.session, order_id).await {
            Ok(order) => Ok(order),
            Err(e) => Err(self.fail(e, "Could not load the order")),
        }
    }

    pub fn allowed_actions(&self, order: &Order) -> ActionSet {
        lifecycle::allowed_actions(order.status, Role::Admin)
    }

    /// Runs a status transition after checking it against the lifecycle
    /// table. The caller reloads the list afterwards.
    pub async fn apply_action(
        &mut self,
        order: &Order,
        action: OrderAction,
    ) -> Result<(), AppError> {
        let context = format!("Could not {} order {}", action, order.id);
        if let Err(e) = lifecycle::check(order.status, Role::Admin, action) {
            return Err(self.fail(e, &context));
        }
        match self.backend.transition(&self.session, order.id, action).await {
            Ok(()) => {
                self.done(format!("{} (#{})", action_done(action), order.id));
                Ok(())
            }
            Err(e) => Err(self.fail(e, &context)),
        }
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::order::{OrderItem, OrderStatus};
    use crate::infrastructure::memory::InMemoryBackend;

    fn admin() -> AdminService<InMemoryBackend> {
        let backend = InMemoryBackend::new();
        let session = backend
            .seed_account("root@example.com", "pw", Role::Admin)
            .unwrap();
        AdminService::new(backend, session).unwrap()
    }

    fn lamp_draft(category_id: i64) -> ProductDraft {
        ProductDraft {
            name: "Lamp".to_string(),
            description: "Desk lamp".to_string(),
            price: BigDecimal::from(20),
            stock: 3,
            category_id,
            ..ProductDraft::default()
        }
    }

    #[test]
    fn customer_session_is_refused() {
        let session = Session::new("t", "ana@example.com", Role::Customer);
        let result = AdminService::new(InMemoryBackend::new(), session);
        assert!(matches!(result, Err(AppError::NotPermitted(_))));
    }

    #[test]
    fn search_matches_name_or_description() {
        let categories = vec![
            Category {
                id: 1,
                name: "Lighting".to_string(),
                description: "Lamps and bulbs".to_string(),
            },
            Category {
                id: 2,
                name: "Office".to_string(),
                description: "Desks".to_string(),
            },
        ];
        assert_eq!(search_categories(&categories, "lamp").len(), 1);
        assert_eq!(search_categories(&categories, "  ").len(), 2);
        assert_eq!(search_categories(&categories, "OFF")[0].id, 2);
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_locally() {
        let mut admin = admin();
        let draft = ProductDraft {
            name: " ".to_string(),
            ..lamp_draft(1)
        };
        let err = admin.create_product(&draft).await.unwrap_err();
        assert!(err.is_local());
        assert!(admin.advisory().unwrap().is_error());
    }

    #[tokio::test]
    async fn product_crud_round() {
        let mut admin = admin();
        let category = admin
            .create_category(&CategoryDraft {
                name: "Lighting".to_string(),
                description: "Lamps".to_string(),
            })
            .await
            .unwrap();

        let product = admin.create_product(&lamp_draft(category.id)).await.unwrap();
        let mut draft = admin.product_draft(product.id).await.unwrap();
        assert_eq!(draft.category_id, category.id);

        draft.stock = 7;
        let updated = admin.update_product(product.id, &draft).await.unwrap();
        assert_eq!(updated.stock, 7);
        assert_eq!(admin.advisory().unwrap().text, "Product 'Lamp' updated");

        let mut cursor = PageCursor::new(10);
        let page = admin
            .list_products(&ProductFilters::default(), &mut cursor)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(cursor.total_elements(), 1);

        admin.delete_product(product.id).await.unwrap();
        let err = admin.product_draft(product.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn transitions_follow_the_table() {
        let backend = InMemoryBackend::new();
        let root = backend
            .seed_account("root@example.com", "pw", Role::Admin)
            .unwrap();
        let ana = backend
            .seed_account("ana@example.com", "pw", Role::Customer)
            .unwrap();
        let lamp = backend.seed_product("Lamp", BigDecimal::from(20), 5).unwrap();
        let order = backend
            .create_order(
                &ana,
                &[OrderItem {
                    product_id: lamp.id,
                    quantity: 1,
                }],
            )
            .await
            .unwrap();

        let mut admin = AdminService::new(backend, root).unwrap();
        assert!(admin.allowed_actions(&order).contains(OrderAction::Confirm));

        let err = admin.apply_action(&order, OrderAction::Deliver).await.unwrap_err();
        assert!(matches!(err, AppError::NotPermitted(_)));

        admin.apply_action(&order, OrderAction::Confirm).await.unwrap();
        let mut cursor = PageCursor::default();
        let page = admin
            .list_orders(
                &OrderFilters {
                    status: Some(OrderStatus::Confirmed),
                    ..OrderFilters::default()
                },
                &mut cursor,
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].status, OrderStatus::Confirmed);
    }
}
