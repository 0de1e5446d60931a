use std::collections::HashMap;

use super::advisory::Advisory;
use super::errors::DomainError;
use super::lifecycle::{self, OrderAction};
use super::order::{Order, OrderItem};
use super::product::Product;
use super::session::Role;

/// Ceiling used when the product's stock is not known locally.
pub const UNKNOWN_STOCK_CEILING: u32 = 99;

/// Customer-side working copy of a pending order's items. Saving sends the
/// whole list, replacing what the backend holds.
#[derive(Debug, Clone)]
pub struct EditDraft {
    order_id: i64,
    items: Vec<OrderItem>,
    stock: HashMap<i64, u32>,
    default_product: Option<i64>,
}

impl EditDraft {
    /// Opens a draft for `order`. Only pending orders may be edited, and only
    /// by their customer.
    pub fn open(order: &Order, catalog: &[Product]) -> Result<Self, DomainError> {
        lifecycle::check(order.status, Role::Customer, OrderAction::Edit)?;
        Ok(Self {
            order_id: order.id,
            items: order.items(),
            stock: catalog.iter().map(|p| (p.id, p.stock)).collect(),
            default_product: catalog.first().map(|p| p.id),
        })
    }

    pub fn order_id(&self) -> i64 {
        self.order_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Index of the first line holding `product_id`.
    pub fn position(&self, product_id: i64) -> Option<usize> {
        self.items.iter().position(|i| i.product_id == product_id)
    }

    fn max_for(&self, product_id: i64) -> u32 {
        self.stock
            .get(&product_id)
            .copied()
            .unwrap_or(UNKNOWN_STOCK_CEILING)
    }

    pub fn stock_of(&self, product_id: i64) -> u32 {
        self.stock.get(&product_id).copied().unwrap_or(0)
    }

    /// Appends a line with quantity 1, for `product_id` or the first known
    /// product. Nothing is added when neither is available.
    pub fn add_item(&mut self, product_id: Option<i64>) -> Option<Advisory> {
        let Some(product_id) = product_id.or(self.default_product) else {
            return Some(Advisory::error("No products available to add"));
        };
        self.items.push(OrderItem {
            product_id,
            quantity: 1,
        });
        None
    }

    pub fn set_product(&mut self, index: usize, product_id: i64) {
        if let Some(item) = self.items.get_mut(index) {
            item.product_id = product_id;
        }
    }

    /// Removes a line unless it is the last one.
    pub fn remove_item(&mut self, index: usize) -> Option<Advisory> {
        if index >= self.items.len() {
            return None;
        }
        if self.items.len() > 1 {
            self.items.remove(index);
            None
        } else {
            Some(Advisory::error("The order must keep at least one product"))
        }
    }

    pub fn increase(&mut self, index: usize) -> Option<Advisory> {
        let max = self.max_for(self.items.get(index)?.product_id);
        let item = self.items.get_mut(index)?;
        if item.quantity < max {
            item.quantity += 1;
            None
        } else {
            Some(Advisory::error(format!(
                "Cannot add more than {} units (available stock)",
                max
            )))
        }
    }

    pub fn decrease(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            if item.quantity > 1 {
                item.quantity -= 1;
            }
        }
    }

    /// Sets a typed-in quantity, clamped into `[1, max]`.
    pub fn set_quantity(&mut self, index: usize, quantity: i64) -> Option<Advisory> {
        let max = self.max_for(self.items.get(index)?.product_id);
        let item = self.items.get_mut(index)?;
        if quantity > i64::from(max) {
            item.quantity = max.max(1);
            return Some(Advisory::info(format!(
                "Quantity adjusted to the available stock ({})",
                max
            )));
        }
        item.quantity = quantity.max(1) as u32;
        None
    }
}
