//! Session-scoped shopping cart.
//!
//! Every line keeps the product snapshot it was added with, and its quantity
//! stays within `[1, snapshot.stock]`. Totals are derived on each read. The
//! cart never fails: requests that would break the stock bound become a
//! no-op plus a [`CartNotice`] the caller can show. The backend re-checks
//! stock when the order is submitted.

use bigdecimal::BigDecimal;

use super::advisory::Advisory;
use super::order::OrderItem;
use super::product::Product;

/// Informational sales tax rate, in percent.
pub const TAX_RATE_PERCENT: u32 = 18;

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> BigDecimal {
        &self.product.price * BigDecimal::from(self.quantity)
    }
}

/// What a cart mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartNotice {
    Added { name: String },
    Updated,
    Removed { name: String },
    OutOfStock { name: String },
    StockLimitReached { stock: u32 },
    Adjusted { stock: u32 },
    NotInCart,
}

impl CartNotice {
    /// User-facing message, if the mutation warrants one.
    pub fn advisory(&self) -> Option<Advisory> {
        match self {
            CartNotice::Added { name } => {
                Some(Advisory::success(format!("{} added to cart", name)))
            }
            CartNotice::Updated => Some(Advisory::success("Quantity updated")),
            CartNotice::Removed { name } => {
                Some(Advisory::info(format!("{} removed from cart", name)))
            }
            CartNotice::OutOfStock { name } => {
                Some(Advisory::error(format!("{} is out of stock", name)))
            }
            CartNotice::StockLimitReached { stock } => Some(Advisory::error(format!(
                "Cannot order more than the available stock ({})",
                stock
            ))),
            CartNotice::Adjusted { stock } => Some(Advisory::info(format!(
                "Quantity adjusted to the available stock ({})",
                stock
            ))),
            CartNotice::NotInCart => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CartNotice::OutOfStock { .. } | CartNotice::StockLimitReached { .. }
        )
    }
}

/// Lines keyed by product id, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, product_id: i64) -> Option<usize> {
        self.lines.iter().position(|l| l.product.id == product_id)
    }

    pub fn add(&mut self, product: &Product) -> CartNotice {
        let Some(idx) = self.position(product.id) else {
            if !product.in_stock() {
                return CartNotice::OutOfStock {
                    name: product.name.clone(),
                };
            }
            self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
            });
            return CartNotice::Added {
                name: product.name.clone(),
            };
        };

        // A line at the limit keeps its old snapshot.
        let line = &mut self.lines[idx];
        if line.quantity >= product.stock {
            return CartNotice::StockLimitReached {
                stock: product.stock,
            };
        }
        line.product = product.clone();
        line.quantity += 1;
        CartNotice::Added {
            name: product.name.clone(),
        }
    }

    pub fn remove(&mut self, product_id: i64) -> CartNotice {
        match self.position(product_id) {
            Some(idx) => {
                let line = self.lines.remove(idx);
                CartNotice::Removed {
                    name: line.product.name,
                }
            }
            None => CartNotice::NotInCart,
        }
    }

    pub fn increase(&mut self, product_id: i64) -> CartNotice {
        let Some(idx) = self.position(product_id) else {
            return CartNotice::NotInCart;
        };
        let line = &mut self.lines[idx];
        if line.quantity < line.product.stock {
            line.quantity += 1;
            CartNotice::Updated
        } else {
            CartNotice::StockLimitReached {
                stock: line.product.stock,
            }
        }
    }

    pub fn decrease(&mut self, product_id: i64) -> CartNotice {
        let Some(idx) = self.position(product_id) else {
            return CartNotice::NotInCart;
        };
        if self.lines[idx].quantity > 1 {
            self.lines[idx].quantity -= 1;
            CartNotice::Updated
        } else {
            self.remove(product_id)
        }
    }

    /// Values at or below zero remove the line; values above the stock clamp to it.
    pub fn set_quantity(&mut self, product_id: i64, quantity: i64) -> CartNotice {
        let Some(idx) = self.position(product_id) else {
            return CartNotice::NotInCart;
        };
        if quantity <= 0 {
            return self.remove(product_id);
        }
        let line = &mut self.lines[idx];
        let stock = line.product.stock;
        if quantity > i64::from(stock) {
            line.quantity = stock;
            CartNotice::Adjusted { stock }
        } else {
            // quantity is in 1..=stock, which fits in u32
            line.quantity = quantity as u32;
            CartNotice::Updated
        }
    }

    /// Replaces line snapshots with freshly loaded products. Lines whose stock
    /// shrank are clamped; lines whose product ran out are dropped.
    pub fn reconcile(&mut self, products: &[Product]) -> Vec<CartNotice> {
        let mut notices = Vec::new();
        self.lines.retain_mut(|line| {
            let Some(fresh) = products.iter().find(|p| p.id == line.product.id) else {
                return true;
            };
            line.product = fresh.clone();
            if !fresh.in_stock() {
                notices.push(CartNotice::OutOfStock {
                    name: fresh.name.clone(),
                });
                return false;
            }
            if line.quantity > fresh.stock {
                line.quantity = fresh.stock;
                notices.push(CartNotice::Adjusted { stock: fresh.stock });
            }
            true
        });
        notices
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> impl Iterator<Item = &CartLine> + Clone + '_ {
        self.lines.iter()
    }

    pub fn line(&self, product_id: i64) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product.id == product_id)
    }

    pub fn quantity_of(&self, product_id: i64) -> u32 {
        self.line(product_id).map_or(0, |l| l.quantity)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn subtotal(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::from(0), |acc, l| acc + l.subtotal())
    }

    pub fn tax(&self) -> BigDecimal {
        self.subtotal() * BigDecimal::from(TAX_RATE_PERCENT) / BigDecimal::from(100)
    }

    /// Prices are tax-inclusive, so the total equals the subtotal.
    pub fn total(&self) -> BigDecimal {
        self.subtotal()
    }

    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|l| OrderItem {
                product_id: l.product.id,
                quantity: l.quantity,
            })
            .collect()
    }
}
