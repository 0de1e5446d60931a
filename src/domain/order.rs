use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::DomainError;

/// Status of an order as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Name used by the deployed backend on the wire.
    pub fn backend_name(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDIENTE",
            OrderStatus::Confirmed => "CONFIRMADO",
            OrderStatus::Shipped => "ENVIADO",
            OrderStatus::Delivered => "ENTREGADO",
            OrderStatus::Cancelled => "CANCELADO",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "PENDIENTE" => Ok(OrderStatus::Pending),
            "CONFIRMED" | "CONFIRMADO" => Ok(OrderStatus::Confirmed),
            "SHIPPED" | "ENVIADO" => Ok(OrderStatus::Shipped),
            "DELIVERED" | "ENTREGADO" => Ok(OrderStatus::Delivered),
            "CANCELLED" | "CANCELED" | "CANCELADO" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

/// A requested line: what the backend receives on create and edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderItem {
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: BigDecimal,
}

impl OrderLine {
    pub fn subtotal(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub status: OrderStatus,
    pub total: BigDecimal,
    pub created_at: Option<DateTime<Utc>>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Current lines as a replace payload. Lines without a product id are skipped.
    pub fn items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .filter_map(|l| {
                l.product_id.map(|product_id| OrderItem {
                    product_id,
                    quantity: l.quantity,
                })
            })
            .collect()
    }
}
