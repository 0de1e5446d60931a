use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderItem, OrderLine, OrderStatus};
use crate::domain::pagination::Page;
use crate::domain::product::{Category, CategoryDraft, Product, ProductDraft};
use crate::domain::session::{Role, Session};

// ── Pages ────────────────────────────────────────────────────────────────────

/// Spring-style page. Missing fields default so partial responses still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDto<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> PageDto<T> {
    pub fn into_page<U>(
        self,
        convert: impl FnMut(T) -> Result<U, DomainError>,
    ) -> Result<Page<U>, DomainError> {
        Ok(Page {
            items: self
                .content
                .into_iter()
                .map(convert)
                .collect::<Result<_, _>>()?,
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        })
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: BigDecimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_true")]
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl From<ProductDto> for Product {
    fn from(dto: ProductDto) -> Self {
        Product {
            id: dto.id,
            name: dto.name,
            description: dto.description,
            price: dto.price,
            stock: dto.stock,
            category_id: dto.category_id,
            category_name: dto.category_name,
            active: dto.status,
            image_url: dto.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequestDto {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub price_discount: BigDecimal,
    pub stock: i64,
    pub brand_name: String,
    pub category_id: i64,
}

impl From<&ProductDraft> for ProductRequestDto {
    fn from(d: &ProductDraft) -> Self {
        ProductRequestDto {
            name: d.name.trim().to_string(),
            description: d.description.clone(),
            price: d.price.clone(),
            price_discount: d.discount_price.clone(),
            stock: d.stock,
            brand_name: d.brand_name.clone(),
            category_id: d.category_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl From<CategoryDto> for Category {
    fn from(dto: CategoryDto) -> Self {
        Category {
            id: dto.id,
            name: dto.name,
            description: dto.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRequestDto {
    pub name: String,
    pub description: String,
}

impl From<&CategoryDraft> for CategoryRequestDto {
    fn from(d: &CategoryDraft) -> Self {
        CategoryRequestDto {
            name: d.name.trim().to_string(),
            description: d.description.trim().to_string(),
        }
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

/// Order as returned by the backend. Deployments disagree on some field
/// names, so the known variants are accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default = "zero", alias = "totalAmount")]
    pub total: BigDecimal,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub status: String,
    #[serde(default, alias = "orderProducts")]
    pub order_details: Vec<OrderDetailDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    #[serde(default = "zero", alias = "unitPrice")]
    pub price: BigDecimal,
}

fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

/// Accepts RFC 3339 timestamps and the zone-less form some backends emit.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl TryFrom<OrderDto> for Order {
    type Error = DomainError;

    fn try_from(dto: OrderDto) -> Result<Self, Self::Error> {
        let status: OrderStatus = dto
            .status
            .parse()
            .map_err(|e: DomainError| DomainError::Internal(e.to_string()))?;
        let created_at = dto.date.as_deref().and_then(parse_timestamp);

        Ok(Order {
            id: dto.id,
            user_id: dto.user_id,
            user_email: dto.user_email,
            status,
            total: dto.total,
            created_at,
            lines: dto
                .order_details
                .into_iter()
                .map(|d| OrderLine {
                    product_id: d.product_id,
                    product_name: d.product_name,
                    quantity: d.quantity,
                    unit_price: d.price,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub product_id: i64,
    pub quantity: u32,
}

impl From<&OrderItem> for OrderItemDto {
    fn from(i: &OrderItem) -> Self {
        OrderItemDto {
            product_id: i.product_id,
            quantity: i.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequestDto {
    pub products: Vec<OrderItemDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceItemsRequestDto {
    pub items: Vec<OrderItemDto>,
}

// ── Auth ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsDto {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponseDto {
    pub token: String,
    pub email: String,
    pub rol: String,
}

impl TryFrom<AuthResponseDto> for Session {
    type Error = DomainError;

    fn try_from(dto: AuthResponseDto) -> Result<Self, Self::Error> {
        let role: Role = dto.rol.parse()?;
        Ok(Session::new(dto.token, dto.email, role))
    }
}

/// Body of a backend error response; only `message` is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBodyDto {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
