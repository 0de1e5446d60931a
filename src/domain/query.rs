use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use super::order::OrderStatus;

/// Ordered query-string parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paged(page: u32, size: u32) -> Self {
        let mut params = Self::new();
        params.push("page", page);
        params.push("size", size);
        params
    }

    pub fn push(&mut self, key: &str, value: impl ToString) {
        self.0.push((key.to_string(), value.to_string()));
    }

    pub fn push_opt<T: ToString>(&mut self, key: &str, value: Option<T>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilters {
    pub name: Option<String>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub category_id: Option<i64>,
    pub status: Option<bool>,
}

impl ProductFilters {
    fn trimmed_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Admin catalog query: every set filter is sent as-is.
    pub fn to_params(&self, page: u32, size: u32) -> QueryParams {
        let mut params = QueryParams::paged(page, size);
        params.push_opt("name", self.trimmed_name());
        params.push_opt("minPrice", self.min_price.as_ref());
        params.push_opt("maxPrice", self.max_price.as_ref());
        params.push_opt("categoryId", self.category_id);
        params.push_opt("status", self.status);
        params
    }

    /// Storefront query: only active products, and only positive price bounds.
    pub fn to_storefront_params(&self, page: u32, size: u32) -> QueryParams {
        let zero = BigDecimal::from(0);
        let mut params = QueryParams::paged(page, size);
        params.push("status", true);
        params.push_opt("name", self.trimmed_name());
        params.push_opt("minPrice", self.min_price.as_ref().filter(|p| **p > zero));
        params.push_opt("maxPrice", self.max_price.as_ref().filter(|p| **p > zero));
        params.push_opt("categoryId", self.category_id.filter(|id| *id > 0));
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilters {
    pub user_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl OrderFilters {
    /// Dates cover whole days in UTC. A lone start date also bounds the end.
    pub fn to_params(&self, page: u32, size: u32) -> QueryParams {
        let mut params = QueryParams::paged(page, size);
        params.push_opt("userId", self.user_id);
        params.push_opt("status", self.status.map(OrderStatus::backend_name));

        let end_date = self.end_date.or(self.start_date);
        params.push_opt(
            "startDate",
            self.start_date
                .map(|d| format!("{}T00:00:00.000Z", d.format("%Y-%m-%d"))),
        );
        params.push_opt(
            "endDate",
            end_date.map(|d| format!("{}T23:59:59.999Z", d.format("%Y-%m-%d"))),
        );
        params
    }
}
