use bigdecimal::BigDecimal;

use super::errors::DomainError;

/// Catalog snapshot of a product. Copies go stale until the list is reloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock: u32,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub active: bool,
    pub image_url: Option<String>,
}

impl Product {
    pub fn new(id: i64, name: impl Into<String>, price: BigDecimal, stock: u32) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            price,
            stock,
            category_id: None,
            category_name: None,
            active: true,
            image_url: None,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Admin form for creating or updating a product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub discount_price: BigDecimal,
    pub stock: i64,
    pub brand_name: String,
    pub category_id: i64,
}

impl Default for ProductDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: BigDecimal::from(0),
            discount_price: BigDecimal::from(0),
            stock: 0,
            brand_name: String::new(),
            category_id: 0,
        }
    }
}

impl ProductDraft {
    /// Form checks run before any request is issued.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("name is required".to_string()));
        }
        if self.price < BigDecimal::from(0) {
            return Err(DomainError::InvalidInput(
                "price must be greater than or equal to 0".to_string(),
            ));
        }
        if self.stock < 0 {
            return Err(DomainError::InvalidInput(
                "stock must be greater than or equal to 0".to_string(),
            ));
        }
        if self.category_id <= 0 {
            return Err(DomainError::InvalidInput(
                "a category must be selected".to_string(),
            ));
        }
        Ok(())
    }

    /// Prefills the form from a catalog snapshot, resolving the category by
    /// name when the backend only reports `categoryName`.
    pub fn from_product(product: &Product, categories: &[Category]) -> Self {
        let category_id = product
            .category_id
            .or_else(|| {
                let name = product.category_name.as_deref()?;
                categories.iter().find(|c| c.name == name).map(|c| c.id)
            })
            .unwrap_or(0);

        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.clone(),
            discount_price: BigDecimal::from(0),
            stock: i64::from(product.stock),
            brand_name: String::new(),
            category_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
}

impl CategoryDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("name is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "description is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> ProductDraft {
        ProductDraft {
            name: "Keyboard".to_string(),
            price: BigDecimal::from(45),
            stock: 3,
            category_id: 2,
            ..ProductDraft::default()
        }
    }

    #[test]
    fn valid_product_draft_passes() {
        assert!(valid_draft().validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let draft = ProductDraft {
            name: "   ".to_string(),
            ..valid_draft()
        };
        assert!(matches!(draft.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn negative_price_is_rejected() {
        let draft = ProductDraft {
            price: BigDecimal::from(-1),
            ..valid_draft()
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn negative_stock_is_rejected() {
        let draft = ProductDraft {
            stock: -4,
            ..valid_draft()
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn missing_category_is_rejected() {
        let draft = ProductDraft {
            category_id: 0,
            ..valid_draft()
        };
        let err = draft.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: a category must be selected");
    }

    #[test]
    fn zero_price_and_stock_are_allowed() {
        let draft = ProductDraft {
            price: BigDecimal::from(0),
            stock: 0,
            ..valid_draft()
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn draft_resolves_category_by_name() {
        let mut product = Product::new(7, "Mouse", BigDecimal::from(20), 4);
        product.category_name = Some("Peripherals".to_string());
        let categories = vec![
            Category {
                id: 1,
                name: "Audio".to_string(),
                description: "Speakers".to_string(),
            },
            Category {
                id: 9,
                name: "Peripherals".to_string(),
                description: "Input devices".to_string(),
            },
        ];

        let draft = ProductDraft::from_product(&product, &categories);
        assert_eq!(draft.category_id, 9);
        assert_eq!(draft.stock, 4);
    }

    #[test]
    fn category_draft_requires_both_fields() {
        let mut draft = CategoryDraft {
            name: "Audio".to_string(),
            description: String::new(),
        };
        assert!(draft.validate().is_err());
        draft.description = "Speakers and headphones".to_string();
        assert!(draft.validate().is_ok());
    }
}
