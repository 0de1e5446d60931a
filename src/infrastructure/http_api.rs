use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::domain::errors::DomainError;
use crate::domain::lifecycle::OrderAction;
use crate::domain::order::{Order, OrderItem};
use crate::domain::pagination::Page;
use crate::domain::ports::{AuthApi, CatalogApi, OrderApi};
use crate::domain::product::{Category, CategoryDraft, Product, ProductDraft};
use crate::domain::query::QueryParams;
use crate::domain::session::{Credentials, Role, Session};

use super::models::{
    AuthResponseDto, CategoryDto, CategoryRequestDto, CreateOrderRequestDto, CredentialsDto,
    ErrorBodyDto, OrderDto, OrderItemDto, PageDto, ProductDto, ProductRequestDto,
    ReplaceItemsRequestDto,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DomainError::Internal(format!("unexpected response body: {}", e))
        } else {
            DomainError::Unavailable(e.to_string())
        }
    }
}

// ── Backend ──────────────────────────────────────────────────────────────────

/// REST client for the catalog, order and auth endpoints.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    api_url: String,
    catalog_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, DomainError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(Self::with_client(http, &config.api_url, &config.catalog_url))
    }

    pub fn with_client(http: Client, api_url: &str, catalog_url: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            catalog_url: catalog_url.trim_end_matches('/').to_string(),
        }
    }

    fn products_url(&self) -> String {
        format!("{}/products", self.catalog_url)
    }

    fn categories_url(&self) -> String {
        format!("{}/categories", self.catalog_url)
    }

    fn orders_url(&self) -> String {
        format!("{}/orders", self.api_url)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/{}", self.api_url, endpoint)
    }

    /// Auth endpoints are built without this, so they never carry a token.
    fn authorized(req: RequestBuilder, session: Option<&Session>) -> RequestBuilder {
        match session {
            Some(s) => req.bearer_auth(&s.token),
            None => req,
        }
    }

    async fn check(resp: Response) -> Result<Response, DomainError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(DomainError::Unauthorized),
            StatusCode::NOT_FOUND => Err(DomainError::NotFound),
            _ => {
                let body = resp.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorBodyDto>(&body)
                    .ok()
                    .and_then(|b| b.message.or(b.error))
                    .unwrap_or(body);
                log::warn!("Backend rejected request ({}): {}", status, message);
                Err(DomainError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, DomainError> {
        let resp = Self::check(req.send().await?).await?;
        Ok(resp.json::<T>().await?)
    }

    async fn execute(&self, req: RequestBuilder) -> Result<(), DomainError> {
        Self::check(req.send().await?).await?;
        Ok(())
    }

    async fn authenticate(
        &self,
        endpoint: &str,
        credentials: &Credentials,
        rol: Option<Role>,
    ) -> Result<Session, DomainError> {
        log::debug!("POST {}", self.auth_url(endpoint));
        let body = CredentialsDto {
            email: credentials.email.trim().to_string(),
            password: credentials.password.clone(),
            rol: rol.map(|r| r.as_str().to_string()),
        };
        let dto: AuthResponseDto = self
            .fetch(self.http.post(self.auth_url(endpoint)).json(&body))
            .await?;
        Session::try_from(dto)
    }
}

#[async_trait]
impl CatalogApi for HttpBackend {
    async fn list_products(
        &self,
        session: Option<&Session>,
        params: &QueryParams,
    ) -> Result<Page<Product>, DomainError> {
        log::debug!("GET {} {:?}", self.products_url(), params.as_pairs());
        let req = self.http.get(self.products_url()).query(params.as_pairs());
        let dto: PageDto<ProductDto> = self.fetch(Self::authorized(req, session)).await?;
        dto.into_page(|p| Ok(Product::from(p)))
    }

    async fn get_product(
        &self,
        session: Option<&Session>,
        id: i64,
    ) -> Result<Product, DomainError> {
        let url = format!("{}/{}", self.products_url(), id);
        log::debug!("GET {}", url);
        let dto: ProductDto = self
            .fetch(Self::authorized(self.http.get(url), session))
            .await?;
        Ok(dto.into())
    }

    async fn create_product(
        &self,
        session: &Session,
        draft: &ProductDraft,
    ) -> Result<Product, DomainError> {
        log::debug!("POST {}", self.products_url());
        let req = self
            .http
            .post(self.products_url())
            .json(&ProductRequestDto::from(draft));
        let dto: ProductDto = self.fetch(Self::authorized(req, Some(session))).await?;
        Ok(dto.into())
    }

    async fn update_product(
        &self,
        session: &Session,
        id: i64,
        draft: &ProductDraft,
    ) -> Result<Product, DomainError> {
        let url = format!("{}/{}", self.products_url(), id);
        log::debug!("PUT {}", url);
        let req = self.http.put(url).json(&ProductRequestDto::from(draft));
        let dto: ProductDto = self.fetch(Self::authorized(req, Some(session))).await?;
        Ok(dto.into())
    }

    async fn delete_product(&self, session: &Session, id: i64) -> Result<(), DomainError> {
        let url = format!("{}/{}", self.products_url(), id);
        log::debug!("DELETE {}", url);
        self.execute(Self::authorized(self.http.delete(url), Some(session)))
            .await
    }

    async fn list_categories(
        &self,
        session: Option<&Session>,
        params: &QueryParams,
    ) -> Result<Page<Category>, DomainError> {
        log::debug!("GET {} {:?}", self.categories_url(), params.as_pairs());
        let req = self.http.get(self.categories_url()).query(params.as_pairs());
        let dto: PageDto<CategoryDto> = self.fetch(Self::authorized(req, session)).await?;
        dto.into_page(|c| Ok(Category::from(c)))
    }

    async fn get_category(&self, session: &Session, id: i64) -> Result<Category, DomainError> {
        let url = format!("{}/{}", self.categories_url(), id);
        log::debug!("GET {}", url);
        let dto: CategoryDto = self
            .fetch(Self::authorized(self.http.get(url), Some(session)))
            .await?;
        Ok(dto.into())
    }

    async fn create_category(
        &self,
        session: &Session,
        draft: &CategoryDraft,
    ) -> Result<Category, DomainError> {
        log::debug!("POST {}", self.categories_url());
        let req = self
            .http
            .post(self.categories_url())
            .json(&CategoryRequestDto::from(draft));
        let dto: CategoryDto = self.fetch(Self::authorized(req, Some(session))).await?;
        Ok(dto.into())
    }

    async fn update_category(
        &self,
        session: &Session,
        id: i64,
        draft: &CategoryDraft,
    ) -> Result<Category, DomainError> {
        let url = format!("{}/{}", self.categories_url(), id);
        log::debug!("PUT {}", url);
        let req = self.http.put(url).json(&CategoryRequestDto::from(draft));
        let dto: CategoryDto = self.fetch(Self::authorized(req, Some(session))).await?;
        Ok(dto.into())
    }

    async fn delete_category(&self, session: &Session, id: i64) -> Result<(), DomainError> {
        let url = format!("{}/{}", self.categories_url(), id);
        log::debug!("DELETE {}", url);
        self.execute(Self::authorized(self.http.delete(url), Some(session)))
            .await
    }
}

#[async_trait]
impl OrderApi for HttpBackend {
    async fn create_order(
        &self,
        session: &Session,
        items: &[OrderItem],
    ) -> Result<Order, DomainError> {
        log::debug!("POST {} ({} items)", self.orders_url(), items.len());
        let body = CreateOrderRequestDto {
            products: items.iter().map(OrderItemDto::from).collect(),
        };
        let req = self.http.post(self.orders_url()).json(&body);
        let dto: OrderDto = self.fetch(Self::authorized(req, Some(session))).await?;
        Order::try_from(dto)
    }

    async fn replace_items(
        &self,
        session: &Session,
        order_id: i64,
        items: &[OrderItem],
    ) -> Result<Order, DomainError> {
        let url = format!("{}/{}", self.orders_url(), order_id);
        log::debug!("PUT {} ({} items)", url, items.len());
        let body = ReplaceItemsRequestDto {
            items: items.iter().map(OrderItemDto::from).collect(),
        };
        let req = self.http.put(url).json(&body);
        let dto: OrderDto = self.fetch(Self::authorized(req, Some(session))).await?;
        Order::try_from(dto)
    }

    async fn transition(
        &self,
        session: &Session,
        order_id: i64,
        action: OrderAction,
    ) -> Result<(), DomainError> {
        if !action.is_transition() {
            return Err(DomainError::InvalidInput(format!(
                "'{}' is not a status transition",
                action
            )));
        }
        let url = format!("{}/{}/{}", self.orders_url(), order_id, action.as_str());
        log::debug!("PUT {}", url);
        self.execute(Self::authorized(self.http.put(url), Some(session)))
            .await
    }

    async fn get_order(&self, session: &Session, order_id: i64) -> Result<Order, DomainError> {
        let url = format!("{}/{}", self.orders_url(), order_id);
        log::debug!("GET {}", url);
        let dto: OrderDto = self
            .fetch(Self::authorized(self.http.get(url), Some(session)))
            .await?;
        Order::try_from(dto)
    }

    async fn list_all_orders(
        &self,
        session: &Session,
        params: &QueryParams,
    ) -> Result<Page<Order>, DomainError> {
        let url = format!("{}/admin", self.orders_url());
        log::debug!("GET {} {:?}", url, params.as_pairs());
        let req = self.http.get(url).query(params.as_pairs());
        let dto: PageDto<OrderDto> = self.fetch(Self::authorized(req, Some(session))).await?;
        dto.into_page(Order::try_from)
    }

    async fn list_my_orders(
        &self,
        session: &Session,
        params: &QueryParams,
    ) -> Result<Page<Order>, DomainError> {
        let url = format!("{}/customer", self.orders_url());
        log::debug!("GET {} {:?}", url, params.as_pairs());
        let req = self.http.get(url).query(params.as_pairs());
        let dto: PageDto<OrderDto> = self.fetch(Self::authorized(req, Some(session))).await?;
        dto.into_page(Order::try_from)
    }
}

#[async_trait]
impl AuthApi for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Session, DomainError> {
        self.authenticate("login", credentials, None).await
    }

    async fn register_customer(&self, credentials: &Credentials) -> Result<Session, DomainError> {
        self.authenticate("register-customer", credentials, None)
            .await
    }

    async fn register_admin(&self, credentials: &Credentials) -> Result<Session, DomainError> {
        self.authenticate("register", credentials, Some(Role::Admin))
            .await
    }
}
