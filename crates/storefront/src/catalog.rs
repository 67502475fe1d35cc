//! Product catalog client.
//!
//! Products are public: no token is needed. Listings and single products are
//! cached with `moka` for the configured TTL (5 minutes by default); a TTL of
//! zero turns the cache off.

use std::sync::Arc;
use std::time::Duration;

use boutique_core::ProductId;
use moka::future::Cache;
use tracing::{debug, instrument};

use crate::api::{ApiClient, Product};
use crate::error::Result;

/// Upper bound on cached entries.
const CACHE_CAPACITY: u64 = 1000;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Product(ProductId),
}

#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
}

/// Client for the catalog endpoints.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    api: ApiClient,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl CatalogClient {
    /// Create a catalog client caching for `ttl`.
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });

        Self {
            inner: Arc::new(CatalogClientInner { api, cache }),
        }
    }

    /// All products the backend lists.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<Product>>> {
        if let Some(CacheValue::Products(products)) = self.cached(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Arc<Vec<Product>> = Arc::new(self.inner.api.get("/products").await?);
        self.store(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` (status 404) for an unknown product, or if the
    /// request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &ProductId) -> Result<Product> {
        let key = CacheKey::Product(product_id.clone());
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .inner
            .api
            .get(&format!("/products/{product_id}"))
            .await?;
        self.store(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Drop everything cached, e.g. after an order changed stock levels.
    pub async fn invalidate_all(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
        }
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }
}
