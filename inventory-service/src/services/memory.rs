use crate::models::{Product, ProductUpdate};
use crate::services::ProductRepository;
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::{Mutex, MutexGuard};

/// Process-local product store with the same semantics as the MongoDB
/// adapter: insertion order is kept, duplicate ids are allowed and the first
/// match wins.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: Mutex<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Product>>, AppError> {
        self.products.lock().map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Product store mutex poisoned: {}", e))
        })
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.lock()?.clone())
    }

    async fn get_product(&self, id: u64) -> Result<Option<Product>, AppError> {
        Ok(self.lock()?.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, product: &Product) -> Result<(), AppError> {
        self.lock()?.push(product.clone());
        Ok(())
    }

    async fn update_product(&self, id: u64, update: ProductUpdate) -> Result<(), AppError> {
        let mut products = self.lock()?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::not_found("Product not found"))?;
        update.apply(product);
        Ok(())
    }

    async fn delete_product(&self, id: u64) -> Result<(), AppError> {
        let mut products = self.lock()?;
        let index = products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::not_found("Product not found"))?;
        products.remove(index);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }
}
