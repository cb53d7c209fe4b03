use crate::models::{Product, ProductUpdate};
use crate::services::MongoDb;
use async_trait::async_trait;
use futures::TryStreamExt;
use metrics::counter;
use mongodb::{
    bson::{doc, Bson, Document},
    options::IndexOptions,
    Collection, IndexModel,
};
use service_core::error::AppError;
use std::future::Future;
use std::time::Duration;

/// Product persistence. Every operation either succeeds or reports a typed
/// [`AppError`]; "nothing matched" on update/delete is `AppError::NotFound`.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products. An empty vector is a valid result, not an error.
    async fn list_products(&self) -> Result<Vec<Product>, AppError>;

    /// The first product whose `id` matches, if any.
    async fn get_product(&self, id: u64) -> Result<Option<Product>, AppError>;

    /// Insert without checking for an existing `id`.
    async fn create_product(&self, product: &Product) -> Result<(), AppError>;

    /// Apply `update` to the product matching `id`.
    async fn update_product(&self, id: u64, update: ProductUpdate) -> Result<(), AppError>;

    async fn delete_product(&self, id: u64) -> Result<(), AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoProductRepository {
    db: MongoDb,
    collection: Collection<Product>,
    operation_timeout: Duration,
}

impl MongoProductRepository {
    pub fn new(db: MongoDb, collection: &str, operation_timeout: Duration) -> Self {
        Self {
            collection: db.products(collection),
            db,
            operation_timeout,
        }
    }

    /// Lookup index on the product `id`. Not unique: duplicate ids are
    /// tolerated by this service.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .name("product_id_lookup".to_string())
                    .build(),
            )
            .build();

        self.bounded("create_index", self.collection.create_index(id_index, None))
            .await
            .map_err(|e| {
                tracing::error!("Failed to create id index on products collection: {}", e);
                e
            })?;
        tracing::info!("Created index on products.id");
        Ok(())
    }

    /// Run one driver call under the operation timeout and record its outcome.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = mongodb::error::Result<T>>,
    {
        let (outcome, result) = match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(Ok(value)) => ("ok", Ok(value)),
            Ok(Err(e)) => {
                tracing::error!(operation, error = %e, "MongoDB operation failed");
                ("error", Err(AppError::from(e)))
            }
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_secs = self.operation_timeout.as_secs(),
                    "MongoDB operation timed out"
                );
                (
                    "timeout",
                    Err(AppError::Unavailable(anyhow::anyhow!(
                        "{} timed out after {:?}",
                        operation,
                        self.operation_timeout
                    ))),
                )
            }
        };

        counter!(
            "inventory_store_operations_total",
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);

        result
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.bounded("list_products", async {
            let cursor = self.collection.find(None, None).await?;
            cursor.try_collect::<Vec<Product>>().await
        })
        .await
    }

    async fn get_product(&self, id: u64) -> Result<Option<Product>, AppError> {
        let filter = id_filter(id)?;
        self.bounded("get_product", self.collection.find_one(filter, None))
            .await
    }

    async fn create_product(&self, product: &Product) -> Result<(), AppError> {
        store_int(product.id, "id")?;
        store_int(product.quantity, "quantity")?;

        let result = self
            .bounded("create_product", self.collection.insert_one(product, None))
            .await?;

        if result.inserted_id == Bson::Null {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "Insert did not yield a document identifier"
            )));
        }

        tracing::info!(product_id = product.id, "Product created");
        Ok(())
    }

    async fn update_product(&self, id: u64, update: ProductUpdate) -> Result<(), AppError> {
        let filter = id_filter(id)?;
        let field = update.field();
        let changes = set_document(&update)?;

        let result = self
            .bounded(
                "update_product",
                self.collection.update_one(filter, changes, None),
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::not_found("Product not found"));
        }

        tracing::info!(
            product_id = id,
            field = field.as_str(),
            modified = result.modified_count,
            "Product updated"
        );
        Ok(())
    }

    async fn delete_product(&self, id: u64) -> Result<(), AppError> {
        let filter = id_filter(id)?;
        let result = self
            .bounded("delete_product", self.collection.delete_one(filter, None))
            .await?;

        if result.deleted_count == 0 {
            return Err(AppError::not_found("Product not found"));
        }

        tracing::info!(product_id = id, "Product deleted");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        tokio::time::timeout(self.operation_timeout, self.db.health_check())
            .await
            .map_err(|_| {
                AppError::Unavailable(anyhow::anyhow!(
                    "health_check timed out after {:?}",
                    self.operation_timeout
                ))
            })?
    }
}

/// MongoDB stores integers as signed 64-bit values.
fn store_int(value: u64, field: &str) -> Result<i64, AppError> {
    i64::try_from(value)
        .map_err(|_| AppError::bad_request(format!("'{}' is out of range: {}", field, value)))
}

fn id_filter(id: u64) -> Result<Document, AppError> {
    Ok(doc! { "id": store_int(id, "id")? })
}

fn set_document(update: &ProductUpdate) -> Result<Document, AppError> {
    let fields = match update {
        ProductUpdate::Name(name) => doc! { "name": name.as_str() },
        ProductUpdate::Quantity(quantity) => doc! { "quantity": store_int(*quantity, "quantity")? },
        ProductUpdate::Price(price) => doc! { "price": *price },
        ProductUpdate::Description(description) => doc! { "description": description.as_str() },
        ProductUpdate::Replace {
            name,
            description,
            quantity,
            price,
        } => doc! {
            "name": name.as_str(),
            "description": description.as_str(),
            "quantity": store_int(*quantity, "quantity")?,
            "price": *price,
        },
    };
    Ok(doc! { "$set": fields })
}
