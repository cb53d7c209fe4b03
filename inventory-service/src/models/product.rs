use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::str::FromStr;

/// Header carrying the update selector on `PUT /inventory/{id}`.
pub const UPDATE_FIELD_HEADER: &str = "field";

/// An inventory item. `id` is the caller-supplied lookup key, distinct from
/// the store's own `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub quantity: u64,
    pub price: f64,
}

/// Which part of a product a `PUT` replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateField {
    Name,
    Quantity,
    Price,
    Description,
    /// Every settable field at once.
    All,
}

impl FromStr for UpdateField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(UpdateField::Name),
            "quantity" => Ok(UpdateField::Quantity),
            "price" => Ok(UpdateField::Price),
            "description" => Ok(UpdateField::Description),
            "all" => Ok(UpdateField::All),
            _ => Err(AppError::bad_request("Invalid field")),
        }
    }
}

impl UpdateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateField::Name => "name",
            UpdateField::Quantity => "quantity",
            UpdateField::Price => "price",
            UpdateField::Description => "description",
            UpdateField::All => "all",
        }
    }
}

/// Body of `PUT /inventory/{id}`. Only the fields the selected
/// [`UpdateField`] needs have to be present. Any `id` in the body is ignored;
/// the path id is authoritative.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<u64>,
    pub price: Option<f64>,
}

impl ProductPatch {
    pub fn into_update(self, field: UpdateField) -> Result<ProductUpdate, AppError> {
        let update = match field {
            UpdateField::Name => ProductUpdate::Name(required(self.name, "name")?),
            UpdateField::Quantity => ProductUpdate::Quantity(required(self.quantity, "quantity")?),
            UpdateField::Price => ProductUpdate::Price(required(self.price, "price")?),
            UpdateField::Description => {
                ProductUpdate::Description(required(self.description, "description")?)
            }
            UpdateField::All => ProductUpdate::Replace {
                name: required(self.name, "name")?,
                description: required(self.description, "description")?,
                quantity: required(self.quantity, "quantity")?,
                price: required(self.price, "price")?,
            },
        };
        Ok(update)
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::bad_request(format!("Missing '{}' in request body", field)))
}

/// A typed change to one product, resolved from [`UpdateField`] plus body.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductUpdate {
    Name(String),
    Quantity(u64),
    Price(f64),
    Description(String),
    Replace {
        name: String,
        description: String,
        quantity: u64,
        price: f64,
    },
}

impl ProductUpdate {
    pub fn field(&self) -> UpdateField {
        match self {
            ProductUpdate::Name(_) => UpdateField::Name,
            ProductUpdate::Quantity(_) => UpdateField::Quantity,
            ProductUpdate::Price(_) => UpdateField::Price,
            ProductUpdate::Description(_) => UpdateField::Description,
            ProductUpdate::Replace { .. } => UpdateField::All,
        }
    }

    pub fn apply(self, product: &mut Product) {
        match self {
            ProductUpdate::Name(name) => product.name = name,
            ProductUpdate::Quantity(quantity) => product.quantity = quantity,
            ProductUpdate::Price(price) => product.price = price,
            ProductUpdate::Description(description) => product.description = description,
            ProductUpdate::Replace {
                name,
                description,
                quantity,
                price,
            } => {
                product.name = name;
                product.description = description;
                product.quantity = quantity;
                product.price = price;
            }
        }
    }
}
