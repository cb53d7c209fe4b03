pub mod health;
pub mod inventory;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use inventory::{
    create_product, delete_product, get_product, index, list_products, update_product,
};
