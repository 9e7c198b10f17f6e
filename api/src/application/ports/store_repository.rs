use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::store::cart::Cart;
use crate::domain::store::order::{Order, OrderStatus};
use crate::domain::store::product::{DepartmentCount, Product};

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub department: String,
    pub price: i64,
    pub stock: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub department: Option<String>,
    pub query: Option<String>,
}

#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    Placed(Order),
    OutOfStock { product_id: Uuid, name: String },
}

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn create_product(&self, product: &NewProduct) -> anyhow::Result<Product>;
    async fn get_product(&self, id: Uuid) -> anyhow::Result<Option<Product>>;
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Product>, i64)>;
    async fn update_product(&self, id: Uuid, patch: &ProductPatch)
    -> anyhow::Result<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn departments(&self) -> anyhow::Result<Vec<DepartmentCount>>;

    async fn upsert_rating(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        stars: i32,
        review: Option<&str>,
    ) -> anyhow::Result<()>;
    async fn rating_stars(&self, product_id: Uuid) -> anyhow::Result<Vec<i32>>;
    async fn set_rating_summary(
        &self,
        product_id: Uuid,
        average: f64,
        count: i64,
    ) -> anyhow::Result<Option<Product>>;

    async fn load_cart(&self, user_id: Uuid) -> anyhow::Result<Cart>;
    async fn save_cart(&self, user_id: Uuid, cart: &Cart) -> anyhow::Result<()>;

    /// Decrements stock for every line, writes the order and empties the cart
    /// in one transaction. Nothing is written when a line is short on stock.
    async fn place_order(
        &self,
        user_id: Uuid,
        order_number: &str,
        cart: &Cart,
    ) -> anyhow::Result<CheckoutOutcome>;
    async fn list_orders(
        &self,
        user_id: Option<Uuid>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Order>, i64)>;
    async fn get_order(&self, id: Uuid) -> anyhow::Result<Option<Order>>;
    /// Moves the order from `from` to `to`; returns `None` if it was no longer
    /// in `from`. With `restock`, the order's quantities go back on the shelf.
    async fn set_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        restock: bool,
    ) -> anyhow::Result<Option<Order>>;
}
