use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::store_repository::{
    CheckoutOutcome, NewProduct, ProductFilter, ProductPatch, StoreRepository,
};
use crate::domain::store::cart::Cart;
use crate::domain::store::order::{Order, OrderLine, OrderStatus};
use crate::domain::store::product::{DepartmentCount, Product};

#[derive(Default)]
pub struct MemStore {
    products: Mutex<Vec<Product>>,
    ratings: Mutex<Vec<(Uuid, Uuid, i32)>>,
    carts: Mutex<Vec<(Uuid, Cart)>>,
    orders: Mutex<Vec<Order>>,
}

#[async_trait]
impl StoreRepository for MemStore {
    async fn create_product(&self, p: &NewProduct) -> anyhow::Result<Product> {
        let product = Product {
            id: Uuid::new_v4(),
            sku: p.sku.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            department: p.department.clone(),
            price: p.price,
            stock: p.stock,
            rating_avg: 0.0,
            rating_count: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.products.lock().unwrap().push(product.clone());
        Ok(product)
    }
    async fn get_product(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        Ok(self.products.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }
    async fn list_products(&self, _: &ProductFilter, _: PageRequest) -> anyhow::Result<(Vec<Product>, i64)> {
        unimplemented!()
    }
    async fn update_product(&self, _: Uuid, _: &ProductPatch) -> anyhow::Result<Option<Product>> {
        unimplemented!()
    }
    async fn delete_product(&self, _: Uuid) -> anyhow::Result<bool> {
        unimplemented!()
    }
    async fn departments(&self) -> anyhow::Result<Vec<DepartmentCount>> {
        unimplemented!()
    }
    async fn upsert_rating(&self, product: Uuid, user: Uuid, stars: i32, _: Option<&str>) -> anyhow::Result<()> {
        let mut ratings = self.ratings.lock().unwrap();
        ratings.retain(|(p, u, _)| !(*p == product && *u == user));
        ratings.push((product, user, stars));
        Ok(())
    }
    async fn rating_stars(&self, product: Uuid) -> anyhow::Result<Vec<i32>> {
        Ok(self
            .ratings
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _, _)| *p == product)
            .map(|(_, _, s)| *s)
            .collect())
    }
    async fn set_rating_summary(&self, id: Uuid, avg: f64, count: i64) -> anyhow::Result<Option<Product>> {
        let mut products = self.products.lock().unwrap();
        let p = products.iter_mut().find(|p| p.id == id);
        Ok(p.map(|p| {
            p.rating_avg = avg;
            p.rating_count = count;
            p.clone()
        }))
    }
    async fn load_cart(&self, user: Uuid) -> anyhow::Result<Cart> {
        Ok(self
            .carts
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| *u == user)
            .map(|(_, c)| c.clone())
            .unwrap_or_default())
    }
    async fn save_cart(&self, user: Uuid, cart: &Cart) -> anyhow::Result<()> {
        let mut carts = self.carts.lock().unwrap();
        carts.retain(|(u, _)| *u != user);
        carts.push((user, cart.clone()));
        Ok(())
    }
    async fn place_order(&self, user: Uuid, number: &str, cart: &Cart) -> anyhow::Result<CheckoutOutcome> {
        {
            let mut products = self.products.lock().unwrap();
            for line in &cart.lines {
                let p = products.iter().find(|p| p.id == line.product_id).unwrap();
                if p.stock < line.quantity {
                    return Ok(CheckoutOutcome::OutOfStock {
                        product_id: p.id,
                        name: p.name.clone(),
                    });
                }
            }
            for line in &cart.lines {
                let p = products.iter_mut().find(|p| p.id == line.product_id).unwrap();
                p.stock -= line.quantity;
            }
        }
        let order = Order {
            id: Uuid::new_v4(),
            order_number: number.to_string(),
            user_id: user,
            status: OrderStatus::Pending,
            total: cart.total().unwrap(),
            lines: cart
                .lines
                .iter()
                .map(|l| OrderLine {
                    product_id: l.product_id,
                    name: l.name.clone(),
                    unit_price: l.unit_price,
                    quantity: l.quantity,
                })
                .collect(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.orders.lock().unwrap().push(order.clone());
        self.carts.lock().unwrap().retain(|(u, _)| *u != user);
        Ok(CheckoutOutcome::Placed(order))
    }
    async fn list_orders(&self, user: Option<Uuid>, _: PageRequest) -> anyhow::Result<(Vec<Order>, i64)> {
        let items: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| user.map(|u| u == o.user_id).unwrap_or(true))
            .cloned()
            .collect();
        let total = items.len() as i64;
        Ok((items, total))
    }
    async fn get_order(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        Ok(self.orders.lock().unwrap().iter().find(|o| o.id == id).cloned())
    }
    async fn set_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        restock: bool,
    ) -> anyhow::Result<Option<Order>> {
        let mut orders = self.orders.lock().unwrap();
        let Some(order) = orders.iter_mut().find(|o| o.id == id && o.status == from) else {
            return Ok(None);
        };
        order.status = to;
        if restock {
            let mut products = self.products.lock().unwrap();
            for line in &order.lines {
                if let Some(p) = products.iter_mut().find(|p| p.id == line.product_id) {
                    p.stock += line.quantity;
                }
            }
        }
        Ok(Some(order.clone()))
    }
}
