use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction as PgTransaction};
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::store_repository::{
    CheckoutOutcome, NewProduct, ProductFilter, ProductPatch, StoreRepository,
};
use crate::domain::store::cart::{Cart, CartLine};
use crate::domain::store::order::{Order, OrderLine, OrderStatus};
use crate::domain::store::product::{DepartmentCount, Product};
use crate::infrastructure::db::PgPool;

const PRODUCT_COLUMNS: &str = "id, sku, name, description, department, price, stock, rating_avg, rating_count, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, order_number, user_id, status, total, created_at, updated_at";

pub struct SqlxStoreRepository {
    pub pool: PgPool,
}

impl SqlxStoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_product(r: &PgRow) -> Product {
    Product {
        id: r.get("id"),
        sku: r.get("sku"),
        name: r.get("name"),
        description: r.get("description"),
        department: r.get("department"),
        price: r.get("price"),
        stock: r.get("stock"),
        rating_avg: r.get("rating_avg"),
        rating_count: r.get("rating_count"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn map_order(r: &PgRow, lines: Vec<OrderLine>) -> anyhow::Result<Order> {
    Ok(Order {
        id: r.get("id"),
        order_number: r.get("order_number"),
        user_id: r.get("user_id"),
        status: r.get::<String, _>("status").parse::<OrderStatus>()?,
        total: r.get("total"),
        lines,
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

async fn order_lines<'e, E>(exec: E, order_id: Uuid) -> anyhow::Result<Vec<OrderLine>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query(
        r#"SELECT product_id, name, unit_price, quantity FROM store_order_lines
           WHERE order_id = $1 ORDER BY position"#,
    )
    .bind(order_id)
    .fetch_all(exec)
    .await?;
    Ok(rows
        .iter()
        .map(|r| OrderLine {
            product_id: r.get("product_id"),
            name: r.get("name"),
            unit_price: r.get("unit_price"),
            quantity: r.get("quantity"),
        })
        .collect())
}

/// Stock rows are always locked in product id order so concurrent
/// checkouts and cancellations sharing products cannot deadlock.
fn in_lock_order<L>(lines: &[L], product_id: impl Fn(&L) -> Uuid) -> Vec<&L> {
    let mut sorted: Vec<&L> = lines.iter().collect();
    sorted.sort_by_key(|l| product_id(l));
    sorted
}

/// Puts the quantities of a cancelled order back on the shelf.
async fn restock(tx: &mut PgTransaction<'_, Postgres>, lines: &[OrderLine]) -> anyhow::Result<()> {
    for line in in_lock_order(lines, |l| l.product_id) {
        sqlx::query("UPDATE store_products SET stock = stock + $2, updated_at = now() WHERE id = $1")
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl StoreRepository for SqlxStoreRepository {
    async fn create_product(&self, p: &NewProduct) -> anyhow::Result<Product> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO store_products (sku, name, description, department, price, stock)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {PRODUCT_COLUMNS}"#
        ))
        .bind(&p.sku)
        .bind(&p.name)
        .bind(&p.description)
        .bind(&p.department)
        .bind(p.price)
        .bind(p.stock)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_product(&row))
    }

    async fn get_product(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store_products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_product))
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Product>, i64)> {
        let pattern = filter.query.as_ref().map(|q| format!("%{}%", q.trim()));
        let rows = sqlx::query(&format!(
            r#"SELECT {PRODUCT_COLUMNS}, COUNT(*) OVER() AS total FROM store_products
               WHERE ($1::text IS NULL OR department = $1)
                 AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2)
               ORDER BY name, id
               LIMIT $3 OFFSET $4"#
        ))
        .bind(filter.department.as_deref())
        .bind(pattern)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        Ok((rows.iter().map(map_product).collect(), total))
    }

    async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"UPDATE store_products SET
                 name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 department = COALESCE($4, department),
                 price = COALESCE($5, price),
                 stock = COALESCE($6, stock),
                 updated_at = now()
               WHERE id = $1
               RETURNING {PRODUCT_COLUMNS}"#
        ))
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.department.as_deref())
        .bind(patch.price)
        .bind(patch.stock)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_product))
    }

    async fn delete_product(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM store_products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn departments(&self) -> anyhow::Result<Vec<DepartmentCount>> {
        let rows = sqlx::query(
            r#"SELECT department, COUNT(*) AS product_count FROM store_products
               GROUP BY department ORDER BY department"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| DepartmentCount {
                department: r.get("department"),
                product_count: r.get("product_count"),
            })
            .collect())
    }

    async fn upsert_rating(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        stars: i32,
        review: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO store_ratings (product_id, user_id, stars, review) VALUES ($1, $2, $3, $4)
               ON CONFLICT (product_id, user_id) DO UPDATE
               SET stars = EXCLUDED.stars, review = EXCLUDED.review, created_at = now()"#,
        )
        .bind(product_id)
        .bind(user_id)
        .bind(stars)
        .bind(review)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn rating_stars(&self, product_id: Uuid) -> anyhow::Result<Vec<i32>> {
        let stars = sqlx::query_scalar("SELECT stars FROM store_ratings WHERE product_id = $1")
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(stars)
    }

    async fn set_rating_summary(
        &self,
        product_id: Uuid,
        average: f64,
        count: i64,
    ) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"UPDATE store_products SET rating_avg = $2, rating_count = $3
               WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"#
        ))
        .bind(product_id)
        .bind(average)
        .bind(count)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_product))
    }

    async fn load_cart(&self, user_id: Uuid) -> anyhow::Result<Cart> {
        let rows = sqlx::query(
            r#"SELECT product_id, name, unit_price, quantity FROM store_cart_lines
               WHERE user_id = $1 ORDER BY position"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Cart::new(
            rows.iter()
                .map(|r| CartLine {
                    product_id: r.get("product_id"),
                    name: r.get("name"),
                    unit_price: r.get("unit_price"),
                    quantity: r.get("quantity"),
                })
                .collect(),
        ))
    }

    async fn save_cart(&self, user_id: Uuid, cart: &Cart) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM store_cart_lines WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        for (position, line) in cart.lines.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO store_cart_lines (user_id, product_id, name, unit_price, quantity, position)
                   VALUES ($1, $2, $3, $4, $5, $6)"#,
            )
            .bind(user_id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn place_order(
        &self,
        user_id: Uuid,
        order_number: &str,
        cart: &Cart,
    ) -> anyhow::Result<CheckoutOutcome> {
        let mut tx = self.pool.begin().await?;
        for line in in_lock_order(&cart.lines, |l| l.product_id) {
            let taken = sqlx::query(
                r#"UPDATE store_products SET stock = stock - $2, updated_at = now()
                   WHERE id = $1 AND stock >= $2"#,
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            if taken == 0 {
                tx.rollback().await?;
                return Ok(CheckoutOutcome::OutOfStock {
                    product_id: line.product_id,
                    name: line.name.clone(),
                });
            }
        }
        let row = sqlx::query(&format!(
            r#"INSERT INTO store_orders (order_number, user_id, status, total)
               VALUES ($1, $2, $3, $4)
               RETURNING {ORDER_COLUMNS}"#
        ))
        .bind(order_number)
        .bind(user_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(cart.total()?)
        .fetch_one(&mut *tx)
        .await?;
        let order_id: Uuid = row.get("id");
        let mut lines = Vec::with_capacity(cart.lines.len());
        for (position, line) in cart.lines.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO store_order_lines (order_id, position, product_id, name, unit_price, quantity)
                   VALUES ($1, $2, $3, $4, $5, $6)"#,
            )
            .bind(order_id)
            .bind(position as i32)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
            lines.push(OrderLine {
                product_id: line.product_id,
                name: line.name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
            });
        }
        sqlx::query("DELETE FROM store_cart_lines WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(CheckoutOutcome::Placed(map_order(&row, lines)?))
    }

    async fn list_orders(
        &self,
        user_id: Option<Uuid>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Order>, i64)> {
        let rows = sqlx::query(&format!(
            r#"SELECT {ORDER_COLUMNS}, COUNT(*) OVER() AS total FROM store_orders
               WHERE ($1::uuid IS NULL OR user_id = $1)
               ORDER BY created_at DESC, order_number DESC
               LIMIT $2 OFFSET $3"#
        ))
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        let mut orders = Vec::with_capacity(rows.len());
        for r in &rows {
            let lines = order_lines(&self.pool, r.get("id")).await?;
            orders.push(map_order(r, lines)?);
        }
        Ok((orders, total))
    }

    async fn get_order(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM store_orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(r) => {
                let lines = order_lines(&self.pool, id).await?;
                Ok(Some(map_order(&r, lines)?))
            }
            None => Ok(None),
        }
    }

    async fn set_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        restock_lines: bool,
    ) -> anyhow::Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            r#"UPDATE store_orders SET status = $3, updated_at = now()
               WHERE id = $1 AND status = $2
               RETURNING {ORDER_COLUMNS}"#
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let lines = order_lines(&mut *tx, id).await?;
        if restock_lines {
            restock(&mut tx, &lines).await?;
        }
        tx.commit().await?;
        Ok(Some(map_order(&row, lines)?))
    }
}
