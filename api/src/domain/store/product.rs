use uuid::Uuid;

use crate::domain::rules::RuleViolation;

pub const MIN_STARS: i32 = 0;
pub const MAX_STARS: i32 = 5;
/// Upper bound for a unit price in minor units.
pub const MAX_PRICE: i64 = 100_000_000_000;

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub department: String,
    pub price: i64,
    pub stock: i32,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct Rating {
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub stars: i32,
    pub review: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct DepartmentCount {
    pub department: String,
    pub product_count: i64,
}

pub fn check_stars(stars: i32) -> Result<(), RuleViolation> {
    if !(MIN_STARS..=MAX_STARS).contains(&stars) {
        return Err(RuleViolation::invalid(format!(
            "rating must be between {MIN_STARS} and {MAX_STARS}"
        )));
    }
    Ok(())
}

pub fn check_price_and_stock(price: i64, stock: i32) -> Result<(), RuleViolation> {
    if price < 0 {
        return Err(RuleViolation::invalid("price cannot be negative"));
    }
    if price > MAX_PRICE {
        return Err(RuleViolation::invalid(format!("price cannot exceed {MAX_PRICE}")));
    }
    if stock < 0 {
        return Err(RuleViolation::invalid("stock cannot be negative"));
    }
    Ok(())
}

/// Departments are matched case-insensitively; store them lower-cased.
pub fn normalize_department(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Mean of the given star values rounded to two decimals (0 when empty).
pub fn average_stars(stars: &[i32]) -> f64 {
    if stars.is_empty() {
        return 0.0;
    }
    let sum: i64 = stars.iter().map(|s| i64::from(*s)).sum();
    let avg = sum as f64 / stars.len() as f64;
    (avg * 100.0).round() / 100.0
}
