use uuid::Uuid;

use crate::domain::rules::RuleViolation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

fn too_large() -> RuleViolation {
    RuleViolation::unprocessable("cart total is too large")
}

impl CartLine {
    pub fn subtotal(&self) -> Result<i64, RuleViolation> {
        self.unit_price
            .checked_mul(i64::from(self.quantity))
            .ok_or_else(too_large)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    pub fn total(&self) -> Result<i64, RuleViolation> {
        self.lines
            .iter()
            .try_fold(0i64, |acc, l| acc.checked_add(l.subtotal()?).ok_or_else(too_large))
    }

    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, product_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Adds `quantity` units, merging into an existing line for the same
    /// product. The resulting line quantity may not exceed `available`.
    /// The cart total must stay representable. Returns the new quantity of
    /// that line.
    pub fn add(
        &mut self,
        product_id: Uuid,
        name: &str,
        unit_price: i64,
        quantity: i32,
        available: i32,
    ) -> Result<i32, RuleViolation> {
        if quantity < 1 {
            return Err(RuleViolation::invalid("quantity must be at least 1"));
        }
        let current = self.line(product_id).map(|l| l.quantity).unwrap_or(0);
        let wanted = current
            .checked_add(quantity)
            .ok_or_else(|| RuleViolation::invalid("quantity too large"))?;
        if wanted > available {
            return Err(RuleViolation::unprocessable(format!(
                "only {available} unit(s) of '{name}' in stock"
            )));
        }
        let mut next = self.clone();
        match next.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = wanted;
                // price follows the catalogue at the time of the last add
                line.unit_price = unit_price;
                line.name = name.to_string();
            }
            None => next.lines.push(CartLine {
                product_id,
                name: name.to_string(),
                unit_price,
                quantity: wanted,
            }),
        }
        next.total()?;
        *self = next;
        Ok(wanted)
    }

    /// Takes `quantity` units off a line (all of them when `None`), dropping
    /// the line once it reaches zero. Returns the remaining quantity.
    pub fn remove(&mut self, product_id: Uuid, quantity: Option<i32>) -> Result<i32, RuleViolation> {
        let pos = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| RuleViolation::unprocessable("product is not in the cart"))?;
        let remaining = match quantity {
            Some(q) if q < 1 => {
                return Err(RuleViolation::invalid("quantity must be at least 1"));
            }
            Some(q) => (self.lines[pos].quantity - q).max(0),
            None => 0,
        };
        if remaining == 0 {
            self.lines.remove(pos);
        } else {
            self.lines[pos].quantity = remaining;
        }
        Ok(remaining)
    }
}
