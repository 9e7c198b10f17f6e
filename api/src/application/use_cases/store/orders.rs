use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::pagination::{PageRequest, Paginated};
use crate::application::ports::counter_repository::CounterRepository;
use crate::application::ports::store_repository::{CheckoutOutcome, StoreRepository};
use crate::domain::sequence;
use crate::domain::store::order::{Order, OrderStatus};
use crate::domain::users::user::Role;

pub struct Orders<'a, R, C>
where
    R: StoreRepository + ?Sized,
    C: CounterRepository + ?Sized,
{
    pub repo: &'a R,
    pub counters: &'a C,
}

impl<'a, R, C> Orders<'a, R, C>
where
    R: StoreRepository + ?Sized,
    C: CounterRepository + ?Sized,
{
    pub async fn checkout(&self, user_id: Uuid) -> ServiceResult<Order> {
        let cart = self.repo.load_cart(user_id).await?;
        if cart.is_empty() {
            return Err(ServiceError::bad_request("cart is empty"));
        }
        cart.total()?;
        let number = sequence::order_number(self.counters.next_value(sequence::STORE_ORDER).await?);
        match self.repo.place_order(user_id, &number, &cart).await? {
            CheckoutOutcome::Placed(order) => {
                tracing::info!(order_id = %order.id, number = %order.order_number, total = order.total, "order_placed");
                Ok(order)
            }
            CheckoutOutcome::OutOfStock { product_id, name } => {
                tracing::info!(product_id = %product_id, "checkout_out_of_stock");
                Err(ServiceError::conflict(format!(
                    "not enough stock for '{name}'"
                )))
            }
        }
    }

    /// Admins see every order, customers only their own.
    pub async fn list(
        &self,
        user_id: Uuid,
        role: Role,
        page: PageRequest,
    ) -> ServiceResult<Paginated<Order>> {
        let scope = if role.is_admin() { None } else { Some(user_id) };
        let (items, total) = self.repo.list_orders(scope, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn get(&self, user_id: Uuid, role: Role, id: Uuid) -> ServiceResult<Order> {
        match self.repo.get_order(id).await? {
            Some(o) if o.user_id == user_id || role.is_admin() => Ok(o),
            _ => Err(ServiceError::NotFound("order")),
        }
    }

    pub async fn set_status(&self, role: Role, id: Uuid, next: OrderStatus) -> ServiceResult<Order> {
        if !role.is_admin() {
            return Err(ServiceError::forbidden("administrator access required"));
        }
        let order = self
            .repo
            .get_order(id)
            .await?
            .ok_or(ServiceError::NotFound("order"))?;
        self.transition(order, next).await
    }

    /// Customers may cancel their own order while it is still pending.
    pub async fn cancel(&self, user_id: Uuid, id: Uuid) -> ServiceResult<Order> {
        let order = self.get(user_id, Role::User, id).await?;
        if order.status != OrderStatus::Pending {
            return Err(ServiceError::conflict("only pending orders can be cancelled"));
        }
        self.transition(order, OrderStatus::Cancelled).await
    }

    async fn transition(&self, order: Order, next: OrderStatus) -> ServiceResult<Order> {
        let from = order.status;
        from.transition(next)?;
        let restock = next == OrderStatus::Cancelled;
        let updated = self
            .repo
            .set_order_status(order.id, from, next, restock)
            .await?
            .ok_or_else(|| ServiceError::conflict("order status changed concurrently"))?;
        tracing::info!(order_id = %order.id, from = %from, to = %next, "order_status_changed");
        Ok(updated)
    }
}
