use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::store_repository::StoreRepository;
use crate::domain::rules::RuleViolation;
use crate::domain::store::cart::Cart;

pub struct ShoppingCart<'a, R: StoreRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: StoreRepository + ?Sized> ShoppingCart<'a, R> {
    pub async fn get(&self, user_id: Uuid) -> ServiceResult<Cart> {
        Ok(self.repo.load_cart(user_id).await?)
    }

    pub async fn add(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> ServiceResult<Cart> {
        let product = self
            .repo
            .get_product(product_id)
            .await?
            .ok_or(ServiceError::NotFound("product"))?;
        let mut cart = self.repo.load_cart(user_id).await?;
        cart.add(
            product.id,
            &product.name,
            product.price,
            quantity,
            product.stock,
        )?;
        self.repo.save_cart(user_id, &cart).await?;
        Ok(cart)
    }

    pub async fn remove(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: Option<i32>,
    ) -> ServiceResult<Cart> {
        let mut cart = self.repo.load_cart(user_id).await?;
        match cart.remove(product_id, quantity) {
            Ok(_) => {}
            Err(RuleViolation::Unprocessable(_)) => return Err(ServiceError::NotFound("cart item")),
            Err(e) => return Err(e.into()),
        }
        self.repo.save_cart(user_id, &cart).await?;
        Ok(cart)
    }

    pub async fn clear(&self, user_id: Uuid) -> ServiceResult<()> {
        self.repo.save_cart(user_id, &Cart::default()).await?;
        Ok(())
    }
}
