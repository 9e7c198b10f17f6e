use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::pagination::{PageRequest, Paginated};
use crate::application::ports::counter_repository::CounterRepository;
use crate::application::ports::store_repository::{
    NewProduct, ProductFilter, ProductPatch, StoreRepository,
};
use crate::domain::sequence;
use crate::domain::store::product::{
    DepartmentCount, Product, average_stars, check_price_and_stock, check_stars,
    normalize_department,
};
use crate::domain::users::user::Role;

pub struct Catalog<'a, R, C>
where
    R: StoreRepository + ?Sized,
    C: CounterRepository + ?Sized,
{
    pub repo: &'a R,
    pub counters: &'a C,
}

#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub department: String,
    pub price: i64,
    pub stock: i32,
}

fn require_admin(role: Role) -> ServiceResult<()> {
    if !role.is_admin() {
        return Err(ServiceError::forbidden("administrator access required"));
    }
    Ok(())
}

impl<'a, R, C> Catalog<'a, R, C>
where
    R: StoreRepository + ?Sized,
    C: CounterRepository + ?Sized,
{
    pub async fn create(&self, role: Role, draft: ProductDraft) -> ServiceResult<Product> {
        require_admin(role)?;
        check_price_and_stock(draft.price, draft.stock)?;
        let sku = sequence::product_sku(self.counters.next_value(sequence::STORE_PRODUCT).await?);
        let product = self
            .repo
            .create_product(&NewProduct {
                sku,
                name: draft.name.trim().to_string(),
                description: draft.description,
                department: normalize_department(&draft.department),
                price: draft.price,
                stock: draft.stock,
            })
            .await?;
        tracing::info!(product_id = %product.id, sku = %product.sku, "product_created");
        Ok(product)
    }

    pub async fn list(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> ServiceResult<Paginated<Product>> {
        let filter = ProductFilter {
            department: filter
                .department
                .map(|d| normalize_department(&d))
                .filter(|d| !d.is_empty()),
            query: filter.query.filter(|q| !q.trim().is_empty()),
        };
        let (items, total) = self.repo.list_products(&filter, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Product> {
        self.repo
            .get_product(id)
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }

    pub async fn update(&self, role: Role, id: Uuid, mut patch: ProductPatch) -> ServiceResult<Product> {
        require_admin(role)?;
        check_price_and_stock(patch.price.unwrap_or(0), patch.stock.unwrap_or(0))?;
        patch.department = patch.department.map(|d| normalize_department(&d));
        patch.name = patch.name.map(|n| n.trim().to_string());
        self.repo
            .update_product(id, &patch)
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }

    pub async fn delete(&self, role: Role, id: Uuid) -> ServiceResult<()> {
        require_admin(role)?;
        if !self.repo.delete_product(id).await? {
            return Err(ServiceError::NotFound("product"));
        }
        tracing::info!(product_id = %id, "product_deleted");
        Ok(())
    }

    pub async fn departments(&self) -> ServiceResult<Vec<DepartmentCount>> {
        Ok(self.repo.departments().await?)
    }

    /// Records (or replaces) the caller's rating and refreshes the product's
    /// average.
    pub async fn rate(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        stars: i32,
        review: Option<&str>,
    ) -> ServiceResult<Product> {
        check_stars(stars)?;
        self.get(product_id).await?;
        self.repo
            .upsert_rating(product_id, user_id, stars, review)
            .await?;
        let all = self.repo.rating_stars(product_id).await?;
        let avg = average_stars(&all);
        self.repo
            .set_rating_summary(product_id, avg, all.len() as i64)
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }
}
