use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::ports::store_repository::{ProductFilter, ProductPatch};
use crate::application::use_cases::store::cart::ShoppingCart;
use crate::application::use_cases::store::catalog::{Catalog, ProductDraft};
use crate::application::use_cases::store::orders::Orders;
use crate::application::validation::Validator;
use crate::bootstrap::app_context::AppContext;
use crate::domain::rules::RuleViolation;
use crate::domain::store::cart::{Cart, CartLine};
use crate::domain::store::order::{Order, OrderLine, OrderStatus};
use crate::domain::store::product::{DepartmentCount, Product};
use crate::presentation::http::auth::AuthUser;
use crate::presentation::http::error::{ApiJson, ApiResult, ErrorBody};
use crate::presentation::http::{OrderPage, Page, PageParams, ProductPage, paged};

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
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

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            sku: p.sku,
            name: p.name,
            description: p.description,
            department: p.department,
            price: p.price,
            stock: p.stock,
            rating_avg: p.rating_avg,
            rating_count: p.rating_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentResponse {
    pub department: String,
    pub product_count: i64,
}

impl From<DepartmentCount> for DepartmentResponse {
    fn from(d: DepartmentCount) -> Self {
        Self {
            department: d.department,
            product_count: d.product_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineResponse {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub subtotal: i64,
}

impl TryFrom<CartLine> for LineResponse {
    type Error = RuleViolation;

    fn try_from(l: CartLine) -> Result<Self, Self::Error> {
        Ok(Self {
            subtotal: l.subtotal()?,
            product_id: l.product_id,
            name: l.name,
            unit_price: l.unit_price,
            quantity: l.quantity,
        })
    }
}

impl From<OrderLine> for LineResponse {
    fn from(l: OrderLine) -> Self {
        Self {
            // bounded by the order total checked at checkout
            subtotal: l.unit_price.saturating_mul(i64::from(l.quantity)),
            product_id: l.product_id,
            name: l.name,
            unit_price: l.unit_price,
            quantity: l.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub lines: Vec<LineResponse>,
    pub item_count: i64,
    pub total: i64,
}

impl TryFrom<Cart> for CartResponse {
    type Error = RuleViolation;

    fn try_from(c: Cart) -> Result<Self, Self::Error> {
        Ok(Self {
            item_count: c.item_count(),
            total: c.total()?,
            lines: c
                .lines
                .into_iter()
                .map(LineResponse::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub total: i64,
    pub lines: Vec<LineResponse>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            order_number: o.order_number,
            user_id: o.user_id,
            status: o.status.to_string(),
            total: o.total,
            lines: o.lines.into_iter().map(Into::into).collect(),
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub department: String,
    /// Minor units
    pub price: i64,
    #[serde(default)]
    pub stock: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateRequest {
    /// 0 to 5
    pub stars: i32,
    pub review: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    /// pending, paid, shipped, delivered or cancelled
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub department: Option<String>,
    /// Matches name or description
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RemoveQuery {
    /// Units to remove; the whole line when omitted
    pub quantity: Option<i32>,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/products/:id/ratings", post(rate_product))
        .route("/departments", get(departments))
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_to_cart))
        .route("/cart/items/:product_id", delete(remove_from_cart))
        .route("/orders", post(checkout).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", patch(set_order_status))
        .route("/orders/:id/cancel", post(cancel_order))
        .with_state(ctx)
}

fn check_product(
    name: Option<&str>,
    department: Option<&str>,
    description: Option<&str>,
) -> ApiResult<()> {
    Validator::new()
        .optional_length("name", name, 1, 200)
        .optional_length("department", department, 1, 80)
        .optional_length("description", description, 0, 5_000)
        .finish()?;
    Ok(())
}

#[utoipa::path(get, path = "/api/v1/store/products", tag = "Store", params(ListProductsQuery), responses(
    (status = 200, body = ProductPage)
))]
pub async fn list_products(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Query(q): Query<ListProductsQuery>,
) -> ApiResult<Json<Page<ProductResponse>>> {
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Catalog {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let filter = ProductFilter {
        department: q.department,
        query: q.q,
    };
    let page = uc.list(filter, paged(q.page, q.limit)).await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

#[utoipa::path(post, path = "/api/v1/store/products", tag = "Store", request_body = CreateProductRequest, responses(
    (status = 201, body = ProductResponse),
    (status = 400, body = ErrorBody),
    (status = 403, body = ErrorBody)
))]
pub async fn create_product(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    check_product(Some(&req.name), Some(&req.department), Some(&req.description))?;
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Catalog {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let draft = ProductDraft {
        name: req.name,
        description: req.description,
        department: req.department,
        price: req.price,
        stock: req.stock,
    };
    let product = uc.create(auth.role, draft).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

#[utoipa::path(get, path = "/api/v1/store/products/{id}", tag = "Store",
    params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 200, body = ProductResponse), (status = 404, body = ErrorBody)))]
pub async fn get_product(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProductResponse>> {
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Catalog {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    Ok(Json(uc.get(id).await?.into()))
}

#[utoipa::path(patch, path = "/api/v1/store/products/{id}", tag = "Store", request_body = UpdateProductRequest,
    params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 200, body = ProductResponse), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn update_product(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> ApiResult<Json<ProductResponse>> {
    check_product(
        req.name.as_deref(),
        req.department.as_deref(),
        req.description.as_deref(),
    )?;
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Catalog {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let patch = ProductPatch {
        name: req.name,
        description: req.description,
        department: req.department,
        price: req.price,
        stock: req.stock,
    };
    Ok(Json(uc.update(auth.role, id, patch).await?.into()))
}

#[utoipa::path(delete, path = "/api/v1/store/products/{id}", tag = "Store",
    params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 204), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn delete_product(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Catalog {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    uc.delete(auth.role, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/v1/store/products/{id}/ratings", tag = "Store", request_body = RateRequest,
    params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 200, body = ProductResponse), (status = 400, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn rate_product(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<RateRequest>,
) -> ApiResult<Json<ProductResponse>> {
    Validator::new()
        .optional_length("review", req.review.as_deref(), 0, 2_000)
        .finish()?;
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Catalog {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let product = uc
        .rate(auth.id, id, req.stars, req.review.as_deref())
        .await?;
    Ok(Json(product.into()))
}

#[utoipa::path(get, path = "/api/v1/store/departments", tag = "Store", responses(
    (status = 200, body = [DepartmentResponse])
))]
pub async fn departments(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<DepartmentResponse>>> {
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Catalog {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let items = uc.departments().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(get, path = "/api/v1/store/cart", tag = "Store", responses(
    (status = 200, body = CartResponse)
))]
pub async fn get_cart(
    State(ctx): State<AppContext>,
    auth: AuthUser,
) -> ApiResult<Json<CartResponse>> {
    let repo = ctx.store_repo();
    let uc = ShoppingCart {
        repo: repo.as_ref(),
    };
    Ok(Json(CartResponse::try_from(uc.get(auth.id).await?)?))
}

#[utoipa::path(post, path = "/api/v1/store/cart/items", tag = "Store", request_body = AddToCartRequest, responses(
    (status = 200, body = CartResponse),
    (status = 400, body = ErrorBody),
    (status = 404, body = ErrorBody),
    (status = 422, body = ErrorBody)
))]
pub async fn add_to_cart(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    ApiJson(req): ApiJson<AddToCartRequest>,
) -> ApiResult<Json<CartResponse>> {
    Validator::new()
        .range("quantity", i64::from(req.quantity), 1, 1_000)
        .finish()?;
    let repo = ctx.store_repo();
    let uc = ShoppingCart {
        repo: repo.as_ref(),
    };
    let cart = uc.add(auth.id, req.product_id, req.quantity).await?;
    Ok(Json(CartResponse::try_from(cart)?))
}

#[utoipa::path(delete, path = "/api/v1/store/cart/items/{product_id}", tag = "Store",
    params(("product_id" = Uuid, Path, description = "Product id"), RemoveQuery),
    responses((status = 200, body = CartResponse), (status = 404, body = ErrorBody)))]
pub async fn remove_from_cart(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(product_id): Path<Uuid>,
    Query(q): Query<RemoveQuery>,
) -> ApiResult<Json<CartResponse>> {
    let repo = ctx.store_repo();
    let uc = ShoppingCart {
        repo: repo.as_ref(),
    };
    let cart = uc.remove(auth.id, product_id, q.quantity).await?;
    Ok(Json(CartResponse::try_from(cart)?))
}

#[utoipa::path(delete, path = "/api/v1/store/cart", tag = "Store", responses((status = 204)))]
pub async fn clear_cart(State(ctx): State<AppContext>, auth: AuthUser) -> ApiResult<StatusCode> {
    let repo = ctx.store_repo();
    let uc = ShoppingCart {
        repo: repo.as_ref(),
    };
    uc.clear(auth.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/v1/store/orders", tag = "Store", responses(
    (status = 201, body = OrderResponse),
    (status = 400, body = ErrorBody),
    (status = 409, body = ErrorBody)
))]
pub async fn checkout(
    State(ctx): State<AppContext>,
    auth: AuthUser,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Orders {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let order = uc.checkout(auth.id).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

#[utoipa::path(get, path = "/api/v1/store/orders", tag = "Store", params(PageParams), responses(
    (status = 200, body = OrderPage)
))]
pub async fn list_orders(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Query(q): Query<PageParams>,
) -> ApiResult<Json<Page<OrderResponse>>> {
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Orders {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let page = uc.list(auth.id, auth.role, q.into()).await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

#[utoipa::path(get, path = "/api/v1/store/orders/{id}", tag = "Store",
    params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, body = OrderResponse), (status = 404, body = ErrorBody)))]
pub async fn get_order(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderResponse>> {
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Orders {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    Ok(Json(uc.get(auth.id, auth.role, id).await?.into()))
}

#[utoipa::path(patch, path = "/api/v1/store/orders/{id}/status", tag = "Store", request_body = SetStatusRequest,
    params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, body = OrderResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn set_order_status(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<SetStatusRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let next: OrderStatus = req.status.trim().parse()?;
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Orders {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    Ok(Json(uc.set_status(auth.role, id, next).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/store/orders/{id}/cancel", tag = "Store",
    params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, body = OrderResponse), (status = 404, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn cancel_order(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderResponse>> {
    let repo = ctx.store_repo();
    let counters = ctx.counter_repo();
    let uc = Orders {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    Ok(Json(uc.cancel(auth.id, id).await?.into()))
}
