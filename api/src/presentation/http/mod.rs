pub mod auth;
pub mod bank;
pub mod blog;
pub mod error;
pub mod health;
pub mod issues;
pub mod projects;
pub mod store;
#[cfg(test)]
pub(crate) mod testing;
pub mod todo;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::pagination::{PageQuery, PageRequest, Paginated};
use crate::domain::users::user::UserSummary;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
}

impl From<UserSummary> for UserRef {
    fn from(u: UserSummary) -> Self {
        Self {
            id: u.id,
            name: u.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    UserPage = Page<UserRef>,
    TransactionPage = Page<bank::TransactionResponse>,
    PostPage = Page<blog::PostResponse>,
    SuggestionPage = Page<blog::SuggestionResponse>,
    ProductPage = Page<store::ProductResponse>,
    OrderPage = Page<store::OrderResponse>,
    IssuePage = Page<issues::IssueResponse>,
    PullRequestPage = Page<issues::PullRequestResponse>,
    TodoPage = Page<todo::TodoResponse>
)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn from_paginated<U>(p: Paginated<U>, f: impl FnMut(U) -> T) -> Self {
        let p = p.map(f);
        Self {
            items: p.items,
            page: p.page,
            limit: p.limit,
            total: p.total,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<PageParams> for PageRequest {
    fn from(p: PageParams) -> Self {
        paged(p.page, p.limit)
    }
}

pub(crate) fn paged(page: Option<i64>, limit: Option<i64>) -> PageRequest {
    PageQuery { page, limit }.into()
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
