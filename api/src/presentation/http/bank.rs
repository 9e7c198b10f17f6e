use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::use_cases::bank::accounts::BankAccounts;
use crate::application::use_cases::bank::transfers::{Transfer, TransferCommand};
use crate::application::validation::Validator;
use crate::bootstrap::app_context::AppContext;
use crate::domain::bank::account::{Account, AccountKind, MAX_TRANSACTION_AMOUNT, Transaction};
use crate::presentation::http::auth::AuthUser;
use crate::presentation::http::error::{ApiJson, ApiResult, ErrorBody};
use crate::presentation::http::{Page, PageParams, TransactionPage};

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: Uuid,
    pub account_number: String,
    pub kind: String,
    pub currency: String,
    pub balance: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            account_number: a.account_number,
            kind: a.kind.as_str().to_string(),
            currency: a.currency,
            balance: a.balance,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: String,
    pub amount: i64,
    pub balance_after: i64,
    pub counterparty_account_id: Option<Uuid>,
    pub reference: String,
    pub note: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            account_id: t.account_id,
            kind: t.kind.to_string(),
            amount: t.amount,
            balance_after: t.balance_after,
            counterparty_account_id: t.counterparty_account_id,
            reference: t.reference,
            note: t.note,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenAccountRequest {
    /// `checking` or `savings`
    pub kind: String,
    /// ISO 4217 code, defaults to USD
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AmountRequest {
    /// Minor units
    pub amount: i64,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferBody {
    pub from_account_id: Uuid,
    pub to_account_number: String,
    pub amount: i64,
    pub note: Option<String>,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/accounts", post(open_account).get(list_accounts))
        .route("/accounts/:id", get(get_account))
        .route("/accounts/:id/deposit", post(deposit))
        .route("/accounts/:id/withdraw", post(withdraw))
        .route("/accounts/:id/transactions", get(list_transactions))
        .route("/transfers", post(transfer))
        .with_state(ctx)
}

fn check_movement(amount: i64, note: Option<&str>) -> ApiResult<()> {
    Validator::new()
        .range("amount", amount, 1, MAX_TRANSACTION_AMOUNT)
        .optional_length("note", note, 0, 200)
        .finish()?;
    Ok(())
}

#[utoipa::path(post, path = "/api/v1/bank/accounts", tag = "Bank", request_body = OpenAccountRequest, responses(
    (status = 201, body = AccountResponse),
    (status = 400, body = ErrorBody)
))]
pub async fn open_account(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    ApiJson(req): ApiJson<OpenAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    Validator::new()
        .one_of("kind", &req.kind, &["checking", "savings"])
        .finish()?;
    let kind: AccountKind = req.kind.parse()?;
    let repo = ctx.bank_repo();
    let counters = ctx.counter_repo();
    let uc = BankAccounts {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let account = uc.open(auth.id, kind, req.currency.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

#[utoipa::path(get, path = "/api/v1/bank/accounts", tag = "Bank", responses(
    (status = 200, body = [AccountResponse])
))]
pub async fn list_accounts(
    State(ctx): State<AppContext>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<AccountResponse>>> {
    let repo = ctx.bank_repo();
    let counters = ctx.counter_repo();
    let uc = BankAccounts {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let items = uc.list(auth.id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(get, path = "/api/v1/bank/accounts/{id}", tag = "Bank",
    params(("id" = Uuid, Path, description = "Account id")),
    responses((status = 200, body = AccountResponse), (status = 404, body = ErrorBody)))]
pub async fn get_account(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AccountResponse>> {
    let repo = ctx.bank_repo();
    let counters = ctx.counter_repo();
    let uc = BankAccounts {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    Ok(Json(uc.get_owned(auth.id, id).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/bank/accounts/{id}/deposit", tag = "Bank", request_body = AmountRequest,
    params(("id" = Uuid, Path, description = "Account id")),
    responses((status = 201, body = TransactionResponse), (status = 400, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn deposit(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<AmountRequest>,
) -> ApiResult<(StatusCode, Json<TransactionResponse>)> {
    check_movement(req.amount, req.note.as_deref())?;
    let repo = ctx.bank_repo();
    let counters = ctx.counter_repo();
    let uc = BankAccounts {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let tx = uc
        .deposit(auth.id, id, req.amount, req.note.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(tx.into())))
}

#[utoipa::path(post, path = "/api/v1/bank/accounts/{id}/withdraw", tag = "Bank", request_body = AmountRequest,
    params(("id" = Uuid, Path, description = "Account id")),
    responses((status = 201, body = TransactionResponse), (status = 404, body = ErrorBody), (status = 422, body = ErrorBody)))]
pub async fn withdraw(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<AmountRequest>,
) -> ApiResult<(StatusCode, Json<TransactionResponse>)> {
    check_movement(req.amount, req.note.as_deref())?;
    let repo = ctx.bank_repo();
    let counters = ctx.counter_repo();
    let uc = BankAccounts {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let tx = uc
        .withdraw(auth.id, id, req.amount, req.note.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(tx.into())))
}

#[utoipa::path(get, path = "/api/v1/bank/accounts/{id}/transactions", tag = "Bank",
    params(("id" = Uuid, Path, description = "Account id"), PageParams),
    responses((status = 200, body = TransactionPage), (status = 404, body = ErrorBody)))]
pub async fn list_transactions(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<PageParams>,
) -> ApiResult<Json<Page<TransactionResponse>>> {
    let repo = ctx.bank_repo();
    let counters = ctx.counter_repo();
    let uc = BankAccounts {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let page = uc.transactions(auth.id, id, q.into()).await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

#[utoipa::path(post, path = "/api/v1/bank/transfers", tag = "Bank", request_body = TransferBody, responses(
    (status = 201, body = TransactionResponse),
    (status = 400, body = ErrorBody),
    (status = 404, body = ErrorBody),
    (status = 422, body = ErrorBody)
))]
pub async fn transfer(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    ApiJson(req): ApiJson<TransferBody>,
) -> ApiResult<(StatusCode, Json<TransactionResponse>)> {
    Validator::new()
        .length("to_account_number", &req.to_account_number, 1, 32)
        .range("amount", req.amount, 1, MAX_TRANSACTION_AMOUNT)
        .optional_length("note", req.note.as_deref(), 0, 200)
        .finish()?;
    let repo = ctx.bank_repo();
    let counters = ctx.counter_repo();
    let uc = Transfer {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let cmd = TransferCommand {
        from_account_id: req.from_account_id,
        to_account_number: req.to_account_number.trim().to_string(),
        amount: req.amount,
        note: req.note,
    };
    let debit = uc.execute(auth.id, &cmd).await?;
    Ok((StatusCode::CREATED, Json(debit.into())))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::presentation::http::testing::{TestApp, error_fields, send};

    async fn open(app: &Router, token: &str) -> Value {
        let (status, body) = send(
            app,
            "POST",
            "/accounts",
            token,
            Some(json!({"kind": "checking"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn account_kind_and_amounts_are_validated() {
        let t = TestApp::new(&["ann"]);
        let app = routes(t.ctx.clone());

        let (status, body) = send(
            &app,
            "POST",
            "/accounts",
            &t.token(0),
            Some(json!({"kind": "credit"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_fields(&body), vec!["kind"]);

        let acc = open(&app, &t.token(0)).await;
        assert_eq!(acc["balance"], 0);
        let deposit = format!("/accounts/{}/deposit", acc["id"].as_str().unwrap());
        for amount in [0, -5, MAX_TRANSACTION_AMOUNT + 1] {
            let (status, body) =
                send(&app, "POST", &deposit, &t.token(0), Some(json!({"amount": amount}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error_fields(&body), vec!["amount"]);
        }
    }

    #[tokio::test]
    async fn withdrawals_beyond_the_balance_are_unprocessable() {
        let t = TestApp::new(&["ann", "bob"]);
        let app = routes(t.ctx.clone());
        let acc = open(&app, &t.token(0)).await;
        let id = acc["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/accounts/{id}/deposit"),
            &t.token(0),
            Some(json!({"amount": 500, "note": "salary"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["balance_after"], 500);

        let withdraw = format!("/accounts/{id}/withdraw");
        let (status, _) = send(&app, "POST", &withdraw, &t.token(0), Some(json!({"amount": 501}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, "POST", &withdraw, &t.token(1), Some(json!({"amount": 1}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transfers_check_destination_and_funds() {
        let t = TestApp::new(&["ann", "bob"]);
        let app = routes(t.ctx.clone());
        let from = open(&app, &t.token(0)).await;
        let to = open(&app, &t.token(1)).await;
        let from_id = from["id"].as_str().unwrap();
        send(
            &app,
            "POST",
            &format!("/accounts/{from_id}/deposit"),
            &t.token(0),
            Some(json!({"amount": 300})),
        )
        .await;
        let transfer = |to: &Value, amount: i64| {
            json!({
                "from_account_id": from_id,
                "to_account_number": to["account_number"],
                "amount": amount,
            })
        };

        let (status, _) = send(&app, "POST", "/transfers", &t.token(0), Some(transfer(&from, 10))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "POST", "/transfers", &t.token(0), Some(transfer(&to, 301))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (status, _) = send(&app, "POST", "/transfers", &t.token(1), Some(transfer(&to, 10))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "POST", "/transfers", &t.token(0), Some(transfer(&to, 120))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["kind"], "transfer_out");
        assert_eq!(body["balance_after"], 180);

        let uri = format!("/accounts/{}", to["id"].as_str().unwrap());
        let (status, body) = send(&app, "GET", &uri, &t.token(1), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], 120);
    }
}
