//! JSON endpoints behind the customer admin form.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use eshop_core::{
    build_query, ApplicationError, Customer, CustomerFilter, CustomerInput, InterfaceError,
    PageRequest, PageSize,
};
use eshop_db::{CustomerService, DeleteOutcome, Store, UpdateOutcome};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::health;

#[derive(Clone)]
pub struct ApiState {
    store: Store,
}

impl ApiState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    async fn service(&self, collection: Option<&str>) -> Result<CustomerService, ApiError> {
        let collection = self
            .store
            .collection(collection)
            .await
            .map_err(|error| reject(ApplicationError::from(error)))?;
        Ok(CustomerService::new(Arc::new(collection)))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: &'static str,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Raw form fields; empty strings mean "not provided".
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    name: Option<String>,
    email: Option<String>,
    city: Option<String>,
    created_from: Option<String>,
    created_to: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
    collection: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CollectionParam {
    collection: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PageBody {
    pub items: Vec<Customer>,
    pub total_matching: u64,
    pub page: u32,
    pub page_size: PageSize,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct CreatedBody {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}

pub fn router(store: Store) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/customers", get(list_customers).post(create_customer))
        .route(
            "/api/v1/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .with_state(ApiState::new(store))
}

pub async fn list_customers(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageBody>, ApiError> {
    let filter = CustomerFilter {
        name: params.name,
        email: params.email,
        city: params.city,
        created_from: parse_date("created_from", params.created_from.as_deref()).map_err(reject)?,
        created_to: parse_date("created_to", params.created_to.as_deref()).map_err(reject)?,
    };
    let request = page_request(params.page.as_deref(), params.page_size.as_deref()).map_err(reject)?;

    let service = state.service(params.collection.as_deref()).await?;
    let page = service.read_page(&build_query(&filter), request).await.map_err(reject)?;

    let total_pages = page.total_pages();
    Ok(Json(PageBody {
        items: page.items,
        total_matching: page.total_matching,
        page: page.page,
        page_size: page.page_size,
        total_pages,
    }))
}

pub async fn get_customer(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(params): Query<CollectionParam>,
) -> Result<Json<Customer>, ApiError> {
    let service = state.service(params.collection.as_deref()).await?;
    match service.find_customer(&id).await.map_err(reject)? {
        Some(customer) => Ok(Json(customer)),
        None => Err(not_found(&id)),
    }
}

pub async fn create_customer(
    State(state): State<ApiState>,
    Query(params): Query<CollectionParam>,
    body: Result<Json<CustomerInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedBody>), ApiError> {
    let Json(fields) = body.map_err(reject_body)?;
    let service = state.service(params.collection.as_deref()).await?;
    let id = service.create_customer(fields).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(CreatedBody { id: id.to_string() })))
}

pub async fn update_customer(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(params): Query<CollectionParam>,
    body: Result<Json<CustomerInput>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusBody>), ApiError> {
    let Json(fields) = body.map_err(reject_body)?;
    let service = state.service(params.collection.as_deref()).await?;
    match service.update_customer(&id, fields).await.map_err(reject)? {
        UpdateOutcome::Updated => Ok((StatusCode::OK, Json(StatusBody { status: "updated" }))),
        UpdateOutcome::NotFound => {
            Ok((StatusCode::NOT_FOUND, Json(StatusBody { status: "not_found" })))
        }
    }
}

pub async fn delete_customer(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(params): Query<CollectionParam>,
) -> Result<(StatusCode, Json<DeleteOutcome>), ApiError> {
    let service = state.service(params.collection.as_deref()).await?;
    let outcome = service.delete_customer(&id).await.map_err(reject)?;
    let status = if outcome.deleted_count == 0 { StatusCode::NOT_FOUND } else { StatusCode::OK };
    Ok((status, Json(outcome)))
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ApplicationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d").map(Some).map_err(|_| {
            ApplicationError::Validation(format!("{field} must be a YYYY-MM-DD date, got `{value}`"))
        }),
    }
}

fn page_request(page: Option<&str>, size: Option<&str>) -> Result<PageRequest, ApplicationError> {
    let page = match page.map(str::trim) {
        None | Some("") => 1,
        Some(value) => value.parse::<u32>().map_err(|_| {
            ApplicationError::Validation(format!("page must be a positive integer, got `{value}`"))
        })?,
    };
    let size = match size.map(str::trim) {
        None | Some("") => PageSize::default(),
        Some(value) => {
            let raw = value.parse::<u32>().map_err(|_| {
                ApplicationError::Validation(format!("page_size must be an integer, got `{value}`"))
            })?;
            PageSize::try_from(raw)?
        }
    };
    PageRequest::new(page, size)
}

fn reject(error: ApplicationError) -> ApiError {
    let correlation_id = Uuid::new_v4().to_string();
    let interface = error.into_interface(correlation_id);
    let status = match interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };

    warn!(
        event_name = "api.request.rejected",
        correlation_id = interface.correlation_id(),
        status = status.as_u16(),
        error = %interface,
        "customer request rejected"
    );

    (
        status,
        Json(ErrorBody {
            error: interface.message().to_string(),
            message: interface.user_message(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    reject(ApplicationError::Validation(rejection.body_text()))
}

fn not_found(id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: format!("customer `{id}` not found"),
            message: "No customer matches this identifier.",
            correlation_id: Uuid::new_v4().to_string(),
        }),
    )
}
