use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use zipline_core::{Owner, ShortCode, UrlId};

use crate::error::{AppError, Result};
use crate::extract::Caller;
use crate::model::{CreateUrlRequest, StatusUpdateRequest, UpdateUrlRequest, UrlResponse};
use crate::state::AppState;

pub async fn create_url_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<UrlResponse>)> {
    let record = state
        .service()
        .create(&request.original_url, &caller)
        .await?;
    let response = UrlResponse::from_record(record, state.base_url());
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_urls_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<UrlResponse>>> {
    let Owner::User(user) = caller else {
        return Err(AppError::MissingCaller);
    };

    let records = state.service().list_by_user(user).await?;
    let responses = records
        .into_iter()
        .map(|record| UrlResponse::from_record(record, state.base_url()))
        .collect();
    Ok(Json(responses))
}

pub async fn get_url_by_id_handler(
    Path(id): Path<UrlId>,
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<UrlResponse>> {
    let record = state.service().get_by_id(id, &caller).await?;
    Ok(Json(UrlResponse::from_record(record, state.base_url())))
}

pub async fn update_url_handler(
    Path(id): Path<UrlId>,
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<UpdateUrlRequest>,
) -> Result<Json<UrlResponse>> {
    let record = state
        .service()
        .update_by_id(id, &request.original_url, &caller)
        .await?;
    Ok(Json(UrlResponse::from_record(record, state.base_url())))
}

pub async fn update_url_status_handler(
    Path(id): Path<UrlId>,
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<UrlResponse>> {
    let record = state
        .service()
        .set_status(id, request.status, &caller)
        .await?;
    Ok(Json(UrlResponse::from_record(record, state.base_url())))
}

pub async fn delete_url_by_id_handler(
    Path(id): Path<UrlId>,
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<StatusCode> {
    state.service().delete_by_id(id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_url_by_code_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<UrlResponse>> {
    let code = ShortCode::new(&code)?;
    let record = state.service().get_by_short_code(&code, &caller).await?;
    Ok(Json(UrlResponse::from_record(record, state.base_url())))
}

pub async fn delete_url_by_code_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<StatusCode> {
    let code = ShortCode::new(&code)?;
    state.service().delete_by_short_code(&code, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let code = ShortCode::new(&code)?;
    let target = state.service().resolve_and_increment(&code).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, target)]).into_response())
}
