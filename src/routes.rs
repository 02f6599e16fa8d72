use std::sync::Arc;
use actix_web::{web, HttpResponse};
use log::{info, warn};

use crate::error::ApiError;
use crate::models::*;
use crate::notify::Notifier;
use crate::repo::DocumentRepo;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(web::resource("/health").route(web::get().to(health)))
            .service(
                web::scope("/dense")
                    .service(web::resource("/comment").route(web::post().to(create_comment)))
                    .service(web::resource("/account").route(web::post().to(create_account_request)))
                    .service(web::resource("/report").route(web::post().to(create_report))),
            ),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<DocumentRepo>,
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl AppState {
    pub fn new(repo: DocumentRepo) -> Self {
        Self { repo: Arc::new(repo), notifier: None }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

fn ok() -> HttpResponse {
    HttpResponse::Ok().json(OkResponse { ok: true })
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Liveness probe", body = HealthResponse))
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { ok: true, ts: chrono::Utc::now().timestamp_millis() })
}

#[utoipa::path(
    post,
    path = "/api/dense/comment",
    request_body = NewComment,
    responses(
        (status = 200, description = "Comment appended", body = OkResponse),
        (status = 400, description = "slug and body required"),
        (status = 500, description = "failed to save comment")
    )
)]
pub async fn create_comment(data: web::Data<AppState>, payload: web::Json<NewComment>) -> Result<HttpResponse, ApiError> {
    let (slug, record) = payload.into_inner().into_record().ok_or(ApiError::Validation("slug and body required"))?;
    data.repo
        .append_comment(&slug, record)
        .await
        .map_err(|e| ApiError::from_repo(e, "failed to save comment"))?;
    info!("comment appended to {slug}");
    Ok(ok())
}

#[utoipa::path(
    post,
    path = "/api/dense/account",
    request_body = NewAccountRequest,
    responses(
        (status = 200, description = "Request appended", body = OkResponse),
        (status = 400, description = "email required"),
        (status = 500, description = "failed to save account")
    )
)]
pub async fn create_account_request(data: web::Data<AppState>, payload: web::Json<NewAccountRequest>) -> Result<HttpResponse, ApiError> {
    let record = payload.into_inner().into_record(timestamp_now()).ok_or(ApiError::Validation("email required"))?;
    data.repo
        .append_account_request(record.clone())
        .await
        .map_err(|e| ApiError::from_repo(e, "failed to save account"))?;
    if let Some(notifier) = &data.notifier {
        // the request is already persisted; a failed notification is only logged
        if let Err(e) = notifier.account_requested(&record).await {
            warn!("account request notification failed: {e}");
        }
    }
    Ok(ok())
}

#[utoipa::path(
    post,
    path = "/api/dense/report",
    request_body = NewReport,
    responses(
        (status = 200, description = "Report appended", body = OkResponse),
        (status = 400, description = "slug and reason required"),
        (status = 500, description = "failed to save report")
    )
)]
pub async fn create_report(data: web::Data<AppState>, payload: web::Json<NewReport>) -> Result<HttpResponse, ApiError> {
    let record = payload.into_inner().into_record(timestamp_now()).ok_or(ApiError::Validation("slug and reason required"))?;
    let slug = record.slug.clone();
    data.repo
        .append_report(record)
        .await
        .map_err(|e| ApiError::from_repo(e, "failed to save report"))?;
    info!("moderation report filed for {slug}");
    Ok(ok())
}
