use actix_multipart::Multipart;
use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::inference::ModelSet;
use crate::models::{HealthResponse, PredictionResponse};
use crate::preprocess;

const INDEX_HTML: &str = include_str!("../static/index.html");

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict/{disease}").route(web::post().to(predict)));
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

pub async fn health(models: web::Data<ModelSet>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        models: models.serving_keys(),
    })
}

pub async fn predict(
    disease: web::Path<String>,
    payload: Multipart,
    models: web::Data<ModelSet>,
) -> Result<HttpResponse, ServiceError> {
    let key = disease.into_inner();
    let request_id = Uuid::new_v4();

    let model = models
        .get(&key)
        .ok_or_else(|| ServiceError::UnknownDisease(key.clone()))?;

    let upload = read_file_field(payload).await?;
    tracing::debug!("[{request_id}] {key}: received {} byte upload", upload.len());

    let tensor = preprocess::tensor_from_bytes(&upload)?;
    let prediction = model.predict(&tensor)?;
    let confidence = round2(prediction.confidence);
    tracing::info!(
        "[{request_id}] {key}: {} ({confidence:.2}%)",
        prediction.label
    );

    Ok(HttpResponse::Ok().json(PredictionResponse {
        disease: key,
        predicted_class: prediction.label,
        confidence,
    }))
}

/// Pulls the uploaded image out of the multipart stream.
///
/// Parts without a filename are form values, not uploads, and are skipped;
/// a `file` part carrying an empty filename means nothing was selected in
/// the browser.
async fn read_file_field(mut payload: Multipart) -> Result<Vec<u8>, ServiceError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ServiceError::Multipart(e.to_string()))?;

        let disposition = field.content_disposition();
        if disposition.get_name() != Some("file") {
            continue;
        }
        let filename = match disposition.get_filename() {
            Some(name) => name.to_owned(),
            None => continue,
        };
        if filename.is_empty() {
            return Err(ServiceError::EmptyFilename);
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ServiceError::Multipart(e.to_string()))?;
            data.extend_from_slice(&chunk);
        }
        return Ok(data);
    }

    Err(ServiceError::MissingFilePart)
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
