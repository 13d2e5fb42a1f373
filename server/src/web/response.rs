// grocer_server/src/web/response.rs

//! Success envelope shared by every handler: `{ errCode: 0, message, data }`.

use actix_web::HttpResponse;
use grocer::ErrCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
  pub err_code: ErrCode,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<T>,
}

pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
  HttpResponse::Ok().json(Envelope {
    err_code: ErrCode::Ok,
    message: message.to_string(),
    data: Some(data),
  })
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
  HttpResponse::Created().json(Envelope {
    err_code: ErrCode::Ok,
    message: message.to_string(),
    data: Some(data),
  })
}

pub fn message(message: &str) -> HttpResponse {
  HttpResponse::Ok().json(Envelope::<()> {
    err_code: ErrCode::Ok,
    message: message.to_string(),
    data: None,
  })
}
