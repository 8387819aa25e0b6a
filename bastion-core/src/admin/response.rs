//! JSON response helpers for the admin surface

use crate::rbac::RbacError;
use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde_json::{json, Value};
use std::convert::Infallible;

pub type RespBody = BoxBody<Bytes, Infallible>;
pub type Resp = Response<RespBody>;

/// Create a response body from any data that can be converted to Bytes
pub fn body_from<T: Into<Bytes>>(data: T) -> RespBody {
    Full::new(data.into()).boxed()
}

pub fn json_response(status: StatusCode, body: &Value) -> Resp {
    let mut response = Response::new(body_from(body.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Success body: `{"status": "ok"}` merged with the fields of `extra`
pub fn ok_response(status: StatusCode, extra: Value) -> Resp {
    let mut body = json!({ "status": "ok" });
    if let (Value::Object(map), Value::Object(extra)) = (&mut body, extra) {
        map.extend(extra);
    }
    json_response(status, &body)
}

/// Create a JSON error response with given status code
pub fn json_error_response(status: StatusCode, error: &str, message: &str) -> Resp {
    json_response(status, &json!({ "error": error, "message": message }))
}

pub fn error_response(err: &RbacError) -> Resp {
    json_error_response(err.status(), err.code(), &err.to_string())
}

pub fn invalid_request_response(message: &str) -> Resp {
    json_error_response(StatusCode::BAD_REQUEST, "invalid_request", message)
}

/// Create a standard 404 Not Found JSON response
pub fn not_found_response(resource: &str) -> Resp {
    json_error_response(StatusCode::NOT_FOUND, "not_found", &format!("{} not found", resource))
}

/// Create a standard 405 Method Not Allowed JSON response
pub fn method_not_allowed_response() -> Resp {
    json_error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        "HTTP method not allowed for this endpoint",
    )
}
