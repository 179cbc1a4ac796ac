use crate::prompb::ReadRequest;
use crate::reader::Reader;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

pub async fn read_handler(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
) -> Result<Response, StatusCode> {
    debug!("Received read request");

    let mut req = req;
    let body_bytes = match to_bytes(req.body_mut(), state.max_request_body_bytes).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read request body: {:?}", e);
            return Err(e);
        }
    };

    // An empty body or a JSON `null` is an absent request
    let read_req: Option<ReadRequest> = if body_bytes.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice(&body_bytes) {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to parse read request: {}", e);
                return Err(StatusCode::BAD_REQUEST);
            }
        }
    };

    match state.reader.read(read_req.as_ref()).await {
        Ok(Some(resp)) => {
            debug!("Answered {} quer(ies)", resp.results.len());
            Ok((StatusCode::OK, Json(resp)).into_response())
        }
        Ok(None) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => {
            error!("Read failed: {:#}", e);
            let body = json!({ "error": e.to_string() });
            Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response())
        }
    }
}

// Helper to read the full body with size limit
async fn to_bytes(body: &mut Body, max_size: usize) -> Result<Bytes, StatusCode> {
    use axum::body::HttpBody;
    use bytes::BytesMut;

    let mut buf = BytesMut::new();
    let mut total_size: usize = 0;

    while let Some(chunk_res) = body.data().await {
        let chunk = match chunk_res {
            Ok(chunk) => chunk,
            Err(_) => return Err(StatusCode::BAD_REQUEST),
        };

        // Check for overflow and size limit
        total_size = match total_size.checked_add(chunk.len()) {
            Some(new_size) if new_size <= max_size => new_size,
            _ => return Err(StatusCode::PAYLOAD_TOO_LARGE),
        };

        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}
