//! HTTP transport
//!
//! `POST /` with a form body computes a change-set. Every other path is a
//! file fetch, for both GET and POST. Blocking work (hashing, path
//! resolution, opening files) runs on the blocking pool; file bodies are
//! streamed.

use crate::api::{DiffResponse, GameConfService};
use crate::config::GameConfConfig;
use crate::diff::RequestFields;
use crate::error::{RequestError, ServerError};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Form, FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

/// Response header naming the operator of this server.
pub const ATTRIBUTION_HEADER: &str = "x-gcup-src";

/// Largest accepted request body.
pub const MAX_REQUEST_BODY: usize = 1024 * 1024;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<GameConfService>,
    pub attribution: HeaderValue,
}

impl AppState {
    pub fn new(service: Arc<GameConfService>, attribution: HeaderValue) -> Self {
        Self {
            service,
            attribution,
        }
    }
}

/// Router with every route and middleware installed.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(fetch_file).post(submit_diff))
        .fallback(fetch_file)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY))
        .layer(middleware::from_fn_with_state(
            state.attribution.clone(),
            attribution_middleware,
        ))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &GameConfConfig, service: GameConfService) -> Result<(), ServerError> {
    let attribution = HeaderValue::from_str(config.attribution.source.trim())
        .map_err(|e| ServerError::ConfigError(format!("Invalid attribution source: {}", e)))?;
    let app = build_app(AppState::new(Arc::new(service), attribution));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!(address = %listener.local_addr()?, "Gameconf server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gameconf server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn attribution_middleware(
    State(attribution): State<HeaderValue>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(ATTRIBUTION_HEADER, attribution);
    response
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}

/// Form encodings a diff request may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormEncoding {
    UrlEncoded,
    Multipart,
}

fn form_encoding(request: &Request) -> Option<FormEncoding> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)?
        .to_str()
        .ok()?
        .trim()
        .to_ascii_lowercase();
    if content_type.starts_with("application/x-www-form-urlencoded") {
        Some(FormEncoding::UrlEncoded)
    } else if content_type.starts_with("multipart/form-data") {
        Some(FormEncoding::Multipart)
    } else {
        None
    }
}

async fn submit_diff(State(state): State<AppState>, request: Request) -> Response {
    let fields = match form_encoding(&request) {
        Some(FormEncoding::UrlEncoded) => read_urlencoded(request).await,
        Some(FormEncoding::Multipart) => read_multipart(request).await,
        None => {
            debug!("POST / without form body, treating as GET");
            return not_found();
        }
    };

    let response = match fields {
        Ok(fields) => {
            let service = Arc::clone(&state.service);
            match tokio::task::spawn_blocking(move || service.diff(&fields)).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, "Diff task failed");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
        }
        Err(error) => DiffResponse::Errors(error),
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TEXT_PLAIN)],
        response.to_body(),
    )
        .into_response()
}

async fn read_urlencoded(request: Request) -> Result<RequestFields, RequestError> {
    let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &())
        .await
        .map_err(|e| {
            debug!(error = %e, "Undecodable urlencoded body");
            RequestError::Malformed
        })?;
    Ok(pairs.into_iter().collect())
}

async fn read_multipart(request: Request) -> Result<RequestFields, RequestError> {
    let mut multipart = Multipart::from_request(request, &()).await.map_err(|e| {
        debug!(error = %e, "Undecodable multipart body");
        RequestError::Malformed
    })?;

    let mut fields = RequestFields::new();
    loop {
        let field = multipart.next_field().await.map_err(|e| {
            debug!(error = %e, "Malformed multipart field");
            RequestError::Malformed
        })?;
        let Some(field) = field else {
            break;
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await.map_err(|_| RequestError::Malformed)?;
        fields.insert(name, value);
    }
    Ok(fields)
}

async fn fetch_file(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD && method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let requested = match percent_decode_str(uri.path()).decode_utf8() {
        Ok(path) => path.into_owned(),
        Err(_) => return not_found(),
    };

    let service = Arc::clone(&state.service);
    let resolved = match tokio::task::spawn_blocking(move || service.fetch(&requested)).await {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(error = %e, "Fetch task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Some(resolved) = resolved else {
        return not_found();
    };

    let len = resolved.len;
    let stream = ReaderStream::new(tokio::fs::File::from_std(resolved.file));
    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, TEXT_PLAIN)
        .header(header::CONTENT_LENGTH, len)
        .body(Body::from_stream(stream))
    {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Failed to build file response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, [(header::CONTENT_TYPE, TEXT_PLAIN)], "").into_response()
}
