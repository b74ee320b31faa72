//! Ordered-fallback static file resolution.

use std::io;
use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::files::inject::{inject_before_body_close, is_injectable, CLIENT_SCRIPT};

/// What a resolution attempt produced. `NotFound` and `Error` delegate the
/// actual response to the caller's status defaults.
pub enum Outcome {
    Served(Response),
    NotFound,
    Error(io::Error),
}

/// How the winning file gets onto the wire.
pub enum ServeMode<'a> {
    /// Stream through the file service, with the request context available
    /// for conditional/range negotiation.
    Stream {
        method: &'a Method,
        uri: &'a Uri,
        headers: &'a HeaderMap,
    },
    /// Read fully and send as one buffered response. Used for injectable
    /// documents and for every non-200 body.
    Buffer,
}

pub struct ResolveContext<'a> {
    /// Live-reload mode: injectable documents get the client script.
    pub inject: bool,
    pub mode: ServeMode<'a>,
}

/// Walk `candidates` in registration order looking for `relative`, serving
/// the first hit. A directory retargets to its `index.html`. Only a true
/// not-found advances the chain; any other stat error aborts immediately.
pub async fn resolve(
    candidates: &[PathBuf],
    relative: &str,
    ctx: ResolveContext<'_>,
) -> Outcome {
    let Some(relative) = sanitize(relative) else {
        return Outcome::NotFound;
    };

    for dir in candidates {
        match locate(&dir.join(&relative)).await {
            Located::Missing => continue,
            Located::Failed(err) => return Outcome::Error(err),
            Located::File(target) => return serve_file(&target, ctx).await,
        }
    }

    Outcome::NotFound
}

/// Single-candidate resolution, used by the response senders' `file`
/// capability and by status-default body files.
pub async fn serve_single(path: &Path, ctx: ResolveContext<'_>) -> Outcome {
    match locate(path).await {
        Located::Missing => Outcome::NotFound,
        Located::Failed(err) => Outcome::Error(err),
        Located::File(target) => serve_file(&target, ctx).await,
    }
}

enum Located {
    File(PathBuf),
    Missing,
    Failed(io::Error),
}

async fn locate(path: &Path) -> Located {
    match tokio::fs::metadata(path).await {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Located::Missing,
        Err(err) => Located::Failed(err),
        Ok(meta) if meta.is_dir() => {
            let index = path.join("index.html");
            match tokio::fs::metadata(&index).await {
                Err(err) if err.kind() == io::ErrorKind::NotFound => Located::Missing,
                Err(err) => Located::Failed(err),
                Ok(_) => Located::File(index),
            }
        }
        Ok(_) => Located::File(path.to_path_buf()),
    }
}

/// Reject traversal out of the candidate directories. The relative path
/// comes percent-decoded from the greedy route variable, so `..` and rooted
/// components can appear in it.
fn sanitize(relative: &str) -> Option<PathBuf> {
    let path = Path::new(relative);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(clean)
}

async fn serve_file(target: &Path, ctx: ResolveContext<'_>) -> Outcome {
    let injectable = is_injectable(target);

    match ctx.mode {
        ServeMode::Buffer => serve_buffered(target, injectable && ctx.inject).await,
        ServeMode::Stream {
            method,
            uri,
            headers,
        } => {
            if injectable && ctx.inject {
                serve_buffered(target, true).await
            } else {
                serve_streamed(target, method, uri, headers).await
            }
        }
    }
}

async fn serve_buffered(target: &Path, inject: bool) -> Outcome {
    let doc = match tokio::fs::read(target).await {
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Outcome::NotFound,
        Err(err) => return Outcome::Error(err),
        Ok(doc) => doc,
    };
    let doc = if inject {
        inject_before_body_close(doc, CLIENT_SCRIPT)
    } else {
        doc
    };
    let mime = content_type(target);
    Outcome::Served(
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime)],
            doc,
        )
            .into_response(),
    )
}

async fn serve_streamed(
    target: &Path,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Outcome {
    let mut request = Request::new(Body::empty());
    *request.method_mut() = method.clone();
    *request.uri_mut() = uri.clone();
    *request.headers_mut() = headers.clone();

    let response = match ServeFile::new(target).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    if response.status() == StatusCode::NOT_FOUND {
        // The stat said the target existed; if it turned into a directory in
        // the meantime, send the browser to the slash-terminated URL instead
        // of a 404.
        let is_dir = tokio::fs::metadata(target)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if is_dir {
            return Outcome::Served(redirect_to_directory(uri));
        }
        return Outcome::NotFound;
    }

    Outcome::Served(response)
}

fn redirect_to_directory(uri: &Uri) -> Response {
    let location = format!("{}/", uri.path().trim_end_matches('/'));
    match header::HeaderValue::from_str(&location) {
        Ok(value) => {
            let mut response = StatusCode::MOVED_PERMANENTLY.into_response();
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

fn content_type(target: &Path) -> String {
    if target.extension().is_none() {
        // Extensionless files only reach the buffered path as injectable
        // documents.
        return mime_guess::mime::TEXT_HTML_UTF_8.to_string();
    }
    mime_guess::from_path(target)
        .first_or_octet_stream()
        .to_string()
}
