//! Package and command documentation endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query as AxumQuery, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};

use gw_pkgdoc::Mode;

use crate::state::AppState;

/// `GET /pkg/`: the package index (the source root's doc page).
pub(crate) async fn index(
    State(state): State<Arc<AppState>>,
    AxumQuery(params): AxumQuery<HashMap<String, String>>,
) -> Response {
    doc_response(&state, "", "/pkg/", &params)
}

/// `GET /pkg/{import-path}/`.
pub(crate) async fn package(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    AxumQuery(params): AxumQuery<HashMap<String, String>>,
) -> Response {
    // Canonical doc URLs end in a slash.
    let Some(import_path) = path.strip_suffix('/') else {
        return redirect(&format!("/pkg/{path}/"));
    };
    doc_response(&state, import_path, &format!("/pkg/{path}"), &params)
}

/// `GET /cmd/{name}/`: commands live under `cmd/` in the source tree.
pub(crate) async fn command(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    AxumQuery(params): AxumQuery<HashMap<String, String>>,
) -> Response {
    let Some(name) = path.strip_suffix('/') else {
        return redirect(&format!("/cmd/{path}/"));
    };
    doc_response(
        &state,
        &format!("cmd/{name}"),
        &format!("/cmd/{path}"),
        &params,
    )
}

fn redirect(location: &str) -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, location.to_owned())],
    )
        .into_response()
}

/// Build and render one doc page.
fn doc_response(
    state: &AppState,
    import_path: &str,
    request_path: &str,
    params: &HashMap<String, String>,
) -> Response {
    let Some(docs) = &state.docs else {
        return not_found(state, request_path);
    };

    // The synthetic builtin package always renders with ALL|BUILTIN.
    let mode = if import_path == "builtin" {
        Mode::builtin()
    } else {
        params
            .get("m")
            .map(|m| Mode::from_query(m))
            .unwrap_or_default()
    };
    let goos = params.get("GOOS").map(String::as_str);
    let goarch = params.get("GOARCH").map(String::as_str);

    match docs.doc_page(import_path, mode, goos, goarch) {
        Ok(doc) => match state.site.render_doc_page(&doc, request_path) {
            Ok(html) => (StatusCode::OK, Html(html)).into_response(),
            Err(e) => {
                tracing::error!(path = %request_path, error = %e, "doc page render failed");
                not_found(state, request_path)
            }
        },
        Err(e) if e.is_not_found() => not_found(state, request_path),
        Err(e) => {
            tracing::error!(path = %request_path, error = %e, "doc page build failed");
            not_found(state, request_path)
        }
    }
}

fn not_found(state: &AppState, path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(state.site.not_found_page(path)),
    )
        .into_response()
}
