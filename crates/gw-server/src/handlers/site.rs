//! Content dispatch: everything that is not package documentation.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query as AxumQuery, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};

use gw_site::{Query, SiteResponse};

use crate::state::AppState;

/// Handle any content path.
pub(crate) async fn content(
    State(state): State<Arc<AppState>>,
    AxumQuery(params): AxumQuery<HashMap<String, String>>,
    uri: Uri,
) -> Response {
    let query = site_query(&params);
    let resp = state.site.respond(uri.path(), &query);
    into_response(resp)
}

/// Translate URL query parameters into the dispatcher's query.
pub(crate) fn site_query(params: &HashMap<String, String>) -> Query {
    Query {
        text: params.get("m").is_some_and(|m| {
            m.split(',').any(|token| token.trim() == "text")
        }),
        highlight: params.get("h").filter(|h| !h.is_empty()).cloned(),
        selection: params.get("s").and_then(|s| parse_selection(s)),
    }
}

/// Parse `s=lo:hi` (half-open byte range, `lo < hi`).
pub(crate) fn parse_selection(s: &str) -> Option<(usize, usize)> {
    let (lo, hi) = s.split_once(':')?;
    let lo = lo.parse().ok()?;
    let hi = hi.parse().ok()?;
    if lo < hi { Some((lo, hi)) } else { None }
}

/// Map the engine's response onto HTTP.
pub(crate) fn into_response(resp: SiteResponse) -> Response {
    match resp {
        SiteResponse::Html(body) => (StatusCode::OK, Html(body)).into_response(),
        SiteResponse::Redirect(location) => (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, location)],
        )
            .into_response(),
        SiteResponse::Text(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response(),
        SiteResponse::Raw {
            content,
            content_type,
        } => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type)],
            content,
        )
            .into_response(),
        SiteResponse::NotFound(body) | SiteResponse::Error(body) => {
            (StatusCode::NOT_FOUND, Html(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("10:20"), Some((10, 20)));
        assert_eq!(parse_selection("20:10"), None);
        assert_eq!(parse_selection("10:10"), None);
        assert_eq!(parse_selection("x:y"), None);
        assert_eq!(parse_selection("10"), None);
    }

    #[test]
    fn test_site_query_text_mode() {
        assert!(site_query(&params(&[("m", "text")])).text);
        assert!(site_query(&params(&[("m", "all,text")])).text);
        assert!(!site_query(&params(&[("m", "all")])).text);
        assert!(!site_query(&params(&[])).text);
    }

    #[test]
    fn test_site_query_highlight_and_selection() {
        let q = site_query(&params(&[("h", "func.*main"), ("s", "5:9")]));
        assert_eq!(q.highlight.as_deref(), Some("func.*main"));
        assert_eq!(q.selection, Some((5, 9)));

        let q = site_query(&params(&[("h", "")]));
        assert_eq!(q.highlight, None);
    }

    #[test]
    fn test_redirect_is_301() {
        let resp = into_response(SiteResponse::Redirect("/doc/x/".to_owned()));
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/doc/x/"
        );
    }

    #[test]
    fn test_not_found_is_404_html() {
        let resp = into_response(SiteResponse::NotFound("<h1>gone</h1>".to_owned()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
