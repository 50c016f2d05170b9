//! Template evaluation and layout composition.

use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::{AutoEscape, Environment, Value};

use gw_vfs::path_dir;

use crate::error::SiteError;
use crate::funcs;
use crate::layout::find_layout;
use crate::page::Page;
use crate::site::SiteInner;

/// Build the template environment for one render: function set, include
/// loader, HTML auto-escaping.
pub(crate) fn base_env(
    site: &Arc<SiteInner>,
    page_dir: &str,
    request_path: &str,
) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);

    let vfs = Arc::clone(site.vfs_arc());
    env.set_loader(move |name| {
        match vfs.read_to_string(name.trim_start_matches('/')) {
            Ok(source) => Ok(Some(source)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(minijinja::Error::new(
                minijinja::ErrorKind::InvalidOperation,
                e.to_string(),
            )),
        }
    });

    funcs::register(
        &mut env,
        Arc::clone(site),
        page_dir.to_owned(),
        request_path.to_owned(),
    );
    env
}

/// Template context from a page map, with `content` injected as safe HTML
/// once rendered.
pub(crate) fn page_context(page: &Page, content: Option<String>) -> Value {
    let mut map: BTreeMap<String, Value> = page
        .data()
        .iter()
        .map(|(k, v)| (k.clone(), Value::from_serialize(v)))
        .collect();
    if let Some(content) = content {
        map.insert("content".to_owned(), Value::from_safe_string(content));
    }
    Value::from_iter(map)
}

/// Render a page to its final HTML.
///
/// The body is template-expanded first when the page says so, Markdown
/// sources are rendered to HTML, and the resolved layout wraps the result.
/// `layout: none` (or no default layout) leaves the bare content.
pub(crate) fn render_page(
    site: &Arc<SiteInner>,
    page: &Page,
    request_path: &str,
) -> Result<String, SiteError> {
    let page_dir = path_dir(page.file()).to_owned();
    let mut env = base_env(site, &page_dir, request_path);

    let mut body = page.file_data().to_owned();
    if page.is_template() {
        env.add_template_owned("__body__".to_owned(), body)?;
        body = env
            .get_template("__body__")?
            .render(page_context(page, None))?;
    }

    let content = if page.file().ends_with(".md") {
        gw_markdown::to_html(&body)
    } else {
        body
    };

    let layout_name = page.layout();
    if layout_name == "none" {
        return Ok(content);
    }
    let Some(layout_path) = find_layout(site.vfs(), &page_dir, layout_name) else {
        if layout_name.is_empty() {
            return Ok(content);
        }
        return Err(SiteError::LayoutNotFound(layout_name.to_owned()));
    };

    let source = site.vfs().read_to_string(&layout_path)?;
    env.add_template_owned(layout_path.clone(), source)?;
    let rendered = env
        .get_template(&layout_path)?
        .render(page_context(page, Some(content)))?;
    Ok(rendered)
}

/// Render a named layout with an ad-hoc context (error pages, directory
/// listings, package docs). Returns `None` when the layout doesn't exist so
/// callers can fall back to builtin markup.
pub(crate) fn render_layout(
    site: &Arc<SiteInner>,
    name: &str,
    ctx: Value,
    request_path: &str,
) -> Result<Option<String>, SiteError> {
    let Some(layout_path) = find_layout(site.vfs(), ".", name) else {
        return Ok(None);
    };
    let mut env = base_env(site, ".", request_path);
    let source = site.vfs().read_to_string(&layout_path)?;
    env.add_template_owned(layout_path.clone(), source)?;
    let rendered = env.get_template(&layout_path)?.render(ctx)?;
    Ok(Some(rendered))
}
