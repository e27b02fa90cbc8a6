//! The `metrics://` resource: exposes the local metrics store's recorded
//! history through the MCP resource surface, grounded on the teacher's
//! `resources/mod.rs` URI-templated resource handler.

use crate::protocol::{ReadResourceResult, ResourceContents, ResourceInfo, ResourceTemplate};
use crate::runtime::AppContext;
use sg_core::{CoreError, ErrorKind};

const URI_PREFIX: &str = "metrics://history/";

pub struct ResourceHandler<'a> {
    ctx: &'a AppContext,
}

impl<'a> ResourceHandler<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// There is no enumerable listing of every `(project, path, function)`
    /// key without scanning the whole store file up front; the resource
    /// surface advertises the template instead (spec.md §9's registry-value
    /// redesign note applies equally to resources: wire shape is a thin
    /// view over the store, not a second source of truth).
    pub fn list_resources(&self) -> Vec<ResourceInfo> {
        Vec::new()
    }

    pub fn list_templates(&self) -> Vec<ResourceTemplate> {
        vec![ResourceTemplate {
            uri_template: format!("{URI_PREFIX}{{project}}/{{path}}/{{function}}"),
            name: "Metrics history".to_string(),
            title: Some("Function metrics history".to_string()),
            description: Some(
                "Complexity/quality measurements recorded for one (project, path, function) key"
                    .to_string(),
            ),
            mime_type: Some("application/json".to_string()),
        }]
    }

    pub fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, CoreError> {
        let rest = uri.strip_prefix(URI_PREFIX).ok_or_else(|| {
            CoreError::new(ErrorKind::Internal, format!("unsupported resource URI: {uri}"))
        })?;

        let mut parts = rest.splitn(3, '/');
        let project = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::new(ErrorKind::Internal, "URI is missing a project segment"))?;
        let path = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::new(ErrorKind::Internal, "URI is missing a path segment"))?;
        let function = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::new(ErrorKind::Internal, "URI is missing a function segment"))?;

        let history = self
            .ctx
            .metrics_store
            .history(project, std::path::Path::new(path), function)
            .map_err(CoreError::from)?;

        let text = serde_json::to_string_pretty(&history)
            .map_err(|e| CoreError::new(ErrorKind::Internal, e.to_string()))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                name: format!("{function}.json"),
                title: Some(format!("{project}/{path}::{function}")),
                mime_type: Some("application/json".to_string()),
                text: Some(text),
                blob: None,
            }],
        })
    }
}
