//! Tool registry (spec.md §9: "decorator-based tool registration becomes a
//! registry value built at startup from a list of `(ToolDescriptor,
//! Handler)` pairs; the wire layer is a thin dispatch table over this
//! registry").

use crate::protocol::ToolInfo;
use crate::runtime::AppContext;
use sg_core::CoreError;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, CoreError>> + Send + 'a>>;
pub type ToolHandler =
    Box<dyn for<'a> Fn(&'a AppContext, Option<Value>) -> ToolFuture<'a> + Send + Sync>;

pub struct Registry {
    entries: Vec<(ToolInfo, ToolHandler)>,
}

impl Registry {
    pub fn new(entries: Vec<(ToolInfo, ToolHandler)>) -> Self {
        Self { entries }
    }

    pub fn list(&self) -> Vec<ToolInfo> {
        self.entries.iter().map(|(info, _)| info.clone()).collect()
    }

    pub async fn call(
        &self,
        ctx: &AppContext,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<Value, CoreError> {
        match self.entries.iter().find(|(info, _)| info.name == name) {
            Some((_, handler)) => handler(ctx, arguments).await,
            None => Err(CoreError::new(
                sg_core::ErrorKind::Internal,
                format!("unknown tool: {name}"),
            )),
        }
    }
}
