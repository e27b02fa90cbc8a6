//! MCP tool registry and stdio JSON-RPC dispatch over the structural
//! analysis core (spec.md §6 "Deliberately out of scope": wire framing,
//! tool registration, argument validation and CLI entry points are not part
//! of the core itself, but a thin collaborator layer still needs to exist
//! to make the tools reachable — this crate is that layer).

pub mod protocol;
pub mod registry;
pub mod resources;
pub mod runtime;
pub mod server;
pub mod tools;
pub mod transport;

pub use registry::Registry;
pub use runtime::AppContext;
pub use server::McpServer;
