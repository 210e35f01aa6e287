/// Middleware modules for the API server
///
/// Session resolution lives in `kanban_shared::auth::middleware`; this
/// module holds the HTTP-only layers.

pub mod security;
