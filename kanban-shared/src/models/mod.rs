/// Database models and their SQL operations
///
/// Accounts ([`user`], [`session`]) are plain models with associated
/// functions. The six kanban entities implement [`resource::Resource`], the
/// owner-scoped CRUD contract the HTTP layer is generic over.
///
/// # Hierarchy
///
/// ```text
/// User ── Project ── Board ── List ─┬─ Card
///                                   └─ Task ── Comment
/// ```

pub mod board;
pub mod card;
pub mod comment;
pub mod list;
pub mod project;
pub mod resource;
pub mod session;
pub mod task;
pub mod user;

pub use board::Board;
pub use card::Card;
pub use comment::Comment;
pub use list::List;
pub use project::Project;
pub use resource::Resource;
pub use session::Session;
pub use task::{Priority, Task};
pub use user::User;
