/// Ownership checks along the project hierarchy
///
/// Every board, list, card, task and comment belongs to exactly one user:
/// the owner of the project at the top of its parent chain. Creating or
/// moving a resource under a parent requires owning that parent.

use sqlx::PgPool;
use std::fmt;

/// A resource that other resources can be created under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Project(i64),
    Board(i64),
    List(i64),
    Task(i64),
}

impl Parent {
    pub fn id(&self) -> i64 {
        match *self {
            Parent::Project(id) | Parent::Board(id) | Parent::List(id) | Parent::Task(id) => id,
        }
    }

    /// Lowercase name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Parent::Project(_) => "project",
            Parent::Board(_) => "board",
            Parent::List(_) => "list",
            Parent::Task(_) => "task",
        }
    }

    fn forbidden_message(&self) -> &'static str {
        match self {
            Parent::Project(_) => "You do not have permission to create a board in this project.",
            Parent::Board(_) => "You do not have permission to create a list in this board.",
            Parent::List(_) => "You do not have permission to add items to this list.",
            Parent::Task(_) => "You do not have permission to comment on this task.",
        }
    }

    fn owner_query(&self) -> &'static str {
        match self {
            Parent::Project(_) => "SELECT owner_id FROM projects WHERE id = $1",
            Parent::Board(_) => {
                "SELECT p.owner_id FROM boards b
                 JOIN projects p ON p.id = b.project_id
                 WHERE b.id = $1"
            }
            Parent::List(_) => {
                "SELECT p.owner_id FROM lists l
                 JOIN boards b ON b.id = l.board_id
                 JOIN projects p ON p.id = b.project_id
                 WHERE l.id = $1"
            }
            Parent::Task(_) => {
                "SELECT p.owner_id FROM tasks t
                 JOIN lists l ON l.id = t.list_id
                 JOIN boards b ON b.id = l.board_id
                 JOIN projects p ON p.id = b.project_id
                 WHERE t.id = $1"
            }
        }
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// Error type for ownership checks
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Parent exists but belongs to someone else
    #[error("{0}")]
    Forbidden(String),

    /// Referenced parent does not exist
    #[error("Invalid pk \"{id}\" - {kind} does not exist.")]
    ParentNotFound { kind: &'static str, id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Looks up the user at the top of `parent`'s ownership chain
pub async fn owner_of(pool: &PgPool, parent: Parent) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(parent.owner_query())
        .bind(parent.id())
        .fetch_optional(pool)
        .await
}

/// Checks that `parent` exists and is owned by `user_id`
pub async fn require_parent_owner(
    pool: &PgPool,
    parent: Parent,
    user_id: i64,
) -> Result<(), AccessError> {
    let owner = owner_of(pool, parent).await?;
    check_owner(parent, owner, user_id)
}

fn check_owner(parent: Parent, owner: Option<i64>, user_id: i64) -> Result<(), AccessError> {
    match owner {
        None => Err(AccessError::ParentNotFound {
            kind: parent.kind(),
            id: parent.id(),
        }),
        Some(owner) if owner == user_id => Ok(()),
        Some(_) => {
            tracing::debug!(%parent, user_id, "Rejected write to unowned parent");
            Err(AccessError::Forbidden(parent.forbidden_message().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_accessors() {
        assert_eq!(Parent::Board(9).id(), 9);
        assert_eq!(Parent::Board(9).kind(), "board");
        assert_eq!(Parent::Task(2).to_string(), "task 2");
    }

    #[test]
    fn test_check_owner_allows_owner() {
        assert!(check_owner(Parent::Project(1), Some(7), 7).is_ok());
    }

    #[test]
    fn test_check_owner_rejects_other_user() {
        let err = check_owner(Parent::Project(1), Some(7), 8).unwrap_err();
        assert_eq!(
            err.to_string(),
            "You do not have permission to create a board in this project."
        );
    }

    #[test]
    fn test_check_owner_missing_parent() {
        let err = check_owner(Parent::List(42), None, 8).unwrap_err();
        assert!(matches!(err, AccessError::ParentNotFound { kind: "list", id: 42 }));
        assert_eq!(err.to_string(), "Invalid pk \"42\" - list does not exist.");
    }

    #[test]
    fn test_owner_queries_reach_projects() {
        for parent in [Parent::Project(1), Parent::Board(1), Parent::List(1), Parent::Task(1)] {
            let sql = parent.owner_query();
            assert!(sql.starts_with("SELECT") && sql.contains("owner_id"));
            assert!(sql.trim_end().ends_with("id = $1"));
        }
    }
}
