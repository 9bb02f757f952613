use thiserror::Error;

/// Fatal scene construction errors. Assembly of the current top-level entry
/// stops and everything it built is rolled back.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("node type `{0}` is already registered")]
    DuplicateType(String),

    #[error("unknown node type `{0}`")]
    UnknownType(String),

    #[error("object name `{0}` is already used by another node")]
    DuplicateName(String),

    #[error("factory for `{tag}` failed: {source}")]
    Factory {
        tag: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Recoverable configuration mistake in a spec: logged, the offending value
/// (or entry) is skipped and assembly continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecIssue {
    #[error("spec entry is not an object: {0}")]
    NotAnObject(String),

    #[error("spec has no `type` field")]
    MissingType,

    #[error("`{field}` on `{owner}` should be {expected}")]
    InvalidField {
        owner: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("`{child}` cannot be placed under its own descendant `{parent}`")]
    ParentCycle { child: String, parent: String },
}
