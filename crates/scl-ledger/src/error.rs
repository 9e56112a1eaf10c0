use scl_tx::FailedAuthorizations;
use scl_types::GlobalKey;
use thiserror::Error;

/// Expected commit rejections, returned as values. Anything else that can
/// go wrong during a commit is an invariant violation and crashes the
/// ledger instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitError {
    #[error("transaction failed authorization on {} node(s)", failed.len())]
    FailedAuthorizations { failed: FailedAuthorizations },

    #[error("contract key for template {} is already taken by an active contract", key.template_id)]
    UniqueKeyViolation { key: GlobalKey },
}
