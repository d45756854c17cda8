/// Hard translation failures. A rule that is merely outside its domain
/// declines with `Ok(None)` instead; errors are reserved for call sites we
/// positively recognize but cannot or must not lower.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{feature} requires PostgreSQL {major}.{minor} or later")]
    MinimumVersion {
        feature: &'static str,
        major: u32,
        minor: u32,
    },

    #[error("{operation}: argument {index} must be {expected}")]
    InvalidArgument {
        operation: &'static str,
        index: usize,
        expected: &'static str,
    },

    #[error("{operation} called with {got} arguments, expected {expected}")]
    IncorrectArgCount {
        operation: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("translation error: {0}")]
    Other(String),
}

/// The shared result shape for every translation rule: `Ok(None)` declines,
/// `Ok(Some(expr))` commits, `Err` surfaces to the user.
pub type TranslateResult = Result<Option<crate::expr::ExprRef>, Error>;
