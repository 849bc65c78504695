//! Error type shared by the normalisation rewriters, the static analyzer and the explorer.
//!
//! None of these errors are retried internally: the caller decides whether to abort
//! the whole run or to skip the offending equation.

/// Errors raised by the PBES pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A precondition was violated, e.g. the input is not in BQNF, or a rewriter
    /// produced an equation that fails the PPG re-check.
    #[error("validation failed for equation '{equation}': {reason}")]
    Validation { equation: String, reason: String },

    /// An expression shape outside the handled grammar was met in the middle of a pass.
    #[error("unexpected expression in {context}: {expr}")]
    Structural { context: String, expr: String },

    /// A parameter value is missing while building or decoding a state vector.
    #[error("no value in {context}")]
    NoValue { context: String },

    /// Lookup of an unknown name, signature, group, label or intern-table index.
    #[error("unknown {kind}: {key}")]
    Index { kind: &'static str, key: String },
}

impl Error {
    pub fn validation(equation: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            equation: equation.into(),
            reason: reason.into(),
        }
    }

    pub fn structural(context: impl Into<String>, expr: impl ToString) -> Self {
        Error::Structural {
            context: context.into(),
            expr: expr.to_string(),
        }
    }

    pub fn no_value(context: impl Into<String>) -> Self {
        Error::NoValue {
            context: context.into(),
        }
    }

    pub fn index(kind: &'static str, key: impl ToString) -> Self {
        Error::Index {
            kind,
            key: key.to_string(),
        }
    }

    /// Error for a recursive pass that went deeper than its configured guard.
    pub fn too_deep(context: &str, max_depth: usize) -> Self {
        Error::Structural {
            context: context.to_string(),
            expr: format!("nesting deeper than {}", max_depth),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = Error::validation("X", "input not in BQNF");
        assert_eq!(e.to_string(), "validation failed for equation 'X': input not in BQNF");

        let e = Error::index("variable", "Y");
        assert_eq!(e.to_string(), "unknown variable: Y");

        let e = Error::too_deep("to_ppg", 8);
        assert!(e.to_string().contains("nesting deeper than 8"));
    }
}
