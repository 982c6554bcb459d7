pub type ExprResult<T> = Result<T, ExprError>;

#[derive(thiserror::Error, Debug)]
pub enum ExprError {
    #[error("type error: {0}")]
    Type(String),

    #[error("usage error: {0}")]
    Usage(String),

    #[error("parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExprError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn parse(offset: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ExprError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(ExprError::type_error("x").to_string().contains("type error:"));
        assert!(ExprError::usage("x").to_string().contains("usage error:"));
        assert!(
            ExprError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ExprError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
        assert_eq!(
            ExprError::parse(7, "unexpected token").to_string(),
            "parse error at byte 7: unexpected token"
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ExprError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn json_errors_map_to_serde() {
        let err: ExprError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ExprError::Serde(_)));
    }
}
