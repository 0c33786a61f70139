pub type StageResult<T> = Result<T, StageError>;

#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("initialization error: {0}")]
    Init(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for StageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            StageError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            StageError::init("x")
                .to_string()
                .contains("initialization error:")
        );
        assert!(StageError::render("x").to_string().contains("render error:"));
        assert!(StageError::asset("x").to_string().contains("asset error:"));
        assert!(
            StageError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = StageError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn json_errors_map_to_serde() {
        let err: StageError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, StageError::Serde(_)));
    }
}
