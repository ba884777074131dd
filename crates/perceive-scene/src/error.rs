use std::fmt;

#[derive(Debug)]
pub enum SceneError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Io(e) => write!(f, "I/O error: {e}"),
            SceneError::Parse(e) => write!(f, "scenario parse error: {e}"),
            SceneError::Invalid(msg) => write!(f, "invalid scenario: {msg}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Io(e) => Some(e),
            SceneError::Parse(e) => Some(e),
            SceneError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for SceneError {
    fn from(e: std::io::Error) -> Self {
        SceneError::Io(e)
    }
}

impl From<toml::de::Error> for SceneError {
    fn from(e: toml::de::Error) -> Self {
        SceneError::Parse(e)
    }
}

pub type Result<T> = std::result::Result<T, SceneError>;
