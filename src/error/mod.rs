use thiserror::Error;

#[derive(Error, Debug)]
pub enum HashWatchError {
    #[error("Failed to load state: {0}")]
    StoreLoad(String),

    #[error("Failed to save state: {0}")]
    StoreWrite(String),

    #[error("Threat lookup error: {0}")]
    Lookup(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not read file: {0}")]
    FileUnreadable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HashWatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err: HashWatchError = parse.into();
        assert!(matches!(err, HashWatchError::Json(_)));
        assert!(err.to_string().starts_with("JSON error: "));
    }

    #[test]
    fn test_store_errors_name_the_operation() {
        let load = HashWatchError::StoreLoad("./fim_data.json not found".into());
        let write = HashWatchError::StoreWrite("./fim_data.json: denied".into());
        assert_eq!(load.to_string(), "Failed to load state: ./fim_data.json not found");
        assert_eq!(write.to_string(), "Failed to save state: ./fim_data.json: denied");
    }
}
