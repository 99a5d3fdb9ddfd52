use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Remote store backend types
///
/// Defined in core because configuration selects the backend before the
/// storage crate builds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Folder tree mirrored into a directory on the local filesystem
    Local,
    /// Volatile in-memory tree (dry runs and tests)
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StoreBackend::Local),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid store backend: {}", s)),
        }
    }
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StoreBackend::Local => write!(f, "local"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_from_str() {
        assert_eq!("local".parse::<StoreBackend>().unwrap(), StoreBackend::Local);
        assert_eq!("MEMORY".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("s3".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_store_backend_display() {
        assert_eq!(StoreBackend::Local.to_string(), "local");
        assert_eq!(StoreBackend::Memory.to_string(), "memory");
    }
}
