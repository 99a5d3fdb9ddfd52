use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::error::AppError;

/// Article code used as the base name of every renamed output file.
///
/// Always uppercase and starting with `B`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductCode(String);

impl ProductCode {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.starts_with('B') {
            Ok(ProductCode(normalized))
        } else {
            Err(AppError::Validation(format!(
                "Invalid code (must start with 'B'): {}",
                normalized
            )))
        }
    }

    /// Split a comma-separated list into valid and invalid codes, dropping
    /// empty entries.
    pub fn parse_list(raw: &str) -> CodeValidation {
        let mut validation = CodeValidation::default();
        for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match ProductCode::parse(entry) {
                Ok(code) => validation.valid.push(code),
                Err(_) => validation.invalid.push(entry.to_uppercase()),
            }
        }
        validation
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProductCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Codes split by validity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CodeValidation {
    pub valid: Vec<ProductCode>,
    pub invalid: Vec<String>,
}

impl CodeValidation {
    /// Fail-fast check used before any folder is touched.
    pub fn into_valid(self) -> Result<Vec<ProductCode>, AppError> {
        if !self.invalid.is_empty() {
            return Err(AppError::Validation(format!(
                "Invalid codes (must start with 'B'): {}",
                self.invalid.join(", ")
            )));
        }
        if self.valid.is_empty() {
            return Err(AppError::Validation("No product codes given".to_string()));
        }
        Ok(self.valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        let code = ProductCode::parse("  b0123 ").unwrap();
        assert_eq!(code.as_str(), "B0123");
        assert!(ProductCode::parse("A01").is_err());
        assert!(ProductCode::parse("").is_err());
    }

    #[test]
    fn test_parse_list_splits_validity() {
        let validation = ProductCode::parse_list("B01, b02,,x03 , ");
        assert_eq!(
            validation.valid.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            vec!["B01", "B02"]
        );
        assert_eq!(validation.invalid, vec!["X03"]);
    }

    #[test]
    fn test_into_valid_rejects_any_invalid() {
        let err = ProductCode::parse_list("B01,C02").into_valid().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("C02")));
        assert!(ProductCode::parse_list(" , ").into_valid().is_err());
        assert_eq!(ProductCode::parse_list("B1").into_valid().unwrap().len(), 1);
    }
}
