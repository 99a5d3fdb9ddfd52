use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

/// Country markers recognised in folder names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CountryCode {
    Es,
    De,
    Fr,
    It,
    Uk,
    Ne,
    Pl,
    Se,
}

impl CountryCode {
    /// Detection priority order.
    pub const ALL: [CountryCode; 8] = [
        CountryCode::Es,
        CountryCode::De,
        CountryCode::Fr,
        CountryCode::It,
        CountryCode::Uk,
        CountryCode::Ne,
        CountryCode::Pl,
        CountryCode::Se,
    ];

    /// Two-letter marker as it appears in folder names.
    pub fn token(self) -> &'static str {
        match self {
            CountryCode::Es => "ES",
            CountryCode::De => "DE",
            CountryCode::Fr => "FR",
            CountryCode::It => "IT",
            CountryCode::Uk => "UK",
            CountryCode::Ne => "NE",
            CountryCode::Pl => "PL",
            CountryCode::Se => "SE",
        }
    }

    /// Name of the country folder in the remote tree.
    pub fn folder_name(self) -> &'static str {
        match self {
            CountryCode::Es => "ESPAÑA",
            CountryCode::De => "ALEMANIA",
            CountryCode::Fr => "FRANCIA",
            CountryCode::It => "ITALIA",
            CountryCode::Uk => "UK",
            CountryCode::Ne => "NETHERLANDS",
            CountryCode::Pl => "POLONIA",
            CountryCode::Se => "SUECIA",
        }
    }
}

impl Display for CountryCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.token())
    }
}
