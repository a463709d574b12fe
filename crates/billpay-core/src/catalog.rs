//! # Service Catalog
//!
//! The carriers, utilities and schools the payment form offers.
//! Loaded from `config/catalog.toml`; purely presentational. The request
//! validator does not consult it.

use crate::request::{Carrier, ServiceKind};
use serde::{Deserialize, Serialize};

/// A country the service operates in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// ISO 3166 alpha-2 (e.g., "ZM")
    pub code: String,
    pub name: String,
    /// International dialing prefix (e.g., "+260")
    pub dial_code: String,
}

/// A mobile carrier selling airtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierEntry {
    pub carrier: Carrier,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// National-number prefixes allocated to this carrier
    #[serde(default)]
    pub prefixes: Vec<String>,
}

/// A utility company billed through the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityEntry {
    /// `electricity` or `water`
    pub kind: ServiceKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// A school accepting fee payments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Everything the front end renders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    #[serde(default)]
    pub countries: Vec<Country>,
    #[serde(default)]
    pub carriers: Vec<CarrierEntry>,
    #[serde(default)]
    pub utilities: Vec<UtilityEntry>,
    #[serde(default)]
    pub schools: Vec<SchoolEntry>,
}

impl ServiceCatalog {
    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// The Zambian deployment the service launched with
    pub fn builtin() -> Self {
        let zm = || vec!["ZM".to_string()];
        let carrier = |carrier, logo: &str, prefixes: &[&str]| CarrierEntry {
            carrier,
            countries: zm(),
            logo: Some(logo.to_string()),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        };
        let utility = |kind, name: &str, logo: &str| UtilityEntry {
            kind,
            name: name.to_string(),
            logo: Some(logo.to_string()),
        };
        let school = |name: &str, logo: &str| SchoolEntry {
            name: name.to_string(),
            logo: Some(logo.to_string()),
        };

        Self {
            countries: vec![Country {
                code: "ZM".into(),
                name: "Zambia".into(),
                dial_code: "+260".into(),
            }],
            carriers: vec![
                carrier(Carrier::Mtn, "/static/mtn-logo.png", &["76", "96"]),
                carrier(Carrier::Airtel, "/static/airtel-logo.png", &["77", "97"]),
                carrier(Carrier::Zamtel, "/static/zamtel-logo.png", &["95"]),
            ],
            utilities: vec![
                utility(ServiceKind::Electricity, "ZESCO", "/static/zesco-logo.png"),
                utility(
                    ServiceKind::Electricity,
                    "Copperbelt Energy Corporation",
                    "/static/cec-logo.png",
                ),
                utility(
                    ServiceKind::Water,
                    "Lusaka Water and Sewerage Company",
                    "/static/lwsc-logo.png",
                ),
                utility(
                    ServiceKind::Water,
                    "Nkana Water and Sewerage Company",
                    "/static/nwsc-logo.png",
                ),
            ],
            schools: vec![
                school("University of Zambia", "/static/unza-logo.png"),
                school("Copperbelt University", "/static/cbu-logo.png"),
                school("Mulungushi University", "/static/mu-logo.png"),
            ],
        }
    }

    /// Utilities billed under `kind`
    pub fn utilities_for(&self, kind: ServiceKind) -> impl Iterator<Item = &UtilityEntry> {
        self.utilities.iter().filter(move |u| u.kind == kind)
    }

    pub fn carrier(&self, carrier: Carrier) -> Option<&CarrierEntry> {
        self.carriers.iter().find(|c| c.carrier == carrier)
    }

    /// Utility entries must be electricity or water
    pub fn check(&self) -> Result<(), String> {
        match self
            .utilities
            .iter()
            .find(|u| !matches!(u.kind, ServiceKind::Electricity | ServiceKind::Water))
        {
            Some(u) => Err(format!("utility '{}' has non-utility kind '{}'", u.name, u.kind)),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty() && self.utilities.is_empty() && self.schools.is_empty()
    }
}
