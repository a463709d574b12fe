//! # Service Request Types
//!
//! A `ServiceRequest` is what the payer asked for: the service kind, the
//! invoice amount, and the kind-specific details needed to fulfil it once
//! the invoice settles. Values of this type only come out of
//! [`crate::validate::validate`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recognized service kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Airtime,
    Electricity,
    Water,
    #[serde(rename = "schoolfees")]
    SchoolFees,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Airtime,
        ServiceKind::Electricity,
        ServiceKind::Water,
        ServiceKind::SchoolFees,
    ];

    /// Wire name as used by the front end
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Airtime => "airtime",
            ServiceKind::Electricity => "electricity",
            ServiceKind::Water => "water",
            ServiceKind::SchoolFees => "schoolfees",
        }
    }

    /// Kind-specific fields, in the order they are checked
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ServiceKind::Airtime => &["phone", "carrier"],
            ServiceKind::Electricity | ServiceKind::Water => &["utility", "account"],
            ServiceKind::SchoolFees => &["institution", "student_id", "student_name"],
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Mobile carriers that sell airtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Carrier {
    #[serde(rename = "MTN")]
    Mtn,
    Airtel,
    Zamtel,
}

impl Carrier {
    pub const ALL: [Carrier; 3] = [Carrier::Mtn, Carrier::Airtel, Carrier::Zamtel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Mtn => "MTN",
            Carrier::Airtel => "Airtel",
            Carrier::Zamtel => "Zamtel",
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Carrier {
    type Err = String;

    /// Case-insensitive ("mtn", "MTN" and "Mtn" are all MTN)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Carrier::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

/// Kind-specific details. Each variant carries exactly the fields its kind
/// requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ServicePayload {
    Airtime {
        phone: String,
        carrier: Carrier,
    },
    Electricity {
        utility: String,
        account: String,
    },
    Water {
        utility: String,
        account: String,
    },
    #[serde(rename = "schoolfees")]
    SchoolFees {
        institution: String,
        student_id: String,
        student_name: String,
    },
}

impl ServicePayload {
    pub fn kind(&self) -> ServiceKind {
        match self {
            ServicePayload::Airtime { .. } => ServiceKind::Airtime,
            ServicePayload::Electricity { .. } => ServiceKind::Electricity,
            ServicePayload::Water { .. } => ServiceKind::Water,
            ServicePayload::SchoolFees { .. } => ServiceKind::SchoolFees,
        }
    }

    /// Who or what gets credited (phone, meter/account, student)
    pub fn beneficiary(&self) -> &str {
        match self {
            ServicePayload::Airtime { phone, .. } => phone,
            ServicePayload::Electricity { account, .. } | ServicePayload::Water { account, .. } => {
                account
            }
            ServicePayload::SchoolFees { student_id, .. } => student_id,
        }
    }
}

/// A validated request to pay for a service over Lightning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    /// Invoice value in satoshis (> 0)
    pub amount_sats: u64,

    /// Fiat value the payer saw; informational only
    pub fiat_reference: f64,

    /// Free-text memo passed to the invoice
    pub memo: String,

    /// Kind plus kind-specific details
    pub payload: ServicePayload,
}

impl ServiceRequest {
    pub fn kind(&self) -> ServiceKind {
        self.payload.kind()
    }
}
