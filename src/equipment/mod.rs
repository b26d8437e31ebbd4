//! Equipment record types and wire normalization
//!
//! ## Responsibilities
//!
//! - Canonical `EquipmentRecord` shape used everywhere inside the service
//! - Normalization of the two wire shapes the backend may emit (compact-word
//!   keys vs underscored keys) into that single shape
//!
//! Normalization precedence is explicit: the compact-word variant of a field
//! wins, the underscored variant applies only when the compact-word key is
//! absent.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Normalized equipment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub id: String,
    pub name: String,
    pub serial_number: String,
    pub category: String,
    pub department: String,
    pub owner_name: String,
    pub location: String,
    pub is_scrapped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrapped_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrapped_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warranty_expiry: Option<String>,
    pub maintenance_team_id: String,
    pub default_technician_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Wire-format record accepting both field-naming conventions
///
/// Single-word fields (`id`, `name`, `category`, `department`, `location`)
/// spell the same either way and are required outright.
#[derive(Debug, Clone, Deserialize)]
pub struct EquipmentWire {
    pub id: String,
    pub name: String,
    pub category: String,
    pub department: String,
    pub location: String,

    #[serde(rename = "serialNumber", default)]
    serial_number_compact: Option<String>,
    #[serde(default)]
    serial_number: Option<String>,

    #[serde(rename = "ownerName", default)]
    owner_name_compact: Option<String>,
    #[serde(default)]
    owner_name: Option<String>,

    #[serde(rename = "isScrapped", default)]
    is_scrapped_compact: Option<bool>,
    #[serde(default)]
    is_scrapped: Option<bool>,

    #[serde(rename = "scrappedAt", default)]
    scrapped_at_compact: Option<String>,
    #[serde(default)]
    scrapped_at: Option<String>,

    #[serde(rename = "scrappedReason", default)]
    scrapped_reason_compact: Option<String>,
    #[serde(default)]
    scrapped_reason: Option<String>,

    #[serde(rename = "purchaseDate", default)]
    purchase_date_compact: Option<String>,
    #[serde(default)]
    purchase_date: Option<String>,

    #[serde(rename = "warrantyExpiry", default)]
    warranty_expiry_compact: Option<String>,
    #[serde(default)]
    warranty_expiry: Option<String>,

    #[serde(rename = "maintenanceTeamId", default)]
    maintenance_team_id_compact: Option<String>,
    #[serde(default)]
    maintenance_team_id: Option<String>,

    #[serde(rename = "defaultTechnicianId", default)]
    default_technician_id_compact: Option<String>,
    #[serde(default)]
    default_technician_id: Option<String>,

    #[serde(rename = "createdAt", default)]
    created_at_compact: Option<String>,
    #[serde(default)]
    created_at: Option<String>,

    #[serde(rename = "updatedAt", default)]
    updated_at_compact: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

fn required(field: &str, compact: Option<String>, underscored: Option<String>) -> Result<String> {
    compact
        .or(underscored)
        .ok_or_else(|| Error::Parse(format!("equipment record missing field: {}", field)))
}

impl EquipmentWire {
    /// Collapse both naming conventions into the normalized record
    pub fn normalize(self) -> Result<EquipmentRecord> {
        Ok(EquipmentRecord {
            id: self.id,
            name: self.name,
            category: self.category,
            department: self.department,
            location: self.location,
            serial_number: required(
                "serial_number",
                self.serial_number_compact,
                self.serial_number,
            )?,
            owner_name: required("owner_name", self.owner_name_compact, self.owner_name)?,
            is_scrapped: self
                .is_scrapped_compact
                .or(self.is_scrapped)
                .unwrap_or(false),
            scrapped_at: self.scrapped_at_compact.or(self.scrapped_at),
            scrapped_reason: self.scrapped_reason_compact.or(self.scrapped_reason),
            purchase_date: self.purchase_date_compact.or(self.purchase_date),
            warranty_expiry: self.warranty_expiry_compact.or(self.warranty_expiry),
            maintenance_team_id: required(
                "maintenance_team_id",
                self.maintenance_team_id_compact,
                self.maintenance_team_id,
            )?,
            default_technician_id: required(
                "default_technician_id",
                self.default_technician_id_compact,
                self.default_technician_id,
            )?,
            created_at: required("created_at", self.created_at_compact, self.created_at)?,
            updated_at: required("updated_at", self.updated_at_compact, self.updated_at)?,
        })
    }
}

/// Normalize a raw wire body (either naming convention) into an `EquipmentRecord`
pub fn normalize_record(value: serde_json::Value) -> Result<EquipmentRecord> {
    let wire: EquipmentWire = serde_json::from_value(value)
        .map_err(|e| Error::Parse(format!("malformed equipment body: {}", e)))?;
    wire.normalize()
}
