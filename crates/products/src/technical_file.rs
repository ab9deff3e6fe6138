//! Technical documentation slots and the optional notified body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gpsrhub_core::{DomainError, DomainResult, ProductId};

/// The fixed set of documents every product's technical file must account for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalFileKind {
    DeclarationOfConformity,
    RiskAssessment,
    TestReports,
    UserManual,
    ProductLabels,
    SafetyWarnings,
    TechnicalDrawings,
    BillOfMaterials,
    ProductionControl,
    ConformityCertificate,
    TraceabilityRecords,
}

impl TechnicalFileKind {
    pub const ALL: [TechnicalFileKind; 11] = [
        TechnicalFileKind::DeclarationOfConformity,
        TechnicalFileKind::RiskAssessment,
        TechnicalFileKind::TestReports,
        TechnicalFileKind::UserManual,
        TechnicalFileKind::ProductLabels,
        TechnicalFileKind::SafetyWarnings,
        TechnicalFileKind::TechnicalDrawings,
        TechnicalFileKind::BillOfMaterials,
        TechnicalFileKind::ProductionControl,
        TechnicalFileKind::ConformityCertificate,
        TechnicalFileKind::TraceabilityRecords,
    ];

    /// Stable key used in storage paths and persisted rows.
    pub fn key(&self) -> &'static str {
        match self {
            TechnicalFileKind::DeclarationOfConformity => "declaration_of_conformity",
            TechnicalFileKind::RiskAssessment => "risk_assessment",
            TechnicalFileKind::TestReports => "test_reports",
            TechnicalFileKind::UserManual => "user_manual",
            TechnicalFileKind::ProductLabels => "product_labels",
            TechnicalFileKind::SafetyWarnings => "safety_warnings",
            TechnicalFileKind::TechnicalDrawings => "technical_drawings",
            TechnicalFileKind::BillOfMaterials => "bill_of_materials",
            TechnicalFileKind::ProductionControl => "production_control",
            TechnicalFileKind::ConformityCertificate => "conformity_certificate",
            TechnicalFileKind::TraceabilityRecords => "traceability_records",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TechnicalFileKind::DeclarationOfConformity => "Declaration of Conformity",
            TechnicalFileKind::RiskAssessment => "Risk assessment",
            TechnicalFileKind::TestReports => "Test reports",
            TechnicalFileKind::UserManual => "User manual",
            TechnicalFileKind::ProductLabels => "Product labels and markings",
            TechnicalFileKind::SafetyWarnings => "Safety warnings",
            TechnicalFileKind::TechnicalDrawings => "Technical drawings",
            TechnicalFileKind::BillOfMaterials => "Bill of materials",
            TechnicalFileKind::ProductionControl => "Production control procedures",
            TechnicalFileKind::ConformityCertificate => "Conformity certificate",
            TechnicalFileKind::TraceabilityRecords => "Traceability records",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl core::fmt::Display for TechnicalFileKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

/// What a slot currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotState {
    File { file_url: String },
    NotRequired { reason: String },
}

/// One persisted slot row. Absence of a row means the slot is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalFileSlot {
    pub product_id: ProductId,
    pub kind: TechnicalFileKind,
    pub state: SlotState,
    pub updated_at: DateTime<Utc>,
}

impl TechnicalFileSlot {
    pub fn with_file(
        product_id: ProductId,
        kind: TechnicalFileKind,
        file_url: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            kind,
            state: SlotState::File {
                file_url: file_url.into(),
            },
            updated_at: now,
        }
    }

    /// Build a not-required row.
    ///
    /// `existing` is the current row for the same slot, if any; a slot that holds a
    /// file must have the file removed first.
    pub fn not_required(
        product_id: ProductId,
        kind: TechnicalFileKind,
        reason: &str,
        existing: Option<&TechnicalFileSlot>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if let Some(slot) = existing {
            if slot.file_url().is_some() {
                return Err(DomainError::conflict(format!(
                    "{} has an uploaded file; remove it before marking it not required",
                    kind.label()
                )));
            }
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation(format!(
                "a reason is required to mark {} as not required",
                kind.label()
            )));
        }
        Ok(Self {
            product_id,
            kind,
            state: SlotState::NotRequired {
                reason: reason.to_string(),
            },
            updated_at: now,
        })
    }

    pub fn file_url(&self) -> Option<&str> {
        match &self.state {
            SlotState::File { file_url } => Some(file_url),
            SlotState::NotRequired { .. } => None,
        }
    }

    pub fn is_not_required(&self) -> bool {
        matches!(self.state, SlotState::NotRequired { .. })
    }
}

/// Slots of the fixed enumeration that have neither a file nor a not-required row.
pub fn missing_slots(slots: &[TechnicalFileSlot]) -> Vec<TechnicalFileKind> {
    TechnicalFileKind::ALL
        .into_iter()
        .filter(|kind| !slots.iter().any(|slot| slot.kind == *kind))
        .collect()
}

/// Third-party conformity assessment body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifiedBody {
    /// Whether the product's conformity route involves a notified body at all.
    pub required: bool,
    pub name: String,
    pub address: String,
    /// Four-digit NANDO identification number.
    pub number: String,
    /// Certificate or report reference issued by the body.
    pub reference_number: String,
}

impl NotifiedBody {
    /// First missing detail when the body is required, in form order.
    pub fn missing_detail(&self) -> Option<&'static str> {
        if !self.required {
            return None;
        }
        if self.name.trim().is_empty() {
            return Some("name");
        }
        if self.address.trim().is_empty() {
            return Some("address");
        }
        if self.number.trim().is_empty() && self.reference_number.trim().is_empty() {
            return Some("number or reference number");
        }
        None
    }
}
