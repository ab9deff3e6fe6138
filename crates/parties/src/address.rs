use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gpsrhub_core::{AddressId, DomainError, DomainResult, Entity, SoftDeletable, UserId};

use crate::jurisdiction::{CountryCode, Market};

/// Role an address plays for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Manufacturer,
    EuRepresentative,
    UkRepresentative,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Manufacturer => "manufacturer",
            AddressKind::EuRepresentative => "eu_representative",
            AddressKind::UkRepresentative => "uk_representative",
        }
    }

    /// Market the address must be located in, if any.
    ///
    /// Manufacturers may be anywhere; representatives must be established in the
    /// market they represent.
    pub fn required_market(&self) -> Option<Market> {
        match self {
            AddressKind::Manufacturer => None,
            AddressKind::EuRepresentative => Some(Market::Eu),
            AddressKind::UkRepresentative => Some(Market::Uk),
        }
    }
}

impl core::fmt::Display for AddressKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address form as submitted by the user (untrusted).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub name: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub country: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// A validated, persisted address row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub owner_id: UserId,
    pub kind: AddressKind,
    pub name: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub country: CountryCode,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

struct CleanInput {
    name: String,
    street: String,
    city: String,
    postcode: String,
    country: CountryCode,
    email: Option<String>,
    phone: Option<String>,
    website: Option<String>,
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl AddressInput {
    fn clean(&self, kind: AddressKind) -> DomainResult<CleanInput> {
        let name = required("name", &self.name)?;
        let street = required("street", &self.street)?;
        let city = required("city", &self.city)?;
        let postcode = required("postcode", &self.postcode)?;
        let country = CountryCode::parse(&self.country)?;

        if let Some(market) = kind.required_market() {
            if country.market() != Some(market) {
                return Err(DomainError::validation(format!(
                    "{kind} must be established in the {} market, got country {country}",
                    match market {
                        Market::Eu => "EU",
                        Market::Uk => "UK",
                    }
                )));
            }
        }

        let email = optional(&self.email);
        if let Some(email) = &email {
            let valid = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !valid {
                return Err(DomainError::validation(format!("invalid email '{email}'")));
            }
        }

        Ok(CleanInput {
            name,
            street,
            city,
            postcode,
            country,
            email,
            phone: optional(&self.phone),
            website: optional(&self.website),
        })
    }
}

impl Address {
    /// Validate `input` and build a new address owned by `owner_id`.
    pub fn register(
        id: AddressId,
        owner_id: UserId,
        kind: AddressKind,
        input: &AddressInput,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let clean = input.clean(kind)?;
        Ok(Self {
            id,
            owner_id,
            kind,
            name: clean.name,
            street: clean.street,
            city: clean.city,
            postcode: clean.postcode,
            country: clean.country,
            email: clean.email,
            phone: clean.phone,
            website: clean.website,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    /// Return an updated copy. The kind of an address never changes.
    pub fn updated(&self, input: &AddressInput, now: DateTime<Utc>) -> DomainResult<Self> {
        if !self.is_active() {
            return Err(DomainError::conflict("archived addresses cannot be edited"));
        }
        let clean = input.clean(self.kind)?;
        Ok(Self {
            name: clean.name,
            street: clean.street,
            city: clean.city,
            postcode: clean.postcode,
            country: clean.country,
            email: clean.email,
            phone: clean.phone,
            website: clean.website,
            updated_at: now,
            ..self.clone()
        })
    }

    /// Return a soft-deleted copy.
    pub fn archived(&self, now: DateTime<Utc>) -> DomainResult<Self> {
        if !self.is_active() {
            return Err(DomainError::conflict("address is already archived"));
        }
        Ok(Self {
            deleted_at: Some(now),
            updated_at: now,
            ..self.clone()
        })
    }

    /// Whether a product of `owner_id` may reference this address as `kind`.
    pub fn ensure_usable_as(&self, owner_id: UserId, kind: AddressKind) -> DomainResult<()> {
        if self.owner_id != owner_id {
            return Err(DomainError::Unauthorized);
        }
        if !self.is_active() {
            return Err(DomainError::invariant(format!(
                "{kind} address {} is archived",
                self.id
            )));
        }
        if self.kind != kind {
            return Err(DomainError::invariant(format!(
                "address {} is a {}, not a {kind}",
                self.id, self.kind
            )));
        }
        Ok(())
    }

    /// One-line postal form used on labels and summaries.
    pub fn single_line(&self) -> String {
        format!(
            "{}, {}, {} {}, {}",
            self.name, self.street, self.postcode, self.city, self.country
        )
    }
}

impl Entity for Address {
    type Id = AddressId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl SoftDeletable for Address {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
