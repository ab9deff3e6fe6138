//! Pre-submit checks. Fail-fast: the first violation is reported and no
//! collaborator call is made.

use thiserror::Error;

use gpsrhub_core::{AddressId, CatalogId, FileUpload};

use crate::product::{Declarations, DraftProduct};
use crate::technical_file::{TechnicalFileKind, missing_slots};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("select an EU or UK representative")]
    NoRepresentative,

    #[error("add at least one product image")]
    NoImages,

    #[error("image {0} is not attached to this product")]
    UnknownImage(String),

    #[error("question {0} does not apply to the selected product type")]
    UnknownQuestion(CatalogId),

    #[error("technical files missing: {}", .0.iter().map(|k| k.label()).collect::<Vec<_>>().join(", "))]
    MissingTechnicalFiles(Vec<TechnicalFileKind>),

    #[error("notified body {0} is required")]
    NotifiedBodyIncomplete(&'static str),

    #[error("confirm '{0}' before submitting")]
    DeclarationUnchecked(&'static str),
}

/// Step 1 form ("General information").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralDetails {
    pub name: String,
    pub batch_number: String,
    pub model: String,
    pub specification: Option<String>,
    pub category_id: Option<CatalogId>,
    pub product_type_id: Option<CatalogId>,
    pub requires_marking: bool,
    pub manufacturer_id: Option<AddressId>,
    pub eu_representative_id: Option<AddressId>,
    pub uk_representative_id: Option<AddressId>,
    /// Already stored images the user kept, by public URL.
    pub kept_images: Vec<String>,
    /// Newly selected images, not yet uploaded.
    pub new_images: Vec<FileUpload>,
    /// Questions answered "yes".
    pub selected_question_ids: Vec<CatalogId>,
}

pub fn validate_general(details: &GeneralDetails) -> Result<(), ValidationError> {
    if details.category_id.is_none() {
        return Err(ValidationError::MissingField("category"));
    }
    if details.product_type_id.is_none() {
        return Err(ValidationError::MissingField("product type"));
    }
    if details.manufacturer_id.is_none() {
        return Err(ValidationError::MissingField("manufacturer"));
    }
    for (value, field) in [
        (&details.name, "name"),
        (&details.batch_number, "batch number"),
        (&details.model, "model"),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }
    if details.eu_representative_id.is_none() && details.uk_representative_id.is_none() {
        return Err(ValidationError::NoRepresentative);
    }
    if details.kept_images.is_empty() && details.new_images.is_empty() {
        return Err(ValidationError::NoImages);
    }
    Ok(())
}

/// Kept images must be ones the product already has.
pub fn validate_kept_images(current: &[String], details: &GeneralDetails) -> Result<(), ValidationError> {
    match details.kept_images.iter().find(|url| !current.contains(url)) {
        Some(unknown) => Err(ValidationError::UnknownImage(unknown.clone())),
        None => Ok(()),
    }
}

/// Step 3 gate before the product is handed over for review.
pub fn validate_submission(
    draft: &DraftProduct,
    declarations: &Declarations,
) -> Result<(), ValidationError> {
    let missing = missing_slots(&draft.technical_files);
    if !missing.is_empty() {
        return Err(ValidationError::MissingTechnicalFiles(missing));
    }
    if let Some(detail) = draft.notified_body.as_ref().and_then(|b| b.missing_detail()) {
        return Err(ValidationError::NotifiedBodyIncomplete(detail));
    }
    if let Some(unchecked) = declarations.first_unchecked() {
        return Err(ValidationError::DeclarationUnchecked(unchecked));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gpsrhub_core::{ProductId, UserId};

    use crate::technical_file::{NotifiedBody, TechnicalFileSlot};

    fn complete_details() -> GeneralDetails {
        GeneralDetails {
            name: "Plush rabbit".to_string(),
            batch_number: "B-2024-07".to_string(),
            model: "PR-12".to_string(),
            specification: None,
            category_id: Some(CatalogId::new(1)),
            product_type_id: Some(CatalogId::new(11)),
            requires_marking: true,
            manufacturer_id: Some(AddressId::new()),
            eu_representative_id: None,
            uk_representative_id: Some(AddressId::new()),
            kept_images: vec![],
            new_images: vec![FileUpload::new("rabbit.jpg", "image/jpeg", vec![0xff, 0xd8])],
            selected_question_ids: vec![CatalogId::new(100)],
        }
    }

    #[test]
    fn complete_general_details_pass() {
        assert_eq!(validate_general(&complete_details()), Ok(()));
    }

    #[test]
    fn first_violation_wins() {
        let mut details = complete_details();
        details.category_id = None;
        details.name = " ".to_string();
        details.new_images.clear();
        assert_eq!(
            validate_general(&details),
            Err(ValidationError::MissingField("category"))
        );
    }

    #[test]
    fn whitespace_only_text_is_missing() {
        let mut details = complete_details();
        details.batch_number = "\t ".to_string();
        assert_eq!(
            validate_general(&details),
            Err(ValidationError::MissingField("batch number"))
        );
    }

    #[test]
    fn a_representative_is_required() {
        let mut details = complete_details();
        details.uk_representative_id = None;
        assert_eq!(validate_general(&details), Err(ValidationError::NoRepresentative));
    }

    #[test]
    fn kept_images_count_as_images() {
        let mut details = complete_details();
        details.new_images.clear();
        assert_eq!(validate_general(&details), Err(ValidationError::NoImages));
        details.kept_images.push("https://cdn.example/a.jpg".to_string());
        assert_eq!(validate_general(&details), Ok(()));
    }

    #[test]
    fn kept_images_must_already_belong_to_the_product() {
        let current = vec!["https://cdn.example/a.jpg".to_string()];
        let mut details = complete_details();
        details.kept_images = current.clone();
        assert_eq!(validate_kept_images(&current, &details), Ok(()));

        details.kept_images.push("https://elsewhere.example/b.jpg".to_string());
        assert_eq!(
            validate_kept_images(&current, &details),
            Err(ValidationError::UnknownImage("https://elsewhere.example/b.jpg".to_string()))
        );
        assert!(validate_kept_images(&[], &details).is_err());
    }

    fn draft_with_slots(files: &[TechnicalFileKind]) -> DraftProduct {
        let product_id = ProductId::new();
        let mut draft = DraftProduct::new(UserId::new());
        draft.id = Some(product_id);
        draft.technical_files = TechnicalFileKind::ALL
            .into_iter()
            .map(|kind| {
                if files.contains(&kind) {
                    TechnicalFileSlot::with_file(product_id, kind, format!("https://cdn/{kind}.pdf"), Utc::now())
                } else {
                    TechnicalFileSlot::not_required(product_id, kind, "not applicable", None, Utc::now())
                        .unwrap()
                }
            })
            .collect();
        draft
    }

    #[test]
    fn nine_not_required_and_two_files_pass() {
        let draft = draft_with_slots(&[
            TechnicalFileKind::DeclarationOfConformity,
            TechnicalFileKind::TestReports,
        ]);
        assert_eq!(draft.technical_files.len(), 11);
        assert_eq!(
            validate_submission(&draft, &Declarations::all_checked()),
            Ok(())
        );
    }

    #[test]
    fn removed_file_without_marking_is_listed() {
        let mut draft = draft_with_slots(&[
            TechnicalFileKind::DeclarationOfConformity,
            TechnicalFileKind::TestReports,
        ]);
        draft
            .technical_files
            .retain(|slot| slot.kind != TechnicalFileKind::TestReports);
        assert_eq!(
            validate_submission(&draft, &Declarations::all_checked()),
            Err(ValidationError::MissingTechnicalFiles(vec![
                TechnicalFileKind::TestReports
            ]))
        );
    }

    #[test]
    fn required_notified_body_needs_details() {
        let mut draft = draft_with_slots(&[]);
        draft.notified_body = Some(NotifiedBody {
            required: true,
            name: "BSI".to_string(),
            ..NotifiedBody::default()
        });
        assert_eq!(
            validate_submission(&draft, &Declarations::all_checked()),
            Err(ValidationError::NotifiedBodyIncomplete("address"))
        );
    }

    #[test]
    fn every_declaration_must_be_checked() {
        let draft = draft_with_slots(&[]);
        let declarations = Declarations {
            terms_accepted: false,
            ..Declarations::all_checked()
        };
        assert_eq!(
            validate_submission(&draft, &declarations),
            Err(ValidationError::DeclarationUnchecked("terms_accepted"))
        );
    }

    #[test]
    fn missing_files_message_uses_labels() {
        let err = ValidationError::MissingTechnicalFiles(vec![
            TechnicalFileKind::UserManual,
            TechnicalFileKind::RiskAssessment,
        ]);
        assert_eq!(err.to_string(), "technical files missing: User manual, Risk assessment");
    }
}
