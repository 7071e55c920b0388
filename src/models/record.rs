// src/models/record.rs
//
// Eventos por animal: produção, sanidade, reprodução (somente inserção) e alertas.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("Value cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

// `length(min = 1)` aceitaria "   ", que vira "" depois do trim no service
fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        return Err(ValidationError::new("length"));
    }
    Ok(())
}

// --- Produção (litros/dia) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecord {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub record_date: NaiveDate,
    pub liters_per_day: Option<Decimal>,
    pub quality_rating: Option<i32>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionPayload {
    #[serde(alias = "record_date")]
    #[validate(required(message = "recordDate is required."))]
    pub record_date: Option<NaiveDate>,

    #[serde(alias = "liters_per_day")]
    #[validate(required(message = "litersPerDay is required."), custom(function = "validate_not_negative"))]
    pub liters_per_day: Option<Decimal>,

    #[serde(alias = "quality_rating")]
    #[validate(range(min = 1, max = 10, message = "qualityRating must be between 1 and 10."))]
    pub quality_rating: Option<i32>,

    pub notes: Option<String>,
}

// --- Sanidade ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub record_date: NaiveDate,
    pub event_type: String,
    pub description: Option<String>,
    pub treatment: Option<String>,
    pub cost: Option<Decimal>,
    pub veterinarian: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthPayload {
    #[serde(alias = "record_date")]
    #[validate(required(message = "recordDate is required."))]
    pub record_date: Option<NaiveDate>,

    #[serde(default)]
    #[serde(alias = "event_type")]
    #[validate(custom(function = "validate_not_blank", message = "eventType is required."))]
    #[schema(example = "vaccination")]
    pub event_type: String,

    pub description: Option<String>,
    pub treatment: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub cost: Option<Decimal>,

    pub veterinarian: Option<String>,
    pub notes: Option<String>,
}

// --- Reprodução ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReproductionRecord {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub record_date: NaiveDate,
    pub record_type: String,
    pub bull_id: Option<String>,
    pub expected_birth_date: Option<NaiveDate>,
    pub actual_birth_date: Option<NaiveDate>,
    pub calf_sex: Option<String>,
    pub calf_weight: Option<Decimal>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReproductionPayload {
    #[serde(alias = "record_date")]
    #[validate(required(message = "recordDate is required."))]
    pub record_date: Option<NaiveDate>,

    #[serde(default)]
    #[serde(alias = "record_type")]
    #[validate(custom(function = "validate_not_blank", message = "recordType is required."))]
    #[schema(example = "insemination")]
    pub record_type: String,

    #[serde(alias = "bull_id")]
    pub bull_id: Option<String>,
    #[serde(alias = "expected_birth_date")]
    pub expected_birth_date: Option<NaiveDate>,
    #[serde(alias = "actual_birth_date")]
    pub actual_birth_date: Option<NaiveDate>,
    #[serde(alias = "calf_sex")]
    pub calf_sex: Option<String>,

    #[serde(alias = "calf_weight")]
    #[validate(custom(function = "validate_not_negative"))]
    pub calf_weight: Option<Decimal>,

    pub notes: Option<String>,
}

// --- Alertas (active -> resolved, terminal) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub alert_type: String,
    pub title: String,
    pub description: Option<String>,
    pub alert_date: NaiveDate,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub resolved_by: Option<Uuid>,
    pub resolved_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    #[serde(default)]
    #[serde(alias = "alert_type")]
    #[validate(custom(function = "validate_not_blank", message = "alertType is required."))]
    #[schema(example = "pregnancy")]
    pub alert_type: String,

    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "title is required."))]
    pub title: String,

    pub description: Option<String>,

    /// Padrão: hoje.
    #[serde(alias = "alert_date")]
    pub alert_date: Option<NaiveDate>,
}

// --- Fotos (metadados; o arquivo vive fora da API) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimalPhoto {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub photo_url: String,
    pub description: Option<String>,
    pub is_primary: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoPayload {
    #[serde(default, alias = "photo_url")]
    #[validate(
        custom(function = "validate_not_blank", message = "photoUrl is required."),
        length(max = 2048, message = "photoUrl must have at most 2048 characters.")
    )]
    pub photo_url: String,

    pub description: Option<String>,

    /// A nova foto principal tira a marcação das anteriores.
    #[serde(default, alias = "is_primary")]
    pub is_primary: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoResponse {
    pub message: String,
    pub photo: AnimalPhoto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordResponse<T> {
    pub message: String,
    pub record: T,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertResponse {
    pub message: String,
    pub alert: Alert,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn production_requires_date_and_liters() {
        let payload: ProductionPayload = serde_json::from_value(json!({ "notes": "x" })).unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("record_date"));
        assert!(fields.contains_key("liters_per_day"));
    }

    #[test]
    fn negative_liters_are_rejected() {
        let payload: ProductionPayload = serde_json::from_value(json!({
            "recordDate": "2025-03-01",
            "litersPerDay": -2.5
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn quality_rating_is_bounded() {
        let payload: ProductionPayload = serde_json::from_value(json!({
            "recordDate": "2025-03-01",
            "litersPerDay": 21.4,
            "qualityRating": 11
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn alert_needs_type_and_title() {
        let payload: AlertPayload = serde_json::from_value(json!({ "description": "x" })).unwrap();
        let errors = payload.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }

    #[test]
    fn blank_alert_fields_are_rejected() {
        let payload: AlertPayload =
            serde_json::from_value(json!({ "alertType": "   ", "title": "\t" })).unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("alert_type"));
        assert!(fields.contains_key("title"));
    }

    #[test]
    fn blank_record_types_are_rejected() {
        let health: HealthPayload =
            serde_json::from_value(json!({ "recordDate": "2025-03-01", "eventType": " " })).unwrap();
        assert!(health.validate().is_err());

        let reproduction: ReproductionPayload =
            serde_json::from_value(json!({ "recordDate": "2025-03-01", "recordType": "  " })).unwrap();
        assert!(reproduction.validate().is_err());
    }

    #[test]
    fn snake_case_keys_are_accepted() {
        let payload: ProductionPayload = serde_json::from_value(json!({
            "record_date": "2025-03-01",
            "liters_per_day": 18,
            "quality_rating": 7
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.quality_rating, Some(7));
    }

    #[test]
    fn photo_needs_a_url() {
        let blank: PhotoPayload = serde_json::from_value(json!({ "photoUrl": " ", "isPrimary": true })).unwrap();
        assert!(blank.validate().unwrap_err().field_errors().contains_key("photo_url"));

        let photo: PhotoPayload =
            serde_json::from_value(json!({ "photo_url": "https://cdn.test/a.jpg", "is_primary": true })).unwrap();
        assert!(photo.validate().is_ok());
        assert!(photo.is_primary);
    }
}
