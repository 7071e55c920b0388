// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Tipos gravados em `activity_log.activity_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityType {
    AnimalCreated,
    AnimalUpdated,
    AnimalMovement,
    ProductionRecordAdded,
    HealthRecordAdded,
    ReproductionRecordAdded,
    AlertAdded,
    AlertResolved,
    PhotoAdded,
    RodeoCreated,
    RodeoUpdated,
    RodeoDeleted,
    BulkAnimalMovement,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::AnimalCreated => "animal_created",
            ActivityType::AnimalUpdated => "animal_updated",
            ActivityType::AnimalMovement => "animal_movement",
            ActivityType::ProductionRecordAdded => "production_record_added",
            ActivityType::HealthRecordAdded => "health_record_added",
            ActivityType::ReproductionRecordAdded => "reproduction_record_added",
            ActivityType::AlertAdded => "alert_added",
            ActivityType::AlertResolved => "alert_resolved",
            ActivityType::PhotoAdded => "photo_added",
            ActivityType::RodeoCreated => "rodeo_created",
            ActivityType::RodeoUpdated => "rodeo_updated",
            ActivityType::RodeoDeleted => "rodeo_deleted",
            ActivityType::BulkAnimalMovement => "bulk_animal_movement",
        }
    }
}

// Linha do log a ser inserida junto com a mutação que a originou
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub id: Uuid,
    pub establishment_id: Uuid,
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub description: String,
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub metadata: Value,
}

impl NewActivity {
    pub fn new(
        establishment_id: Uuid,
        user_id: Uuid,
        activity_type: ActivityType,
        entity_type: &'static str,
        entity_id: Uuid,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            establishment_id,
            user_id,
            activity_type,
            description: description.into(),
            entity_type,
            entity_id,
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Entrada do feed de atividades do dashboard.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ActivityFeedItem {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub description: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Nome de quem executou, ou "Sistema".
    #[serde(rename = "user")]
    pub user_name: String,
}
