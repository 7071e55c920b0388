// src/db/store.rs
//
// Contratos de acesso a dados. Os serviços só conhecem estes traits; quem decide
// se é Postgres ou memória é o `AppState` na inicialização.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::{
        activity::{ActivityFeedItem, NewActivity},
        admin::{AdminStats, NewUser, UserChanges, UserFilter, UserWithAdmin},
        animal::{Animal, AnimalFilter, AnimalHistory, AnimalListItem, AnimalMove, AnimalView},
        auth::User,
        dashboard::{AlertFeedRow, DailyProduction, EstablishmentCounts, RodeoSummary, SearchHit},
        establishment::{Establishment, EstablishmentScope, EstablishmentSummary, Membership, NewEstablishment},
        record::{Alert, AnimalPhoto, HealthRecord, ProductionRecord, ReproductionRecord},
        rodeo::{Rodeo, RodeoAnimal, RodeoWithCounts},
    },
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// E-mail duplicado vira `Conflict`. Papéis administrativos ganham a linha em `administrators`.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Aplica as alterações e sincroniza `administrators` com o papel resultante.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError>;

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;

    async fn find_user_with_admin(&self, id: Uuid) -> Result<Option<UserWithAdmin>, AppError>;

    /// Página de usuários (mais novos primeiro) e o total que casa com o filtro.
    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<(Vec<UserWithAdmin>, i64), AppError>;

    async fn admin_stats(&self) -> Result<AdminStats, AppError>;
}

#[async_trait]
pub trait EstablishmentStore: Send + Sync {
    /// O vínculo ativo mais antigo do usuário.
    async fn resolve_scope(&self, user_id: Uuid) -> Result<Option<EstablishmentScope>, AppError>;

    async fn list_establishments(&self) -> Result<Vec<EstablishmentSummary>, AppError>;

    async fn find_establishment(&self, id: Uuid) -> Result<Option<Establishment>, AppError>;

    /// Cria o estabelecimento e, havendo dono, já o vincula.
    async fn create_establishment(&self, establishment: NewEstablishment) -> Result<Establishment, AppError>;

    /// Ativa o vínculo e desativa os demais vínculos do usuário.
    async fn assign_member(&self, establishment_id: Uuid, user_id: Uuid) -> Result<Membership, AppError>;
}

#[async_trait]
pub trait AnimalStore: Send + Sync {
    async fn list_animals(
        &self,
        establishment_id: Uuid,
        filter: &AnimalFilter,
        page: PageRequest,
    ) -> Result<(Vec<AnimalListItem>, i64), AppError>;

    async fn find_animal(&self, establishment_id: Uuid, id: Uuid) -> Result<Option<Animal>, AppError>;

    /// Somente os animais ativos do estabelecimento; ids desconhecidos são ignorados.
    async fn find_animals(&self, establishment_id: Uuid, ids: &[Uuid]) -> Result<Vec<Animal>, AppError>;

    async fn find_animal_view(&self, establishment_id: Uuid, id: Uuid) -> Result<Option<AnimalView>, AppError>;

    async fn animal_history(&self, animal_id: Uuid) -> Result<AnimalHistory, AppError>;

    async fn external_tag_taken(&self, tag: &str, except: Option<Uuid>) -> Result<bool, AppError>;

    async fn internal_tag_taken(
        &self,
        establishment_id: Uuid,
        tag: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError>;

    async fn insert_animal(&self, animal: Animal, activity: NewActivity) -> Result<Animal, AppError>;

    async fn update_animal(&self, animal: Animal, activity: NewActivity) -> Result<Animal, AppError>;

    /// Troca o rodeo de cada animal e grava as movimentações, tudo ou nada.
    async fn record_moves(
        &self,
        moves: &[AnimalMove],
        reason: Option<&str>,
        created_by: Uuid,
        activity: NewActivity,
    ) -> Result<(), AppError>;

    async fn add_production_record(
        &self,
        record: ProductionRecord,
        activity: NewActivity,
    ) -> Result<ProductionRecord, AppError>;

    async fn add_health_record(&self, record: HealthRecord, activity: NewActivity) -> Result<HealthRecord, AppError>;

    async fn add_reproduction_record(
        &self,
        record: ReproductionRecord,
        activity: NewActivity,
    ) -> Result<ReproductionRecord, AppError>;

    async fn add_alert(&self, alert: Alert, activity: NewActivity) -> Result<Alert, AppError>;

    /// Alerta ativo cujo animal pertence ao estabelecimento.
    async fn find_active_alert(&self, establishment_id: Uuid, alert_id: Uuid) -> Result<Option<Alert>, AppError>;

    /// `None` quando o alerta já não estava ativo.
    async fn resolve_alert(
        &self,
        alert_id: Uuid,
        resolved_by: Uuid,
        resolved_date: NaiveDate,
        activity: NewActivity,
    ) -> Result<Option<Alert>, AppError>;

    /// Foto principal desmarca as outras do mesmo animal na mesma escrita.
    async fn add_photo(&self, photo: AnimalPhoto, activity: NewActivity) -> Result<AnimalPhoto, AppError>;
}

#[async_trait]
pub trait RodeoStore: Send + Sync {
    async fn list_rodeos(&self, establishment_id: Uuid) -> Result<Vec<RodeoWithCounts>, AppError>;

    async fn find_rodeo(&self, establishment_id: Uuid, id: Uuid) -> Result<Option<Rodeo>, AppError>;

    async fn rodeo_animals(&self, establishment_id: Uuid, rodeo_id: Uuid) -> Result<Vec<RodeoAnimal>, AppError>;

    async fn rodeo_name_taken(
        &self,
        establishment_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError>;

    async fn count_rodeo_animals(&self, rodeo_id: Uuid) -> Result<i64, AppError>;

    async fn insert_rodeo(&self, rodeo: Rodeo, activity: NewActivity) -> Result<Rodeo, AppError>;

    async fn update_rodeo(&self, rodeo: Rodeo, activity: NewActivity) -> Result<Rodeo, AppError>;

    async fn deactivate_rodeo(&self, rodeo_id: Uuid, activity: NewActivity) -> Result<(), AppError>;
}

#[async_trait]
pub trait DashboardStore: Send + Sync {
    async fn establishment_counts(&self, establishment_id: Uuid) -> Result<EstablishmentCounts, AppError>;

    /// Produção agregada por dia desde `since` (inclusive), do dia mais antigo ao mais novo.
    async fn daily_production(
        &self,
        establishment_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DailyProduction>, AppError>;

    async fn recent_activity(&self, establishment_id: Uuid, limit: i64) -> Result<Vec<ActivityFeedItem>, AppError>;

    async fn rodeo_summaries(&self, establishment_id: Uuid) -> Result<Vec<RodeoSummary>, AppError>;

    async fn active_alert_feed(&self, establishment_id: Uuid, limit: i64) -> Result<Vec<AlertFeedRow>, AppError>;

    async fn search_animals(&self, establishment_id: Uuid, query: &str, limit: i64) -> Result<Vec<SearchHit>, AppError>;
}

/// Tudo que a aplicação precisa de um backend de dados.
pub trait Store: UserStore + EstablishmentStore + AnimalStore + RodeoStore + DashboardStore {}

impl<T> Store for T where T: UserStore + EstablishmentStore + AnimalStore + RodeoStore + DashboardStore {}
