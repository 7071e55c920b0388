// src/db/memory.rs
//
// Backend em memória com a mesma semântica do Postgres (unicidade, escopo por
// estabelecimento, escrita + auditoria atômicas). Usado nos testes e com
// `DATABASE_URL=memory://`.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::{AnimalStore, DashboardStore, EstablishmentStore, RodeoStore, UserStore},
    models::{
        activity::{ActivityFeedItem, NewActivity},
        admin::{AdminStats, NewUser, UserChanges, UserFilter, UserWithAdmin},
        animal::{
            Animal, AnimalFilter, AnimalHistory, AnimalListItem, AnimalMove, AnimalView, Movement, MovementView,
        },
        auth::{User, UserRole},
        dashboard::{AlertFeedRow, DailyProduction, EstablishmentCounts, RodeoSummary, SearchHit, SYSTEM_ACTOR},
        establishment::{Establishment, EstablishmentScope, EstablishmentSummary, Membership, NewEstablishment},
        record::{Alert, AnimalPhoto, HealthRecord, ProductionRecord, ReproductionRecord},
        rodeo::{Rodeo, RodeoAnimal, RodeoWithCounts},
    },
};

#[derive(Debug, Clone)]
struct AdminRow {
    user_id: Uuid,
    level: UserRole,
}

#[derive(Debug, Clone)]
struct ActivityRow {
    activity: NewActivity,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    administrators: Vec<AdminRow>,
    establishments: Vec<Establishment>,
    memberships: Vec<Membership>,
    rodeos: Vec<Rodeo>,
    animals: Vec<Animal>,
    movements: Vec<Movement>,
    production: Vec<ProductionRecord>,
    health: Vec<HealthRecord>,
    reproduction: Vec<ReproductionRecord>,
    alerts: Vec<Alert>,
    photos: Vec<AnimalPhoto>,
    activity: Vec<ActivityRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// --- helpers ---

fn contains_ci(value: Option<&str>, needle: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase().contains(needle))
}

fn starts_with_ci(value: Option<&str>, needle: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase().starts_with(needle))
}

// Ordem do Postgres para texto anulável em ORDER BY ASC: NULLs por último
fn nulls_last(value: &Option<String>) -> (bool, String) {
    (value.is_none(), value.clone().unwrap_or_default())
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn display_name(users: &[User], user_id: Option<Uuid>) -> String {
    user_id
        .and_then(|id| users.iter().find(|u| u.id == id))
        .map(|u| format!("{} {}", u.first_name, u.last_name))
        .unwrap_or_else(|| SYSTEM_ACTOR.to_string())
}

impl Tables {
    fn user_with_admin(&self, user: &User) -> UserWithAdmin {
        let admin = self.administrators.iter().find(|a| a.user_id == user.id);
        UserWithAdmin {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            admin_level: admin.map(|a| a.level),
            can_manage_users: admin.map(|_| true),
            can_manage_establishments: admin.map(|_| true),
            can_view_reports: admin.map(|_| true),
        }
    }

    fn sync_admin_row(&mut self, user_id: Uuid, role: UserRole) {
        if role.is_admin() {
            match self.administrators.iter_mut().find(|a| a.user_id == user_id) {
                Some(row) => row.level = role,
                None => self.administrators.push(AdminRow { user_id, level: role }),
            }
        } else {
            self.administrators.retain(|a| a.user_id != user_id);
        }
    }

    fn activate_membership(&mut self, establishment_id: Uuid, user_id: Uuid) -> Membership {
        for m in self.memberships.iter_mut().filter(|m| m.user_id == user_id) {
            m.is_active = m.establishment_id == establishment_id;
        }

        if let Some(existing) = self
            .memberships
            .iter()
            .find(|m| m.user_id == user_id && m.establishment_id == establishment_id)
        {
            return existing.clone();
        }

        let membership = Membership {
            user_id,
            establishment_id,
            is_active: true,
            created_at: Utc::now(),
        };
        self.memberships.push(membership.clone());
        membership
    }

    fn external_tag_taken(&self, tag: &str, except: Option<Uuid>) -> bool {
        self.animals
            .iter()
            .any(|a| a.is_active && Some(a.id) != except && a.external_tag.as_deref() == Some(tag))
    }

    fn internal_tag_taken(&self, establishment_id: Uuid, tag: &str, except: Option<Uuid>) -> bool {
        self.animals.iter().any(|a| {
            a.is_active
                && a.establishment_id == establishment_id
                && Some(a.id) != except
                && a.internal_tag.as_deref() == Some(tag)
        })
    }

    // Mesmo contrato dos índices únicos parciais do Postgres
    fn check_tags(&self, animal: &Animal) -> Result<(), AppError> {
        let external = animal
            .external_tag
            .as_deref()
            .is_some_and(|tag| self.external_tag_taken(tag, Some(animal.id)));
        let internal = animal
            .internal_tag
            .as_deref()
            .is_some_and(|tag| self.internal_tag_taken(animal.establishment_id, tag, Some(animal.id)));

        if external || internal {
            return Err(AppError::Conflict("Animal tag already exists".into()));
        }
        Ok(())
    }

    fn rodeo_name(&self, id: Option<Uuid>) -> Option<String> {
        id.and_then(|id| self.rodeos.iter().find(|r| r.id == id))
            .map(|r| r.name.clone())
    }

    fn active_alerts_for(&self, animal_id: Uuid) -> i64 {
        self.alerts
            .iter()
            .filter(|a| a.animal_id == animal_id && a.is_active)
            .count() as i64
    }

    fn rodeo_alerts(&self, rodeo_id: Uuid) -> i64 {
        self.animals
            .iter()
            .filter(|a| a.is_active && a.current_rodeo_id == Some(rodeo_id))
            .map(|a| self.active_alerts_for(a.id))
            .sum()
    }

    fn rodeo_animal_count(&self, rodeo_id: Uuid) -> i64 {
        self.animals
            .iter()
            .filter(|a| a.is_active && a.current_rodeo_id == Some(rodeo_id))
            .count() as i64
    }

    fn animal_in_scope(&self, establishment_id: Uuid, animal_id: Uuid) -> bool {
        self.animals
            .iter()
            .any(|a| a.id == animal_id && a.establishment_id == establishment_id)
    }

    fn log(&mut self, activity: NewActivity) {
        self.activity.push(ActivityRow {
            activity,
            created_at: Utc::now(),
        });
    }
}

fn user_matches(user: &User, filter: &UserFilter) -> bool {
    let search_ok = filter.search.as_deref().is_none_or(|search| {
        let needle = search.to_lowercase();
        contains_ci(Some(&user.email), &needle)
            || contains_ci(Some(&user.first_name), &needle)
            || contains_ci(Some(&user.last_name), &needle)
    });
    let role_ok = filter.role.is_none_or(|role| user.role == role);
    search_ok && role_ok
}

fn animal_matches(animal: &Animal, establishment_id: Uuid, filter: &AnimalFilter) -> bool {
    if !animal.is_active || animal.establishment_id != establishment_id {
        return false;
    }
    let search_ok = filter.search.as_deref().is_none_or(|search| {
        let needle = search.to_lowercase();
        contains_ci(animal.external_tag.as_deref(), &needle)
            || contains_ci(animal.internal_tag.as_deref(), &needle)
            || contains_ci(animal.name.as_deref(), &needle)
    });
    let rodeo_ok = filter.rodeo_id.is_none_or(|id| animal.current_rodeo_id == Some(id));
    search_ok && rodeo_ok
}

// Mais novos primeiro; empates ficam com o inserido por último
fn newest_first<T, F>(mut rows: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    rows.reverse();
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

fn paginate<T>(rows: Vec<T>, page: PageRequest) -> Vec<T> {
    rows.into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit).unwrap_or(0))
        .collect()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("User with this email already exists".into()));
        }

        let now = Utc::now();
        let created = User {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        if created.role.is_admin() {
            tables.sync_admin_row(created.id, created.role);
        }
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        let updated = user.clone();
        if changes.role.is_some() {
            tables.sync_admin_row(updated.id, updated.role);
        }
        Ok(Some(updated))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        tables.administrators.retain(|a| a.user_id != id);
        tables.memberships.retain(|m| m.user_id != id);
        for establishment in tables.establishments.iter_mut().filter(|e| e.owner_id == Some(id)) {
            establishment.owner_id = None;
        }
        Ok(true)
    }

    async fn find_user_with_admin(&self, id: Uuid) -> Result<Option<UserWithAdmin>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| tables.user_with_admin(u)))
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<(Vec<UserWithAdmin>, i64), AppError> {
        let tables = self.tables.lock().await;
        let matching: Vec<&User> = tables.users.iter().filter(|u| user_matches(u, filter)).collect();
        let total = matching.len() as i64;

        let users = paginate(newest_first(matching, |u| u.created_at), page)
            .into_iter()
            .map(|u| tables.user_with_admin(u))
            .collect();

        Ok((users, total))
    }

    async fn admin_stats(&self) -> Result<AdminStats, AppError> {
        let tables = self.tables.lock().await;
        Ok(AdminStats {
            total_users: tables.users.len() as i64,
            total_admins: tables.users.iter().filter(|u| u.role.is_admin()).count() as i64,
            active_users: tables.users.iter().filter(|u| u.is_active).count() as i64,
            total_establishments: tables.establishments.len() as i64,
        })
    }
}

#[async_trait]
impl EstablishmentStore for MemoryStore {
    async fn resolve_scope(&self, user_id: Uuid) -> Result<Option<EstablishmentScope>, AppError> {
        let tables = self.tables.lock().await;
        let scope = tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id && m.is_active)
            .min_by_key(|m| m.created_at)
            .and_then(|m| tables.establishments.iter().find(|e| e.id == m.establishment_id))
            .map(|e| EstablishmentScope {
                id: e.id,
                name: e.name.clone(),
            });
        Ok(scope)
    }

    async fn list_establishments(&self) -> Result<Vec<EstablishmentSummary>, AppError> {
        let tables = self.tables.lock().await;
        let mut establishments: Vec<EstablishmentSummary> = tables
            .establishments
            .iter()
            .map(|e| EstablishmentSummary {
                id: e.id,
                name: e.name.clone(),
                address: e.address.clone(),
                phone: e.phone.clone(),
                email: e.email.clone(),
                owner_id: e.owner_id,
                owner_email: e
                    .owner_id
                    .and_then(|id| tables.users.iter().find(|u| u.id == id))
                    .map(|u| u.email.clone()),
                is_active: e.is_active,
                created_at: e.created_at,
            })
            .collect();
        establishments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(establishments)
    }

    async fn find_establishment(&self, id: Uuid) -> Result<Option<Establishment>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.establishments.iter().find(|e| e.id == id).cloned())
    }

    async fn create_establishment(&self, new: NewEstablishment) -> Result<Establishment, AppError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let establishment = Establishment {
            id: new.id,
            name: new.name,
            address: new.address,
            phone: new.phone,
            email: new.email,
            owner_id: new.owner_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.establishments.push(establishment.clone());

        if let Some(owner_id) = establishment.owner_id {
            tables.activate_membership(establishment.id, owner_id);
        }
        Ok(establishment)
    }

    async fn assign_member(&self, establishment_id: Uuid, user_id: Uuid) -> Result<Membership, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.activate_membership(establishment_id, user_id))
    }
}

#[async_trait]
impl AnimalStore for MemoryStore {
    async fn list_animals(
        &self,
        establishment_id: Uuid,
        filter: &AnimalFilter,
        page: PageRequest,
    ) -> Result<(Vec<AnimalListItem>, i64), AppError> {
        let tables = self.tables.lock().await;
        let matching: Vec<&Animal> = tables
            .animals
            .iter()
            .filter(|a| animal_matches(a, establishment_id, filter))
            .collect();
        let total = matching.len() as i64;

        let animals = paginate(newest_first(matching, |a| a.created_at), page)
            .into_iter()
            .map(|a| AnimalListItem {
                id: a.id,
                external_tag: a.external_tag.clone(),
                internal_tag: a.internal_tag.clone(),
                name: a.name.clone(),
                birth_date: a.birth_date,
                breed: a.breed.clone(),
                entry_date: a.entry_date,
                observations: a.observations.clone(),
                current_rodeo_id: a.current_rodeo_id,
                rodeo_name: tables.rodeo_name(a.current_rodeo_id),
                created_at: a.created_at,
                active_alerts: tables.active_alerts_for(a.id),
            })
            .collect();

        Ok((animals, total))
    }

    async fn find_animal(&self, establishment_id: Uuid, id: Uuid) -> Result<Option<Animal>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .animals
            .iter()
            .find(|a| a.id == id && a.establishment_id == establishment_id && a.is_active)
            .cloned())
    }

    async fn find_animals(&self, establishment_id: Uuid, ids: &[Uuid]) -> Result<Vec<Animal>, AppError> {
        let tables = self.tables.lock().await;
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        Ok(tables
            .animals
            .iter()
            .filter(|a| wanted.contains(&a.id) && a.establishment_id == establishment_id && a.is_active)
            .cloned()
            .collect())
    }

    async fn find_animal_view(&self, establishment_id: Uuid, id: Uuid) -> Result<Option<AnimalView>, AppError> {
        let tables = self.tables.lock().await;
        let Some(animal) = tables
            .animals
            .iter()
            .find(|a| a.id == id && a.establishment_id == establishment_id && a.is_active)
        else {
            return Ok(None);
        };

        let mother = animal
            .mother_id
            .and_then(|mother_id| tables.animals.iter().find(|a| a.id == mother_id));

        Ok(Some(AnimalView {
            rodeo_name: tables.rodeo_name(animal.current_rodeo_id),
            mother_name: mother.and_then(|m| m.name.clone()),
            mother_external_tag: mother.and_then(|m| m.external_tag.clone()),
            animal: animal.clone(),
        }))
    }

    async fn animal_history(&self, animal_id: Uuid) -> Result<AnimalHistory, AppError> {
        let tables = self.tables.lock().await;

        let mut production_records: Vec<ProductionRecord> = tables
            .production
            .iter()
            .filter(|r| r.animal_id == animal_id)
            .cloned()
            .collect();
        production_records.reverse();
        production_records.sort_by(|a, b| b.record_date.cmp(&a.record_date));

        let mut health_records: Vec<HealthRecord> = tables
            .health
            .iter()
            .filter(|r| r.animal_id == animal_id)
            .cloned()
            .collect();
        health_records.reverse();
        health_records.sort_by(|a, b| b.record_date.cmp(&a.record_date));

        let mut reproduction_records: Vec<ReproductionRecord> = tables
            .reproduction
            .iter()
            .filter(|r| r.animal_id == animal_id)
            .cloned()
            .collect();
        reproduction_records.reverse();
        reproduction_records.sort_by(|a, b| b.record_date.cmp(&a.record_date));

        let movements = tables
            .movements
            .iter()
            .rev()
            .filter(|m| m.animal_id == animal_id)
            .map(|m| MovementView {
                from_rodeo_name: tables.rodeo_name(m.from_rodeo_id),
                to_rodeo_name: tables.rodeo_name(m.to_rodeo_id),
                movement: m.clone(),
            })
            .collect();

        let mut alerts: Vec<Alert> = tables
            .alerts
            .iter()
            .filter(|a| a.animal_id == animal_id && a.is_active)
            .cloned()
            .collect();
        alerts.reverse();
        alerts.sort_by(|a, b| b.alert_date.cmp(&a.alert_date));

        let mut photos: Vec<AnimalPhoto> = tables
            .photos
            .iter()
            .rev()
            .filter(|p| p.animal_id == animal_id)
            .cloned()
            .collect();
        photos.sort_by(|a, b| b.is_primary.cmp(&a.is_primary));

        Ok(AnimalHistory {
            production_records,
            health_records,
            reproduction_records,
            movements,
            alerts,
            photos,
        })
    }

    async fn external_tag_taken(&self, tag: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.external_tag_taken(tag, except))
    }

    async fn internal_tag_taken(
        &self,
        establishment_id: Uuid,
        tag: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.internal_tag_taken(establishment_id, tag, except))
    }

    async fn insert_animal(&self, animal: Animal, activity: NewActivity) -> Result<Animal, AppError> {
        let mut tables = self.tables.lock().await;
        tables.check_tags(&animal)?;
        tables.animals.push(animal.clone());
        tables.log(activity);
        Ok(animal)
    }

    async fn update_animal(&self, animal: Animal, activity: NewActivity) -> Result<Animal, AppError> {
        let mut tables = self.tables.lock().await;
        tables.check_tags(&animal)?;

        let Some(stored) = tables.animals.iter_mut().find(|a| a.id == animal.id) else {
            return Err(AppError::NotFound("Animal not found".into()));
        };
        stored.external_tag = animal.external_tag;
        stored.internal_tag = animal.internal_tag;
        stored.name = animal.name;
        stored.birth_date = animal.birth_date;
        stored.breed = animal.breed;
        stored.mother_id = animal.mother_id;
        stored.father_name = animal.father_name;
        stored.entry_date = animal.entry_date;
        stored.observations = animal.observations;
        stored.updated_at = Utc::now();

        let updated = stored.clone();
        tables.log(activity);
        Ok(updated)
    }

    async fn record_moves(
        &self,
        moves: &[AnimalMove],
        reason: Option<&str>,
        created_by: Uuid,
        activity: NewActivity,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        for step in moves {
            if let Some(animal) = tables.animals.iter_mut().find(|a| a.id == step.animal_id) {
                animal.current_rodeo_id = step.to_rodeo_id;
                animal.updated_at = now;
            }
            tables.movements.push(Movement {
                id: step.movement_id,
                animal_id: step.animal_id,
                from_rodeo_id: step.from_rodeo_id,
                to_rodeo_id: step.to_rodeo_id,
                reason: reason.map(str::to_string),
                created_by: Some(created_by),
                movement_date: now,
            });
        }

        tables.log(activity);
        Ok(())
    }

    async fn add_production_record(
        &self,
        record: ProductionRecord,
        activity: NewActivity,
    ) -> Result<ProductionRecord, AppError> {
        let mut tables = self.tables.lock().await;
        tables.production.push(record.clone());
        tables.log(activity);
        Ok(record)
    }

    async fn add_health_record(&self, record: HealthRecord, activity: NewActivity) -> Result<HealthRecord, AppError> {
        let mut tables = self.tables.lock().await;
        tables.health.push(record.clone());
        tables.log(activity);
        Ok(record)
    }

    async fn add_reproduction_record(
        &self,
        record: ReproductionRecord,
        activity: NewActivity,
    ) -> Result<ReproductionRecord, AppError> {
        let mut tables = self.tables.lock().await;
        tables.reproduction.push(record.clone());
        tables.log(activity);
        Ok(record)
    }

    async fn add_alert(&self, alert: Alert, activity: NewActivity) -> Result<Alert, AppError> {
        let mut tables = self.tables.lock().await;
        tables.alerts.push(alert.clone());
        tables.log(activity);
        Ok(alert)
    }

    async fn find_active_alert(&self, establishment_id: Uuid, alert_id: Uuid) -> Result<Option<Alert>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .alerts
            .iter()
            .find(|a| a.id == alert_id && a.is_active && tables.animal_in_scope(establishment_id, a.animal_id))
            .cloned())
    }

    async fn resolve_alert(
        &self,
        alert_id: Uuid,
        resolved_by: Uuid,
        resolved_date: NaiveDate,
        activity: NewActivity,
    ) -> Result<Option<Alert>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(alert) = tables.alerts.iter_mut().find(|a| a.id == alert_id && a.is_active) else {
            return Ok(None);
        };

        alert.is_active = false;
        alert.resolved_by = Some(resolved_by);
        alert.resolved_date = Some(resolved_date);

        let resolved = alert.clone();
        tables.log(activity);
        Ok(Some(resolved))
    }

    async fn add_photo(&self, photo: AnimalPhoto, activity: NewActivity) -> Result<AnimalPhoto, AppError> {
        let mut tables = self.tables.lock().await;
        if photo.is_primary {
            tables
                .photos
                .iter_mut()
                .filter(|p| p.animal_id == photo.animal_id)
                .for_each(|p| p.is_primary = false);
        }
        tables.photos.push(photo.clone());
        tables.log(activity);
        Ok(photo)
    }
}

#[async_trait]
impl RodeoStore for MemoryStore {
    async fn list_rodeos(&self, establishment_id: Uuid) -> Result<Vec<RodeoWithCounts>, AppError> {
        let tables = self.tables.lock().await;
        let mut rodeos: Vec<RodeoWithCounts> = tables
            .rodeos
            .iter()
            .filter(|r| r.establishment_id == establishment_id && r.is_active)
            .map(|r| RodeoWithCounts {
                animal_count: tables.rodeo_animal_count(r.id),
                active_alerts: tables.rodeo_alerts(r.id),
                rodeo: r.clone(),
            })
            .collect();
        rodeos.sort_by(|a, b| a.rodeo.name.cmp(&b.rodeo.name));
        Ok(rodeos)
    }

    async fn find_rodeo(&self, establishment_id: Uuid, id: Uuid) -> Result<Option<Rodeo>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rodeos
            .iter()
            .find(|r| r.id == id && r.establishment_id == establishment_id && r.is_active)
            .cloned())
    }

    async fn rodeo_animals(&self, establishment_id: Uuid, rodeo_id: Uuid) -> Result<Vec<RodeoAnimal>, AppError> {
        let tables = self.tables.lock().await;
        let mut animals: Vec<RodeoAnimal> = tables
            .animals
            .iter()
            .filter(|a| a.is_active && a.establishment_id == establishment_id && a.current_rodeo_id == Some(rodeo_id))
            .map(|a| RodeoAnimal {
                id: a.id,
                external_tag: a.external_tag.clone(),
                internal_tag: a.internal_tag.clone(),
                name: a.name.clone(),
                birth_date: a.birth_date,
                breed: a.breed.clone(),
                active_alerts: tables.active_alerts_for(a.id),
            })
            .collect();
        animals.sort_by_key(|a| (nulls_last(&a.external_tag), nulls_last(&a.internal_tag), nulls_last(&a.name)));
        Ok(animals)
    }

    async fn rodeo_name_taken(
        &self,
        establishment_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.rodeos.iter().any(|r| {
            r.establishment_id == establishment_id && r.is_active && r.name == name && Some(r.id) != except
        }))
    }

    async fn count_rodeo_animals(&self, rodeo_id: Uuid) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.rodeo_animal_count(rodeo_id))
    }

    async fn insert_rodeo(&self, rodeo: Rodeo, activity: NewActivity) -> Result<Rodeo, AppError> {
        let mut tables = self.tables.lock().await;
        let duplicate = tables
            .rodeos
            .iter()
            .any(|r| r.establishment_id == rodeo.establishment_id && r.is_active && r.name == rodeo.name);
        if duplicate {
            return Err(AppError::Conflict("Rodeo name already exists in this establishment".into()));
        }

        tables.rodeos.push(rodeo.clone());
        tables.log(activity);
        Ok(rodeo)
    }

    async fn update_rodeo(&self, rodeo: Rodeo, activity: NewActivity) -> Result<Rodeo, AppError> {
        let mut tables = self.tables.lock().await;
        let duplicate = tables.rodeos.iter().any(|r| {
            r.establishment_id == rodeo.establishment_id && r.is_active && r.name == rodeo.name && r.id != rodeo.id
        });
        if duplicate {
            return Err(AppError::Conflict("Rodeo name already exists in this establishment".into()));
        }

        let Some(stored) = tables.rodeos.iter_mut().find(|r| r.id == rodeo.id) else {
            return Err(AppError::NotFound("Rodeo not found".into()));
        };
        stored.name = rodeo.name;
        stored.description = rodeo.description;
        stored.updated_at = Utc::now();

        let updated = stored.clone();
        tables.log(activity);
        Ok(updated)
    }

    async fn deactivate_rodeo(&self, rodeo_id: Uuid, activity: NewActivity) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        if let Some(rodeo) = tables.rodeos.iter_mut().find(|r| r.id == rodeo_id) {
            rodeo.is_active = false;
            rodeo.updated_at = Utc::now();
        }
        tables.log(activity);
        Ok(())
    }
}

#[derive(Default)]
struct DayTotals {
    animals: HashSet<Uuid>,
    liters_sum: Decimal,
    liters_count: i64,
    quality_sum: Decimal,
    quality_count: i64,
    records: i64,
}

#[async_trait]
impl DashboardStore for MemoryStore {
    async fn establishment_counts(&self, establishment_id: Uuid) -> Result<EstablishmentCounts, AppError> {
        let tables = self.tables.lock().await;

        let active_alerts: Vec<&Alert> = tables
            .alerts
            .iter()
            .filter(|a| a.is_active && tables.animal_in_scope(establishment_id, a.animal_id))
            .collect();
        let of_type = |kind: &str| active_alerts.iter().filter(|a| a.alert_type == kind).count() as i64;

        Ok(EstablishmentCounts {
            total_animals: tables
                .animals
                .iter()
                .filter(|a| a.establishment_id == establishment_id && a.is_active)
                .count() as i64,
            total_rodeos: tables
                .rodeos
                .iter()
                .filter(|r| r.establishment_id == establishment_id && r.is_active)
                .count() as i64,
            total_alerts: active_alerts.len() as i64,
            pregnancy_alerts: of_type("pregnancy"),
            antibiotics_alerts: of_type("antibiotics"),
        })
    }

    async fn daily_production(
        &self,
        establishment_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DailyProduction>, AppError> {
        let tables = self.tables.lock().await;
        let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();

        for record in tables
            .production
            .iter()
            .filter(|r| r.record_date >= since && tables.animal_in_scope(establishment_id, r.animal_id))
        {
            let day = days.entry(record.record_date).or_default();
            day.animals.insert(record.animal_id);
            day.records += 1;
            if let Some(liters) = record.liters_per_day {
                day.liters_sum += liters;
                day.liters_count += 1;
            }
            if let Some(quality) = record.quality_rating {
                day.quality_sum += Decimal::from(quality);
                day.quality_count += 1;
            }
        }

        let average = |sum: Decimal, count: i64| {
            if count == 0 {
                Decimal::ZERO
            } else {
                round2(sum / Decimal::from(count))
            }
        };

        Ok(days
            .into_iter()
            .map(|(date, day)| DailyProduction {
                date,
                animals_milked: day.animals.len() as i64,
                avg_liters_per_animal: average(day.liters_sum, day.liters_count),
                total_liters: day.liters_sum,
                avg_quality: average(day.quality_sum, day.quality_count),
                total_records: day.records,
            })
            .collect())
    }

    async fn recent_activity(&self, establishment_id: Uuid, limit: i64) -> Result<Vec<ActivityFeedItem>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .activity
            .iter()
            .rev()
            .filter(|row| row.activity.establishment_id == establishment_id)
            .take(limit.max(0) as usize)
            .map(|row| ActivityFeedItem {
                activity_type: row.activity.activity_type.as_str().to_string(),
                description: row.activity.description.clone(),
                created_at: row.created_at,
                user_name: display_name(&tables.users, Some(row.activity.user_id)),
            })
            .collect())
    }

    async fn rodeo_summaries(&self, establishment_id: Uuid) -> Result<Vec<RodeoSummary>, AppError> {
        let tables = self.tables.lock().await;
        let mut rodeos: Vec<RodeoSummary> = tables
            .rodeos
            .iter()
            .filter(|r| r.establishment_id == establishment_id && r.is_active)
            .map(|r| RodeoSummary {
                id: r.id,
                name: r.name.clone(),
                animal_count: tables.rodeo_animal_count(r.id),
                alerts_count: tables.rodeo_alerts(r.id),
            })
            .collect();
        rodeos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rodeos)
    }

    async fn active_alert_feed(&self, establishment_id: Uuid, limit: i64) -> Result<Vec<AlertFeedRow>, AppError> {
        let tables = self.tables.lock().await;
        let mut alerts: Vec<(&Alert, &Animal)> = tables
            .alerts
            .iter()
            .filter(|a| a.is_active)
            .filter_map(|alert| {
                tables
                    .animals
                    .iter()
                    .find(|a| a.id == alert.animal_id && a.establishment_id == establishment_id)
                    .map(|animal| (alert, animal))
            })
            .collect();
        alerts.sort_by(|(a, _), (b, _)| {
            b.alert_date
                .cmp(&a.alert_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(alerts
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(alert, animal)| AlertFeedRow {
                id: alert.id,
                alert_type: alert.alert_type.clone(),
                title: alert.title.clone(),
                description: alert.description.clone(),
                alert_date: alert.alert_date,
                created_at: alert.created_at,
                external_tag: animal.external_tag.clone(),
                internal_tag: animal.internal_tag.clone(),
                animal_name: animal.name.clone(),
                rodeo_name: tables.rodeo_name(animal.current_rodeo_id),
                created_by_name: display_name(&tables.users, alert.created_by),
            })
            .collect())
    }

    async fn search_animals(&self, establishment_id: Uuid, query: &str, limit: i64) -> Result<Vec<SearchHit>, AppError> {
        let tables = self.tables.lock().await;
        let needle = query.to_lowercase();

        let mut hits: Vec<(u8, &Animal)> = tables
            .animals
            .iter()
            .filter(|a| a.establishment_id == establishment_id && a.is_active)
            .filter(|a| {
                contains_ci(a.external_tag.as_deref(), &needle)
                    || contains_ci(a.internal_tag.as_deref(), &needle)
                    || contains_ci(a.name.as_deref(), &needle)
            })
            .map(|a| {
                let rank = if starts_with_ci(a.external_tag.as_deref(), &needle) {
                    1
                } else if starts_with_ci(a.internal_tag.as_deref(), &needle) {
                    2
                } else {
                    3
                };
                (rank, a)
            })
            .collect();

        hits.sort_by_key(|(rank, a)| {
            (
                *rank,
                nulls_last(&a.external_tag),
                nulls_last(&a.internal_tag),
                nulls_last(&a.name),
            )
        });

        Ok(hits
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, a)| SearchHit {
                id: a.id,
                external_tag: a.external_tag.clone(),
                internal_tag: a.internal_tag.clone(),
                name: a.name.clone(),
                rodeo_name: tables.rodeo_name(a.current_rodeo_id),
                active_alerts: tables.active_alerts_for(a.id),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::ActivityType;

    fn animal(establishment_id: Uuid, external: Option<&str>, internal: Option<&str>) -> Animal {
        let now = Utc::now();
        Animal {
            id: Uuid::new_v4(),
            establishment_id,
            current_rodeo_id: None,
            mother_id: None,
            external_tag: external.map(str::to_string),
            internal_tag: internal.map(str::to_string),
            name: None,
            birth_date: None,
            breed: None,
            father_name: None,
            entry_date: None,
            observations: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn activity(establishment_id: Uuid) -> NewActivity {
        NewActivity::new(
            establishment_id,
            Uuid::new_v4(),
            ActivityType::AnimalCreated,
            "animal",
            Uuid::new_v4(),
            "test",
        )
    }

    #[tokio::test]
    async fn tag_uniqueness_mirrors_the_database_indexes() {
        let store = MemoryStore::new();
        let (farm_a, farm_b) = (Uuid::new_v4(), Uuid::new_v4());

        store
            .insert_animal(animal(farm_a, Some("AR-1"), Some("7")), activity(farm_a))
            .await
            .unwrap();

        // brinco oficial é global
        let err = store
            .insert_animal(animal(farm_b, Some("AR-1"), None), activity(farm_b))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // brinco interno só vale dentro do estabelecimento
        assert!(store.insert_animal(animal(farm_b, None, Some("7")), activity(farm_b)).await.is_ok());
        assert!(store.insert_animal(animal(farm_a, None, Some("7")), activity(farm_a)).await.is_err());
    }

    #[tokio::test]
    async fn resolving_twice_returns_none() {
        let store = MemoryStore::new();
        let farm = Uuid::new_v4();
        let cow = store.insert_animal(animal(farm, Some("AR-9"), None), activity(farm)).await.unwrap();

        let alert = Alert {
            id: Uuid::new_v4(),
            animal_id: cow.id,
            alert_type: "pregnancy".into(),
            title: "Check".into(),
            description: None,
            alert_date: Utc::now().date_naive(),
            is_active: true,
            created_by: None,
            resolved_by: None,
            resolved_date: None,
            created_at: Utc::now(),
        };
        store.add_alert(alert.clone(), activity(farm)).await.unwrap();

        let today = Utc::now().date_naive();
        let first = store.resolve_alert(alert.id, Uuid::new_v4(), today, activity(farm)).await.unwrap();
        assert!(first.is_some_and(|a| !a.is_active));

        let second = store.resolve_alert(alert.id, Uuid::new_v4(), today, activity(farm)).await.unwrap();
        assert!(second.is_none());
        assert!(store.find_active_alert(farm, alert.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn earliest_active_membership_wins() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let mut ids = Vec::new();
        for name in ["Norte", "Sur"] {
            let created = store
                .create_establishment(NewEstablishment {
                    id: Uuid::new_v4(),
                    name: name.into(),
                    address: None,
                    phone: None,
                    email: None,
                    owner_id: None,
                })
                .await
                .unwrap();
            ids.push(created.id);
        }

        assert!(store.resolve_scope(user_id).await.unwrap().is_none());

        store.assign_member(ids[0], user_id).await.unwrap();
        assert_eq!(store.resolve_scope(user_id).await.unwrap().map(|s| s.id), Some(ids[0]));

        // o novo vínculo desativa o anterior
        store.assign_member(ids[1], user_id).await.unwrap();
        assert_eq!(store.resolve_scope(user_id).await.unwrap().map(|s| s.id), Some(ids[1]));
    }
}
