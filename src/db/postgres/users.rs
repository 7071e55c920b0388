// src/db/postgres/users.rs

use async_trait::async_trait;
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use super::PgStore;
use crate::{
    common::{
        error::{unique_violation, AppError},
        pagination::{contains_pattern, PageRequest},
    },
    db::UserStore,
    models::{
        admin::{AdminStats, NewUser, UserChanges, UserFilter, UserWithAdmin},
        auth::{User, UserRole},
    },
};

const USER_WITH_ADMIN: &str = r#"
    SELECT u.id, u.email, u.first_name, u.last_name, u.phone, u.role, u.is_active, u.created_at,
           a.admin_level, a.can_manage_users, a.can_manage_establishments, a.can_view_reports
    FROM users u
    LEFT JOIN administrators a ON a.user_id = u.id
"#;

fn push_user_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE TRUE");

    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        qb.push(" AND (u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.last_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(role) = filter.role {
        qb.push(" AND u.role = ").push_bind(role);
    }
}

// Mantém `administrators` coerente com o papel: cria/atualiza para admin e super_admin, remove para user.
async fn sync_admin_row<'e, E>(executor: E, user_id: Uuid, role: UserRole) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    if role.is_admin() {
        sqlx::query(
            r#"
            INSERT INTO administrators
                (user_id, admin_level, can_manage_users, can_manage_establishments, can_view_reports)
            VALUES ($1, $2, TRUE, TRUE, TRUE)
            ON CONFLICT (user_id) DO UPDATE SET admin_level = EXCLUDED.admin_level
            "#,
        )
        .bind(user_id)
        .bind(role)
        .execute(executor)
        .await?;
    } else {
        sqlx::query("DELETE FROM administrators WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(unique_violation("User with this email already exists"))?;

        if created.role.is_admin() {
            sync_admin_row(&mut *tx, created.id, created.role).await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                phone      = COALESCE($4, phone),
                role       = COALESCE($5, role),
                is_active  = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.phone)
        .bind(changes.role)
        .bind(changes.is_active)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = updated else {
            return Ok(None);
        };

        if changes.role.is_some() {
            sync_admin_row(&mut *tx, user.id, user.role).await?;
        }

        tx.commit().await?;
        Ok(Some(user))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        // `administrators` e os vínculos caem por ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user_with_admin(&self, id: Uuid) -> Result<Option<UserWithAdmin>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(USER_WITH_ADMIN);
        qb.push(" WHERE u.id = ").push_bind(id);

        let user = qb
            .build_query_as::<UserWithAdmin>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<(Vec<UserWithAdmin>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
        push_user_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(USER_WITH_ADMIN);
        push_user_filter(&mut qb, filter);
        qb.push(" ORDER BY u.created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let users = qb
            .build_query_as::<UserWithAdmin>()
            .fetch_all(&self.pool)
            .await?;

        Ok((users, total))
    }

    async fn admin_stats(&self) -> Result<AdminStats, AppError> {
        let stats = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM users WHERE role IN ('admin', 'super_admin')),
                (SELECT COUNT(*) FROM users WHERE is_active),
                (SELECT COUNT(*) FROM establishments)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminStats {
            total_users: stats.0,
            total_admins: stats.1,
            active_users: stats.2,
            total_establishments: stats.3,
        })
    }
}
