use crate::domain::{Identity, Role, UserId};
use crate::ports::identity_provider::{IdentityProvider as IdentityProviderTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

fn role_from_column(role: &str) -> Result<Role> {
    match role {
        "user" => Ok(Role::User),
        "admin" => Ok(Role::Admin),
        other => Err(format!("Invalid role: {}", other).into()),
    }
}

/// IdentityProviderのPostgreSQL実装
///
/// 認証基盤が同期している users テーブルからロールとオンボーディング状況を読む。
pub struct IdentityProvider {
    pool: PgPool,
}

impl IdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProviderTrait for IdentityProvider {
    async fn identify(&self, user_id: UserId) -> Result<Option<Identity>> {
        let row = sqlx::query(
            r#"
            SELECT role, onboarding_completed
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.value())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Identity {
            user_id,
            role: role_from_column(row.try_get("role")?)?,
            onboarding_completed: row.try_get("onboarding_completed")?,
        }))
    }
}
