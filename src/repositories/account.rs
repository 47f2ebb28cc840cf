//! Account repository for database operations.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::account;

/// Repository for account-related database operations.
pub struct AccountRepository;

impl AccountRepository {
    /// Get an account by id.
    pub async fn get_by_id<C>(conn: &C, id: &Uuid) -> Result<Option<account::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(account::Entity::find_by_id(*id).one(conn).await?)
    }

    /// Get every account that has completed remote authentication.
    pub async fn get_linked<C>(conn: &C) -> Result<Vec<account::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(account::Entity::find()
            .filter(account::Column::OauthId.is_not_null())
            .order_by_asc(account::Column::Name)
            .all(conn)
            .await?)
    }

    /// Create a new account.
    pub async fn create<C>(conn: &C, account: account::Model) -> Result<account::Model>
    where
        C: ConnectionTrait,
    {
        Ok(account.into_active_model().reset_all().insert(conn).await?)
    }

    /// Persist a refreshed access token (and a rotated refresh token, if any).
    pub async fn update_tokens<C>(
        conn: &C,
        account: account::Model,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<account::Model>
    where
        C: ConnectionTrait,
    {
        let mut active_model = account.into_active_model();
        active_model.oauth_token = ActiveValue::Set(Some(access_token.to_string()));
        active_model.oauth_expires_at = ActiveValue::Set(Some(expires_at));
        if let Some(refresh_token) = refresh_token {
            active_model.oauth_refresh_token = ActiveValue::Set(Some(refresh_token.to_string()));
        }
        Ok(active_model.update(conn).await?)
    }
}
