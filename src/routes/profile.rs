//! src/routes/profile.rs

use actix_web::{web, HttpResponse};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::authentication::UserId;
use crate::error::AuthResult;

/// The caller-visible slice of a user record.
#[derive(sqlx::FromRow)]
pub struct ProfileData {
    pub username: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(serde::Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    pub date_joined: NaiveDate,
}

pub async fn profile(
    user_id: web::ReqData<UserId>,
    pool: web::Data<PgPool>,
) -> AuthResult<HttpResponse> {
    let profile_data = get_profile_data(&pool, **user_id).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse {
        // only the date portion of the join timestamp is exposed
        date_joined: profile_data.joined_at.date_naive(),
        username: profile_data.username,
        email: profile_data.email,
    }))
}

#[tracing::instrument(name = "Get profile data of user", skip(pool))]
pub async fn get_profile_data(pool: &PgPool, user_id: Uuid) -> AuthResult<ProfileData> {
    let row = sqlx::query_as::<_, ProfileData>(
        r#"
        SELECT username, email, joined_at
        FROM users
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to perform query to retrieve profile data.")?;
    // session tokens are removed with their user, so an authenticated
    // request always finds its user row
    let profile_data = row.context("User behind an active session token no longer exists.")?;
    Ok(profile_data)
}
