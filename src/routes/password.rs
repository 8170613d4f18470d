//! src/routes/password.rs

use actix_web::{web, HttpResponse};
use secrecy::Secret;
use sqlx::PgPool;

use crate::authentication::{
    change_password_in_db, validate_credentials, Credentials, PasswordPolicy, UserId,
};
use crate::domain::ValidationError;
use crate::error::AuthResult;
use crate::routes::get_profile_data;

#[derive(serde::Deserialize)]
pub struct PasswordData {
    pub old_password: Secret<String>,
    pub new_password: Secret<String>,
}

#[derive(serde::Serialize)]
pub struct PasswordChangedResponse {
    pub message: String,
}

pub async fn change_password(
    payload: web::Json<PasswordData>,
    user_id: web::ReqData<UserId>,
    pool: web::Data<PgPool>,
    policy: web::Data<PasswordPolicy>,
) -> AuthResult<HttpResponse> {
    let user_id = user_id.into_inner();
    let identity = get_profile_data(&pool, *user_id).await?;
    let PasswordData {
        old_password,
        new_password,
    } = payload.into_inner();
    // first check the replacement against the strength policy; a weak one is
    // reported even when the old password would not verify
    policy
        .validate(&new_password, &identity.username, &identity.email)
        .map_err(|reasons| ValidationError::WeakPassword {
            field: "new_password",
            reasons,
        })?;
    // then verify the current password
    let credentials = Credentials {
        username: identity.username,
        password: old_password,
    };
    validate_credentials(credentials, &pool)
        .await
        .map_err(|e| e.into_wrong_old_password())?;
    // existing session tokens stay valid across a password change
    change_password_in_db(*user_id, new_password, &pool).await?;
    Ok(HttpResponse::Ok().json(PasswordChangedResponse {
        message: "Password updated successfully".to_string(),
    }))
}
