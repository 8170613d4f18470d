//! src/startup.rs

use actix_web::dev::Server;
use actix_web::{web, web::Data, App, HttpResponse, HttpServer};
use actix_web_lab::middleware::from_fn;
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::authentication::{reject_anonymous_users, PasswordPolicy};
use crate::configuration::{DatabaseSettings, Settings};
use crate::error::AuthResult;
use crate::routes::{
    change_password, health_check, log_out, log_out_all, login, profile, register,
};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> AuthResult<Self> {
        let connection_pool = get_connection_pool(&configuration.database);

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address).context("Failed to bind a TCP listener.")?;
        let port = listener
            .local_addr()
            .context("Failed to read the address of the TCP listener.")?
            .port();
        let password_policy = PasswordPolicy::new(configuration.password_policy.min_length);
        let server = run(listener, connection_pool, password_policy)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(configuration.with_db())
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    password_policy: PasswordPolicy,
) -> AuthResult<Server> {
    // Wrap shared state in smart pointers
    let db_pool = Data::new(db_pool);
    let password_policy = Data::new(password_policy);
    // Malformed JSON bodies surface in the same field-keyed shape as
    // domain validation errors.
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let body = serde_json::json!({ "non_field_errors": [err.to_string()] });
        actix_web::error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(body),
        )
        .into()
    });
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .service(
                web::scope("")
                    .wrap(from_fn(reject_anonymous_users))
                    .route("/logout", web::post().to(log_out))
                    .route("/logout-all", web::post().to(log_out_all))
                    .route("/profile", web::get().to(profile))
                    .route("/change-password", web::put().to(change_password)),
            )
            .app_data(json_config.clone())
            .app_data(db_pool.clone())
            .app_data(password_policy.clone())
    })
    .listen(listener)
    .context("Failed to listen on the provided TCP listener.")?
    .run();
    Ok(server)
}
