//! tests/api/helpers.rs

use anyhow::Error;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version};
use async_once_cell::OnceCell;
use lazy_static::lazy_static;
use once_cell::sync::Lazy;
use sqlx::{Connection, Executor, PgConnection, PgPool, Row};
use tokenauth::configuration::{get_configuration, DatabaseSettings};
use tokenauth::startup::{get_connection_pool, Application};
use tokenauth::telemetry::{get_subscriber, init_subscriber};
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // We cannot assign the output of `get_subscriber` to a variable based on the
    // value TEST_LOG` because the sink is part of the type returned by
    // `get_subscriber`, therefore they are not the same type. We could work around
    // it, but this is the most straight-forward way of moving forward.
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

lazy_static! {
    static ref CLEANUP_DB: OnceCell<Result<(), Error>> = OnceCell::new();
}

pub struct TestUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl TestUser {
    pub fn generate() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            username: Uuid::new_v4().to_string(),
            email: format!("{}@test.example.com", Uuid::new_v4()),
            password: Uuid::new_v4().to_string(),
        }
    }

    /// A test user with fixed credentials, e.g. to pin down a concrete
    /// scenario. `store` bypasses the strength policy the same way an
    /// administrative creation path would.
    pub fn with_credentials(username: &str, email: &str, password: &str) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    pub async fn store(&self, pool: &PgPool) {
        let salt = SaltString::generate(&mut rand::thread_rng());
        // We don't care about the exact Argon2 parameters here
        // given that it's for testing purposes!
        let password_hash = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(15_000, 2, 1, None).unwrap(),
        )
        .hash_password(self.password.as_bytes(), &salt)
        .unwrap()
        .to_string();
        sqlx::query(
            "INSERT INTO users (user_id, username, email, password_hash, joined_at)
            VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(self.user_id)
        .bind(&self.username)
        .bind(&self.email)
        .bind(password_hash)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await
        .expect("Failed to create test user.");
    }

    pub async fn login(&self, app: &TestApp) -> reqwest::Response {
        app.post_login(&serde_json::json!({
            "username": &self.username,
            "password": &self.password
        }))
        .await
    }

    /// Log in and extract the issued token.
    pub async fn login_token(&self, app: &TestApp) -> String {
        let response = self.login(app).await;
        assert_eq!(response.status().as_u16(), 200);
        extract_token(response).await
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db_pool: PgPool,
    pub db_name: String,
    pub test_user: TestUser,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// helper for sending a POST /register request
    pub async fn post_register<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}/register", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// helper for sending a POST /login request
    pub async fn post_login<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}/login", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// helper to get the profile, with or without a token
    pub async fn get_profile(&self, token: Option<&str>) -> reqwest::Response {
        let mut request = self.api_client.get(&format!("{}/profile", &self.address));
        if let Some(token) = token {
            request = request.header("Authorization", format!("Token {}", token));
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// helper to change the password of the token's owner
    pub async fn put_change_password<Body>(&self, token: &str, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .put(&format!("{}/change-password", &self.address))
            .header("Authorization", format!("Token {}", token))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// helper to revoke the presented token
    pub async fn post_logout(&self, token: Option<&str>) -> reqwest::Response {
        let mut request = self.api_client.post(&format!("{}/logout", &self.address));
        if let Some(token) = token {
            request = request.header("Authorization", format!("Token {}", token));
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// helper to revoke every token of the caller
    pub async fn post_logout_all(&self, token: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/logout-all", &self.address))
            .header("Authorization", format!("Token {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// helper to probe liveness
    pub async fn get_health_check(&self) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/health_check", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// number of user rows carrying this username
    pub async fn count_users_with_username(&self, username: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to count users.")
    }

    /// total number of user rows
    pub async fn count_users(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to count users.")
    }

    /// number of active session tokens of a user
    pub async fn count_session_tokens(&self, user_id: Uuid) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM session_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to count session tokens.")
    }
}

/// Pull the `token` field out of a successful login/register response.
pub async fn extract_token(response: reqwest::Response) -> String {
    let body: serde_json::Value = response.json().await.unwrap();
    body["token"]
        .as_str()
        .expect("Response carried no token.")
        .to_string()
}

/// Assert a field-scoped error response: given status, and `field` carrying
/// `expected_message` among its messages.
pub async fn assert_field_error(
    response: reqwest::Response,
    expected_status: u16,
    field: &str,
    expected_message: &str,
) {
    assert_eq!(expected_status, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    let messages = body[field]
        .as_array()
        .unwrap_or_else(|| panic!("Response carried no `{}` field: {}", field, body));
    assert!(
        messages
            .iter()
            .any(|m| m.as_str() == Some(expected_message)),
        "`{}` did not contain `{}`: {}",
        field,
        expected_message,
        body
    );
}

/// Spin up an instance of our application
/// and returns its address (i.e. http://localhost:XXXX)
pub async fn spawn_app() -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);
    if let Err(r) = CLEANUP_DB.get_or_init(cleanup_db()).await {
        panic!("clean up of test databases failed:\n{}", r);
    }

    // Randomise configuration to ensure test isolation
    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        // use different database for each test case
        c.database.database_name = Uuid::new_v4().to_string();
        // use a random OS port
        c.application.port = 0;
        c
    };

    // Create and migrate the database
    configure_database(&configuration.database).await;

    let application = Application::build(configuration.clone())
        .await
        .expect("Failed to build application");
    let application_port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let test_app = TestApp {
        address: format!("http://127.0.0.1:{}", application_port),
        port: application_port,
        db_pool: get_connection_pool(&configuration.database),
        db_name: configuration.database.database_name,
        test_user: TestUser::generate(),
        api_client: client,
    };
    test_app.test_user.store(&test_app.db_pool).await;
    test_app
}

async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres");

    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("Failed to create database.");

    // Migrate database
    let connection_pool = PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");

    connection_pool
}

async fn cleanup_db() -> Result<(), Error> {
    let database = get_configuration()?.database;
    // Connect to postgres without db
    let mut connection = PgConnection::connect_with(&database.without_db()).await?;

    let rows = connection
        .fetch_all("SELECT datname FROM pg_database WHERE datistemplate = false")
        .await?;

    for row in rows {
        let database_name: String = row.try_get("datname")?;
        if Uuid::parse_str(&database_name).is_ok() {
            // database is Uuid -> test database -> delete it
            let query: &str = &format!(r#"DROP DATABASE IF EXISTS "{}" ( FORCE ) "#, database_name);
            connection.execute(query).await?;
        }
    }
    Ok(())
}
