use crate::error::DbError;
use configuration::{Credentials, DatabaseSettings};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Builds connection options from a credentials section.
///
/// Options are assembled field by field rather than through a URL so passwords
/// containing `@`, `:` or `/` need no escaping.
pub fn connect_options(credentials: &Credentials) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&credentials.host)
        .port(credentials.port)
        .username(&credentials.user)
        .database(&credentials.dbname);

    if credentials.password.is_empty() {
        options
    } else {
        options.password(&credentials.password)
    }
}

/// Establishes a connection pool to the PostgreSQL database.
///
/// A `DATABASE_URL` (from the environment or a `.env` file) wins over the
/// credentials, which keeps local overrides out of the shared config file.
pub async fn connect(
    credentials: &Credentials,
    settings: &DatabaseSettings,
) -> Result<PgPool, DbError> {
    // A missing .env file is fine; the credentials are the normal path.
    let _ = dotenvy::dotenv();

    let options = match env::var("DATABASE_URL") {
        Ok(url) => PgConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?,
        Err(_) => connect_options(credentials),
    };

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect_with(options)
        .await?;

    tracing::info!(database = %credentials.label(), "Connected to database.");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            user: "footy".to_string(),
            password: "p@ss:word/1".to_string(),
            host: "warehouse.local".to_string(),
            port: 6543,
            dbname: "afl".to_string(),
            db: None,
        }
    }

    #[test]
    fn options_carry_every_credential_field() {
        let options = connect_options(&credentials());
        assert_eq!(options.get_host(), "warehouse.local");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "footy");
        assert_eq!(options.get_database(), Some("afl"));
    }
}
