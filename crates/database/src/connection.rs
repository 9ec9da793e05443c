//! Database connection management

use crate::entities::{Chat, User};
use crate::types::{DatabaseError, DatabaseResult};
use korero_config::DatabaseConfig;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use tracing::{error, info};

pub const USERS_COLLECTION: &str = "users";
pub const CHATS_COLLECTION: &str = "chats";

/// Build driver options from configuration without touching the network.
pub async fn client_options(config: &DatabaseConfig) -> DatabaseResult<ClientOptions> {
    let mut options = ClientOptions::parse(config.uri.as_str())
        .await
        .map_err(|e| DatabaseError::ConnectionFailure(format!("invalid database uri: {e}")))?;

    let timeout = config.connect_timeout();
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);
    options.max_pool_size = Some(config.max_pool_size);
    if options.app_name.is_none() {
        options.app_name = config.app_name.clone();
    }

    Ok(options)
}

/// Process-wide handle to the document database.
///
/// The driver pools connections internally, so one handle is created at startup,
/// cloned into every repository, and released with [`DatabaseConnection::close`].
#[derive(Clone, Debug)]
pub struct DatabaseConnection {
    client: Client,
    database: Database,
}

impl DatabaseConnection {
    /// Connect and verify the server answers within the configured timeout.
    pub async fn from_config(config: &DatabaseConfig) -> DatabaseResult<Self> {
        config
            .validate()
            .map_err(|e| DatabaseError::ConnectionFailure(e.to_string()))?;

        let options = client_options(config).await?;
        let client = Client::with_options(options)
            .map_err(|e| DatabaseError::from_connect("create database client", e))?;
        let connection = Self::from_client(client, &config.name);

        match tokio::time::timeout(config.connect_timeout(), connection.test_connection()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(error = %e, database = %config.name, "database ping failed");
                return Err(e.into_connection_failure());
            }
            Err(_) => {
                error!(database = %config.name, "database ping timed out");
                return Err(DatabaseError::ConnectionFailure(format!(
                    "no response from database within {}s",
                    config.connect_timeout_seconds
                )));
            }
        }

        info!(database = %config.name, "database connection established");
        Ok(connection)
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client, database_name: &str) -> Self {
        let database = client.database(database_name);
        Self { client, database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn users(&self) -> Collection<User> {
        self.database.collection(USERS_COLLECTION)
    }

    pub fn chats(&self) -> Collection<Chat> {
        self.database.collection(CHATS_COLLECTION)
    }

    /// Round-trip a `ping` command.
    pub async fn test_connection(&self) -> DatabaseResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DatabaseError::from_read("ping database", e))?;
        Ok(())
    }

    /// Release pooled connections. Clones still held elsewhere stop working.
    pub async fn close(self) {
        self.client.shutdown().await;
        info!(database = %self.database.name(), "database connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn options_carry_configured_timeouts_and_pool() {
        let config = DatabaseConfig {
            connect_timeout_seconds: 3,
            max_pool_size: 4,
            ..DatabaseConfig::with_uri("mongodb://localhost:27017")
        };

        let options = client_options(&config).await.unwrap();
        assert_eq!(options.connect_timeout, Some(std::time::Duration::from_secs(3)));
        assert_eq!(options.server_selection_timeout, Some(std::time::Duration::from_secs(3)));
        assert_eq!(options.max_pool_size, Some(4));
        assert_eq!(options.app_name.as_deref(), Some("korero"));
    }

    #[tokio::test]
    async fn malformed_uri_is_a_connection_failure() {
        let config = DatabaseConfig::with_uri("http://localhost:27017");

        let error = DatabaseConnection::from_config(&config).await.unwrap_err();
        assert!(error.is_unavailable());
    }

    #[tokio::test]
    async fn missing_uri_is_reported_instead_of_exiting() {
        let error = DatabaseConnection::from_config(&DatabaseConfig::default())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("not configured"));
    }
}
