use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const IMAGE: &str = "mysql";
const TAG: &str = "8.4";
const SERVER_PORT: u16 = 3306;

/// Credentials and database name for a disposable MySQL server.
#[derive(TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "zipline".to_string())]
    database: String,
    #[builder(default = "zipline".to_string())]
    username: String,
    #[builder(default = "zipline".to_string())]
    password: String,
}

/// Test fixture for a disposable MySQL server.
///
/// The image entrypoint logs "ready for connections" once for the
/// bootstrap server and once for the real one, so callers should still
/// retry their first connection.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    /// Starts a MySQL container suitable for integration tests.
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new(IMAGE, TAG)
            .with_exposed_port(SERVER_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn host(&self) -> Result<String> {
        let host = self.container.get_host().await?.to_string();

        // Pin "localhost" to IPv4; the forwarded port is not always
        // reachable over ::1.
        Ok(match host.as_str() {
            "localhost" => String::from("127.0.0.1"),
            _ => host,
        })
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self.container.get_host_port_ipv4(SERVER_PORT).await?)
    }

    /// Connection URL for the test database.
    pub async fn database_url(&self) -> Result<String> {
        Ok(format!(
            "mysql://{}:{}@{}:{}/{}",
            self.config.username,
            self.config.password,
            self.host().await?,
            self.port().await?,
            self.config.database
        ))
    }

    /// Returns the underlying container reference.
    pub fn container(&self) -> &ContainerAsync<GenericImage> {
        &self.container
    }
}
