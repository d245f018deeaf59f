use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "folio", about = "A server-rendered blog")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub mail: MailConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    /// Secret used to sign session and flash cookies.
    pub secret_key: Option<String>,
    pub bcrypt_cost: u32,
}

/// Super-admin seeded at startup.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AdminConfig {
    pub email: Option<String>,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MailConfig {
    pub address: Option<String>,
    pub app_password: Option<String>,
    pub service: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5002,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "folio_session".to_string(),
            session_hours: 720,
            secret_key: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: None,
            username: "Admin1".to_string(),
            password: "admin123".to_string(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            address: None,
            app_password: None,
            service: "gmail".to_string(),
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env(|name| std::env::var(name).ok())?;

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("posts.db"));
        }

        Ok(config)
    }

    /// Overlay the deployment environment variables on top of file values.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(secret) = get("SECRET_APP_KEY") {
            self.auth.secret_key = Some(secret);
        }
        if let Some(uri) = get("DB_URI") {
            self.database.path = Some(parse_db_uri(&uri)?);
        }
        if let Some(email) = get("SUPER_ADMIN_EMAIL") {
            self.admin.email = Some(email);
        }
        if let Some(address) = get("EMAIL_KEY") {
            self.mail.address = Some(address);
        }
        if let Some(password) = get("PASSWORD_KEY") {
            self.mail.app_password = Some(password);
        }
        Ok(())
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(".folio"))
                .unwrap_or_else(|| PathBuf::from(".folio"))
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("posts.db"))
    }
}

/// Accepts `sqlite:///relative.db`, `sqlite:////absolute.db` or a bare path.
pub fn parse_db_uri(uri: &str) -> anyhow::Result<PathBuf> {
    if let Some(rest) = uri.strip_prefix("sqlite:///") {
        if rest.is_empty() {
            anyhow::bail!("DB_URI is missing a database path");
        }
        return Ok(PathBuf::from(rest));
    }
    if uri.contains("://") {
        anyhow::bail!("Unsupported DB_URI scheme (only sqlite is supported): {}", uri);
    }
    Ok(PathBuf::from(uri))
}
