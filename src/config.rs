use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Admin account created at startup when no user with that username exists.
#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://clinic.db".to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(5);

        let bootstrap_admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.trim().is_empty() && !password.is_empty() => {
                let email = env::var("ADMIN_EMAIL")
                    .unwrap_or_else(|_| format!("{}@clinic.local", username.trim()));
                Some(BootstrapAdmin {
                    username: username.trim().to_string(),
                    email,
                    password,
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            bootstrap_admin,
        })
    }
}
