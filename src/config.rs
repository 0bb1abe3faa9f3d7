use std::env;

// ============================================================================
// Configuration
// ============================================================================
//
// Everything comes from the environment, like RUST_LOG does. The seed admin
// is a provisioning concern: the first admin account is created explicitly
// at startup from these values, never inferred from a caller's email at
// request time.
//
// ============================================================================

const DEFAULT_METRICS_PORT: u16 = 9090;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the Prometheus scrape endpoint binds to (`METRICS_PORT`).
    pub metrics_port: u16,
    /// Admin account provisioned once at startup
    /// (`SEED_ADMIN_NAME` + `SEED_ADMIN_EMAIL`).
    pub seed_admin: Option<SeedAdmin>,
}

#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub name: String,
    pub email: String,
}

impl Config {
    pub fn from_env() -> Self {
        let metrics_port = env::var("METRICS_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_METRICS_PORT);

        let seed_admin = match (env::var("SEED_ADMIN_NAME"), env::var("SEED_ADMIN_EMAIL")) {
            (Ok(name), Ok(email)) if !name.is_empty() && !email.is_empty() => {
                Some(SeedAdmin { name, email })
            }
            _ => None,
        };

        Self {
            metrics_port,
            seed_admin,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            seed_admin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.metrics_port, DEFAULT_METRICS_PORT);
        assert!(config.seed_admin.is_none());
    }
}
