//! Deployment endpoints, read from the environment.

/// Where the API lives. `api_base_url` prefixes every computed path;
/// `api_root_url` serves the discovery document.
#[derive(Clone, Debug)]
pub struct Environment {
    pub api_base_url: String,
    pub api_root_url: String,
}

impl Environment {
    pub fn new(api_base_url: impl Into<String>, api_root_url: impl Into<String>) -> Environment {
        Environment {
            api_base_url: api_base_url.into(),
            api_root_url: api_root_url.into(),
        }
    }

    /// From `MOVIESHIP_API_BASE_URL` / `MOVIESHIP_API_ROOT_URL`. The root
    /// URL defaults to the discovery endpoint under the base.
    pub fn from_env() -> Environment {
        let api_base_url = std::env::var("MOVIESHIP_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000".into());
        let api_root_url = std::env::var("MOVIESHIP_API_ROOT_URL")
            .unwrap_or_else(|_| format!("{}/api/v1", api_base_url));
        Environment {
            api_base_url,
            api_root_url,
        }
    }
}
