//! Server Configuration

/// Settings read from the environment at startup
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Public origin of the app; base for checkout return URLs and login redirects
    pub app_url: String,

    /// Directory holding the compiled WASM frontend
    pub static_dir: String,

    /// HS256 secret shared with the OAuth session provider
    pub auth_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            app_url: "http://localhost:3000".into(),
            static_dir: "static".into(),
            auth_secret: None,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            app_url: std::env::var("APP_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.app_url),
            static_dir: std::env::var("STATIC_DIR").unwrap_or(defaults.static_dir),
            auth_secret: std::env::var("AUTH_SECRET")
                .ok()
                .filter(|secret| !secret.is_empty()),
        }
    }

    /// Where Stripe sends the user after paying
    pub fn checkout_success_url(&self) -> String {
        format!(
            "{}/billing?success=true&session_id={{CHECKOUT_SESSION_ID}}",
            self.app_url
        )
    }

    /// Where Stripe sends the user on cancel
    pub fn checkout_cancel_url(&self) -> String {
        format!("{}/billing?canceled=true", self.app_url)
    }
}
