use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::str::FromStr;

/// Blog policy knobs. The defaults are the values the site has always used.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogSettings {
    pub posts_per_page: usize,
    pub similar_posts_limit: usize,
    pub search_similarity_threshold: f64,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            posts_per_page: 3,
            similar_posts_limit: 4,
            search_similarity_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBackend {
    Console,
    Smtp,
    Memory,
}

impl FromStr for EmailBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(EmailBackend::Console),
            "smtp" => Ok(EmailBackend::Smtp),
            "memory" => Ok(EmailBackend::Memory),
            other => Err(format!("unknown email backend: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub backend: EmailBackend,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub default_from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: EmailBackend::Console,
            smtp_host: "localhost".to_string(),
            smtp_port: 25,
            smtp_username: None,
            smtp_password: None,
            default_from: "webmaster@localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Scheme and host used for absolute links, e.g. `https://blog.example.com`.
    /// When unset the request's `Host` header is used, if it is allowed.
    pub site_url: Option<String>,
    /// Host names links may be built from. `*` allows any host and a
    /// leading dot allows a domain and all of its subdomains.
    pub allowed_hosts: Vec<String>,
    pub blog: BlogSettings,
    pub mail: MailConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/blog.db".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            site_url: None,
            allowed_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string(), "[::1]".to_string()],
            blog: BlogSettings::default(),
            mail: MailConfig::default(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup, falling back to defaults
    /// for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let blog = BlogSettings {
            posts_per_page: parse_or(&var, "POSTS_PER_PAGE", defaults.blog.posts_per_page)?,
            similar_posts_limit: parse_or(
                &var,
                "SIMILAR_POSTS_LIMIT",
                defaults.blog.similar_posts_limit,
            )?,
            search_similarity_threshold: parse_or(
                &var,
                "SEARCH_SIMILARITY_THRESHOLD",
                defaults.blog.search_similarity_threshold,
            )?,
        };

        if blog.posts_per_page == 0 {
            anyhow::bail!("POSTS_PER_PAGE must be at least 1");
        }

        let backend = match var("EMAIL_BACKEND") {
            Some(value) => value.parse::<EmailBackend>().map_err(anyhow::Error::msg)?,
            None => defaults.mail.backend,
        };

        let mail = MailConfig {
            backend,
            smtp_host: var("SMTP_HOST").unwrap_or(defaults.mail.smtp_host),
            smtp_port: parse_or(&var, "SMTP_PORT", defaults.mail.smtp_port)?,
            smtp_username: var("SMTP_USERNAME"),
            smtp_password: var("SMTP_PASSWORD"),
            default_from: var("DEFAULT_FROM_EMAIL").unwrap_or(defaults.mail.default_from),
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: parse_or(&var, "BIND_ADDR", defaults.bind_addr)?,
            site_url: var("SITE_URL").map(|url| url.trim_end_matches('/').to_string()),
            allowed_hosts: var("ALLOWED_HOSTS")
                .map(|hosts| {
                    hosts
                        .split(',')
                        .map(|h| h.trim().to_lowercase())
                        .filter(|h| !h.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.allowed_hosts),
            blog,
            mail,
        })
    }

    /// Whether a `Host` header value, port included, names an allowed host.
    pub fn is_allowed_host(&self, host: &str) -> bool {
        let Some(domain) = host_domain(host) else {
            return false;
        };
        self.allowed_hosts.iter().any(|pattern| match pattern.as_str() {
            "*" => true,
            p if p.starts_with('.') => domain == p[1..] || domain.ends_with(p),
            p => domain == p,
        })
    }
}

/// Lowercased host without its port, or `None` if it is not a plain host name
/// or address.
fn host_domain(host: &str) -> Option<String> {
    let host = host.trim().to_lowercase();
    let domain = if host.starts_with('[') {
        let end = host.find(']')?;
        let (domain, rest) = host.split_at(end + 1);
        if !domain[1..end].chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.') {
            return None;
        }
        if !(rest.is_empty() || rest.strip_prefix(':').is_some_and(|p| p.chars().all(|c| c.is_ascii_digit()))) {
            return None;
        }
        domain.to_string()
    } else {
        let domain = match host.split_once(':') {
            Some((domain, port)) if port.chars().all(|c| c.is_ascii_digit()) => domain,
            Some(_) => return None,
            None => host.as_str(),
        };
        if !domain.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.') {
            return None;
        }
        domain.trim_end_matches('.').to_string()
    };
    (!domain.is_empty()).then_some(domain)
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {value:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, "sqlite:data/blog.db");
        assert_eq!(config.blog, BlogSettings::default());
        assert_eq!(config.blog.posts_per_page, 3);
        assert_eq!(config.blog.similar_posts_limit, 4);
        assert_eq!(config.blog.search_similarity_threshold, 0.1);
        assert_eq!(config.mail.backend, EmailBackend::Console);
        assert!(config.site_url.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("POSTS_PER_PAGE", "10"),
            ("SEARCH_SIMILARITY_THRESHOLD", "0.3"),
            ("EMAIL_BACKEND", "SMTP"),
            ("SMTP_PORT", "2525"),
            ("SITE_URL", "https://blog.example.com/"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ])
        .unwrap();
        assert_eq!(config.blog.posts_per_page, 10);
        assert_eq!(config.blog.search_similarity_threshold, 0.3);
        assert_eq!(config.mail.backend, EmailBackend::Smtp);
        assert_eq!(config.mail.smtp_port, 2525);
        assert_eq!(config.site_url.as_deref(), Some("https://blog.example.com"));
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config_from(&[("POSTS_PER_PAGE", "many")]).is_err());
        assert!(config_from(&[("POSTS_PER_PAGE", "0")]).is_err());
        assert!(config_from(&[("EMAIL_BACKEND", "pigeon")]).is_err());
    }

    #[test]
    fn allowed_hosts_match_exact_names_and_subdomains() {
        let config = config_from(&[("ALLOWED_HOSTS", "blog.example.com, .example.org")]).unwrap();
        assert!(config.is_allowed_host("blog.example.com"));
        assert!(config.is_allowed_host("Blog.Example.com:8080"));
        assert!(config.is_allowed_host("example.org"));
        assert!(config.is_allowed_host("www.example.org"));
        assert!(!config.is_allowed_host("evil.attacker.example"));
        assert!(!config.is_allowed_host("notexample.org"));
        assert!(!config.is_allowed_host("blog.example.com/evil"));
        assert!(!config.is_allowed_host("blog.example.com:80@evil.example"));
        assert!(!config.is_allowed_host(""));
    }

    #[test]
    fn default_hosts_are_local_only() {
        let config = Config::default();
        assert!(config.is_allowed_host("localhost:3000"));
        assert!(config.is_allowed_host("127.0.0.1"));
        assert!(config.is_allowed_host("[::1]:3000"));
        assert!(!config.is_allowed_host("blog.example.com"));

        let any = config_from(&[("ALLOWED_HOSTS", "*")]).unwrap();
        assert!(any.is_allowed_host("blog.example.com"));
        assert!(!any.is_allowed_host("bad host"));
    }

    #[test]
    fn similar_posts_limit_cannot_be_negative() {
        assert!(config_from(&[("SIMILAR_POSTS_LIMIT", "-1")]).is_err());
        let config = config_from(&[("SIMILAR_POSTS_LIMIT", "2")]).unwrap();
        assert_eq!(config.blog.similar_posts_limit, 2);
    }
}
