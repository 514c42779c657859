use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutQuery {
    pub next: Option<String>,
}

impl LogoutQuery {
    /// Where to send the browser after logout. Only same-site paths are
    /// honoured so `next` cannot be used as an open redirect.
    pub fn redirect_target(&self) -> &str {
        match self.next.as_deref() {
            Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => next,
            _ => "/",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(next: Option<&str>) -> String {
        LogoutQuery {
            next: next.map(String::from),
        }
        .redirect_target()
        .to_string()
    }

    #[test]
    fn defaults_to_root() {
        assert_eq!(target(None), "/");
    }

    #[test]
    fn keeps_local_paths() {
        assert_eq!(target(Some("/login")), "/login");
        assert_eq!(target(Some("/?view=full")), "/?view=full");
    }

    #[test]
    fn rejects_external_targets() {
        assert_eq!(target(Some("https://evil.example")), "/");
        assert_eq!(target(Some("//evil.example")), "/");
        assert_eq!(target(Some("/\\evil.example")), "/");
        assert_eq!(target(Some("")), "/");
    }
}
