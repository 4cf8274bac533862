use anyhow::Result;

/// Who is calling the backend. Built once at startup and handed to the REST
/// client, instead of being read from ambient storage on every request.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    user_id: Option<String>,
}

impl Session {
    pub fn new(token: Option<String>, user_id: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            user_id: user_id.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn require_user_id(&self) -> Result<&str> {
        self.user_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no user id in session; log in first"))
    }

    /// Build auth headers for a request. Empty for anonymous sessions.
    pub fn headers(&self) -> Vec<(String, String)> {
        match &self.token {
            Some(token) => vec![("Authorization".to_string(), format!("Bearer {}", token))],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let session = Session::new(Some("abc123".to_string()), Some("7".to_string()));
        assert!(session.is_authenticated());
        assert_eq!(
            session.headers(),
            vec![("Authorization".to_string(), "Bearer abc123".to_string())]
        );
        assert_eq!(session.require_user_id().unwrap(), "7");
    }

    #[test]
    fn test_blank_values_are_anonymous() {
        let session = Session::new(Some("  ".to_string()), Some(String::new()));
        assert!(!session.is_authenticated());
        assert!(session.headers().is_empty());
        assert!(session.require_user_id().is_err());
    }
}
