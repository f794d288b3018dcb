use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Identity of whoever is viewing the running application
pub trait SessionProvider: Send + Sync {
    fn current_user(&self) -> Option<UserInfo>;

    fn has_role(&self, role: &str) -> bool {
        self.current_user()
            .map_or(false, |user| user.roles.iter().any(|r| r == role))
    }
}

/// Fixed identity, anonymous when `None`
#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<UserInfo>);

impl StaticSession {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user(user: UserInfo) -> Self {
        Self(Some(user))
    }
}

impl SessionProvider for StaticSession {
    fn current_user(&self) -> Option<UserInfo> {
        self.0.clone()
    }
}
