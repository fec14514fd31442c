//! Demo access gates: a shared-password unlock and a demo login that accepts
//! any non-empty credentials. Neither is a security boundary.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tokio::sync::RwLock;
use uuid::Uuid;

pub const DEMO_USER_ID: &str = "demo-user-id";

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Admin => "Admin User",
            Self::User => "Demo User",
        }
    }

    /// Portal page a freshly logged-in user lands on.
    pub const fn landing(self) -> &'static str {
        match self {
            Self::Admin => "/admin/dashboard",
            Self::User => "/tenant/overview",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    unlocked: Arc<RwLock<HashSet<String>>>,
}

impl SessionStore {
    pub async fn unlock(&self, password: &str, expected: &str) -> Option<String> {
        if password != expected {
            return None;
        }
        let token = Uuid::new_v4().to_string();
        self.unlocked.write().await.insert(token.clone());
        Some(token)
    }

    pub async fn is_unlocked(&self, token: &str) -> bool {
        self.unlocked.read().await.contains(token)
    }

    pub async fn lock(&self, token: &str) -> bool {
        self.unlocked.write().await.remove(token)
    }

    pub async fn login(&self, email: &str, password: &str, role: Role) -> Option<(String, User)> {
        if email.is_empty() || password.is_empty() {
            return None;
        }
        let user = User {
            id: DEMO_USER_ID.to_string(),
            email: email.to_string(),
            name: role.display_name().to_string(),
            role,
        };
        let token = Uuid::new_v4().to_string();
        self.users.write().await.insert(token.clone(), user.clone());
        Some((token, user))
    }

    pub async fn get(&self, token: &str) -> Option<User> {
        self.users.read().await.get(token).cloned()
    }

    pub async fn logout(&self, token: &str) -> bool {
        self.users.write().await.remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, SessionStore, DEMO_USER_ID};

    #[tokio::test]
    async fn wrong_password_keeps_gate_closed() {
        let store = SessionStore::default();
        assert!(store.unlock("guess", "protoType2@25").await.is_none());
    }

    #[tokio::test]
    async fn unlock_then_lock() {
        let store = SessionStore::default();
        let token = store
            .unlock("protoType2@25", "protoType2@25")
            .await
            .expect("correct password");
        assert!(store.is_unlocked(&token).await);
        assert!(store.lock(&token).await);
        assert!(!store.is_unlocked(&token).await);
        assert!(!store.lock(&token).await);
    }

    #[tokio::test]
    async fn login_builds_demo_user_per_role() {
        let store = SessionStore::default();
        let (token, user) = store
            .login("ops@example.com", "x", Role::Admin)
            .await
            .expect("any credentials");
        assert_eq!(user.id, DEMO_USER_ID);
        assert_eq!(user.name, "Admin User");
        assert_eq!(store.get(&token).await, Some(user));

        let (_, tenant) = store
            .login("t@example.com", "x", Role::User)
            .await
            .expect("any credentials");
        assert_eq!(tenant.name, "Demo User");
        assert_eq!(Role::User.landing(), "/tenant/overview");
    }

    #[tokio::test]
    async fn empty_credentials_are_refused() {
        let store = SessionStore::default();
        assert!(store.login("", "x", Role::User).await.is_none());
        assert!(store.login("a@b", "", Role::User).await.is_none());
    }

    #[tokio::test]
    async fn logout_forgets_user() {
        let store = SessionStore::default();
        let (token, _) = store.login("a@b", "pw", Role::User).await.expect("login");
        assert!(store.logout(&token).await);
        assert!(store.get(&token).await.is_none());
    }
}
