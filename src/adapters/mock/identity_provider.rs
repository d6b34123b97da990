use crate::domain::{Identity, Role, UserId};
use crate::ports::identity_provider::{IdentityProvider as IdentityProviderTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// IdentityProviderのモック実装
///
/// 利用者を登録することで状態を持ったテストをサポート。
pub struct IdentityProvider {
    identities: Mutex<HashMap<UserId, Identity>>,
}

impl IdentityProvider {
    pub fn new() -> Self {
        Self {
            identities: Mutex::new(HashMap::new()),
        }
    }

    /// テスト用に利用者を登録
    pub fn add_identity(&self, identity: Identity) {
        self.identities
            .lock()
            .unwrap()
            .insert(identity.user_id, identity);
    }

    /// オンボーディング済みの一般利用者を登録して返す
    pub fn add_user(&self) -> Identity {
        let identity = Identity {
            user_id: UserId::new(),
            role: Role::User,
            onboarding_completed: true,
        };
        self.add_identity(identity.clone());
        identity
    }

    /// 管理者を登録して返す
    pub fn add_admin(&self) -> Identity {
        let identity = Identity {
            user_id: UserId::new(),
            role: Role::Admin,
            onboarding_completed: true,
        };
        self.add_identity(identity.clone());
        identity
    }
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProviderTrait for IdentityProvider {
    async fn identify(&self, user_id: UserId) -> Result<Option<Identity>> {
        Ok(self.identities.lock().unwrap().get(&user_id).cloned())
    }
}
