use crate::domain::{Identity, UserId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 認証基盤ポート
///
/// 認証済みの呼び出し元について、ロールとオンボーディング完了フラグを提供する。
/// 認証そのもの（トークン検証など）はこのポートの外側の責務。
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 利用者IDから呼び出し元の情報を取得する
    ///
    /// 未登録の利用者は `None`。
    async fn identify(&self, user_id: UserId) -> Result<Option<Identity>>;
}
