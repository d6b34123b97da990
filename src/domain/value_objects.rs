use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PricingError;

/// 予約ID - 予約管理コンテキストの集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

/// 利用者ID - 認証基盤（Identity Provider）への参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 車両ID - 車両カタログコンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

/// 金額（通貨の最小単位ではなく、整数の通貨単位）
///
/// 不変条件：負の金額は存在しない。
/// 減算は `saturating_sub` のみ提供し、0 未満にならないことを型で保証する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// 単価 × 数量
    pub fn times(self, quantity: u64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }

    pub fn saturating_add(self, other: Money) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// 0 で下限を打ち切る減算
    pub fn saturating_sub(self, other: Money) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Money::saturating_add)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 利用者のロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

/// Identity Provider から受け取る呼び出し元の情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
    pub onboarding_completed: bool,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 本人または管理者か
    pub fn can_access(&self, owner: UserId) -> bool {
        self.user_id == owner || self.is_admin()
    }
}

/// 緯度経度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// 予約作成時点の受け取り場所のスナップショット
///
/// 車両の所在地が後から変わっても過去の予約には影響しない（値のコピー）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub point: Option<GeoPoint>,
    pub address: String,
}

/// 予約期間 `[start, end)`
///
/// 不変条件：`end > start`（コンストラクタとデシリアライズで強制）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PeriodParts")]
pub struct RentalPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct PeriodParts {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<PeriodParts> for RentalPeriod {
    type Error = PricingError;

    fn try_from(parts: PeriodParts) -> Result<Self, Self::Error> {
        RentalPeriod::new(parts.start, parts.end)
    }
}

impl RentalPeriod {
    /// # エラー
    /// `end <= start` の場合は `PricingError::InvalidInterval`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PricingError> {
        if end <= start {
            return Err(PricingError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// 半開区間の重なり判定。端点が接するだけなら重ならない。
    pub fn overlaps(&self, other: &RentalPeriod) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_booking_id_creation() {
        let id1 = BookingId::new();
        let id2 = BookingId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_asset_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = AssetId::from_uuid(uuid);
        assert_eq!(id.value(), uuid);
    }

    #[test]
    fn test_money_saturating_sub_never_negative() {
        let price = Money::new(100);
        assert_eq!(price.saturating_sub(Money::new(250)), Money::ZERO);
        assert_eq!(price.saturating_sub(Money::new(40)), Money::new(60));
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [Money::new(10), Money::new(20), Money::new(5)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::new(35));
    }

    #[test]
    fn test_rental_period_rejects_empty_and_reversed() {
        assert!(RentalPeriod::new(at(2, 0), at(2, 0)).is_err());
        assert!(RentalPeriod::new(at(3, 0), at(2, 0)).is_err());
        assert!(RentalPeriod::new(at(2, 0), at(3, 0)).is_ok());
    }

    #[test]
    fn test_rental_period_touching_endpoints_do_not_overlap() {
        let first = RentalPeriod::new(at(1, 0), at(4, 0)).unwrap();
        let second = RentalPeriod::new(at(4, 0), at(6, 0)).unwrap();
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn test_rental_period_overlap_is_symmetric() {
        let outer = RentalPeriod::new(at(1, 0), at(10, 0)).unwrap();
        let inner = RentalPeriod::new(at(3, 0), at(4, 0)).unwrap();
        let partial = RentalPeriod::new(at(9, 0), at(12, 0)).unwrap();
        assert!(outer.overlaps(&inner) && inner.overlaps(&outer));
        assert!(outer.overlaps(&partial) && partial.overlaps(&outer));
        assert!(!inner.overlaps(&partial));
    }

    #[test]
    fn test_identity_can_access() {
        let owner = UserId::new();
        let user = Identity {
            user_id: owner,
            role: Role::User,
            onboarding_completed: true,
        };
        let stranger = Identity {
            user_id: UserId::new(),
            role: Role::User,
            onboarding_completed: true,
        };
        let admin = Identity {
            user_id: UserId::new(),
            role: Role::Admin,
            onboarding_completed: false,
        };
        assert!(user.can_access(owner));
        assert!(!stranger.can_access(owner));
        assert!(admin.can_access(owner));
    }
}
