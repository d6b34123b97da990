use crate::domain::{
    self, Asset, AssetId, Booking, BookingId, BookingStatus, Identity, Money, RentalPeriod,
    SettlementTerms, Transition, UserId, commands::*,
};
use crate::ports::{AssetCatalog, BookingRepository, IdentityProvider, StoreError};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::errors::{BookingApplicationError, Result};

/// 永続化呼び出しの既定の制限時間
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// 予約サービスの設定値
#[derive(Debug, Clone, Copy)]
pub struct BookingSettings {
    /// 永続化層の1回の呼び出しに許す時間
    pub store_timeout: Duration,
    /// 車両に時間超過料金が設定されていない場合に使う料金
    pub default_extra_charge_per_hour: Money,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            default_extra_charge_per_hour: domain::pricing::DEFAULT_EXTRA_CHARGE_PER_HOUR,
        }
    }
}

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
/// 予約・車両のコレクションはグローバルな状態ではなく、ここから注入される。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub booking_repository: Arc<dyn BookingRepository>,
    pub asset_catalog: Arc<dyn AssetCatalog>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub settings: BookingSettings,
}

/// 永続化層の呼び出しを制限時間付きで実行する
///
/// 制限時間を超えた場合は `StoreError::Timeout` として扱う。
pub(super) async fn within_store_timeout<T>(
    deps: &ServiceDependencies,
    call: impl Future<Output = std::result::Result<T, StoreError>>,
) -> Result<T> {
    let result = tokio::time::timeout(deps.settings.store_timeout, call)
        .await
        .map_err(|_| StoreError::Timeout)?;
    Ok(result?)
}

/// 予約を読み込むヘルパー関数
///
/// # エラー
/// - StorageError: 読み込み失敗
/// - BookingNotFound: 予約が存在しない
pub(super) async fn load_booking(
    deps: &ServiceDependencies,
    booking_id: BookingId,
) -> Result<Booking> {
    within_store_timeout(deps, deps.booking_repository.get_by_id(booking_id))
        .await?
        .ok_or(BookingApplicationError::BookingNotFound)
}

async fn load_asset(deps: &ServiceDependencies, asset_id: AssetId) -> Result<Asset> {
    deps.asset_catalog
        .find_asset(asset_id)
        .await
        .map_err(BookingApplicationError::AssetCatalogError)?
        .ok_or(BookingApplicationError::AssetNotFound)
}

/// 呼び出し元を認証基盤で解決する
///
/// 未登録の利用者は `Unauthorized`。
pub async fn resolve_caller(deps: &ServiceDependencies, user_id: UserId) -> Result<Identity> {
    deps.identity_provider
        .identify(user_id)
        .await
        .map_err(BookingApplicationError::IdentityProviderError)?
        .ok_or(BookingApplicationError::Unauthorized)
}

/// 車両の指定期間に、スケジュールを占有している予約が重なっているか
///
/// `exclude` に指定した予約は判定から除く（期間変更時の自分自身）。
/// 副作用なし。
///
/// # エラー
/// - InvalidInterval: `end <= start`
/// - StorageError: 検索失敗
pub async fn has_conflict(
    deps: &ServiceDependencies,
    asset_id: AssetId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<BookingId>,
) -> Result<bool> {
    let period = RentalPeriod::new(start, end)?;
    check_conflict(deps, asset_id, &period, exclude).await
}

async fn check_conflict(
    deps: &ServiceDependencies,
    asset_id: AssetId,
    period: &RentalPeriod,
    exclude: Option<BookingId>,
) -> Result<bool> {
    let holders = within_store_timeout(
        deps,
        deps.booking_repository.find_schedule_holders(asset_id, period),
    )
    .await?;

    Ok(domain::overlap::has_conflict(
        &holders, asset_id, period, exclude,
    ))
}

/// 車両を予約する
///
/// ビジネスルール：
/// - 呼び出し元のオンボーディングが完了していること
/// - 車両が存在し、有効かつ貸出可能であること
/// - 終了日時が開始日時より後であること
/// - 同じ車両の有効な予約と期間が重ならないこと
///
/// # 一貫性保証
///
/// 事前の重複チェックは早期に失敗させるためのもの。
/// 同時に作成された予約同士の競合は、リポジトリがコミット時に検出し
/// `ScheduleConflict` として返す。どちらか一方だけが保存される。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `caller` - 解決済みの呼び出し元
/// * `cmd` - 予約作成コマンド
///
/// # 戻り値
/// 作成された Pending 状態の予約
pub async fn create_booking(
    deps: &ServiceDependencies,
    caller: &Identity,
    cmd: CreateBooking,
) -> Result<Booking> {
    // 1. オンボーディング・車両の確認
    if !caller.onboarding_completed {
        return Err(BookingApplicationError::OnboardingRequired);
    }

    let asset = load_asset(deps, cmd.asset_id).await?;
    if !asset.is_bookable() {
        return Err(BookingApplicationError::AssetUnavailable);
    }

    // 2. 期間の検証
    let period = RentalPeriod::new(cmd.start, cmd.end)?;

    // 3. 重複チェック
    if check_conflict(deps, asset.asset_id, &period, None).await? {
        tracing::warn!(
            asset_id = %asset.asset_id.value(),
            start = %period.start(),
            end = %period.end(),
            "booking rejected: schedule conflict"
        );
        return Err(BookingApplicationError::ScheduleConflict);
    }

    // 4. ドメイン層の純粋関数を呼び出し（料金計算・所在地のスナップショット）
    let (booking, event) =
        domain::booking::create_booking(caller.user_id, &asset, period, Utc::now())?;

    // 5. 保存（コミット時に重複が再検査される）
    within_store_timeout(
        deps,
        deps.booking_repository
            .insert(&booking, &domain::BookingEvent::BookingCreated(event)),
    )
    .await?;

    tracing::info!(
        booking_id = %booking.booking_id.value(),
        asset_id = %booking.asset_id.value(),
        user_id = %booking.user_id.value(),
        base_price = %booking.base_price,
        "booking created"
    );

    Ok(booking)
}

/// 予約のステータスを変更する（管理者のみ）
///
/// ビジネスルール：
/// - Approved / PickedUp / Active は料金計算を伴わない単純な変更
/// - Returned / Completed は精算として扱い、最終ステータスは Completed
/// - Cancelled はキャンセルと同じ条件で判定する
/// - Pending には戻せない
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `caller` - 解決済みの呼び出し元（管理者）
/// * `cmd` - ステータス変更コマンド
pub async fn update_status(
    deps: &ServiceDependencies,
    caller: &Identity,
    cmd: UpdateBookingStatus,
) -> Result<Booking> {
    if !caller.is_admin() {
        return Err(BookingApplicationError::Unauthorized);
    }

    let booking = load_booking(deps, cmd.booking_id).await?;

    let now = Utc::now();
    let transition = Transition::from_requested(cmd.requested, cmd.returned_at.unwrap_or(now))
        .ok_or(BookingApplicationError::InvalidTransition {
            current: booking.status,
            requested: cmd.requested,
        })?;

    // 料金条件が必要なのは精算のときだけ
    let terms = match transition {
        Transition::Settle { .. } => {
            let asset = load_asset(deps, booking.asset_id).await?;
            SettlementTerms::for_asset(&asset, deps.settings.default_extra_charge_per_hour)
        }
        Transition::Advance(_) | Transition::Cancel => SettlementTerms::unpriced(),
    };

    let (updated, event) =
        domain::booking::apply_transition(&booking, transition, terms, now).inspect_err(|e| {
            tracing::warn!(
                booking_id = %booking.booking_id.value(),
                error = %e,
                "status change rejected"
            );
        })?;

    within_store_timeout(deps, deps.booking_repository.update(&updated, &event)).await?;

    tracing::info!(
        booking_id = %updated.booking_id.value(),
        from = %booking.status,
        to = %updated.status,
        final_price = %updated.final_price(),
        "booking status updated"
    );

    Ok(updated)
}

/// 予約をキャンセルする
///
/// ビジネスルール：
/// - 予約した本人または管理者のみ
/// - Pending / Approved のみキャンセル可能
pub async fn cancel_booking(
    deps: &ServiceDependencies,
    caller: &Identity,
    cmd: CancelBooking,
) -> Result<Booking> {
    let booking = load_booking(deps, cmd.booking_id).await?;

    if !caller.can_access(booking.user_id) {
        return Err(BookingApplicationError::Unauthorized);
    }

    let (cancelled, event) = domain::booking::cancel_booking(&booking, Utc::now())?;

    within_store_timeout(
        deps,
        deps.booking_repository
            .update(&cancelled, &domain::BookingEvent::BookingCancelled(event)),
    )
    .await?;

    tracing::info!(
        booking_id = %cancelled.booking_id.value(),
        cancelled_by = %caller.user_id.value(),
        "booking cancelled"
    );

    Ok(cancelled)
}

/// 予約期間を変更する
///
/// ビジネスルール：
/// - 予約した本人のみ
/// - Pending のみ変更可能
/// - 自分自身を除いて重複チェックをやり直す
/// - 基本料金を再計算する
pub async fn update_booking_dates(
    deps: &ServiceDependencies,
    caller: &Identity,
    cmd: UpdateBookingDates,
) -> Result<Booking> {
    let booking = load_booking(deps, cmd.booking_id).await?;

    if caller.user_id != booking.user_id {
        return Err(BookingApplicationError::Unauthorized);
    }

    if booking.status != BookingStatus::Pending {
        return Err(BookingApplicationError::InvalidTransition {
            current: booking.status,
            requested: BookingStatus::Pending,
        });
    }

    let period = RentalPeriod::new(cmd.start, cmd.end)?;

    if check_conflict(deps, booking.asset_id, &period, Some(booking.booking_id)).await? {
        tracing::warn!(
            booking_id = %booking.booking_id.value(),
            "date change rejected: schedule conflict"
        );
        return Err(BookingApplicationError::ScheduleConflict);
    }

    let asset = load_asset(deps, booking.asset_id).await?;

    let (updated, event) =
        domain::booking::reschedule_booking(&booking, period, asset.price_per_day, Utc::now())?;

    within_store_timeout(
        deps,
        deps.booking_repository
            .update(&updated, &domain::BookingEvent::BookingRescheduled(event)),
    )
    .await?;

    tracing::info!(
        booking_id = %updated.booking_id.value(),
        base_price = %updated.base_price,
        "booking dates updated"
    );

    Ok(updated)
}
