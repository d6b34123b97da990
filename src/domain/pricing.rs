use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Money, PricingError, RentalPeriod};

/// 車両に時間超過料金が設定されていない場合の既定値
pub const DEFAULT_EXTRA_CHARGE_PER_HOUR: Money = Money::new(50);

/// 返却遅れの猶予（時間）。これを超えた場合のみ延滞料金が発生する。
pub const GRACE_PERIOD_HOURS: i64 = 1;

/// 早期返却の返金対象となる最小の前倒し時間
pub const EARLY_RETURN_THRESHOLD_HOURS: i64 = 24;

/// `elapsed` を `unit` で割った商と、余りがあるか
///
/// ナノ秒で計算し、i64に収まらない長さのときだけマイクロ秒、ミリ秒へ落とす。
/// `elapsed` は0以上であること。
fn divide_elapsed(elapsed: Duration, unit: Duration) -> (u64, bool) {
    let (numerator, denominator) = match (elapsed.num_nanoseconds(), unit.num_nanoseconds()) {
        (Some(n), Some(d)) => (n, d),
        _ => match (elapsed.num_microseconds(), unit.num_microseconds()) {
            (Some(n), Some(d)) => (n, d),
            _ => (elapsed.num_milliseconds(), unit.num_milliseconds()),
        },
    };
    let quotient = (numerator / denominator).max(0) as u64;
    (quotient, numerator % denominator != 0)
}

fn ceil_units(elapsed: Duration, unit: Duration) -> u64 {
    match divide_elapsed(elapsed, unit) {
        (quotient, true) => quotient + 1,
        (quotient, false) => quotient,
    }
}

/// 精算時の調整額
///
/// 延滞料金と返金は互いに素な範囲から計算されるため、同時に非ゼロにはならない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettlementAdjustment {
    pub penalty: Money,
    pub refund: Money,
}

/// 課金日数
///
/// 経過時間を24時間で割って切り上げる（暦日・タイムゾーンは考慮しない）。
/// 期間は正であることが型で保証されているので、結果は必ず1以上。
pub fn rental_days(period: &RentalPeriod) -> u64 {
    ceil_units(period.duration(), Duration::days(1)).max(1)
}

/// 基本料金 = 課金日数 × 1日あたりの料金
///
/// # エラー
/// `end <= start` の場合は `PricingError::InvalidInterval`
pub fn compute_base_price(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    price_per_day: Money,
) -> Result<Money, PricingError> {
    let period = RentalPeriod::new(start, end)?;
    Ok(base_price_for(&period, price_per_day))
}

/// 検証済みの期間に対する基本料金
pub fn base_price_for(period: &RentalPeriod, price_per_day: Money) -> Money {
    price_per_day.times(rental_days(period))
}

/// 実際に適用する時間超過料金
///
/// 未設定または0の場合は `default_rate` を使う。
pub fn effective_hourly_rate(extra_charge_per_hour: Option<Money>, default_rate: Money) -> Money {
    extra_charge_per_hour
        .filter(|rate| !rate.is_zero())
        .unwrap_or(default_rate)
}

/// 返却時刻から延滞料金または返金額を計算する
///
/// ルール：
/// - 予定終了からの差が1時間以内なら延滞料金なし（猶予）
/// - 1時間を超えた遅れは、遅れ時間を切り上げた時間数 × 時間超過料金
/// - 24時間より前倒しの返却は、前倒し日数（切り捨て）× 1日あたりの料金を返金
/// - その間（-24h 〜 +1h）は調整なし
pub fn compute_settlement(
    scheduled_end: DateTime<Utc>,
    actual_return: DateTime<Utc>,
    price_per_day: Money,
    extra_charge_per_hour: Money,
) -> SettlementAdjustment {
    let diff = actual_return - scheduled_end;

    if diff > Duration::hours(GRACE_PERIOD_HOURS) {
        let late_hours = ceil_units(diff, Duration::hours(1));
        return SettlementAdjustment {
            penalty: extra_charge_per_hour.times(late_hours),
            refund: Money::ZERO,
        };
    }

    if diff < -Duration::hours(EARLY_RETURN_THRESHOLD_HOURS) {
        let (early_days, _) = divide_elapsed(-diff, Duration::days(1));
        return SettlementAdjustment {
            penalty: Money::ZERO,
            refund: price_per_day.times(early_days),
        };
    }

    SettlementAdjustment::default()
}

/// 最終料金 = max(0, 基本料金 + 延滞料金 - 返金)
pub fn final_price(base_price: Money, adjustment: SettlementAdjustment) -> Money {
    base_price
        .saturating_add(adjustment.penalty)
        .saturating_sub(adjustment.refund)
}
