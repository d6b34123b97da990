use crate::domain::{
    AssetId, Booking, BookingEvent, BookingId, BookingStatus, GeoPoint, LocationSnapshot, Money,
    RentalPeriod, Settlement, UserId,
};
use crate::ports::booking_repository::{
    BookingRepository as BookingRepositoryTrait, Result, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::collections::BTreeMap;
use std::str::FromStr;

/// 排他制約違反（exclusion_violation）
const EXCLUSION_VIOLATION: &str = "23P01";

const SELECT_BOOKINGS: &str = r#"
    SELECT
        booking_id,
        user_id,
        asset_id,
        scheduled_start,
        scheduled_end,
        actual_return,
        base_price,
        penalty_amount,
        refund_amount,
        final_price,
        status,
        pickup_lat,
        pickup_lng,
        pickup_address,
        version,
        created_at,
        updated_at
    FROM bookings
"#;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) {
                return StoreError::ScheduleConflict;
            }
        }
        StoreError::Backend(Box::new(err))
    }
}

fn invalid_data(message: String) -> StoreError {
    StoreError::Backend(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

fn money_from_column(row: &PgRow, column: &str) -> Result<Money> {
    let amount: i64 = row.try_get(column)?;
    u64::try_from(amount)
        .map(Money::new)
        .map_err(|_| invalid_data(format!("{} out of range: {}", column, amount)))
}

fn money_to_column(amount: Money) -> Result<i64> {
    i64::try_from(amount.value())
        .map_err(|_| invalid_data(format!("amount out of range: {}", amount)))
}

fn version_to_column(version: u32) -> Result<i32> {
    i32::try_from(version).map_err(|_| invalid_data(format!("version out of range: {}", version)))
}

/// PostgreSQLの行データをBookingに変換する
///
/// 金額（BIGINT）・バージョン（INTEGER）・ステータス文字列の変換で
/// 不正な値があればエラーにする。
fn map_row_to_booking(row: &PgRow) -> Result<Booking> {
    let status_str: &str = row.try_get("status")?;
    let status = BookingStatus::from_str(status_str).map_err(invalid_data)?;

    let start: DateTime<Utc> = row.try_get("scheduled_start")?;
    let end: DateTime<Utc> = row.try_get("scheduled_end")?;
    let period = RentalPeriod::new(start, end).map_err(|e| invalid_data(e.to_string()))?;

    let version: i32 = row.try_get("version")?;
    let version = u32::try_from(version)
        .map_err(|_| invalid_data(format!("version out of range: {}", version)))?;

    let actual_return: Option<DateTime<Utc>> = row.try_get("actual_return")?;
    let settlement = match actual_return {
        Some(actual_return) => Some(Settlement {
            actual_return,
            penalty: money_from_column(row, "penalty_amount")?,
            refund: money_from_column(row, "refund_amount")?,
            final_price: money_from_column(row, "final_price")?,
        }),
        None => None,
    };

    let lat: Option<f64> = row.try_get("pickup_lat")?;
    let lng: Option<f64> = row.try_get("pickup_lng")?;
    let point = lat.zip(lng).map(|(lat, lng)| GeoPoint { lat, lng });

    Ok(Booking {
        booking_id: BookingId::from_uuid(row.try_get("booking_id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        asset_id: AssetId::from_uuid(row.try_get("asset_id")?),
        period,
        base_price: money_from_column(row, "base_price")?,
        status,
        settlement,
        location: LocationSnapshot {
            point,
            address: row.try_get("pickup_address")?,
        },
        version,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// BookingRepositoryのPostgreSQL実装
///
/// 期間の重なりは bookings_no_overlap 排他制約でコミット時に検査される。
/// 予約の行と監査イベントは同じトランザクションで書き込む。
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// PostgreSQLコネクションプールから新しいBookingRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn append_event(tx: &mut Transaction<'_, Postgres>, event: &BookingEvent) -> Result<()> {
        let event_data = serde_json::to_value(event).map_err(|e| StoreError::Backend(Box::new(e)))?;

        sqlx::query(
            r#"
            INSERT INTO booking_events (booking_id, event_type, event_data, occurred_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(event.booking_id().value())
        .bind(event.event_type())
        .bind(event_data)
        .bind(event.occurred_at())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl BookingRepositoryTrait for BookingRepository {
    /// 予約を追加する
    ///
    /// 期間が重なる場合は排他制約違反となり `ScheduleConflict` を返す。
    async fn insert(&self, booking: &Booking, event: &BookingEvent) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bookings (
                booking_id,
                user_id,
                asset_id,
                scheduled_start,
                scheduled_end,
                actual_return,
                base_price,
                penalty_amount,
                refund_amount,
                final_price,
                status,
                pickup_lat,
                pickup_lng,
                pickup_address,
                version,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(booking.booking_id.value())
        .bind(booking.user_id.value())
        .bind(booking.asset_id.value())
        .bind(booking.period.start())
        .bind(booking.period.end())
        .bind(booking.actual_return())
        .bind(money_to_column(booking.base_price)?)
        .bind(money_to_column(booking.penalty_amount())?)
        .bind(money_to_column(booking.refund_amount())?)
        .bind(money_to_column(booking.final_price())?)
        .bind(booking.status.as_str())
        .bind(booking.location.point.map(|p| p.lat))
        .bind(booking.location.point.map(|p| p.lng))
        .bind(&booking.location.address)
        .bind(version_to_column(booking.version)?)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::append_event(&mut tx, event).await?;

        tx.commit().await?;
        Ok(())
    }

    /// 予約を更新する（楽観的排他制御）
    ///
    /// 保存済みのバージョンが `booking.version - 1` でなければ何も書き込まない。
    async fn update(&self, booking: &Booking, event: &BookingEvent) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                scheduled_start = $2,
                scheduled_end = $3,
                actual_return = $4,
                base_price = $5,
                penalty_amount = $6,
                refund_amount = $7,
                final_price = $8,
                status = $9,
                version = $10,
                updated_at = $11
            WHERE booking_id = $1 AND version = $12
            "#,
        )
        .bind(booking.booking_id.value())
        .bind(booking.period.start())
        .bind(booking.period.end())
        .bind(booking.actual_return())
        .bind(money_to_column(booking.base_price)?)
        .bind(money_to_column(booking.penalty_amount())?)
        .bind(money_to_column(booking.refund_amount())?)
        .bind(money_to_column(booking.final_price())?)
        .bind(booking.status.as_str())
        .bind(version_to_column(booking.version)?)
        .bind(booking.updated_at)
        .bind(version_to_column(booking.version.saturating_sub(1))?)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::VersionMismatch(booking.booking_id));
        }

        Self::append_event(&mut tx, event).await?;

        tx.commit().await?;
        Ok(())
    }

    /// IDで予約を取得
    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        let sql = format!("{SELECT_BOOKINGS} WHERE booking_id = $1");
        let row = sqlx::query(&sql)
            .bind(booking_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_booking).transpose()
    }

    /// 期間が重なる、スケジュールを占有中の予約を検索（重複チェック用）
    async fn find_schedule_holders(
        &self,
        asset_id: AssetId,
        period: &RentalPeriod,
    ) -> Result<Vec<Booking>> {
        let sql = format!(
            "{SELECT_BOOKINGS}
            WHERE asset_id = $1
              AND status NOT IN ('cancelled', 'completed', 'returned')
              AND scheduled_start < $3
              AND $2 < scheduled_end"
        );
        let rows = sqlx::query(&sql)
            .bind(asset_id.value())
            .bind(period.start())
            .bind(period.end())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    /// 利用者の予約一覧（新しい順）
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let sql = format!("{SELECT_BOOKINGS} WHERE user_id = $1 ORDER BY created_at DESC");
        let rows = sqlx::query(&sql)
            .bind(user_id.value())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    /// すべての予約（新しい順）
    async fn find_all(&self) -> Result<Vec<Booking>> {
        let sql = format!("{SELECT_BOOKINGS} ORDER BY created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    async fn count_by_status(&self) -> Result<BTreeMap<BookingStatus, u64>> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS count
            FROM bookings
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let status_str: &str = row.try_get("status")?;
            let status = BookingStatus::from_str(status_str).map_err(invalid_data)?;
            let count: i64 = row.try_get("count")?;
            counts.insert(status, count.max(0) as u64);
        }
        Ok(counts)
    }

    async fn total_revenue(&self) -> Result<Money> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(final_price), 0)::BIGINT
            FROM bookings
            WHERE status <> 'cancelled'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        u64::try_from(total)
            .map(Money::new)
            .map_err(|_| invalid_data(format!("revenue out of range: {}", total)))
    }

    /// 予約の監査イベントを発生順に取得
    async fn history(&self, booking_id: BookingId) -> Result<Vec<BookingEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT event_data
            FROM booking_events
            WHERE booking_id = $1
            ORDER BY sequence_number ASC
            "#,
        )
        .bind(booking_id.value())
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_data: serde_json::Value = row.try_get("event_data")?;
            let event: BookingEvent =
                serde_json::from_value(event_data).map_err(|e| StoreError::Backend(Box::new(e)))?;
            events.push(event);
        }

        Ok(events)
    }
}
