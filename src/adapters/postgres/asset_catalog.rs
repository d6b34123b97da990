use crate::domain::{Asset, AssetId, AssetKind, GeoPoint, Money};
use crate::ports::asset_catalog::{AssetCatalog as AssetCatalogTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn money_from_column(amount: i64, column: &str) -> Result<Money> {
    u64::try_from(amount)
        .map(Money::new)
        .map_err(|_| format!("{} out of range: {}", column, amount).into())
}

fn kind_from_column(kind: &str) -> Result<AssetKind> {
    match kind {
        "car" => Ok(AssetKind::Car),
        "bike" => Ok(AssetKind::Bike),
        other => Err(format!("Invalid asset kind: {}", other).into()),
    }
}

/// PostgreSQLの行データをAssetに変換する
fn map_row_to_asset(row: &PgRow) -> Result<Asset> {
    let extra_charge: Option<i64> = row.try_get("extra_charge_per_hour")?;
    let lat: Option<f64> = row.try_get("pickup_lat")?;
    let lng: Option<f64> = row.try_get("pickup_lng")?;

    Ok(Asset {
        asset_id: AssetId::from_uuid(row.try_get("asset_id")?),
        kind: kind_from_column(row.try_get("kind")?)?,
        price_per_day: money_from_column(row.try_get("price_per_day")?, "price_per_day")?,
        extra_charge_per_hour: extra_charge
            .map(|amount| money_from_column(amount, "extra_charge_per_hour"))
            .transpose()?,
        is_available: row.try_get("is_available")?,
        is_active: row.try_get("is_active")?,
        pickup_location: lat.zip(lng).map(|(lat, lng)| GeoPoint { lat, lng }),
        address: row.try_get("address")?,
    })
}

/// AssetCatalogのPostgreSQL実装（読み取り専用）
pub struct AssetCatalog {
    pool: PgPool,
}

impl AssetCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetCatalogTrait for AssetCatalog {
    async fn find_asset(&self, asset_id: AssetId) -> Result<Option<Asset>> {
        let row = sqlx::query(
            r#"
            SELECT
                asset_id,
                kind,
                price_per_day,
                extra_charge_per_hour,
                is_available,
                is_active,
                pickup_lat,
                pickup_lng,
                address
            FROM assets
            WHERE asset_id = $1
            "#,
        )
        .bind(asset_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_asset).transpose()
    }
}
