pub mod asset_catalog;
pub mod booking_repository;
pub mod identity_provider;

// パブリックに型を再エクスポート
pub use asset_catalog::AssetCatalog as PostgresAssetCatalog;
pub use booking_repository::BookingRepository as PostgresBookingRepository;
pub use identity_provider::IdentityProvider as PostgresIdentityProvider;

/// デモ用の車両と利用者を投入するSQL
pub const DEMO_SEED_SQL: &str = include_str!("../../../seeds/demo.sql");

/// デモデータを投入する（冪等）
pub async fn seed_demo_data(pool: &sqlx::PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(DEMO_SEED_SQL).execute(pool).await?;
    Ok(())
}
