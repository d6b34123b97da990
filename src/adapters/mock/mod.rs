pub mod asset_catalog;
pub mod booking_repository;
pub mod identity_provider;

pub use asset_catalog::AssetCatalog;
pub use booking_repository::BookingRepository;
pub use identity_provider::IdentityProvider;
