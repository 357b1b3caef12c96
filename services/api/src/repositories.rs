//! Repositories for database operations

pub mod alert;
pub mod favorite;
pub mod preferences;
pub mod promotion;

pub use alert::AlertRepository;
pub use favorite::FavoriteRepository;
pub use preferences::PreferenceRepository;
pub use promotion::PromotionRepository;
