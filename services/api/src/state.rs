//! Application state shared across handlers

use common::session::SessionRepository;

use crate::{
    config::Settings,
    repositories::{
        AlertRepository, FavoriteRepository, PreferenceRepository, PromotionRepository,
    },
    voyager::VoyagerClient,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub sessions: SessionRepository,
    pub promotions: PromotionRepository,
    pub alerts: AlertRepository,
    pub favorites: FavoriteRepository,
    pub preferences: PreferenceRepository,
    pub voyager: VoyagerClient,
}
