//! Data models for the API service

pub mod alert;
pub mod favorite;
pub mod preferences;
pub mod promotion;
pub mod voyager;
