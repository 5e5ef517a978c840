pub mod analytics;
pub mod application;
pub mod auth;
pub mod contest;
pub mod giveaway;
pub mod notification;
pub mod points;
pub mod public;
pub mod shared;
pub mod submission;
pub mod subscription;
pub mod user;
