mod admin;
mod auth;
mod common;
mod contest;
mod giveaway;
mod notification;
mod points;
mod public;
