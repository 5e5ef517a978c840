pub mod contest;
pub mod contest_application;
pub mod contest_submission;
pub mod giveaway;
pub mod giveaway_entry;
pub mod giveaway_winner;
pub mod notification;
pub mod payment_event;
pub mod points_transaction;
pub mod role;
pub mod role_permission;
pub mod user;
