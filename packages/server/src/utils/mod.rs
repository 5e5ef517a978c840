pub mod contest;
pub mod giveaway;
pub mod hash;
pub mod jwt;
pub mod ledger;
pub mod notify;
pub mod token;
