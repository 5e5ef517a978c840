pub mod contest;
pub mod error;
pub mod giveaway;
pub mod points;
pub mod storage;
pub mod subscription;

pub use contest::{ApplicationStatus, ContestStatus, SubmissionStatus};
pub use error::ParseEnumError;
pub use giveaway::{ClaimStatus, EntryStatus, GiveawayStatus};
pub use points::TransactionKind;
pub use subscription::{SubscriptionStatus, SubscriptionTier};
