pub mod billing;
pub mod hook;
pub mod quota;
pub mod transcript;

pub use billing::{BillingHistory, BillingRecord, UsageStats};
pub use hook::HookInput;
pub use quota::{ExpiryInfo, ExpiryStatus, QuotaSnapshot, RemainingDuration};
pub use transcript::TranscriptEntry;
