//! Infrastructure Layer
//!
//! Database implementations, the OTP cache and the activity log worker.

pub mod activity_log;
pub mod otp_store;
pub mod postgres;

pub use activity_log::{ActivityLog, ActivityLogWorker};
pub use otp_store::OtpStore;
pub use postgres::PgIamRepository;
