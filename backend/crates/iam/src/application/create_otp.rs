//! Create OTP Use Case

use platform::crypto::random_numeric_code;
use platform::mailer::Mailer;
use std::sync::Arc;

use crate::domain::repository::UserRepository;
use crate::domain::value_object::Email;
use crate::error::{IamError, IamResult};
use crate::infra::otp_store::OtpStore;

pub const OTP_MAIL_SUBJECT: &str = "OTP Code";

pub fn otp_mail_body(code: &str) -> String {
    format!("<h1>Your OTP code is: {code}</h1>")
}

/// Create OTP use case
///
/// Generates a one-time code for an existing user and mails it. At most one
/// code per email is outstanding; a failed delivery withdraws the code so the
/// user can ask again right away.
pub struct CreateOtpUseCase<R, M>
where
    R: UserRepository,
    M: Mailer,
{
    repo: Arc<R>,
    otp: OtpStore,
    mailer: Option<Arc<M>>,
    otp_length: usize,
}

impl<R, M> CreateOtpUseCase<R, M>
where
    R: UserRepository,
    M: Mailer + Sync,
{
    pub fn new(repo: Arc<R>, otp: OtpStore, mailer: Option<Arc<M>>, otp_length: usize) -> Self {
        Self {
            repo,
            otp,
            mailer,
            otp_length,
        }
    }

    pub async fn execute(&self, email: &str) -> IamResult<()> {
        let email = Email::new(email)?;

        let user = self
            .repo
            .find_user_by_email(&email)
            .await?
            .ok_or(IamError::UserNotFound)?;

        if self.otp.get(&email).await.is_some() {
            return Err(IamError::OtpAlreadyExists);
        }

        let mailer = self.mailer.as_ref().ok_or(IamError::MailerUnavailable)?;

        let code = random_numeric_code(self.otp_length)
            .map_err(|e| IamError::OtpGeneration(e.to_string()))?;

        if !self.otp.insert_if_absent(&email, code.clone()).await {
            return Err(IamError::OtpAlreadyExists);
        }

        if let Err(e) = mailer
            .send_raw(email.as_str(), OTP_MAIL_SUBJECT, &otp_mail_body(&code))
            .await
        {
            self.otp.delete(&email).await;
            return Err(IamError::MailDelivery(e));
        }

        tracing::info!(user_id = %user.id, "OTP issued");
        Ok(())
    }
}
