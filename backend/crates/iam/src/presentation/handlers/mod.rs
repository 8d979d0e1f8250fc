//! HTTP Handlers

pub mod auth;
pub mod tenant;
pub mod user;

use axum::Json;
use axum::extract::Query;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use platform::mailer::Mailer;
use platform::password::CredentialHasher;
use std::sync::Arc;

use crate::application::{IamConfig, TokenIssuer};
use crate::domain::repository::IamRepository;
use crate::error::{IamError, IamResult};
use crate::infra::activity_log::ActivityLog;
use crate::infra::otp_store::OtpStore;
use crate::presentation::trace::{ApiResult, TraceId};

/// Shared state for IAM handlers and middleware
pub struct IamAppState<R, M>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<IamConfig>,
    pub hasher: Arc<CredentialHasher>,
    pub tokens: Arc<TokenIssuer>,
    pub otp: OtpStore,
    /// `None` when SMTP is not configured; OTP requests then fail with 500
    pub mailer: Option<Arc<M>>,
    pub activity: ActivityLog,
}

impl<R, M> IamAppState<R, M>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    /// Build the hasher, token issuer and OTP store from `config`
    pub fn new(repo: Arc<R>, config: IamConfig, activity: ActivityLog) -> IamResult<Self> {
        config.validate()?;
        let hasher = CredentialHasher::new(config.password_pepper.clone())?;
        let tokens = TokenIssuer::new(&config)?;
        let otp = OtpStore::new(config.otp_ttl);

        Ok(Self {
            repo,
            config: Arc::new(config),
            hasher: Arc::new(hasher),
            tokens: Arc::new(tokens),
            otp,
            mailer: None,
            activity,
        })
    }

    pub fn with_mailer(mut self, mailer: M) -> Self {
        self.mailer = Some(Arc::new(mailer));
        self
    }

    /// Replace the default hasher (cheaper parameters in tests)
    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }
}

// `M` itself need not be Clone
impl<R, M> Clone for IamAppState<R, M>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            hasher: self.hasher.clone(),
            tokens: self.tokens.clone(),
            otp: self.otp.clone(),
            mailer: self.mailer.clone(),
            activity: self.activity.clone(),
        }
    }
}

/// Unwrap a JSON body, turning extractor rejections into 400s
fn json_body<T>(payload: Result<Json<T>, JsonRejection>, trace_id: &TraceId) -> ApiResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(IamError::invalid(format!(
            "invalid request body: {}",
            rejection.body_text()
        ))
        .traced(trace_id)),
    }
}

fn query_params<T>(payload: Result<Query<T>, QueryRejection>, trace_id: &TraceId) -> ApiResult<T> {
    match payload {
        Ok(Query(value)) => Ok(value),
        Err(rejection) => Err(IamError::invalid(format!(
            "invalid query parameters: {}",
            rejection.body_text()
        ))
        .traced(trace_id)),
    }
}
