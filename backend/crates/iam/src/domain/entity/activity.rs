//! Activity Log Entries
//!
//! Access entries describe authenticated requests; audit entries describe
//! logins and tenant/user mutations.

use chrono::{DateTime, Utc};
use kernel::id::{TenantId, UserId};
use serde_json::Value;

use crate::domain::entity::login::Login;

#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub tenant_id: Option<TenantId>,
    pub user_id: Option<UserId>,
    /// Caller email
    pub identifier: String,
    pub trace_id: String,
    pub method: String,
    pub path: String,
    pub host: String,
    pub status: u16,
    pub client_ip: Option<String>,
    pub user_agent: String,
    pub referer: String,
    pub content_type: String,
    pub language: String,
    pub requested_at: DateTime<Utc>,
    pub latency_ms: i64,
}

impl AccessLogEntry {
    /// Build from a resolved login once the response status is known
    pub fn from_login(login: &Login, status: u16, latency_ms: i64) -> Self {
        let meta = &login.metadata;
        Self {
            tenant_id: login.tenant_id(),
            user_id: Some(login.user_id()),
            identifier: login.user.email.to_string(),
            trace_id: meta.trace_id.clone(),
            method: meta.method.clone(),
            path: meta.path.clone(),
            host: meta.host.clone(),
            status,
            client_ip: meta.client_ip.map(|ip| ip.to_string()),
            user_agent: meta.user_agent.clone(),
            referer: meta.referer.clone(),
            content_type: meta.content_type.clone(),
            language: meta.language.clone(),
            requested_at: meta.requested_at,
            latency_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditLogEntry {
    pub tenant_id: Option<TenantId>,
    pub user_id: Option<UserId>,
    pub identifier: String,
    pub trace_id: String,
    /// `auth`, `tenant` or `user`
    pub domain: &'static str,
    pub action: &'static str,
    pub function: &'static str,
    pub success: bool,
    /// Request payload; passwords never appear here
    pub input: Value,
    pub output: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        trace_id: impl Into<String>,
        domain: &'static str,
        action: &'static str,
        function: &'static str,
    ) -> Self {
        Self {
            tenant_id: None,
            user_id: None,
            identifier: String::new(),
            trace_id: trace_id.into(),
            domain,
            action,
            function,
            success: false,
            input: Value::Null,
            output: Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Attribute the entry to the caller
    pub fn by(mut self, login: &Login) -> Self {
        self.tenant_id = login.tenant_id();
        self.user_id = Some(login.user_id());
        self.identifier = login.user.email.to_string();
        self
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    /// Record the outcome; errors are stored as their boundary message
    pub fn outcome<T, E>(mut self, result: &Result<T, E>, output: impl FnOnce(&T) -> Value) -> Self
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(value) => {
                self.success = true;
                self.output = output(value);
            }
            Err(e) => {
                self.success = false;
                self.output = serde_json::json!({ "error": e.to_string() });
            }
        }
        self
    }
}
