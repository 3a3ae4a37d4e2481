//! Session state: who is working and what they have selected

use chrono::{DateTime, Local};
use fleetfuel_infra::AccessList;
use fleetfuel_types::{Error, Result};
use tracing::info;

use crate::config::Config;
use crate::report::ConsumptionFilter;

/// One operator session.
///
/// Holds identity and filter selections for the reporting layer; the
/// reconciliation pipeline never sees it.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Option<String>,
    pub started_at: DateTime<Local>,
    pub filter: ConsumptionFilter,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            identity: None,
            started_at: Local::now(),
            filter: ConsumptionFilter::default(),
        }
    }

    /// Open a session, passing the credential gate when an access list is configured
    pub fn open(config: &Config, email: Option<&str>, code: Option<&str>) -> Result<Self> {
        let Some(access_file) = config.access_file.as_deref() else {
            return Ok(Self::anonymous());
        };

        let (email, code) = match (email, code) {
            (Some(email), Some(code)) => (email, code),
            _ => {
                return Err(Error::AccessDenied(
                    "missing credentials (use --user and --code)".to_string(),
                ))
            }
        };

        let identity = AccessList::load(access_file)?.authenticate(email, code)?;
        info!(user = %identity, "session opened");

        Ok(Self {
            identity: Some(identity),
            ..Self::anonymous()
        })
    }

    pub fn with_filter(mut self, filter: ConsumptionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Name shown in report footers
    pub fn identity_label(&self) -> &str {
        self.identity.as_deref().unwrap_or("anonymous")
    }
}
