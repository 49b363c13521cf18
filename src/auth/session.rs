use std::rc::Rc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::storage::{CARGO_LIST_KEY, KvOp, KvStore, PHOTOS_KEY, SESSION_KEY};

use super::{AuthError, Directory, EmployeeCode};

/// Persisted employee session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Session {
    pub(crate) id: EmployeeCode,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) position: String,
    #[serde(default)]
    pub(crate) department: String,
    pub(crate) login_time: DateTime<Utc>,
    #[serde(default)]
    pub(crate) session_id: String,
}

impl Session {
    pub(crate) fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.login_time
    }

    pub(crate) fn is_expired(&self, now: DateTime<Utc>, validity: TimeDelta) -> bool {
        self.age(now) >= validity
    }

    /// Time left before expiry, zero once expired
    pub(crate) fn remaining(&self, now: DateTime<Utc>, validity: TimeDelta) -> TimeDelta {
        (validity - self.age(now)).max(TimeDelta::zero())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SessionState {
    Active(Session),
    /// The stored session was past its window and has been removed
    Expired(Session),
    LoggedOut,
}

pub(crate) struct SessionManager {
    kv: Rc<dyn KvStore>,
    directory: Directory,
    validity: TimeDelta,
}

impl SessionManager {
    pub(crate) fn new(kv: Rc<dyn KvStore>, directory: Directory, validity: TimeDelta) -> Self {
        Self {
            kv,
            directory,
            validity,
        }
    }

    pub(crate) fn directory(&self) -> &Directory {
        &self.directory
    }

    pub(crate) fn validity(&self) -> TimeDelta {
        self.validity
    }

    pub(crate) fn login(
        &self,
        code: &EmployeeCode,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let employee = self
            .directory
            .lookup(code)
            .ok_or_else(|| AuthError::UnknownEmployee { code: code.clone() })?;

        let session = Session {
            id: employee.code.clone(),
            name: employee.full_name.clone(),
            position: employee.position.clone(),
            department: employee.department.clone(),
            login_time: now,
            session_id: format!("SESS_{}", now.timestamp_millis()),
        };
        let json = serde_json::to_string(&session)?;
        self.kv.set(SESSION_KEY, &json)?;
        info!(code = %session.id, session_id = %session.session_id, "employee logged in");
        Ok(session)
    }

    /// Read the stored session. Expired or unreadable records are removed.
    pub(crate) fn state_at(&self, now: DateTime<Utc>) -> Result<SessionState, AuthError> {
        let Some(raw) = self.kv.get(SESSION_KEY)? else {
            return Ok(SessionState::LoggedOut);
        };

        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "stored session is malformed, discarding");
                self.forget();
                return Ok(SessionState::LoggedOut);
            }
        };

        if session.is_expired(now, self.validity) {
            debug!(code = %session.id, "session expired");
            self.forget();
            return Ok(SessionState::Expired(session));
        }
        Ok(SessionState::Active(session))
    }

    pub(crate) fn require(&self, now: DateTime<Utc>) -> Result<Session, AuthError> {
        match self.state_at(now)? {
            SessionState::Active(session) => Ok(session),
            SessionState::Expired(session) => Err(AuthError::Expired { name: session.name }),
            SessionState::LoggedOut => Err(AuthError::NotLoggedIn),
        }
    }

    /// End the session and drop the live cargo list; shipment history stays
    pub(crate) fn logout(&self) -> Result<Option<Session>, AuthError> {
        let previous = self
            .kv
            .get(SESSION_KEY)?
            .and_then(|raw| serde_json::from_str::<Session>(&raw).ok());
        self.kv.apply(&[
            KvOp::remove(SESSION_KEY),
            KvOp::remove(CARGO_LIST_KEY),
            KvOp::remove(PHOTOS_KEY),
        ])?;
        if let Some(session) = &previous {
            info!(code = %session.id, "employee logged out");
        }
        Ok(previous)
    }

    fn forget(&self) {
        if let Err(e) = self.kv.remove(SESSION_KEY) {
            warn!(error = %e, "failed to remove stale session");
        }
    }
}
