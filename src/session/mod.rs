//! Who is making a request, and what they are allowed to touch.
//!
//! `Session` is extracted per request from headers set by the upstream
//! auth proxy. `SessionContext` is the long lived holder for clients that
//! need to react to sign in and sign out.
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use anyhow::anyhow;
use axum::extract::FromRequestParts;
use http::{StatusCode, request::Parts};
use serde::{Deserialize, Serialize};

use crate::api::public::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";
pub const MERCHANT_ID_HEADER: &str = "x-merchant-id";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Merchant,
    Employee,
    Client,
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "merchant" => Ok(Role::Merchant),
            "employee" => Ok(Role::Employee),
            "client" => Ok(Role::Client),
            _ => Err(anyhow!("Unknown role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Merchant => "merchant",
            Role::Employee => "employee",
            Role::Client => "client",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    /// Merchant the user belongs to, for merchant and employee roles
    pub merchant_id: Option<String>,
}

impl Session {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Role {} may not perform this action",
                self.role
            )))
        }
    }

    /// Admins can act on any merchant; merchants and employees only on
    /// their own.
    pub fn require_merchant(&self, merchant_id: &str) -> Result<(), ApiError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Merchant | Role::Employee
                if self.merchant_id.as_deref() == Some(merchant_id) =>
            {
                Ok(())
            }
            _ => Err(ApiError::forbidden(format!(
                "No access to merchant {}",
                merchant_id
            ))),
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        let user_id = header(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized(format!("Missing {} header", USER_ID_HEADER)))?;
        let role = header(ROLE_HEADER)
            .ok_or_else(|| ApiError::unauthorized(format!("Missing {} header", ROLE_HEADER)))?
            .parse::<Role>()
            .map_err(|e| ApiError::new(StatusCode::UNAUTHORIZED, e))?;
        let merchant_id = header(MERCHANT_ID_HEADER);

        Ok(Session {
            user_id,
            role,
            merchant_id,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut(Session),
}

pub trait SessionObserver: Send + Sync {
    fn on_session_event(&self, event: &SessionEvent);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn on_session_event(&self, event: &SessionEvent) {
        self(event)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct ContextInner {
    current: Option<Session>,
    next_id: u64,
    observers: Vec<(SubscriptionId, Arc<dyn SessionObserver>)>,
}

/// Holds the signed in session and notifies subscribers when it changes.
/// Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<ContextInner>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.inner
            .read()
            .expect("Session context lock poisoned")
            .current
            .clone()
    }

    pub fn subscribe(&self, observer: impl SessionObserver + 'static) -> SubscriptionId {
        let observer: Arc<dyn SessionObserver> = Arc::new(observer);
        let mut inner = self.inner.write().expect("Session context lock poisoned");
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.write().expect("Session context lock poisoned");
        let before = inner.observers.len();
        inner.observers.retain(|(sub, _)| *sub != id);
        inner.observers.len() != before
    }

    /// Replaces any current session. The previous one is signed out first.
    pub fn sign_in(&self, session: Session) {
        let previous = self.swap(Some(session.clone()));
        if let Some(previous) = previous {
            self.notify(&SessionEvent::SignedOut(previous));
        }
        tracing::debug!(user_id = %session.user_id, role = %session.role, "Signed in");
        self.notify(&SessionEvent::SignedIn(session));
    }

    pub fn sign_out(&self) -> Option<Session> {
        let previous = self.swap(None);
        if let Some(session) = &previous {
            tracing::debug!(user_id = %session.user_id, "Signed out");
            self.notify(&SessionEvent::SignedOut(session.clone()));
        }
        previous
    }

    fn swap(&self, session: Option<Session>) -> Option<Session> {
        let mut inner = self.inner.write().expect("Session context lock poisoned");
        std::mem::replace(&mut inner.current, session)
    }

    // Observers are called without the lock held so they may read the
    // context or subscribe from inside a callback.
    fn notify(&self, event: &SessionEvent) {
        let observers: Vec<Arc<dyn SessionObserver>> = self
            .inner
            .read()
            .expect("Session context lock poisoned")
            .observers
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in observers {
            observer.on_session_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn merchant(id: &str) -> Session {
        Session {
            user_id: format!("user-{}", id),
            role: Role::Merchant,
            merchant_id: Some(id.to_string()),
        }
    }

    #[test]
    fn it_parses_roles_case_insensitively() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("client".parse::<Role>().unwrap(), Role::Client);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn it_limits_merchants_to_their_own_shop() {
        let session = merchant("m1");
        assert!(session.require_merchant("m1").is_ok());
        assert!(session.require_merchant("m2").is_err());

        let admin = Session {
            user_id: "root".to_string(),
            role: Role::Admin,
            merchant_id: None,
        };
        assert!(admin.require_merchant("m2").is_ok());

        let client = Session {
            user_id: "c".to_string(),
            role: Role::Client,
            merchant_id: Some("m1".to_string()),
        };
        assert!(client.require_merchant("m1").is_err());
        assert!(client.require_role(&[Role::Admin, Role::Merchant]).is_err());
        assert!(client.require_role(&[Role::Client]).is_ok());
    }

    #[test]
    fn it_notifies_subscribers_of_sign_in_and_out() {
        let ctx = SessionContext::new();
        let events = Arc::new(Mutex::new(vec![]));
        let sink = Arc::clone(&events);
        ctx.subscribe(move |event: &SessionEvent| sink.lock().unwrap().push(event.clone()));

        ctx.sign_in(merchant("m1"));
        assert_eq!(ctx.current(), Some(merchant("m1")));
        ctx.sign_in(merchant("m2"));
        assert_eq!(ctx.sign_out(), Some(merchant("m2")));
        assert_eq!(ctx.sign_out(), None);

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                SessionEvent::SignedIn(merchant("m1")),
                SessionEvent::SignedOut(merchant("m1")),
                SessionEvent::SignedIn(merchant("m2")),
                SessionEvent::SignedOut(merchant("m2")),
            ]
        );
    }

    #[test]
    fn it_stops_notifying_after_unsubscribe() {
        let ctx = SessionContext::new();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let id = ctx.subscribe(move |_: &SessionEvent| *sink.lock().unwrap() += 1);

        ctx.sign_in(merchant("m1"));
        assert!(ctx.unsubscribe(id));
        assert!(!ctx.unsubscribe(id));
        ctx.sign_out();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn it_lets_observers_read_the_context() {
        let ctx = SessionContext::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let reader = ctx.clone();
        ctx.subscribe(move |_: &SessionEvent| *sink.lock().unwrap() = reader.current());

        ctx.sign_in(merchant("m1"));
        assert_eq!(*seen.lock().unwrap(), Some(merchant("m1")));
    }
}
