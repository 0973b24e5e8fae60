//! Positioning: permission state and location fixes, delivered as events.

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::types::Coordinate;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationStatus {
    #[default]
    NotDetermined,
    Denied,
    AuthorizedWhenInUse,
    AuthorizedAlways,
}

impl AuthorizationStatus {
    pub fn is_authorized(self) -> bool {
        matches!(self, Self::AuthorizedWhenInUse | Self::AuthorizedAlways)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Authorization(AuthorizationStatus),
    Fix(Coordinate),
    Failed(String),
}

/// A device positioning service.
///
/// Requests return immediately; outcomes arrive on the event stream.
pub trait PositioningService: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<LocationEvent>;

    fn authorization_status(&self) -> AuthorizationStatus;

    fn request_permission(&self);

    /// Ask for a single fix.
    fn request_location(&self);
}

/// Positioning backed by a configured coordinate.
///
/// Grants (or denies) permission on request and answers every location
/// request with the same fix. `emit` injects arbitrary events.
#[derive(Debug)]
pub struct FixedPositioning {
    fix: Option<Coordinate>,
    grant: bool,
    status: Mutex<AuthorizationStatus>,
    tx: broadcast::Sender<LocationEvent>,
}

impl FixedPositioning {
    pub fn new(fix: Option<Coordinate>) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            fix,
            grant: true,
            status: Mutex::new(AuthorizationStatus::NotDetermined),
            tx,
        }
    }

    /// A service whose permission prompt is always declined.
    pub fn denied() -> Self {
        Self {
            grant: false,
            ..Self::new(None)
        }
    }

    pub fn emit(&self, event: LocationEvent) {
        if let LocationEvent::Authorization(status) = &event {
            *self.status.lock() = *status;
        }
        // No subscribers is fine; nobody is waiting for the event.
        let _ = self.tx.send(event);
    }
}

impl PositioningService for FixedPositioning {
    fn subscribe(&self) -> broadcast::Receiver<LocationEvent> {
        self.tx.subscribe()
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        *self.status.lock()
    }

    fn request_permission(&self) {
        let status = if self.grant {
            AuthorizationStatus::AuthorizedWhenInUse
        } else {
            AuthorizationStatus::Denied
        };
        self.emit(LocationEvent::Authorization(status));
    }

    fn request_location(&self) {
        if !self.authorization_status().is_authorized() {
            self.emit(LocationEvent::Failed("location permission not granted".into()));
            return;
        }
        match self.fix {
            Some(coordinate) => self.emit(LocationEvent::Fix(coordinate)),
            None => self.emit(LocationEvent::Failed("no location available".into())),
        }
    }
}
