use crate::session::RecordingSession;
use crate::store::RecordingStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one recorder. Requests are serialized by the lock, so a stop
    /// issued during acquisition waits for it to resolve and then stops.
    pub session: Arc<Mutex<RecordingSession>>,

    /// Same store the session saves into
    pub store: Arc<dyn RecordingStore>,
}

impl AppState {
    pub fn new(session: RecordingSession) -> Self {
        let store = Arc::clone(session.store());
        Self {
            session: Arc::new(Mutex::new(session)),
            store,
        }
    }
}
