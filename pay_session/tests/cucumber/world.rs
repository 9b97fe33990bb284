use std::{fmt::Debug, sync::Arc, time::Duration};

use cucumber::World;
use log::*;
use pay_session::{
    config::ClientConfig,
    session::{OrderSession, SessionUpdate},
    SessionError,
    UserId,
};
use tokio::time::timeout;
use url::Url;
use wiremock::MockServer;

use crate::support::{FakePushServer, RecordingNotifier};

const UPDATE_LIMIT: Duration = Duration::from_secs(5);

#[derive(World, Default)]
pub struct SessionWorld {
    pub api: Option<MockServer>,
    pub push: Option<FakePushServer>,
    pub session: Option<OrderSession>,
    pub notifier: RecordingNotifier,
    pub last_error: Option<SessionError>,
}

impl Debug for SessionWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWorld")
            .field("api", &self.api.as_ref().map(|s| s.uri()))
            .field("push", &self.push.as_ref().map(|s| s.url().to_string()))
            .field("order", &self.session.as_ref().and_then(|s| s.current_order().cloned()))
            .field("status", &self.session.as_ref().and_then(|s| s.current_status().cloned()))
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl SessionWorld {
    pub async fn start_service(&mut self) {
        let _ = env_logger::try_init();
        let api = MockServer::start().await;
        let push = FakePushServer::start().await;
        let api_url = Url::parse(&api.uri()).expect("Mock server URI is invalid");
        let config = ClientConfig::new(api_url).expect("Invalid test configuration").with_stream_url(push.url());
        info!("🌍️ Service mocked at {} with push stream at {}", api.uri(), push.url());
        let notifier = Arc::new(self.notifier.clone());
        let session = OrderSession::from_config(UserId::from(42), &config, notifier).expect("Could not create session");
        self.api = Some(api);
        self.push = Some(push);
        self.session = Some(session);
    }

    pub fn api(&self) -> &MockServer {
        self.api.as_ref().expect("Service not started")
    }

    pub fn push(&self) -> &FakePushServer {
        self.push.as_ref().expect("Service not started")
    }

    pub fn session(&self) -> &OrderSession {
        self.session.as_ref().expect("Session not created")
    }

    pub fn session_mut(&mut self) -> &mut OrderSession {
        self.session.as_mut().expect("Session not created")
    }

    /// Keeps the outcome of the last session operation around for the `Then` steps.
    pub fn record<T>(&mut self, result: Result<T, SessionError>) {
        self.last_error = result.err();
    }

    /// Applies channel events until a push message has been handled.
    pub async fn apply_next_message(&mut self) -> SessionUpdate {
        loop {
            let update = timeout(UPDATE_LIMIT, self.session_mut().next_update())
                .await
                .expect("Timed out waiting for a push message")
                .expect("The push channel ended before a message arrived");
            debug!("🌍️ Session update: {update:?}");
            if matches!(update, SessionUpdate::Projected(_) | SessionUpdate::Malformed(_)) {
                return update;
            }
        }
    }

    pub fn activity(&self) -> String {
        self.session.as_ref().map(|s| s.activity().render()).unwrap_or_default()
    }

    pub async fn shutdown(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.shutdown().await;
        }
    }
}
