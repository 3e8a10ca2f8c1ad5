//! Server state shared by HTTP and WebSocket handlers.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;

use crate::{
    config::ServerConfig,
    domain::{ChatRepository, ModerationGate, ProbabilitySource, TextAnalyzer},
    infrastructure::{RoomRelay, TimeLimitedAnalyzer},
    usecase::{
        AnalyzeEmotionUseCase, ComfortMessageUseCase, ComfortResponder, CrisisPolicy,
        EndSessionUseCase, JoinRoomUseCase, LeaveRoomUseCase, ListMessagesUseCase,
        RequestMatchUseCase, SendMessageUseCase, TypingUseCase,
    },
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: String,
    pub display_name: Option<String>,
}

/// Tunables taken from [`ServerConfig`]
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub comfort_probability: f64,
    pub crisis_severity_threshold: u8,
    pub match_ttl: Option<Duration>,
    pub room_capacity: usize,
    /// Upper bound on a single analyzer call
    pub analyzer_timeout: Duration,
}

impl From<&ServerConfig> for AppSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            comfort_probability: config.comfort_probability,
            crisis_severity_threshold: config.crisis_severity_threshold,
            match_ttl: config.match_ttl(),
            room_capacity: config.room_capacity,
            analyzer_timeout: config.analyzer_timeout(),
        }
    }
}

/// Shared application state
pub struct AppState {
    /// Repository（データアクセス層の抽象化）
    pub repository: Arc<dyn ChatRepository>,
    /// Connection registry and room fan-out
    pub relay: Arc<RoomRelay>,
    pub gate: Arc<ModerationGate>,
    pub analyzer: Arc<dyn TextAnalyzer>,
    pub crisis: Arc<CrisisPolicy>,
    pub responder: Arc<ComfortResponder>,
    pub match_ttl: Option<Duration>,
}

impl AppState {
    pub fn new(
        settings: &AppSettings,
        repository: Arc<dyn ChatRepository>,
        analyzer: Arc<dyn TextAnalyzer>,
        probability: Arc<dyn ProbabilitySource>,
    ) -> Self {
        let analyzer: Arc<dyn TextAnalyzer> = Arc::new(TimeLimitedAnalyzer::new(
            analyzer,
            settings.analyzer_timeout,
        ));
        let relay = Arc::new(RoomRelay::new(settings.room_capacity));
        let gate = Arc::new(ModerationGate::default());
        let crisis = Arc::new(CrisisPolicy::new(
            analyzer.clone(),
            settings.crisis_severity_threshold,
        ));
        let responder = Arc::new(ComfortResponder::new(
            repository.clone(),
            relay.clone(),
            gate.clone(),
            analyzer.clone(),
            probability,
            settings.comfort_probability,
        ));

        Self {
            repository,
            relay,
            gate,
            analyzer,
            crisis,
            responder,
            match_ttl: settings.match_ttl,
        }
    }

    pub fn join_room(&self) -> JoinRoomUseCase {
        JoinRoomUseCase::new(self.relay.clone())
    }

    pub fn leave_room(&self) -> LeaveRoomUseCase {
        LeaveRoomUseCase::new(self.relay.clone())
    }

    pub fn typing(&self) -> TypingUseCase {
        TypingUseCase::new(self.relay.clone())
    }

    pub fn send_message(&self) -> SendMessageUseCase {
        SendMessageUseCase::new(
            self.repository.clone(),
            self.relay.clone(),
            self.gate.clone(),
            self.crisis.clone(),
            self.responder.clone(),
        )
    }

    pub fn request_match(&self) -> RequestMatchUseCase {
        RequestMatchUseCase::new(self.repository.clone(), self.relay.clone(), self.match_ttl)
    }

    pub fn end_session(&self) -> EndSessionUseCase {
        EndSessionUseCase::new(self.repository.clone(), self.relay.clone())
    }

    pub fn list_messages(&self) -> ListMessagesUseCase {
        ListMessagesUseCase::new(self.repository.clone())
    }

    pub fn analyze_emotion(&self) -> AnalyzeEmotionUseCase {
        AnalyzeEmotionUseCase::new(self.gate.clone(), self.crisis.clone(), self.analyzer.clone())
    }

    pub fn comfort_message(&self) -> ComfortMessageUseCase {
        ComfortMessageUseCase::new(self.gate.clone(), self.analyzer.clone())
    }
}
