// Copyright 2025 LiveKit, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::engine::{EngineError, Platform};
use crate::prelude::*;

pub mod data_channel;
pub mod emitter;
pub mod id;
pub mod options;
pub mod participant;
pub mod publication;
pub mod state;
pub mod stats;
pub mod track;

mod room_session;

use emitter::{EventEmitter, HostEvent, HostEventSink};
use options::{LocalMediaOptions, RoomOptions};
use room_session::RoomCommand;
use state::SessionState;

pub type RoomResult<T> = Result<T, RoomError>;

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("{operation} is not allowed while {state}")]
    InvalidState { operation: &'static str, state: &'static str },
    #[error("No camera is supported on this device")]
    DeviceUnavailable,
    #[error("failed to subscribe to track {sid}: {error}")]
    SubscriptionFailure { sid: TrackSid, error: EngineError },
    #[error("failed to connect: {0}")]
    ConnectFailure(#[from] EngineError),
    #[error("failed to send message: {0}")]
    SendFailure(String),
    #[error("room is closed")]
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomInfo {
    pub name: String,
    pub sid: RoomSid,
}

/// Point-in-time copy of the room model
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub state: SessionState,
    pub room: Option<RoomInfo>,
    pub local_participant: Option<LocalParticipant>,
    pub remote_participants: Vec<RemoteParticipant>,
}

impl RoomSnapshot {
    /// Remote participants first, the local participant last
    pub fn participants(&self) -> Vec<Participant> {
        self.remote_participants
            .iter()
            .cloned()
            .map(Participant::Remote)
            .chain(self.local_participant.clone().map(Participant::Local))
            .collect()
    }
}

/// A command issued by the host.
///
/// Hosts that talk JSON send `{"method": "...", ...}` documents, see
/// [`HostCommand::from_json`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum HostCommand {
    #[serde(rename_all = "camelCase")]
    Connect {
        #[serde(default)]
        room_name: Option<String>,
        access_token: String,
        #[serde(default)]
        options: LocalMediaOptions,
    },
    Disconnect,
    SendString {
        message: String,
    },
    FlipCamera,
    SetLocalVideoEnabled {
        enabled: bool,
    },
    SetLocalAudioEnabled {
        enabled: bool,
    },
    #[serde(rename_all = "camelCase")]
    SetRemoteAudioEnabled {
        participant_sid: ParticipantSid,
        enabled: bool,
    },
    ToggleSpeaker {
        enabled: bool,
    },
    ToggleBluetoothHeadset {
        enabled: bool,
    },
    GetStats,
    #[serde(rename_all = "camelCase")]
    StartStatsPolling {
        interval_ms: u64,
    },
    StopStatsPolling,
    OnHostPause,
    OnHostResume,
    Destroy,
}

impl HostCommand {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Handle to the room task.
///
/// Every command and every engine callback is processed by one task, in the
/// order it was received. Commands only fail synchronously when they are not
/// allowed in the current state or when the room is closed; everything else
/// is reported through events.
#[derive(Debug)]
pub struct Room {
    command_tx: mpsc::UnboundedSender<RoomCommand>,
    state: Arc<RwLock<SessionState>>,
    emitter: EventEmitter,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Room {
    /// Spawn the room task. Must be called within a tokio runtime.
    pub fn new(platform: Platform, options: RoomOptions) -> Self {
        let emitter = EventEmitter::new(options.event_prefix.clone());
        let state = Arc::new(RwLock::new(SessionState::Idle));
        let (command_tx, handle) =
            room_session::spawn(platform, options, emitter.clone(), state.clone());

        Self { command_tx, state, emitter, handle: Mutex::new(Some(handle)) }
    }

    /// Register the single host listener, replacing the previous one
    pub fn set_listener(&self, sink: Arc<dyn HostEventSink>) {
        self.emitter.set_listener(sink);
    }

    pub fn remove_listener(&self) {
        self.emitter.remove_listener();
    }

    /// Register a channel as the host listener
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        let (tx, rx) = mpsc::unbounded_channel::<HostEvent>();
        self.emitter.set_listener(Arc::new(tx));
        rx
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Run a command and wait until the room task handled it
    pub async fn execute(&self, command: HostCommand) -> RoomResult<()> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(RoomCommand::Request { request: command, reply: Some(reply) })
            .map_err(|_| RoomError::Closed)?;
        rx.await.map_err(|_| RoomError::Closed)?
    }

    /// Queue a command without waiting for it
    pub fn submit(&self, command: HostCommand) -> RoomResult<()> {
        self.command_tx
            .send(RoomCommand::Request { request: command, reply: None })
            .map_err(|_| RoomError::Closed)
    }

    pub async fn connect(
        &self,
        room_name: Option<String>,
        access_token: impl Into<String>,
        options: LocalMediaOptions,
    ) -> RoomResult<()> {
        self.execute(HostCommand::Connect {
            room_name,
            access_token: access_token.into(),
            options,
        })
        .await
    }

    pub async fn disconnect(&self) -> RoomResult<()> {
        self.execute(HostCommand::Disconnect).await
    }

    pub async fn send_string(&self, message: impl Into<String>) -> RoomResult<()> {
        self.execute(HostCommand::SendString { message: message.into() }).await
    }

    pub async fn flip_camera(&self) -> RoomResult<()> {
        self.execute(HostCommand::FlipCamera).await
    }

    pub async fn set_local_video_enabled(&self, enabled: bool) -> RoomResult<()> {
        self.execute(HostCommand::SetLocalVideoEnabled { enabled }).await
    }

    pub async fn set_local_audio_enabled(&self, enabled: bool) -> RoomResult<()> {
        self.execute(HostCommand::SetLocalAudioEnabled { enabled }).await
    }

    pub async fn set_remote_audio_enabled(
        &self,
        participant_sid: ParticipantSid,
        enabled: bool,
    ) -> RoomResult<()> {
        self.execute(HostCommand::SetRemoteAudioEnabled { participant_sid, enabled }).await
    }

    pub async fn toggle_speaker(&self, enabled: bool) -> RoomResult<()> {
        self.execute(HostCommand::ToggleSpeaker { enabled }).await
    }

    pub async fn toggle_bluetooth_headset(&self, enabled: bool) -> RoomResult<()> {
        self.execute(HostCommand::ToggleBluetoothHeadset { enabled }).await
    }

    pub async fn get_stats(&self) -> RoomResult<()> {
        self.execute(HostCommand::GetStats).await
    }

    pub async fn start_stats_polling(&self, interval_ms: u64) -> RoomResult<()> {
        self.execute(HostCommand::StartStatsPolling { interval_ms }).await
    }

    pub async fn stop_stats_polling(&self) -> RoomResult<()> {
        self.execute(HostCommand::StopStatsPolling).await
    }

    pub async fn on_host_pause(&self) -> RoomResult<()> {
        self.execute(HostCommand::OnHostPause).await
    }

    pub async fn on_host_resume(&self) -> RoomResult<()> {
        self.execute(HostCommand::OnHostResume).await
    }

    pub async fn destroy(&self) -> RoomResult<()> {
        self.execute(HostCommand::Destroy).await
    }

    pub async fn snapshot(&self) -> RoomResult<RoomSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.command_tx.send(RoomCommand::Snapshot(reply)).map_err(|_| RoomError::Closed)?;
        rx.await.map_err(|_| RoomError::Closed)
    }

    /// Tear the room down and wait for the room task to finish
    pub async fn close(self) {
        let handle = self.handle.lock().take();
        let Some(handle) = handle else {
            return;
        };

        let (reply, rx) = oneshot::channel();
        if self.command_tx.send(RoomCommand::Close(reply)).is_ok() {
            let _ = rx.await;
        }
        if let Err(err) = handle.await {
            log::error!("room task failed: {:?}", err);
        }
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        if self.handle.lock().take().is_some() {
            let (reply, _) = oneshot::channel();
            let _ = self.command_tx.send(RoomCommand::Close(reply));
        }
    }
}
