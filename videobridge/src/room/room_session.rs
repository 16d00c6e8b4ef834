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
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

use crate::data_channel::DataChannelDispatcher;
use crate::emitter::{ErrorInfo, EventEmitter, RoomEvent};
use crate::engine::{
    CameraCapturer, CameraSource, ConnectOptions, EngineEmitter, EngineError, EngineEvent,
    EngineRoom, LocalDataTrack, LocalMediaTrack, LocalTrack, Platform, SessionEvent,
};
use crate::options::{LocalMediaOptions, RoomOptions};
use crate::prelude::*;
use crate::state::{DisconnectReason, SessionState};
use crate::stats::{StatsRequester, StatsSampler};
use crate::{HostCommand, RoomError, RoomInfo, RoomResult, RoomSnapshot};

pub(crate) enum RoomCommand {
    Request { request: HostCommand, reply: Option<oneshot::Sender<RoomResult<()>>> },
    RequestStats,
    Snapshot(oneshot::Sender<RoomSnapshot>),
    Close(oneshot::Sender<()>),
}

/// Posts stats requests back into the room task so they are sequenced with
/// everything else touching the session.
struct CommandStatsRequester {
    tx: mpsc::UnboundedSender<RoomCommand>,
}

impl StatsRequester for CommandStatsRequester {
    fn request_stats(&self) -> bool {
        self.tx.send(RoomCommand::RequestStats).is_ok()
    }
}

struct ActiveSession {
    id: u64,
    engine_room: Arc<dyn EngineRoom>,
    info: RoomInfo,
    registry: ParticipantRegistry,
    /// Set when we asked the engine to disconnect
    closing: Option<DisconnectReason>,
}

#[derive(Default)]
struct LocalMedia {
    audio: Option<Arc<dyn LocalMediaTrack>>,
    video: Option<Arc<dyn LocalMediaTrack>>,
    data: Option<Arc<dyn LocalDataTrack>>,
    capturer: Option<Arc<dyn CameraCapturer>>,
}

impl LocalMedia {
    fn release_audio(&mut self) {
        if let Some(track) = self.audio.take() {
            track.release();
        }
    }

    fn release_video(&mut self) {
        if let Some(track) = self.video.take() {
            track.release();
        }
    }

    fn stop_capturer(&mut self) {
        if let Some(capturer) = self.capturer.take() {
            capturer.stop();
        }
    }
}

/// State owned by the room task. Host commands and engine callbacks are both
/// handled here, one at a time.
pub(crate) struct RoomSession {
    platform: Platform,
    options: RoomOptions,
    state: Arc<RwLock<SessionState>>,
    engine_tx: mpsc::UnboundedSender<SessionEvent>,
    next_session_id: u64,
    session: Option<ActiveSession>,
    media: LocalMedia,
    data_channel: DataChannelDispatcher,
    stats: StatsSampler,
    enable_remote_audio: bool,
}

pub(crate) fn spawn(
    platform: Platform,
    options: RoomOptions,
    emitter: EventEmitter,
    state: Arc<RwLock<SessionState>>,
) -> (mpsc::UnboundedSender<RoomCommand>, tokio::task::JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();

    let requester = Arc::new(CommandStatsRequester { tx: command_tx.clone() });
    let data = platform.engine.create_data_track();
    if data.is_none() {
        log::warn!("engine did not provide a local data track");
    }

    let session = RoomSession {
        data_channel: DataChannelDispatcher::new(emitter),
        stats: StatsSampler::new(requester),
        media: LocalMedia { data, ..Default::default() },
        platform,
        options,
        state,
        engine_tx,
        next_session_id: 1,
        session: None,
        enable_remote_audio: true,
    };

    let handle = tokio::spawn(session.run(command_rx, engine_rx));
    (command_tx, handle)
}

impl RoomSession {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<RoomCommand>,
        mut engine_events: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        log::debug!("room handle dropped");
                        self.destroy().await;
                        break;
                    };

                    match command {
                        RoomCommand::Request { request, reply } => {
                            let res = self.handle_command(request).await;
                            if let Err(err) = &res {
                                log::warn!("room command failed: {}", err);
                            }
                            if let Some(reply) = reply {
                                let _ = reply.send(res);
                            }
                        }
                        RoomCommand::RequestStats => {
                            self.request_stats();
                        }
                        RoomCommand::Snapshot(reply) => {
                            let _ = reply.send(self.snapshot());
                        }
                        RoomCommand::Close(reply) => {
                            self.destroy().await;
                            // Let the engine's final callbacks through before stopping
                            while let Ok(event) = engine_events.try_recv() {
                                self.handle_engine_event(event).await;
                            }
                            let _ = reply.send(());
                            break;
                        }
                    }
                },
                Some(event) = engine_events.recv() => {
                    self.handle_engine_event(event).await;
                },
            }
        }

        log::debug!("room task closed");
    }

    fn set_state(&self, state: SessionState) {
        let mut current = self.state.write();
        if *current != state {
            log::debug!("room state {} -> {}", current.as_str(), state.as_str());
        }
        *current = state;
    }

    fn current_state(&self) -> SessionState {
        self.state.read().clone()
    }

    fn snapshot(&self) -> RoomSnapshot {
        let session = self.session.as_ref();
        RoomSnapshot {
            state: self.current_state(),
            room: session.map(|s| s.info.clone()),
            local_participant: session.and_then(|s| s.registry.local().cloned()),
            remote_participants: session
                .map(|s| s.registry.remote_participants())
                .unwrap_or_default(),
        }
    }

    async fn handle_command(&mut self, command: HostCommand) -> RoomResult<()> {
        match command {
            HostCommand::Connect { room_name, access_token, options } => {
                self.connect(room_name, access_token, options).await
            }
            HostCommand::Disconnect => self.disconnect().await,
            HostCommand::SendString { message } => {
                if let Err(err) = self.send_string(&message) {
                    log::debug!("dropping outbound message: {}", err);
                }
                Ok(())
            }
            HostCommand::FlipCamera => {
                self.flip_camera();
                Ok(())
            }
            HostCommand::SetLocalVideoEnabled { enabled } => {
                if let Some(track) = &self.media.video {
                    track.enable(enabled);
                    self.data_channel.emit(RoomEvent::VideoChanged { enabled });
                }
                Ok(())
            }
            HostCommand::SetLocalAudioEnabled { enabled } => {
                if let Some(track) = &self.media.audio {
                    track.enable(enabled);
                    self.data_channel.emit(RoomEvent::AudioChanged { enabled });
                }
                Ok(())
            }
            HostCommand::SetRemoteAudioEnabled { participant_sid, enabled } => {
                self.set_remote_audio_enabled(&participant_sid, enabled);
                Ok(())
            }
            HostCommand::ToggleSpeaker { enabled } => {
                self.platform.audio.set_speakerphone(enabled);
                Ok(())
            }
            HostCommand::ToggleBluetoothHeadset { enabled } => {
                self.platform.audio.set_bluetooth_sco(enabled);
                Ok(())
            }
            HostCommand::GetStats => {
                self.stats.get_once();
                Ok(())
            }
            HostCommand::StartStatsPolling { interval_ms } => {
                self.stats.start(Duration::from_millis(interval_ms));
                Ok(())
            }
            HostCommand::StopStatsPolling => {
                self.stats.stop();
                Ok(())
            }
            HostCommand::OnHostPause => {
                self.host_pause();
                Ok(())
            }
            HostCommand::OnHostResume => {
                self.host_resume();
                Ok(())
            }
            HostCommand::Destroy => {
                self.destroy().await;
                Ok(())
            }
        }
    }

    async fn connect(
        &mut self,
        room_name: Option<String>,
        access_token: String,
        media: LocalMediaOptions,
    ) -> RoomResult<()> {
        let state = self.current_state();
        if !state.is_idle() {
            return Err(RoomError::InvalidState { operation: "connect", state: state.as_str() });
        }

        self.data_channel.start().await;
        self.enable_remote_audio = media.enable_audio;

        self.media.release_audio();
        self.media.audio = self.platform.engine.create_audio_track(media.enable_audio);

        if media.enable_video && self.media.capturer.is_none() {
            let Some(capturer) = self.acquire_capturer() else {
                log::error!("no camera available, not connecting");
                let room = RoomInfo {
                    name: room_name.unwrap_or_default(),
                    sid: RoomSid::default(),
                };
                let error = ErrorInfo::from(&RoomError::DeviceUnavailable);
                self.data_channel.emit(RoomEvent::ConnectFailure { room, error });
                self.media.release_audio();
                self.data_channel.stop().await;
                return Ok(());
            };
            self.media.capturer = Some(capturer);
        }

        if media.enable_video && self.media.video.is_none() {
            if let Some(capturer) = &self.media.capturer {
                if capturer.has_supported_formats() {
                    self.media.video = self.platform.engine.create_video_track(
                        true,
                        capturer,
                        &self.options.video_constraints,
                    );
                } else {
                    log::warn!("camera reports no supported formats, connecting without video");
                }
            }
        }

        if media.enable_audio {
            self.platform.audio.activate(&self.options.preferred_audio_devices);
        } else {
            self.platform.audio.deactivate();
        }

        let options = ConnectOptions {
            room_name: room_name.clone(),
            access_token,
            audio_tracks: self.media.audio.iter().cloned().collect(),
            video_tracks: self.media.video.iter().cloned().collect(),
            data_tracks: self.media.data.iter().cloned().collect(),
            automatic_subscription: self.options.automatic_subscription,
            video_constraints: self.options.video_constraints,
        };

        let session_id = self.next_session_id;
        self.next_session_id += 1;
        let emitter = EngineEmitter::new(session_id, self.engine_tx.clone());

        match self.platform.engine.connect(options, emitter) {
            Ok(engine_room) => {
                log::info!("connecting to room {:?} (session {})", room_name, session_id);
                self.session = Some(ActiveSession {
                    id: session_id,
                    engine_room,
                    info: RoomInfo { name: room_name.unwrap_or_default(), sid: RoomSid::default() },
                    registry: ParticipantRegistry::new(),
                    closing: None,
                });
                self.set_state(SessionState::Connecting);
            }
            Err(err) => {
                let failure = RoomError::ConnectFailure(err.clone());
                log::error!("{}", failure);
                let room = RoomInfo { name: room_name.unwrap_or_default(), sid: RoomSid::default() };
                self.data_channel.emit(RoomEvent::ConnectFailure { room, error: (&failure).into() });
                self.data_channel.stop().await;
                self.media.release_audio();
                self.platform.audio.deactivate();
                self.set_state(SessionState::ConnectFailed(err));
            }
        }

        Ok(())
    }

    fn acquire_capturer(&self) -> Option<Arc<dyn CameraCapturer>> {
        self.options.camera_preference.iter().find_map(|source| {
            let capturer = self.platform.capture.acquire(*source);
            if capturer.is_none() {
                log::debug!("camera {:?} unavailable", source);
            }
            capturer
        })
    }

    async fn disconnect(&mut self) -> RoomResult<()> {
        self.data_channel.stop().await;
        self.stats.stop();

        if let Some(session) = self.session.as_mut() {
            if session.closing.is_none() {
                session.closing = Some(DisconnectReason::UserInitiated);
                session.engine_room.disconnect();
            }
        }

        self.media.release_audio();
        self.media.release_video();
        self.platform.audio.deactivate();
        self.media.stop_capturer();
        Ok(())
    }

    async fn destroy(&mut self) {
        self.stats.stop();
        self.data_channel.stop().await;

        if let Some(session) = self.session.as_mut() {
            if session.closing.is_none() && self.state.read().is_active() {
                session.closing = Some(DisconnectReason::Teardown);
                session.engine_room.disconnect();
            }
        }

        self.media.release_video();
        self.media.release_audio();
    }

    fn send_string(&self, message: &str) -> RoomResult<()> {
        let track = self
            .media
            .data
            .as_ref()
            .ok_or_else(|| RoomError::SendFailure("no local data track".to_owned()))?;
        track.send(message).map_err(|err| RoomError::SendFailure(err.to_string()))
    }

    fn flip_camera(&self) {
        let Some(capturer) = &self.media.capturer else {
            log::debug!("flip_camera without a capturer");
            return;
        };
        capturer.switch_camera();
        let is_back_camera = capturer.source() == CameraSource::Back;
        self.data_channel.emit(RoomEvent::CameraSwitched { is_back_camera });
    }

    fn set_remote_audio_enabled(&self, participant_sid: &ParticipantSid, enabled: bool) {
        let Some(session) = &self.session else {
            return;
        };
        let Some(participant) = session.registry.remote(participant_sid) else {
            log::debug!("set_remote_audio_enabled: unknown participant {}", participant_sid);
            return;
        };
        for publication in participant.subscribed_audio_tracks() {
            session.engine_room.set_remote_audio_playback(
                participant_sid,
                publication.sid(),
                enabled,
            );
        }
    }

    fn request_stats(&self) -> bool {
        match &self.session {
            Some(session) => {
                session.engine_room.request_stats();
                true
            }
            None => false,
        }
    }

    fn host_pause(&mut self) {
        let Some(video) = self.media.video.take() else {
            return;
        };
        if let Some(session) = &self.session {
            if self.state.read().is_connected() {
                session.engine_room.unpublish_track(&LocalTrack::Video(video.clone()));
            }
        }
        video.release();
    }

    fn host_resume(&mut self) {
        let mut recreated = false;
        if self.media.video.is_none() {
            if let Some(capturer) = &self.media.capturer {
                self.media.video = self.platform.engine.create_video_track(
                    true,
                    capturer,
                    &self.options.video_constraints,
                );
                recreated = self.media.video.is_some();
            }
        }

        let (Some(video), Some(session)) = (&self.media.video, &self.session) else {
            return;
        };
        if recreated && self.state.read().is_connected() {
            if let Err(err) = session.engine_room.publish_track(&LocalTrack::Video(video.clone())) {
                log::error!("failed to publish local video: {}", err);
            }
        }
    }

    async fn handle_engine_event(&mut self, event: SessionEvent) {
        let SessionEvent { session_id, event } = event;
        if self.session.as_ref().map(|s| s.id) != Some(session_id) {
            log::debug!("dropping event for stale session {}: {:?}", session_id, event);
            return;
        }

        match event {
            EngineEvent::Connected { room, local_participant, remote_participants } => {
                self.on_connected(room, local_participant, remote_participants);
            }
            EngineEvent::ConnectFailure { room, error } => {
                self.on_connect_failure(room, error).await;
            }
            EngineEvent::Reconnecting { error } => {
                log::warn!("room reconnecting: {}", error);
                self.set_state(SessionState::Reconnecting);
            }
            EngineEvent::Reconnected => {
                log::info!("room reconnected");
                self.set_state(SessionState::Connected);
            }
            EngineEvent::Disconnected { room, error } => {
                self.on_disconnected(room, error).await;
            }
            EngineEvent::ParticipantConnected(participant) => {
                self.add_participant(participant);
            }
            EngineEvent::ParticipantDisconnected(participant) => {
                self.remove_participant(participant);
            }
            EngineEvent::TrackPublished { participant, publication } => {
                self.on_track_update(participant, publication, TrackUpdate::Published, None);
            }
            EngineEvent::TrackUnpublished { participant, publication } => {
                self.on_track_update(participant, publication, TrackUpdate::Unpublished, None);
            }
            EngineEvent::TrackSubscribed { participant, publication } => {
                self.on_track_update(participant, publication, TrackUpdate::Subscribed, None);
            }
            EngineEvent::TrackUnsubscribed { participant, publication } => {
                self.on_track_update(participant, publication, TrackUpdate::Unsubscribed, None);
            }
            EngineEvent::TrackSubscriptionFailed { participant, publication, error } => {
                self.on_track_update(
                    participant,
                    publication,
                    TrackUpdate::SubscriptionFailed,
                    Some(error),
                );
            }
            EngineEvent::TrackEnabled { participant, publication } => {
                self.on_track_update(participant, publication, TrackUpdate::Enabled, None);
            }
            EngineEvent::TrackDisabled { participant, publication } => {
                self.on_track_update(participant, publication, TrackUpdate::Disabled, None);
            }
            EngineEvent::DataMessage { track_sid, message } => {
                self.data_channel.deliver(track_sid, message);
            }
            EngineEvent::StatsReport(reports) => {
                self.data_channel.emit(RoomEvent::StatsReceived(reports));
            }
        }
    }

    fn on_connected(
        &mut self,
        room: RoomInfo,
        local_participant: LocalParticipant,
        remote_participants: Vec<RemoteParticipant>,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        log::info!("connected to room {} ({})", room.name, room.sid);
        session.info = room.clone();
        self.set_state(SessionState::Connected);

        let participants = remote_participants
            .iter()
            .map(|p| p.info())
            .chain(std::iter::once(local_participant.info()))
            .collect();
        self.data_channel.emit(RoomEvent::Connected { room, participants });

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.registry.set_local(local_participant);

        if let Some(data) = &self.media.data {
            if let Err(err) = session.engine_room.publish_track(&LocalTrack::Data(data.clone())) {
                log::error!("failed to publish local data track: {}", err);
            }
        }

        for participant in remote_participants {
            self.add_participant(participant);
        }
    }

    async fn on_connect_failure(&mut self, room: RoomInfo, error: EngineError) {
        log::error!("failed to connect to room {}: {}", room.name, error);
        self.session = None;
        self.data_channel.emit(RoomEvent::ConnectFailure { room, error: (&error).into() });
        self.set_state(SessionState::ConnectFailed(error));
        self.data_channel.stop().await;
        self.media.release_audio();
        self.platform.audio.deactivate();
    }

    async fn on_disconnected(&mut self, room: RoomInfo, error: Option<EngineError>) {
        let Some(session) = self.session.take() else {
            return;
        };

        let participant = session.registry.local().map(|p| p.identity());
        self.data_channel.emit(RoomEvent::Disconnected {
            participant,
            room,
            error: error.as_ref().map(ErrorInfo::from),
        });

        let reason = match (session.closing, error) {
            (Some(reason), _) => reason,
            (None, Some(error)) => DisconnectReason::Error(error),
            (None, None) => DisconnectReason::ServerInitiated,
        };
        log::info!("disconnected from room {} ({:?}, session {})", session.info.name, reason, session.id);
        let from_teardown = reason == DisconnectReason::Teardown;
        self.set_state(SessionState::Disconnected(reason));

        self.data_channel.stop().await;
        if !from_teardown {
            self.platform.audio.deactivate();
        }
    }

    fn add_participant(&mut self, participant: RemoteParticipant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let info = participant.info();
        let data_tracks = participant.subscribed_data_tracks();
        if session.registry.add_remote(participant).is_some() {
            log::debug!("participant {} was already known, replacing", info.identity);
        }

        self.data_channel.emit(RoomEvent::ParticipantConnected {
            room: session.info.clone(),
            participant: info.clone(),
        });

        for publication in data_tracks {
            self.data_channel.bind(publication.sid().clone(), info.clone());
        }
    }

    fn remove_participant(&mut self, participant: RemoteParticipant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let info = participant.info();
        if session.registry.remove_remote(&info.sid).is_none() {
            log::debug!("removing unknown participant {}", info.identity);
        }

        self.data_channel.emit(RoomEvent::ParticipantDisconnected {
            room: session.info.clone(),
            participant: info.clone(),
        });
        self.data_channel.unbind_participant(info.sid);
    }

    fn on_track_update(
        &mut self,
        participant: ParticipantInfo,
        publication: TrackPublication,
        update: TrackUpdate,
        error: Option<EngineError>,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let publication = session
            .registry
            .apply_track_update(&participant, &publication, update)
            .unwrap_or(publication);
        let kind = publication.kind();

        if update == TrackUpdate::Subscribed && kind == TrackKind::Audio {
            session.engine_room.set_remote_audio_playback(
                &participant.sid,
                publication.sid(),
                self.enable_remote_audio,
            );
        }

        match (update, kind) {
            (TrackUpdate::Subscribed, TrackKind::Data) => {
                self.data_channel.bind(publication.sid().clone(), participant.clone());
            }
            (TrackUpdate::Unsubscribed, TrackKind::Data) => {
                self.data_channel.unbind(publication.sid().clone());
            }
            _ => {}
        }

        let event = match update {
            TrackUpdate::Enabled | TrackUpdate::Disabled if !kind.is_media() => {
                log::trace!("ignoring {:?} on data track {}", update, publication.sid());
                return;
            }
            TrackUpdate::Published | TrackUpdate::Unpublished => {
                log::debug!(
                    "{:?} {} track {} of {}",
                    update,
                    kind.as_str(),
                    publication.sid(),
                    participant.identity
                );
                return;
            }
            TrackUpdate::Subscribed => RoomEvent::TrackSubscribed { participant, publication },
            TrackUpdate::Unsubscribed => RoomEvent::TrackUnsubscribed { participant, publication },
            TrackUpdate::SubscriptionFailed => {
                let error = error.unwrap_or_else(|| EngineError::new("subscription failed", 0));
                let failure =
                    RoomError::SubscriptionFailure { sid: publication.sid().clone(), error };
                log::warn!("{}", failure);
                RoomEvent::TrackSubscriptionFailed {
                    participant,
                    publication,
                    error: ErrorInfo::from(&failure),
                }
            }
            TrackUpdate::Enabled => RoomEvent::TrackEnabled { participant, publication },
            TrackUpdate::Disabled => RoomEvent::TrackDisabled { participant, publication },
        };
        self.data_channel.emit(event);
    }
}
