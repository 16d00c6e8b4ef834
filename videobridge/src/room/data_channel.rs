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

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::emitter::{EventEmitter, RoomEvent};
use crate::prelude::*;

#[derive(Debug)]
enum DataTask {
    Bind { track_sid: TrackSid, participant: ParticipantInfo },
    Unbind { track_sid: TrackSid },
    UnbindParticipant { sid: ParticipantSid },
    Message { track_sid: TrackSid, message: String },
    #[cfg(test)]
    Query {
        track_sid: TrackSid,
        reply: tokio::sync::oneshot::Sender<Option<ParticipantIdentity>>,
    },
    Emit(RoomEvent),
}

/// Sequencer for inbound data-track traffic.
///
/// Bindings and messages are applied by a single worker in submission order,
/// so a message never races the subscription that makes its sender known.
/// While a worker runs, every room event goes through it too, so the host
/// sees one order. A worker lives for one connect attempt.
#[derive(Debug)]
pub struct DataChannelDispatcher {
    emitter: EventEmitter,
    tx: Option<mpsc::UnboundedSender<DataTask>>,
    handle: Option<JoinHandle<()>>,
}

impl DataChannelDispatcher {
    pub fn new(emitter: EventEmitter) -> Self {
        Self { emitter, tx: None, handle: None }
    }

    /// Start a fresh worker, draining and stopping any previous one first
    pub async fn start(&mut self) {
        self.stop().await;

        let (tx, rx) = mpsc::unbounded_channel();
        self.handle = Some(tokio::spawn(data_task(self.emitter.clone(), rx)));
        self.tx = Some(tx);
    }

    /// Stop accepting work and wait until everything queued is handled
    pub async fn stop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                log::error!("data channel worker failed: {:?}", err);
            }
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.tx.is_some()
    }

    pub fn bind(&self, track_sid: TrackSid, participant: ParticipantInfo) {
        self.submit(DataTask::Bind { track_sid, participant });
    }

    pub fn unbind(&self, track_sid: TrackSid) {
        self.submit(DataTask::Unbind { track_sid });
    }

    pub fn unbind_participant(&self, sid: ParticipantSid) {
        self.submit(DataTask::UnbindParticipant { sid });
    }

    pub fn deliver(&self, track_sid: TrackSid, message: String) {
        self.submit(DataTask::Message { track_sid, message });
    }

    /// Emit `event` once all work submitted so far is applied, or right away
    /// when no worker is running
    pub fn emit(&self, event: RoomEvent) {
        if self.is_running() {
            self.submit(DataTask::Emit(event));
        } else {
            self.emitter.emit(event);
        }
    }

    /// Identity currently bound to `track_sid`, as seen after all work
    /// submitted so far
    #[cfg(test)]
    pub(crate) async fn sender_of(&self, track_sid: TrackSid) -> Option<ParticipantIdentity> {
        let (reply, rx) = tokio::sync::oneshot::channel();
        self.submit(DataTask::Query { track_sid, reply });
        rx.await.ok().flatten()
    }

    fn submit(&self, task: DataTask) {
        let Some(tx) = self.tx.as_ref() else {
            log::debug!("data channel worker not running, dropping {:?}", task);
            return;
        };
        if let Err(err) = tx.send(task) {
            log::warn!("data channel worker is gone, dropping {:?}", err.0);
        }
    }
}

async fn data_task(emitter: EventEmitter, mut rx: mpsc::UnboundedReceiver<DataTask>) {
    let mut bindings: HashMap<TrackSid, ParticipantInfo> = HashMap::new();

    while let Some(task) = rx.recv().await {
        match task {
            DataTask::Bind { track_sid, participant } => {
                if let Some(previous) = bindings.insert(track_sid.clone(), participant) {
                    log::debug!("rebinding data track {} (was {})", track_sid, previous.identity);
                }
            }
            DataTask::Unbind { track_sid } => {
                bindings.remove(&track_sid);
            }
            DataTask::UnbindParticipant { sid } => {
                bindings.retain(|_, participant| participant.sid != sid);
            }
            DataTask::Message { track_sid, message } => {
                let sender = bindings.get(&track_sid).map(|p| p.identity.clone());
                if sender.is_none() {
                    log::debug!("message on unbound data track {}", track_sid);
                }
                emitter.emit(RoomEvent::DataMessageReceived { message, sender });
            }
            #[cfg(test)]
            DataTask::Query { track_sid, reply } => {
                let _ = reply.send(bindings.get(&track_sid).map(|p| p.identity.clone()));
            }
            DataTask::Emit(event) => emitter.emit(event),
        }
    }

    log::debug!("data channel worker stopped");
}
