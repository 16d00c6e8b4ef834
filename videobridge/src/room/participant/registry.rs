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

use super::{LocalParticipant, ParticipantInfo, RemoteParticipant};
use crate::prelude::*;

/// Track-level transition reported by the engine for a remote publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackUpdate {
    Published,
    Unpublished,
    Subscribed,
    Unsubscribed,
    SubscriptionFailed,
    Enabled,
    Disabled,
}

/// Local participant plus the remote participants of the active session.
///
/// Remote entries only change in response to engine callbacks; a track update
/// for an unknown participant is ignored rather than creating one.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    local: Option<LocalParticipant>,
    remotes: HashMap<ParticipantSid, RemoteParticipant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_local(&mut self, participant: LocalParticipant) {
        self.local = Some(participant);
    }

    pub fn local(&self) -> Option<&LocalParticipant> {
        self.local.as_ref()
    }

    /// Returns the participant previously stored under the same sid
    pub fn add_remote(&mut self, participant: RemoteParticipant) -> Option<RemoteParticipant> {
        self.remotes.insert(participant.sid(), participant)
    }

    pub fn remove_remote(&mut self, sid: &ParticipantSid) -> Option<RemoteParticipant> {
        self.remotes.remove(sid)
    }

    pub fn remote(&self, sid: &ParticipantSid) -> Option<&RemoteParticipant> {
        self.remotes.get(sid)
    }

    pub fn remote_by_identity(&self, identity: &ParticipantIdentity) -> Option<&RemoteParticipant> {
        self.remotes.values().find(|p| &p.identity() == identity)
    }

    /// Remote participants sorted by sid
    pub fn remote_participants(&self) -> Vec<RemoteParticipant> {
        let mut remotes: Vec<_> = self.remotes.values().cloned().collect();
        remotes.sort_by_key(|p| p.sid());
        remotes
    }

    /// Mirror a track transition into the registry.
    ///
    /// Returns the publication as stored after the update, or `None` when the
    /// participant is unknown.
    pub fn apply_track_update(
        &mut self,
        participant: &ParticipantInfo,
        publication: &TrackPublication,
        update: TrackUpdate,
    ) -> Option<TrackPublication> {
        let Some(remote) = self.remotes.get_mut(&participant.sid) else {
            log::warn!(
                "track update {:?} for unknown participant {} ({})",
                update,
                participant.identity,
                participant.sid
            );
            return None;
        };

        let sid = publication.sid();
        match update {
            TrackUpdate::Published => {
                remote.add_publication(publication.clone());
            }
            TrackUpdate::Unpublished => {
                return remote.remove_publication(sid).or_else(|| Some(publication.clone()));
            }
            TrackUpdate::Subscribed => {
                let mut stored = remote
                    .get_track_publication(sid)
                    .cloned()
                    .unwrap_or_else(|| publication.clone());
                stored.set_subscription(SubscriptionState::Subscribed);
                stored.set_enabled(publication.is_enabled());
                remote.add_publication(stored);
            }
            TrackUpdate::Unsubscribed | TrackUpdate::SubscriptionFailed => {
                let state = if update == TrackUpdate::Unsubscribed {
                    SubscriptionState::Unsubscribed
                } else {
                    SubscriptionState::Failed
                };
                match remote.publication_mut(sid) {
                    Some(stored) => stored.set_subscription(state),
                    None => remote.add_publication(publication.clone().with_subscription(state)),
                }
            }
            TrackUpdate::Enabled | TrackUpdate::Disabled => {
                let enabled = update == TrackUpdate::Enabled;
                match remote.publication_mut(sid) {
                    Some(stored) => stored.set_enabled(enabled),
                    None => remote.add_publication(publication.clone().with_enabled(enabled)),
                }
            }
        }

        remote.get_track_publication(sid).cloned()
    }
}
