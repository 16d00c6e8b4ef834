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

use crate::id::TrackSid;
use crate::track::{SubscriptionState, TrackKind};

/// A track offered by a participant, mirrored as the engine last reported it.
///
/// Publications are values: the registry replaces them on every transition
/// instead of sharing mutable handles with the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPublication {
    sid: TrackSid,
    name: String,
    kind: TrackKind,
    subscription: SubscriptionState,
    enabled: bool,
}

impl TrackPublication {
    pub fn new(sid: impl Into<TrackSid>, name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            sid: sid.into(),
            name: name.into(),
            kind,
            subscription: SubscriptionState::Unsubscribed,
            enabled: true,
        }
    }

    pub fn with_subscription(self, subscription: SubscriptionState) -> Self {
        Self { subscription, ..self }
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    #[inline]
    pub fn sid(&self) -> &TrackSid {
        &self.sid
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    #[inline]
    pub fn subscription(&self) -> SubscriptionState {
        self.subscription
    }

    #[inline]
    pub fn is_subscribed(&self) -> bool {
        self.subscription == SubscriptionState::Subscribed
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_subscription(&mut self, subscription: SubscriptionState) {
        self.subscription = subscription;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
