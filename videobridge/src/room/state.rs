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

use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `disconnect()` was called
    UserInitiated,
    /// The room was torn down by `destroy()`
    Teardown,
    Error(EngineError),
    ServerInitiated,
}

/// Connection lifecycle of the room.
///
/// `Disconnected` and `ConnectFailed` end an attempt and behave like `Idle`
/// for the purpose of starting a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    Disconnected(DisconnectReason),
    ConnectFailed(EngineError),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(
            self,
            SessionState::Idle | SessionState::Disconnected(_) | SessionState::ConnectFailed(_)
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_idle()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected | SessionState::Reconnecting)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Reconnecting => "reconnecting",
            SessionState::Disconnected(_) => "disconnected",
            SessionState::ConnectFailed(_) => "connect_failed",
        }
    }
}
