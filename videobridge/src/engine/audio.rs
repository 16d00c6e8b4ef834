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

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioDevice {
    BluetoothHeadset,
    WiredHeadset,
    Speakerphone,
    Earpiece,
}

/// Platform audio focus and output routing.
pub trait AudioRouting: Debug + Send + Sync {
    /// Take audio focus and route to the first available device in `preferred`
    fn activate(&self, preferred: &[AudioDevice]);
    fn deactivate(&self);
    fn set_speakerphone(&self, enabled: bool);
    fn set_bluetooth_sco(&self, enabled: bool);
}
