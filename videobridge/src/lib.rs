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

//! State-synchronization core for bridging a real-time video SDK to a host
//! runtime.
//!
//! A [`Room`] owns one room task that serializes host commands and engine
//! callbacks, mirrors participants and their track publications, and
//! forwards everything to the host as named JSON events.

pub mod engine;
mod room;

pub use room::*;

/// `use videobridge::prelude::*;` to import the room model types
pub mod prelude;
