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

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Something that can be asked for a stats snapshot. Returns false when the
/// request could not be issued.
pub trait StatsRequester: Send + Sync {
    fn request_stats(&self) -> bool;
}

/// Periodic stats polling. At most one polling task runs at a time.
pub struct StatsSampler {
    requester: Arc<dyn StatsRequester>,
    handle: Option<JoinHandle<()>>,
    interval: Option<Duration>,
}

impl StatsSampler {
    pub fn new(requester: Arc<dyn StatsRequester>) -> Self {
        Self { requester, handle: None, interval: None }
    }

    /// Replace any running schedule with one ticking every `interval`,
    /// starting immediately.
    pub fn start(&mut self, interval: Duration) {
        self.stop();

        if interval.is_zero() {
            log::warn!("ignoring stats polling with a zero interval");
            return;
        }

        let requester = self.requester.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !requester.request_stats() {
                    log::trace!("stats tick without an active session");
                }
            }
        }));
        self.interval = Some(interval);
        log::debug!("stats polling every {:?}", interval);
    }

    /// Returns true if a task was running
    pub fn stop(&mut self) -> bool {
        self.interval = None;
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn get_once(&self) -> bool {
        self.requester.request_stats()
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

impl Drop for StatsSampler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
