// Copyright 2025 eraflo
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

//! CPU and GPU timing of one span of commands.

use crate::renderer::{
    api::QueryId,
    error::ResourceError,
    traits::{GlDevice, GpuResource},
};
use std::time::{Duration, Instant};

/// Durations of the last completed span, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockTicks {
    /// Time elapsed on the CPU between `start` and `stop`.
    pub cpu: f64,
    /// Time the GPU took between the two timestamps.
    pub gpu: f64,
}

/// Measures the same span on the CPU and on the GPU.
///
/// The GPU side brackets the span with two timestamp queries and is read
/// lazily: [`ticks`](Self::ticks) never waits for the GPU and keeps reporting
/// the previous GPU duration until the stop timestamp is available. While a
/// result is outstanding, [`start`](Self::start) leaves the pending GPU span
/// alone and only restarts the CPU side.
///
/// # Example
///
/// ```ignore
/// let mut clock = GpuClock::new(device, "Frame")?;
///
/// // Per frame:
/// clock.start(device)?;
/// draw(device);
/// clock.stop(device)?;
/// let ticks = clock.ticks(device)?;
/// log::trace!("cpu {:.3} ms, gpu {:.3} ms", ticks.cpu * 1e3, ticks.gpu * 1e3);
/// ```
#[derive(Debug)]
pub struct GpuClock {
    start_query: QueryId,
    stop_query: QueryId,
    cpu_start: Option<Instant>,
    ticks: ClockTicks,
    gpu_ticking: bool,
    gpu_ready: bool,
    label: &'static str,
}

impl GpuClock {
    /// Creates the clock's two queries and gives each a first timestamp, so
    /// [`ticks`](Self::ticks) is defined before the first span.
    ///
    /// # Errors
    ///
    /// The device error if the queries cannot be created or written; nothing
    /// is leaked.
    pub fn new(device: &dyn GlDevice, label: &'static str) -> Result<Self, ResourceError> {
        let start_query = device.create_timer_query()?;
        let stop_query = match device.create_timer_query() {
            Ok(query) => query,
            Err(e) => {
                release_queries(device, &[start_query], label);
                return Err(e);
            }
        };

        let primed = device
            .write_timestamp(start_query)
            .and_then(|()| device.write_timestamp(stop_query));
        if let Err(e) = primed {
            release_queries(device, &[start_query, stop_query], label);
            return Err(e);
        }

        Ok(Self {
            start_query,
            stop_query,
            cpu_start: None,
            ticks: ClockTicks::default(),
            gpu_ticking: false,
            gpu_ready: true,
            label,
        })
    }

    /// Starts a span. Calling it again before [`stop`](Self::stop) keeps the
    /// first start.
    pub fn start(&mut self, device: &dyn GlDevice) -> Result<(), ResourceError> {
        if self.cpu_start.is_none() {
            self.cpu_start = Some(Instant::now());
        }
        if !self.gpu_ticking && self.gpu_ready {
            device.write_timestamp(self.start_query)?;
            self.gpu_ticking = true;
        }
        Ok(())
    }

    /// Ends the span. The CPU duration is updated immediately; the GPU
    /// duration once the GPU reaches the stop timestamp.
    ///
    /// # Errors
    ///
    /// [`ResourceError::ClockNotStarted`] if no span is running.
    pub fn stop(&mut self, device: &dyn GlDevice) -> Result<(), ResourceError> {
        let started = self.cpu_start.take().ok_or(ResourceError::ClockNotStarted)?;
        self.ticks.cpu = started.elapsed().as_secs_f64();
        if self.gpu_ticking {
            device.write_timestamp(self.stop_query)?;
            self.gpu_ticking = false;
        }
        Ok(())
    }

    /// The durations of the last completed span, polling the GPU result
    /// without blocking.
    pub fn ticks(&mut self, device: &dyn GlDevice) -> Result<ClockTicks, ResourceError> {
        if !self.gpu_ticking {
            match device.timer_query_result(self.stop_query)? {
                Some(stop) => {
                    self.gpu_ready = true;
                    if let Some(start) = device.timer_query_result(self.start_query)? {
                        self.ticks.gpu = Duration::from_nanos(stop.saturating_sub(start))
                            .as_secs_f64();
                    }
                }
                None => self.gpu_ready = false,
            }
        }
        Ok(self.ticks)
    }

    /// Whether a span is running.
    pub fn is_running(&self) -> bool {
        self.cpu_start.is_some()
    }

    /// Destroys both queries.
    pub fn destroy(self, device: &dyn GlDevice) {
        release_queries(device, &[self.start_query, self.stop_query], self.label);
    }
}

fn release_queries(device: &dyn GlDevice, queries: &[QueryId], label: &str) {
    for query in queries {
        if let Err(e) = query.release(device) {
            log::warn!("GpuClock({}): Failed to destroy query {:?}: {}", label, query, e);
        }
    }
}
