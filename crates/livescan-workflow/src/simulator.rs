// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing simulator: the cosmetic progress bar shown between review and
// the delivery form. Nothing is actually processed on the device.
//
//   Idle --start--> Running --tick x25--> Settling --300 ms--> Finished
//                      \________________cancel_______________/-> Cancelled
//
// `ProcessingSimulator` is the pure automaton, so tests can step it by hand.
// `ProcessingSimulator::spawn` drives it from a tokio task that ticks every
// 120 ms and can be cancelled at any point.

use std::time::Duration;

use livescan_core::error::{LiveScanError, Result};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Progress units added per tick.
pub const STEP: u8 = 4;
/// Time between ticks.
pub const TICK_PERIOD: Duration = Duration::from_millis(120);
/// Pause on "complete" before completion is signalled.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Label shown under the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Crop,
    Deskew,
    Enhance,
    Complete,
}

impl Phase {
    pub fn for_progress(progress: u8) -> Self {
        match progress {
            0..30 => Phase::Crop,
            30..65 => Phase::Deskew,
            65..100 => Phase::Enhance,
            _ => Phase::Complete,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Crop => "crop",
            Phase::Deskew => "deskew",
            Phase::Enhance => "enhance",
            Phase::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One observable step of the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Percentage, 0-100.
    pub progress: u8,
    pub phase: Phase,
}

impl Tick {
    fn at(progress: u8) -> Self {
        Self {
            progress,
            phase: Phase::for_progress(progress),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorStatus {
    Idle,
    Running,
    /// Reached 100, waiting out the settle delay.
    Settling,
    Finished,
    Cancelled,
}

/// How a spawned simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ProcessingSimulator {
    progress: u8,
    ticks: u32,
    status: SimulatorStatus,
}

impl Default for ProcessingSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingSimulator {
    pub fn new() -> Self {
        Self {
            progress: 0,
            ticks: 0,
            status: SimulatorStatus::Idle,
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn phase(&self) -> Phase {
        Phase::for_progress(self.progress)
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn status(&self) -> SimulatorStatus {
        self.status
    }

    /// Reset to 0 and begin running. Restarting a finished or cancelled
    /// simulator is allowed.
    pub fn start(&mut self) {
        self.progress = 0;
        self.ticks = 0;
        self.status = SimulatorStatus::Running;
    }

    /// Advance one step. Returns `None` unless running.
    pub fn tick(&mut self) -> Option<Tick> {
        if self.status != SimulatorStatus::Running {
            return None;
        }
        self.progress = self.progress.saturating_add(STEP).min(100);
        self.ticks += 1;
        if self.progress >= 100 {
            self.status = SimulatorStatus::Settling;
        }
        Some(Tick::at(self.progress))
    }

    /// Finish after the settle delay. Returns whether completion was signalled.
    pub fn settle(&mut self) -> bool {
        if self.status == SimulatorStatus::Settling {
            self.status = SimulatorStatus::Finished;
            true
        } else {
            false
        }
    }

    /// Stop immediately. Returns whether anything was running.
    pub fn cancel(&mut self) -> bool {
        match self.status {
            SimulatorStatus::Running | SimulatorStatus::Settling => {
                self.status = SimulatorStatus::Cancelled;
                true
            }
            _ => false,
        }
    }

    /// Start a fresh simulation on the current tokio runtime.
    ///
    /// Fails with `RuntimeUnavailable` when called outside one.
    pub fn spawn() -> Result<SimulationHandle> {
        let runtime = Handle::try_current().map_err(|_| LiveScanError::RuntimeUnavailable)?;
        let cancel = CancellationToken::new();
        let (progress_tx, progress_rx) = watch::channel(Tick::at(0));

        let mut simulator = Self::new();
        simulator.start();
        let task = runtime.spawn(drive(simulator, progress_tx, cancel.clone()));

        Ok(SimulationHandle {
            cancel,
            progress: progress_rx,
            task: Some(task),
        })
    }
}

async fn drive(
    mut simulator: ProcessingSimulator,
    progress: watch::Sender<Tick>,
    cancel: CancellationToken,
) -> SimulationOutcome {
    let mut interval = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while simulator.status() == SimulatorStatus::Running {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                simulator.cancel();
                debug!(progress = simulator.progress(), "processing cancelled");
                return SimulationOutcome::Cancelled;
            }
            _ = interval.tick() => {
                if let Some(tick) = simulator.tick() {
                    debug!(progress = tick.progress, phase = %tick.phase, "processing tick");
                    progress.send_replace(tick);
                }
            }
        }
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            simulator.cancel();
            debug!("processing cancelled while settling");
            SimulationOutcome::Cancelled
        }
        _ = tokio::time::sleep(SETTLE_DELAY) => {
            simulator.settle();
            info!(ticks = simulator.ticks(), "processing complete");
            SimulationOutcome::Completed
        }
    }
}

/// A running simulation. Dropping the handle cancels it.
pub struct SimulationHandle {
    cancel: CancellationToken,
    progress: watch::Receiver<Tick>,
    task: Option<JoinHandle<SimulationOutcome>>,
}

impl SimulationHandle {
    /// The most recent tick.
    pub fn progress(&self) -> Tick {
        *self.progress.borrow()
    }

    /// Receiver notified on every tick.
    pub fn subscribe(&self) -> watch::Receiver<Tick> {
        self.progress.clone()
    }

    /// Stop ticking. No tick is published after this returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for completion or cancellation.
    pub async fn finished(mut self) -> SimulationOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(SimulationOutcome::Cancelled),
            None => SimulationOutcome::Cancelled,
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for SimulationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationHandle")
            .field("progress", &self.progress())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
