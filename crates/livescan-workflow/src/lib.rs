// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live Scan Workflow: the capture -> review -> processing -> delivery ->
// result journey, plus the separately entered redemption screen.

pub mod machine;
pub mod simulator;

pub use machine::{
    BackTarget, DeliveryForm, INTERRUPTED_DELIVERY, WorkflowState, WorkflowStateMachine,
};
pub use simulator::{
    Phase, ProcessingSimulator, SimulationHandle, SimulationOutcome, SimulatorStatus, Tick,
};
