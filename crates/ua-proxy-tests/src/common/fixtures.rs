// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built address spaces for consistent and reproducible testing.
//!
//! ## Design Principles
//!
//! - Each fixture represents a realistic server layout
//! - Node ids are exposed as constants or accessors so tests never
//!   re-type them
//! - Pathological graphs (cycles, deep chains, broken state machines,
//!   denied nodes) live next to the healthy ones

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use ua_proxy::client::{CallRequest, CallResponse};
use ua_proxy::ids::{reference_types, types};
use ua_proxy::{LocalizedText, NodeId};

use crate::common::builders::AddressSpaceBuilder;
use crate::common::mocks::{MockTransport, SharedAddressSpace};

// =============================================================================
// Program State Machine Type
// =============================================================================

/// States of a program state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramState {
    /// Program stopped, needs a reset.
    Halted,
    /// Program ready to start.
    Ready,
    /// Program running.
    Running,
    /// Program paused.
    Suspended,
}

impl ProgramState {
    /// All states, in declaration order.
    pub const ALL: [ProgramState; 4] = [Self::Halted, Self::Ready, Self::Running, Self::Suspended];

    /// Browse name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Halted => "Halted",
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::Suspended => "Suspended",
        }
    }

    /// StateNumber property value.
    pub fn number(&self) -> u32 {
        match self {
            Self::Halted => 11,
            Self::Ready => 12,
            Self::Running => 13,
            Self::Suspended => 14,
        }
    }

    /// Node of the state declaration in the type.
    pub fn node_id(&self) -> NodeId {
        match self {
            Self::Ready => NodeId::numeric(0, 2400),
            Self::Running => NodeId::numeric(0, 2402),
            Self::Suspended => NodeId::numeric(0, 2404),
            Self::Halted => NodeId::numeric(0, 2406),
        }
    }

    /// Methods the server accepts in this state.
    pub fn executable(&self) -> &'static [ProgramMethod] {
        match self {
            Self::Halted => &[ProgramMethod::Reset],
            Self::Ready => &[ProgramMethod::Start, ProgramMethod::Halt, ProgramMethod::Resume],
            Self::Running => &[ProgramMethod::Suspend, ProgramMethod::Halt],
            Self::Suspended => &[ProgramMethod::Resume, ProgramMethod::Halt],
        }
    }

    /// State reached by calling `method` here, `None` if the call leaves the
    /// state unchanged.
    pub fn after(&self, method: ProgramMethod) -> Option<ProgramState> {
        match (self, method) {
            (Self::Halted, ProgramMethod::Reset) => Some(Self::Ready),
            (Self::Ready, ProgramMethod::Start) => Some(Self::Running),
            (Self::Ready, ProgramMethod::Halt) => Some(Self::Halted),
            (Self::Running, ProgramMethod::Suspend) => Some(Self::Suspended),
            (Self::Running, ProgramMethod::Halt) => Some(Self::Halted),
            (Self::Suspended, ProgramMethod::Resume) => Some(Self::Running),
            (Self::Suspended, ProgramMethod::Halt) => Some(Self::Halted),
            _ => None,
        }
    }
}

/// Methods of a program state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramMethod {
    /// Ready to Running.
    Start,
    /// Running to Suspended.
    Suspend,
    /// Suspended to Running.
    Resume,
    /// Any active state to Halted.
    Halt,
    /// Halted to Ready.
    Reset,
}

impl ProgramMethod {
    /// All methods, in declaration order.
    pub const ALL: [ProgramMethod; 5] = [
        Self::Start,
        Self::Suspend,
        Self::Resume,
        Self::Halt,
        Self::Reset,
    ];

    /// Browse name of the method.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Suspend => "Suspend",
            Self::Resume => "Resume",
            Self::Halt => "Halt",
            Self::Reset => "Reset",
        }
    }

    /// Child key of the method in a proxy.
    pub fn key(&self) -> String {
        self.name().to_lowercase()
    }

    /// Node of the method declaration in the type.
    pub fn type_node_id(&self) -> NodeId {
        match self {
            Self::Start => NodeId::numeric(0, 2426),
            Self::Suspend => NodeId::numeric(0, 2427),
            Self::Resume => NodeId::numeric(0, 2428),
            Self::Halt => NodeId::numeric(0, 2429),
            Self::Reset => NodeId::numeric(0, 2430),
        }
    }
}

/// Transition declarations of ProgramStateMachineType:
/// `(name, node, from, to, cause, number)`.
pub const PROGRAM_TRANSITIONS: [(&str, u32, ProgramState, ProgramState, Option<ProgramMethod>, u32); 9] = [
    ("HaltedToReady", 2408, ProgramState::Halted, ProgramState::Ready, Some(ProgramMethod::Reset), 1),
    ("ReadyToRunning", 2410, ProgramState::Ready, ProgramState::Running, Some(ProgramMethod::Start), 2),
    ("RunningToHalted", 2412, ProgramState::Running, ProgramState::Halted, Some(ProgramMethod::Halt), 3),
    ("RunningToReady", 2414, ProgramState::Running, ProgramState::Ready, None, 4),
    ("RunningToSuspended", 2416, ProgramState::Running, ProgramState::Suspended, Some(ProgramMethod::Suspend), 5),
    ("SuspendedToRunning", 2418, ProgramState::Suspended, ProgramState::Running, Some(ProgramMethod::Resume), 6),
    ("SuspendedToHalted", 2420, ProgramState::Suspended, ProgramState::Halted, Some(ProgramMethod::Halt), 7),
    ("SuspendedToReady", 2422, ProgramState::Suspended, ProgramState::Ready, None, 8),
    ("ReadyToHalted", 2424, ProgramState::Ready, ProgramState::Halted, Some(ProgramMethod::Halt), 9),
];

/// Fixture declaring the ProgramStateMachineType instance declarations.
pub struct StateMachineFixtures;

impl StateMachineFixtures {
    /// Adds the states, transitions and methods of ProgramStateMachineType.
    ///
    /// Halted is declared as the initial state.
    pub fn program_state_machine_type(builder: AddressSpaceBuilder) -> AddressSpaceBuilder {
        let program = types::PROGRAM_STATE_MACHINE_TYPE;
        let mut builder = builder;

        for state in ProgramState::ALL {
            let state_type = if state == ProgramState::Halted {
                types::INITIAL_STATE_TYPE
            } else {
                types::STATE_TYPE
            };
            let id = state.node_id();
            let number_id = NodeId::numeric(0, id.as_numeric().unwrap_or_default() + 1);
            builder = builder
                .object(id.clone(), state.name(), state_type)
                .component(&program, &id)
                .property(&id, number_id, "StateNumber", state.number());
        }

        for method in ProgramMethod::ALL {
            builder = builder
                .method(method.type_node_id(), method.name(), true)
                .component(&program, &method.type_node_id());
        }

        for (name, id, from, to, cause, number) in PROGRAM_TRANSITIONS {
            let transition = NodeId::numeric(0, id);
            builder = builder
                .object(transition.clone(), name, types::TRANSITION_TYPE)
                .component(&program, &transition)
                .reference(&transition, reference_types::FROM_STATE, &from.node_id())
                .reference(&transition, reference_types::TO_STATE, &to.node_id())
                .property(&transition, NodeId::numeric(0, id + 1), "TransitionNumber", number);
            if let Some(cause) = cause {
                builder = builder.reference(
                    &transition,
                    reference_types::HAS_CAUSE,
                    &cause.type_node_id(),
                );
            }
        }

        builder
    }

    /// A FiniteStateMachineType subtype whose transition targets a node
    /// outside the state set.
    pub fn dangling_transition_type() -> (MockTransport, NodeId) {
        let machine = NodeId::numeric(3, 1000);
        let idle = NodeId::numeric(3, 1001);
        let busy = NodeId::numeric(3, 1002);
        let stray = NodeId::numeric(3, 1003);
        let transition = NodeId::numeric(3, 1004);

        let transport = AddressSpaceBuilder::with_standard_types()
            .object_type(machine.clone(), "3:DanglingMachineType", Some(types::FINITE_STATE_MACHINE_TYPE))
            .object(idle.clone(), "3:Idle", types::INITIAL_STATE_TYPE)
            .component(&machine, &idle)
            .object(busy.clone(), "3:Busy", types::STATE_TYPE)
            .component(&machine, &busy)
            // Targets a plain object, not a declared state.
            .untyped_object(stray.clone(), "3:Stray")
            .object(transition.clone(), "3:IdleToStray", types::TRANSITION_TYPE)
            .component(&machine, &transition)
            .reference(&transition, reference_types::FROM_STATE, &idle)
            .reference(&transition, reference_types::TO_STATE, &stray)
            .into_transport();
        (transport, machine)
    }

    /// A FiniteStateMachineType subtype whose transition has no ToState.
    pub fn missing_endpoint_type() -> (MockTransport, NodeId) {
        let machine = NodeId::numeric(3, 2000);
        let idle = NodeId::numeric(3, 2001);
        let transition = NodeId::numeric(3, 2002);

        let transport = AddressSpaceBuilder::with_standard_types()
            .object_type(machine.clone(), "3:HalfMachineType", Some(types::FINITE_STATE_MACHINE_TYPE))
            .object(idle.clone(), "3:Idle", types::INITIAL_STATE_TYPE)
            .component(&machine, &idle)
            .object(transition.clone(), "3:IdleToNowhere", types::TRANSITION_TYPE)
            .component(&machine, &transition)
            .reference(&transition, reference_types::FROM_STATE, &idle)
            .into_transport();
        (transport, machine)
    }

    /// A FiniteStateMachineType subtype declaring two initial states.
    pub fn double_initial_type() -> (MockTransport, NodeId) {
        let machine = NodeId::numeric(3, 3000);
        let first = NodeId::numeric(3, 3001);
        let second = NodeId::numeric(3, 3002);

        let transport = AddressSpaceBuilder::with_standard_types()
            .object_type(machine.clone(), "3:TwoHeadedMachineType", Some(types::FINITE_STATE_MACHINE_TYPE))
            .object(first.clone(), "3:First", types::INITIAL_STATE_TYPE)
            .component(&machine, &first)
            .object(second.clone(), "3:Second", types::INITIAL_STATE_TYPE)
            .component(&machine, &second)
            .into_transport();
        (transport, machine)
    }

    /// A FiniteStateMachineType subtype whose transition targets an
    /// undeclared object sharing a state's browse name.
    pub fn foreign_endpoint_type() -> (MockTransport, NodeId) {
        let machine = NodeId::numeric(3, 5000);
        let idle = NodeId::numeric(3, 5001);
        let busy = NodeId::numeric(3, 5002);
        let impostor = NodeId::numeric(3, 5003);
        let transition = NodeId::numeric(3, 5004);

        let transport = AddressSpaceBuilder::with_standard_types()
            .object_type(machine.clone(), "3:LookalikeMachineType", Some(types::FINITE_STATE_MACHINE_TYPE))
            .object(idle.clone(), "3:Idle", types::INITIAL_STATE_TYPE)
            .component(&machine, &idle)
            .object(busy.clone(), "3:Busy", types::STATE_TYPE)
            .component(&machine, &busy)
            .untyped_object(impostor.clone(), "3:Busy")
            .object(transition.clone(), "3:IdleToBusy", types::TRANSITION_TYPE)
            .component(&machine, &transition)
            .reference(&transition, reference_types::FROM_STATE, &idle)
            .reference(&transition, reference_types::TO_STATE, &impostor)
            .into_transport();
        (transport, machine)
    }

    /// A subtype of ProgramStateMachineType that redeclares Ready with a
    /// different StateNumber.
    pub fn overriding_subtype() -> (MockTransport, NodeId) {
        let machine = NodeId::numeric(3, 4000);
        let ready = NodeId::numeric(3, 4001);

        let transport = Self::program_state_machine_type(AddressSpaceBuilder::with_standard_types())
            .object_type(machine.clone(), "3:BatchProgramType", Some(types::PROGRAM_STATE_MACHINE_TYPE))
            .object(ready.clone(), "Ready", types::STATE_TYPE)
            .component(&machine, &ready)
            .property(&ready, NodeId::numeric(3, 4002), "StateNumber", 42u32)
            .into_transport();
        (transport, machine)
    }
}

// =============================================================================
// Boiler
// =============================================================================

/// A boiler with a temperature sensor and a program state machine driving
/// its simulation.
///
/// ```text
/// Objects
/// └── Boiler#1 : BoilerType
///     ├── Temperature = 21.5
///     └── Simulation : ProgramStateMachineType
///         ├── CurrentState = "Ready"
///         │   └── Id
///         └── Start, Suspend, Resume, Halt, Reset
/// ```
///
/// The simulation boots in Ready. Calls move it along
/// [`ProgramState::after`] and update every method's Executable attribute
/// from [`ProgramState::executable`]. A call the current state does not
/// accept returns BadNotExecutable.
pub struct BoilerFixture {
    /// Transport serving the boiler.
    pub transport: Arc<MockTransport>,
    simulation: Arc<ProgramSimulation>,
}

impl BoilerFixture {
    /// Namespace of the boiler nodes.
    pub const NAMESPACE: u16 = 1;

    /// Creates the boiler with transitions applied immediately.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates the boiler with every transition applied `delay` after the
    /// call that caused it returned.
    pub fn with_transition_delay(delay: Duration) -> Self {
        Self::build(Some(delay))
    }

    fn build(delay: Option<Duration>) -> Self {
        let boiler = Self::boiler_id();
        let temperature = Self::temperature_id();
        let simulation = Self::simulation_id();
        let current_state = Self::current_state_id();

        let mut builder = StateMachineFixtures::program_state_machine_type(
            AddressSpaceBuilder::with_standard_types(),
        )
        .object_type(Self::boiler_type_id(), "1:BoilerType", Some(types::BASE_OBJECT_TYPE))
        .object(boiler.clone(), "1:Boiler#1", Self::boiler_type_id())
        .organizes(&ua_proxy::ids::objects::OBJECTS_FOLDER, &boiler)
        .variable(temperature.clone(), "1:Temperature", types::BASE_DATA_VARIABLE_TYPE, 21.5)
        .component(&boiler, &temperature)
        .object(simulation.clone(), "1:Simulation", types::PROGRAM_STATE_MACHINE_TYPE)
        .component(&boiler, &simulation)
        .variable(
            current_state.clone(),
            "CurrentState",
            types::FINITE_STATE_VARIABLE_TYPE,
            LocalizedText::new(ProgramState::Ready.name()).with_locale("en"),
        )
        .component(&simulation, &current_state)
        .property(
            &current_state,
            Self::current_state_number_id(),
            "Id",
            ProgramState::Ready.node_id(),
        );

        for method in ProgramMethod::ALL {
            builder = builder
                .method(
                    Self::method_id(method),
                    method.name(),
                    ProgramState::Ready.executable().contains(&method),
                )
                .component(&simulation, &Self::method_id(method));
        }

        let transport = Arc::new(builder.into_transport());
        let simulation = Arc::new(ProgramSimulation {
            state: Mutex::new(ProgramState::Ready),
            delay,
        });
        for method in ProgramMethod::ALL {
            let simulation = simulation.clone();
            transport.set_handler(
                Self::method_id(method),
                move |space: &SharedAddressSpace, _request: &CallRequest| {
                    simulation.handle(space, method)
                },
            );
        }

        Self {
            transport,
            simulation,
        }
    }

    /// BoilerType node.
    pub fn boiler_type_id() -> NodeId {
        NodeId::numeric(Self::NAMESPACE, 1000)
    }

    /// The boiler object.
    pub fn boiler_id() -> NodeId {
        NodeId::string(Self::NAMESPACE, "Boiler#1")
    }

    /// The temperature variable.
    pub fn temperature_id() -> NodeId {
        NodeId::string(Self::NAMESPACE, "Boiler#1.Temperature")
    }

    /// The simulation state machine object.
    pub fn simulation_id() -> NodeId {
        NodeId::string(Self::NAMESPACE, "Boiler#1.Simulation")
    }

    /// The CurrentState variable.
    pub fn current_state_id() -> NodeId {
        NodeId::string(Self::NAMESPACE, "Boiler#1.Simulation.CurrentState")
    }

    /// The Id property of CurrentState.
    pub fn current_state_number_id() -> NodeId {
        NodeId::string(Self::NAMESPACE, "Boiler#1.Simulation.CurrentState.Id")
    }

    /// A method of the simulation.
    pub fn method_id(method: ProgramMethod) -> NodeId {
        NodeId::string(
            Self::NAMESPACE,
            format!("Boiler#1.Simulation.{}", method.name()),
        )
    }

    /// The state the server is in.
    pub fn state(&self) -> ProgramState {
        *self.simulation.state.lock()
    }

    /// Forces the server into `state` without a call.
    pub fn set_state(&self, state: ProgramState) {
        self.simulation.apply(self.transport.space(), state);
    }

    /// Changes the temperature on the server.
    pub fn set_temperature(&self, value: f64) {
        self.transport
            .space()
            .write()
            .set_value(&Self::temperature_id(), value);
    }
}

impl Default for BoilerFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Server side of the boiler simulation.
struct ProgramSimulation {
    state: Mutex<ProgramState>,
    delay: Option<Duration>,
}

impl ProgramSimulation {
    fn handle(self: &Arc<Self>, space: &SharedAddressSpace, method: ProgramMethod) -> CallResponse {
        let current = *self.state.lock();
        let Some(next) = current.after(method) else {
            return CallResponse::good(Vec::new());
        };

        match self.delay {
            None => self.apply(space, next),
            Some(delay) => {
                let this = self.clone();
                let space = space.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    this.apply(&space, next);
                });
            }
        }
        CallResponse::good(Vec::new())
    }

    fn apply(&self, space: &SharedAddressSpace, state: ProgramState) {
        *self.state.lock() = state;

        let mut space = space.write();
        space.set_value(
            &BoilerFixture::current_state_id(),
            LocalizedText::new(state.name()).with_locale("en"),
        );
        space.set_value(&BoilerFixture::current_state_number_id(), state.node_id());
        for method in ProgramMethod::ALL {
            space.set_executable(
                &BoilerFixture::method_id(method),
                state.executable().contains(&method),
            );
        }
    }
}

// =============================================================================
// Graph Fixtures
// =============================================================================

/// Fixture providing pathological and edge-case instance graphs.
pub struct GraphFixtures;

impl GraphFixtures {
    /// Namespace of the graph fixtures.
    pub const NAMESPACE: u16 = 2;

    /// `Loop` HasComponent `Inner` HasComponent `Loop`.
    pub fn cyclic() -> (MockTransport, NodeId) {
        let root = NodeId::string(Self::NAMESPACE, "Loop");
        let inner = NodeId::string(Self::NAMESPACE, "Loop.Inner");
        let transport = AddressSpaceBuilder::with_standard_types()
            .object(root.clone(), "2:Loop", types::BASE_OBJECT_TYPE)
            .object(inner.clone(), "2:Inner", types::BASE_OBJECT_TYPE)
            .component(&root, &inner)
            .organizes(&inner, &root)
            .into_transport();
        (transport, root)
    }

    /// A chain of nested objects: `Level0` is the root and `Level{depth}`
    /// the deepest node.
    pub fn deep_chain(depth: usize) -> (MockTransport, NodeId) {
        let id = |level: usize| NodeId::string(Self::NAMESPACE, format!("Level{}", level));
        let mut builder = AddressSpaceBuilder::with_standard_types().object(
            id(0),
            "2:Level0",
            types::BASE_OBJECT_TYPE,
        );
        for level in 1..=depth {
            builder = builder
                .object(id(level), format!("2:Level{}", level), types::BASE_OBJECT_TYPE)
                .component(&id(level - 1), &id(level));
        }
        (builder.into_transport(), id(0))
    }

    /// ObjectTypes `3:Ping` and `3:Pong`, each the other's supertype.
    pub fn cyclic_types() -> (MockTransport, NodeId) {
        let ping = NodeId::numeric(3, 6000);
        let pong = NodeId::numeric(3, 6001);
        let transport = AddressSpaceBuilder::with_standard_types()
            .object_type(ping.clone(), "3:Ping", None)
            .object_type(pong.clone(), "3:Pong", None)
            .reference(&pong, reference_types::HAS_SUBTYPE, &ping)
            .reference(&ping, reference_types::HAS_SUBTYPE, &pong)
            .into_transport();
        (transport, ping)
    }

    /// A line of ObjectTypes below BaseObjectType. The returned type is
    /// `hops` HasSubtype references away from BaseObjectType.
    pub fn type_chain(hops: u32) -> (MockTransport, NodeId) {
        let id = |level: u32| NodeId::numeric(3, 7000 + level);
        let mut builder = AddressSpaceBuilder::with_standard_types();
        let mut supertype = types::BASE_OBJECT_TYPE;
        for level in 1..=hops {
            builder = builder.object_type(id(level), format!("3:Tier{}", level), Some(supertype));
            supertype = id(level);
        }
        (builder.into_transport(), supertype)
    }

    /// A diamond: two parents share one child. Not a cycle.
    pub fn diamond() -> (MockTransport, NodeId) {
        let root = NodeId::string(Self::NAMESPACE, "Diamond");
        let left = NodeId::string(Self::NAMESPACE, "Diamond.Left");
        let right = NodeId::string(Self::NAMESPACE, "Diamond.Right");
        let shared = NodeId::string(Self::NAMESPACE, "Diamond.Shared");
        let transport = AddressSpaceBuilder::with_standard_types()
            .object(root.clone(), "2:Diamond", types::BASE_OBJECT_TYPE)
            .object(left.clone(), "2:Left", types::BASE_OBJECT_TYPE)
            .object(right.clone(), "2:Right", types::BASE_OBJECT_TYPE)
            .variable(shared.clone(), "2:Shared", types::BASE_DATA_VARIABLE_TYPE, 1)
            .component(&root, &left)
            .component(&root, &right)
            .component(&left, &shared)
            .component(&right, &shared)
            .into_transport();
        (transport, root)
    }

    /// An object with methods `Start` and `start`, which collide on key.
    pub fn duplicate_method_keys() -> (MockTransport, NodeId) {
        let root = NodeId::string(Self::NAMESPACE, "Twins");
        let upper = NodeId::string(Self::NAMESPACE, "Twins.Start");
        let lower = NodeId::string(Self::NAMESPACE, "Twins.start");
        let transport = AddressSpaceBuilder::with_standard_types()
            .object(root.clone(), "2:Twins", types::BASE_OBJECT_TYPE)
            .method(upper.clone(), "2:Start", true)
            .method(lower.clone(), "2:start", true)
            .component(&root, &upper)
            .component(&root, &lower)
            .into_transport();
        (transport, root)
    }

    /// An object with a Variable `start` and a Method `Start`. Distinct
    /// browse names, so both are valid siblings.
    pub fn variable_and_method_named_alike() -> (MockTransport, NodeId) {
        let root = NodeId::string(Self::NAMESPACE, "Pump");
        let flag = NodeId::string(Self::NAMESPACE, "Pump.start");
        let method = NodeId::string(Self::NAMESPACE, "Pump.Start");
        let transport = AddressSpaceBuilder::with_standard_types()
            .object(root.clone(), "2:Pump", types::BASE_OBJECT_TYPE)
            .variable(flag.clone(), "2:start", types::BASE_DATA_VARIABLE_TYPE, false)
            .method(method.clone(), "2:Start", true)
            .component(&root, &flag)
            .component(&root, &method)
            .into_transport();
        (transport, root)
    }

    /// `Vault` with a denied `Secret` child object.
    pub fn access_denied() -> (MockTransport, NodeId, NodeId) {
        let root = NodeId::string(Self::NAMESPACE, "Vault");
        let secret = NodeId::string(Self::NAMESPACE, "Vault.Secret");
        let transport = AddressSpaceBuilder::with_standard_types()
            .object(root.clone(), "2:Vault", types::BASE_OBJECT_TYPE)
            .object(secret.clone(), "2:Secret", types::BASE_OBJECT_TYPE)
            .component(&root, &secret)
            .deny(&secret)
            .into_transport();
        (transport, root, secret)
    }

    /// A variable exposing a method, so the call must target the parent
    /// object.
    pub fn method_under_variable() -> (MockTransport, NodeId, NodeId) {
        let root = NodeId::string(Self::NAMESPACE, "Valve");
        let position = NodeId::string(Self::NAMESPACE, "Valve.Position");
        let calibrate = NodeId::string(Self::NAMESPACE, "Valve.Position.Calibrate");
        let transport = AddressSpaceBuilder::with_standard_types()
            .object(root.clone(), "2:Valve", types::BASE_OBJECT_TYPE)
            .variable(position.clone(), "2:Position", types::BASE_DATA_VARIABLE_TYPE, 0.0)
            .method(calibrate.clone(), "2:Calibrate", true)
            .component(&root, &position)
            .component(&position, &calibrate)
            .into_transport();
        (transport, root, calibrate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ua_proxy::client::UaValue;

    #[test]
    fn test_program_transitions_respect_executability() {
        for state in ProgramState::ALL {
            for method in ProgramMethod::ALL {
                if state.after(method).is_some() {
                    assert!(
                        state.executable().contains(&method),
                        "{} must be executable in {}",
                        method.name(),
                        state.name()
                    );
                }
            }
        }
    }

    #[tokio::test]
    async fn test_boiler_simulation_moves_state() {
        let boiler = BoilerFixture::new();
        let space = boiler.transport.space().clone();
        boiler.simulation.handle(&space, ProgramMethod::Start);

        assert_eq!(boiler.state(), ProgramState::Running);
        let space = space.read();
        assert_eq!(
            space.value(&BoilerFixture::current_state_id()),
            Some(UaValue::LocalizedText(LocalizedText::new("Running").with_locale("en")))
        );
        assert_eq!(
            space.executable(&BoilerFixture::method_id(ProgramMethod::Suspend)),
            Some(true)
        );
        assert_eq!(
            space.executable(&BoilerFixture::method_id(ProgramMethod::Start)),
            Some(false)
        );
    }
}
