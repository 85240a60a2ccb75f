//! # Fake Controller
//!
//! An in-memory [`Connector`] for testing the dispatcher, the poller and the
//! station without a network.
//!
//! Each line is scripted through [`FakeController::line`], which returns a
//! small builder, and every transport call is recorded so tests can assert on
//! call order, written values and the number of connects/disconnects.
//!
//! # Example
//! ```
//! use pilot_link::catalog::SymbolicTag;
//! use pilot_link::model::LineId;
//! use pilot_link::session::mock::FakeController;
//!
//! let fake = FakeController::new();
//! fake.line(LineId::Lgn01).state(1);
//! fake.line(LineId::Lgn02).refuse_connect();
//! fake.line(LineId::Lgn03).fail_write(SymbolicTag::OrderQuantity);
//! ```
//!
//! Lines are matched by endpoint address, using the registry the fake was
//! built with ([`FakeController::new`] uses the plant defaults).

use super::transport::{Connection, Connector, TransportError};
use crate::catalog::{NodeAddress, SymbolicTag, TagCatalog};
use crate::config::StationConfig;
use crate::model::{LineId, WireValue};
use crate::registry::{EndpointAddress, EndpointRegistry};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeEvent {
    Connect(EndpointAddress),
    Write(EndpointAddress, NodeAddress, WireValue),
    Read(EndpointAddress, NodeAddress),
    Disconnect(EndpointAddress),
}

#[derive(Default)]
struct FakeState {
    refused: HashSet<EndpointAddress>,
    failing_writes: HashSet<(EndpointAddress, NodeAddress)>,
    failing_reads: HashSet<(EndpointAddress, NodeAddress)>,
    latency: HashMap<EndpointAddress, Duration>,
    connect_latency: HashMap<EndpointAddress, Duration>,
    values: HashMap<(EndpointAddress, NodeAddress), WireValue>,
    events: Vec<FakeEvent>,
    open_sessions: HashMap<EndpointAddress, usize>,
    peak_sessions: HashMap<EndpointAddress, usize>,
}

/// Scriptable stand-in for a fleet of line controllers.
///
/// Clones share the same state, so a test keeps one handle for assertions
/// and hands another to the [`SessionFactory`](super::SessionFactory).
#[derive(Clone)]
pub struct FakeController {
    registry: Arc<EndpointRegistry>,
    catalog: Arc<TagCatalog>,
    state: Arc<Mutex<FakeState>>,
}

impl FakeController {
    /// A fake answering on the default endpoints with the standard catalog.
    pub fn new() -> Self {
        Self::with_config(&StationConfig::default())
    }

    /// A fake matching the endpoints and tag addresses of `config`.
    pub fn with_config(config: &StationConfig) -> Self {
        Self {
            registry: Arc::new(config.registry.clone()),
            catalog: Arc::new(config.catalog.clone()),
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    /// Scripts the behaviour of one line.
    pub fn line(&self, line: LineId) -> LineScript<'_> {
        LineScript {
            fake: self,
            endpoint: self.endpoint(line),
        }
    }

    /// Every transport call so far, in order.
    pub fn events(&self) -> Vec<FakeEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Successful writes on `line`, in order, as (tag, value).
    pub fn writes(&self, line: LineId) -> Vec<(SymbolicTag, WireValue)> {
        let endpoint = self.endpoint(line);
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FakeEvent::Write(e, node, value) if e == endpoint => {
                    self.tag_of(&node).map(|tag| (tag, value))
                }
                _ => None,
            })
            .collect()
    }

    pub fn connects(&self, line: LineId) -> usize {
        let endpoint = self.endpoint(line);
        self.count(|event| matches!(event, FakeEvent::Connect(e) if *e == endpoint))
    }

    pub fn disconnects(&self, line: LineId) -> usize {
        let endpoint = self.endpoint(line);
        self.count(|event| matches!(event, FakeEvent::Disconnect(e) if *e == endpoint))
    }

    /// Highest number of sessions that were open on `line` at the same time.
    pub fn peak_sessions(&self, line: LineId) -> usize {
        let endpoint = self.endpoint(line);
        self.state
            .lock()
            .unwrap()
            .peak_sessions
            .get(&endpoint)
            .copied()
            .unwrap_or(0)
    }

    /// Current value of `tag` on `line`, if it was ever set or written.
    pub fn value(&self, line: LineId, tag: SymbolicTag) -> Option<WireValue> {
        let key = (self.endpoint(line), self.node(tag));
        self.state.lock().unwrap().values.get(&key).cloned()
    }

    fn count(&self, predicate: impl Fn(&FakeEvent) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|event| predicate(event))
            .count()
    }

    fn endpoint(&self, line: LineId) -> EndpointAddress {
        self.registry
            .resolve(line)
            .cloned()
            .unwrap_or_else(|_| panic!("fake controller has no endpoint for {line}"))
    }

    fn node(&self, tag: SymbolicTag) -> NodeAddress {
        self.catalog
            .resolve(tag)
            .cloned()
            .unwrap_or_else(|_| panic!("fake controller has no address for {tag}"))
    }

    fn tag_of(&self, node: &NodeAddress) -> Option<SymbolicTag> {
        SymbolicTag::ALL
            .into_iter()
            .find(|tag| self.catalog.resolve(*tag).ok() == Some(node))
    }
}

impl Default for FakeController {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder returned by [`FakeController::line`].
pub struct LineScript<'a> {
    fake: &'a FakeController,
    endpoint: EndpointAddress,
}

impl LineScript<'_> {
    /// Connection attempts to this line fail as unreachable.
    pub fn refuse_connect(self) -> Self {
        self.fake.state.lock().unwrap().refused.insert(self.endpoint.clone());
        self
    }

    /// Writes to `tag` on this line are rejected by the controller.
    pub fn fail_write(self, tag: SymbolicTag) -> Self {
        let key = (self.endpoint.clone(), self.fake.node(tag));
        self.fake.state.lock().unwrap().failing_writes.insert(key);
        self
    }

    /// Reads of `tag` on this line fail.
    pub fn fail_read(self, tag: SymbolicTag) -> Self {
        let key = (self.endpoint.clone(), self.fake.node(tag));
        self.fake.state.lock().unwrap().failing_reads.insert(key);
        self
    }

    /// Every read and write on this line takes `delay`.
    pub fn latency(self, delay: Duration) -> Self {
        self.fake
            .state
            .lock()
            .unwrap()
            .latency
            .insert(self.endpoint.clone(), delay);
        self
    }

    /// Connection attempts to this line take `delay` before answering.
    pub fn connect_latency(self, delay: Duration) -> Self {
        self.fake
            .state
            .lock()
            .unwrap()
            .connect_latency
            .insert(self.endpoint.clone(), delay);
        self
    }

    /// Presets the value of `tag`.
    pub fn value(self, tag: SymbolicTag, value: WireValue) -> Self {
        let key = (self.endpoint.clone(), self.fake.node(tag));
        self.fake.state.lock().unwrap().values.insert(key, value);
        self
    }

    /// Presets the raw machine-state code.
    pub fn state(self, code: i32) -> Self {
        self.value(SymbolicTag::MachineState, WireValue::Int32(code))
    }
}

#[async_trait]
impl Connector for FakeController {
    async fn connect(&self, endpoint: &EndpointAddress) -> Result<Box<dyn Connection>, TransportError> {
        let delay = self.state.lock().unwrap().connect_latency.get(endpoint).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.events.push(FakeEvent::Connect(endpoint.clone()));
        if state.refused.contains(endpoint) {
            return Err(TransportError::Unreachable(endpoint.to_string()));
        }

        let open = state.open_sessions.entry(endpoint.clone()).or_default();
        *open += 1;
        let open = *open;
        let peak = state.peak_sessions.entry(endpoint.clone()).or_default();
        *peak = (*peak).max(open);

        Ok(Box::new(FakeConnection {
            endpoint: endpoint.clone(),
            state: self.state.clone(),
            open: true,
        }))
    }
}

struct FakeConnection {
    endpoint: EndpointAddress,
    state: Arc<Mutex<FakeState>>,
    open: bool,
}

impl FakeConnection {
    async fn delay(&self) {
        let latency = self.state.lock().unwrap().latency.get(&self.endpoint).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn write(&mut self, node: &NodeAddress, value: &WireValue) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        self.delay().await;
        let mut state = self.state.lock().unwrap();
        let key = (self.endpoint.clone(), node.clone());
        if state.failing_writes.contains(&key) {
            return Err(TransportError::Rejected(format!("write to {node} refused")));
        }
        state
            .events
            .push(FakeEvent::Write(self.endpoint.clone(), node.clone(), value.clone()));
        state.values.insert(key, value.clone());
        Ok(())
    }

    async fn read(&mut self, node: &NodeAddress) -> Result<WireValue, TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        self.delay().await;
        let mut state = self.state.lock().unwrap();
        state.events.push(FakeEvent::Read(self.endpoint.clone(), node.clone()));
        let key = (self.endpoint.clone(), node.clone());
        if state.failing_reads.contains(&key) {
            return Err(TransportError::Rejected(format!("read of {node} refused")));
        }
        state
            .values
            .get(&key)
            .cloned()
            .ok_or_else(|| TransportError::BadNode(node.to_string()))
    }

    async fn disconnect(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let mut state = self.state.lock().unwrap();
        state.events.push(FakeEvent::Disconnect(self.endpoint.clone()));
        if let Some(open) = state.open_sessions.get_mut(&self.endpoint) {
            *open = open.saturating_sub(1);
        }
    }
}
