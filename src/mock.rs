//! Test doubles for the collaborators the driver is generic over.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Once};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use embedded_hal_async::digital::Wait;

use crate::{
  Completion, Config, ConnectionId, HidInputReport, HubPath, IdleCoordinator, InputMode, OpenError, ReadRequest,
  RequestError, RequestQueue, ResourceDescriptor, ResourceHub, RmiTouch, TouchEngine, TouchError,
  HID_INPUT_REPORT_SIZE,
};

pub const BUS_ID: ConnectionId = ConnectionId::new(0x0001_0000, 0);
pub const GPIO_ID: ConnectionId = ConnectionId::new(0x0002_0000, 0);

pub fn bus_only() -> [ResourceDescriptor; 1] {
  [ResourceDescriptor::i2c(BUS_ID)]
}

pub fn bus_and_gpio() -> [ResourceDescriptor; 2] {
  [ResourceDescriptor::gpio_io(GPIO_ID), ResourceDescriptor::i2c(BUS_ID)]
}

/// A report whose bytes are all `tag`.
pub fn report(tag: u8) -> HidInputReport {
  HidInputReport::from_bytes([tag; HID_INPUT_REPORT_SIZE])
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|e| e.into_inner())
}

// Hub, bus and GPIO

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
  Low,
  High,
}

#[derive(Default)]
struct HubState {
  open_buses: usize,
  open_gpios: usize,
  last_path: Option<String>,
  order: Vec<&'static str>,
  bus_failure: Option<OpenError>,
  gpio_failure: Option<OpenError>,
  pin_level: bool,
  pin_events: Vec<PinEvent>,
  pin_io_fails: bool,
}

#[derive(Clone, Default)]
pub struct MockHub(Arc<Mutex<HubState>>);

impl MockHub {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail_bus(&mut self, e: OpenError) {
    lock(&self.0).bus_failure = Some(e);
  }

  pub fn fail_gpio(&mut self, e: OpenError) {
    lock(&self.0).gpio_failure = Some(e);
  }

  pub fn fail_pin_io(&mut self, fail: bool) {
    lock(&self.0).pin_io_fails = fail;
  }

  pub fn open_buses(&self) -> usize {
    lock(&self.0).open_buses
  }

  pub fn open_gpios(&self) -> usize {
    lock(&self.0).open_gpios
  }

  pub fn last_path(&self) -> Option<String> {
    lock(&self.0).last_path.clone()
  }

  pub fn open_order(&self) -> Vec<&'static str> {
    lock(&self.0).order.clone()
  }

  pub fn pin_events(&self) -> Vec<PinEvent> {
    lock(&self.0).pin_events.clone()
  }
}

impl ResourceHub for MockHub {
  type Bus = MockBus;
  type Gpio = MockPin;

  fn open_bus(&mut self, path: &HubPath) -> Result<MockBus, OpenError> {
    let mut s = lock(&self.0);
    s.last_path = Some(path.as_str().to_string());
    if let Some(e) = s.bus_failure {
      return Err(e);
    }
    s.open_buses += 1;
    s.order.push("bus");
    Ok(MockBus(self.clone()))
  }

  fn open_gpio(&mut self, path: &HubPath) -> Result<MockPin, OpenError> {
    let mut s = lock(&self.0);
    s.last_path = Some(path.as_str().to_string());
    if let Some(e) = s.gpio_failure {
      return Err(e);
    }
    s.open_gpios += 1;
    s.order.push("gpio");
    Ok(MockPin(self.clone()))
  }
}

pub struct MockBus(MockHub);

impl Drop for MockBus {
  fn drop(&mut self) {
    lock(&self.0 .0).open_buses -= 1;
  }
}

pub struct MockPin(MockHub);

impl MockPin {
  fn drive(&mut self, high: bool) -> Result<(), MockPinError> {
    let mut s = lock(&self.0 .0);
    if s.pin_io_fails {
      return Err(MockPinError);
    }
    s.pin_level = high;
    s.pin_events.push(if high { PinEvent::High } else { PinEvent::Low });
    Ok(())
  }
}

impl Drop for MockPin {
  fn drop(&mut self) {
    lock(&self.0 .0).open_gpios -= 1;
  }
}

#[derive(Debug)]
pub struct MockPinError;

impl digital::Error for MockPinError {
  fn kind(&self) -> ErrorKind {
    ErrorKind::Other
  }
}

impl ErrorType for MockPin {
  type Error = MockPinError;
}

impl InputPin for MockPin {
  fn is_high(&mut self) -> Result<bool, MockPinError> {
    let s = lock(&self.0 .0);
    if s.pin_io_fails {
      return Err(MockPinError);
    }
    Ok(s.pin_level)
  }

  fn is_low(&mut self) -> Result<bool, MockPinError> {
    self.is_high().map(|high| !high)
  }
}

impl OutputPin for MockPin {
  fn set_low(&mut self) -> Result<(), MockPinError> {
    self.drive(false)
  }

  fn set_high(&mut self) -> Result<(), MockPinError> {
    self.drive(true)
  }
}

/// Attention line that is already at whatever level is awaited.
#[derive(Clone, Default)]
pub struct MockIrq {
  waits: Arc<Mutex<Vec<bool>>>,
  fail: bool,
}

impl MockIrq {
  pub fn failing() -> Self {
    Self { fail: true, ..Self::default() }
  }

  /// Levels waited for, `true` for high.
  pub fn waits(&self) -> Vec<bool> {
    lock(&self.waits).clone()
  }

  fn wait(&mut self, high: bool) -> Result<(), MockPinError> {
    if self.fail {
      return Err(MockPinError);
    }
    lock(&self.waits).push(high);
    Ok(())
  }
}

impl ErrorType for MockIrq {
  type Error = MockPinError;
}

impl Wait for MockIrq {
  async fn wait_for_high(&mut self) -> Result<(), MockPinError> {
    self.wait(true)
  }

  async fn wait_for_low(&mut self) -> Result<(), MockPinError> {
    self.wait(false)
  }

  async fn wait_for_rising_edge(&mut self) -> Result<(), MockPinError> {
    self.wait(true)
  }

  async fn wait_for_falling_edge(&mut self) -> Result<(), MockPinError> {
    self.wait(false)
  }

  async fn wait_for_any_edge(&mut self) -> Result<(), MockPinError> {
    self.wait(true)
  }
}

#[derive(Clone, Default)]
pub struct MockDelay(Arc<Mutex<Vec<u32>>>);

impl MockDelay {
  pub fn waits_us(&self) -> Vec<u32> {
    lock(&self.0).clone()
  }
}

impl DelayNs for MockDelay {
  fn delay_ns(&mut self, ns: u32) {
    lock(&self.0).push(ns / 1_000);
  }

  fn delay_us(&mut self, us: u32) {
    lock(&self.0).push(us);
  }
}

// Touch engine

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
  Allocate,
  Start,
  Wake,
  Standby,
  Stop,
  Free,
  Service,
}

#[derive(Default)]
struct EngineState {
  calls: Vec<Call>,
  failures: Vec<(Call, TouchError)>,
  scripted: Vec<HidInputReport>,
  live: usize,
  rescan: Vec<bool>,
  modes: Vec<InputMode>,
}

impl EngineState {
  fn record(&mut self, call: Call) -> Result<(), TouchError> {
    self.calls.push(call);
    match self.failures.iter().find(|(c, _)| *c == call) {
      Some((_, e)) => Err(*e),
      None => Ok(()),
    }
  }
}

#[derive(Clone, Default)]
pub struct MockEngine(Arc<Mutex<EngineState>>);

pub struct MockContext {
  reports: Vec<HidInputReport>,
}

impl MockEngine {
  pub fn fail(&mut self, call: Call, e: TouchError) {
    lock(&self.0).failures.push((call, e));
  }

  pub fn clear_failures(&mut self) {
    lock(&self.0).failures.clear();
  }

  /// Reports returned by the next service pass.
  pub fn script_reports(&mut self, reports: &[HidInputReport]) {
    lock(&self.0).scripted = reports.to_vec();
  }

  pub fn calls(&self) -> Vec<Call> {
    lock(&self.0).calls.clone()
  }

  pub fn live_contexts(&self) -> usize {
    lock(&self.0).live
  }

  pub fn rescan_hints(&self) -> Vec<bool> {
    lock(&self.0).rescan.clone()
  }

  pub fn modes(&self) -> Vec<InputMode> {
    lock(&self.0).modes.clone()
  }
}

impl TouchEngine<MockBus> for MockEngine {
  type Context = MockContext;

  fn allocate_context(&mut self) -> Result<MockContext, TouchError> {
    let mut s = lock(&self.0);
    s.record(Call::Allocate)?;
    s.live += 1;
    Ok(MockContext { reports: Vec::new() })
  }

  fn start(&mut self, _: &mut MockContext, _: &mut MockBus) -> Result<(), TouchError> {
    lock(&self.0).record(Call::Start)
  }

  fn wake(&mut self, _: &mut MockContext, _: &mut MockBus) -> Result<(), TouchError> {
    lock(&self.0).record(Call::Wake)
  }

  fn standby(&mut self, _: &mut MockContext, _: &mut MockBus) -> Result<(), TouchError> {
    lock(&self.0).record(Call::Standby)
  }

  fn stop(&mut self, _: &mut MockContext, _: &mut MockBus) -> Result<(), TouchError> {
    lock(&self.0).record(Call::Stop)
  }

  fn free_context(&mut self, _: MockContext) {
    let mut s = lock(&self.0);
    s.calls.push(Call::Free);
    s.live -= 1;
  }

  fn service_interrupts<'a>(
    &'a mut self,
    ctx: &'a mut MockContext,
    _: &mut MockBus,
    mode: InputMode,
    full_rescan: bool,
  ) -> Result<&'a [HidInputReport], TouchError> {
    let mut s = lock(&self.0);
    s.rescan.push(full_rescan);
    s.modes.push(mode);
    s.record(Call::Service)?;
    ctx.reports = core::mem::take(&mut s.scripted);
    Ok(&ctx.reports)
  }
}

// Host request queue

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
  pub request: usize,
  pub completion: Completion,
  pub buffer: Vec<u8>,
}

#[derive(Default)]
struct QueueState {
  pending: VecDeque<(usize, Option<Vec<u8>>)>,
  next_id: usize,
  completions: Vec<Completed>,
}

#[derive(Clone, Default)]
pub struct MockQueue(Arc<Mutex<QueueState>>);

impl MockQueue {
  /// Queue one request per entry, each with an output buffer of that size.
  pub fn with_requests(sizes: &[usize]) -> Self {
    let mut queue = Self::default();
    queue.push_requests(sizes);
    queue
  }

  pub fn push_requests(&mut self, sizes: &[usize]) {
    let mut s = lock(&self.0);
    for &size in sizes {
      let id = s.next_id;
      s.next_id += 1;
      s.pending.push_back((id, Some(vec![0u8; size])));
    }
  }

  /// Strip the output buffer from the `index`th pending request.
  pub fn drop_buffer(&mut self, index: usize) {
    if let Some(entry) = lock(&self.0).pending.get_mut(index) {
      entry.1 = None;
    }
  }

  pub fn pending(&self) -> usize {
    lock(&self.0).pending.len()
  }

  pub fn completions(&self) -> Vec<Completed> {
    lock(&self.0).completions.clone()
  }
}

pub struct MockRequest {
  id: usize,
  buffer: Option<Vec<u8>>,
  queue: MockQueue,
}

impl ReadRequest for MockRequest {
  fn output_buffer(&mut self) -> Result<&mut [u8], RequestError> {
    self.buffer.as_deref_mut().ok_or(RequestError::NoOutputBuffer)
  }

  fn complete(self, completion: Completion) {
    lock(&self.queue.0).completions.push(Completed {
      request: self.id,
      completion,
      buffer: self.buffer.unwrap_or_default(),
    });
  }
}

impl RequestQueue for MockQueue {
  type Request = MockRequest;

  fn retrieve_next_request(&mut self) -> Option<MockRequest> {
    let (id, buffer) = lock(&self.0).pending.pop_front()?;
    Some(MockRequest { id, buffer, queue: self.clone() })
  }
}

// Idle coordinator

#[derive(Clone, Default)]
pub struct MockIdle(Arc<Mutex<(usize, usize)>>);

impl MockIdle {
  pub fn completions(&self) -> usize {
    lock(&self.0).0
  }

  pub fn cancellations(&self) -> usize {
    lock(&self.0).1
  }
}

impl IdleCoordinator for MockIdle {
  fn complete_idle_requests(&mut self) {
    lock(&self.0).0 += 1;
  }

  fn cancel_idle_requests(&mut self) {
    lock(&self.0).1 += 1;
  }
}

// Driver under test

pub type TestTouch = RmiTouch<MockHub, MockEngine, MockQueue, MockIdle, MockDelay>;

/// Driver wired to mocks, with handles on the shared mock state.
pub struct Harness {
  pub touch: TestTouch,
  pub hub: MockHub,
  pub engine: MockEngine,
  pub idle: MockIdle,
  pub delay: MockDelay,
}

impl Harness {
  pub fn new(config: Config) -> Self {
    let hub = MockHub::new();
    let engine = MockEngine::default();
    let idle = MockIdle::default();
    let delay = MockDelay::default();
    let touch = RmiTouch::new(
      hub.clone(),
      engine.clone(),
      MockQueue::default(),
      idle.clone(),
      delay.clone(),
      config,
    );
    Self { touch, hub, engine, idle, delay }
  }
}

// Log capture

thread_local! {
  static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
  fn enabled(&self, metadata: &log::Metadata) -> bool {
    metadata.level() <= log::Level::Error
  }

  fn log(&self, record: &log::Record) {
    if record.level() != log::Level::Error {
      return;
    }
    CAPTURED.with(|c| {
      if let Some(lines) = c.borrow_mut().as_mut() {
        lines.push(record.args().to_string());
      }
    });
  }

  fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Run `f` and collect the ERROR-level messages it logged on this thread.
pub fn capture_errors<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
  static INIT: Once = Once::new();
  INIT.call_once(|| {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Error);
  });

  CAPTURED.with(|c| *c.borrow_mut() = Some(Vec::new()));
  let result = f();
  let lines = CAPTURED.with(|c| c.borrow_mut().take()).unwrap_or_default();
  (result, lines)
}
