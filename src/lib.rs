#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `no_std` HID reporting core for Synaptics RMI touch controllers reached
//! over I²C.
//!
//! The crate turns a level-triggered controller interrupt into an ordered
//! stream of fixed-size HID input reports, each matched one-to-one against a
//! read request supplied by the host input stack. Around that pipeline it
//! drives the device lifecycle:
//!
//! - Resolving the bus and optional reset GPIO from a platform resource list
//! - Opening the I²C channel and reset line through a [`ResourceHub`]
//! - Allocating, starting, waking, idling, and stopping the [`TouchEngine`]
//!   that speaks the RMI register protocol
//! - Completing parked idle requests when the device returns to D0
//!
//! The register-level RMI protocol is left to the [`TouchEngine`]
//! implementation; this crate only needs it to hand back ready
//! [`HidInputReport`]s when an interrupt is serviced.
//!
//! ```no_run
//! use rmi_hid::{Config, ResourceDescriptor, RmiTouch};
//!
//! fn bring_up<H, T, Q, I, D>(mut touch: RmiTouch<H, T, Q, I, D>, list: &[ResourceDescriptor]) -> Result<(), rmi_hid::Error>
//! where
//!   H: rmi_hid::ResourceHub,
//!   T: rmi_hid::TouchEngine<H::Bus>,
//!   Q: rmi_hid::RequestQueue,
//!   I: rmi_hid::IdleCoordinator,
//!   D: embedded_hal::delay::DelayNs,
//! {
//!   touch.prepare_hardware(list)?;
//!   touch.on_d0_entry(rmi_hid::PowerState::D3)?;
//!
//!   // Called by the interrupt framework for every assertion of ATTN.
//!   let _recognized = touch.on_interrupt(0);
//!   Ok(())
//! }
//! ```

#[macro_use]
mod fmt;

mod bus;
mod config;
mod device;
mod dispatch;
mod engine;
mod gpio;
mod idle;
mod interrupt;
mod report;
mod request;
mod resource;

#[cfg(test)]
mod mock;

use embedded_hal::delay::DelayNs;

pub use bus::*;
pub use config::*;
pub use device::{DeviceState, PowerState};
pub use dispatch::*;
pub use engine::*;
pub use gpio::*;
pub use idle::*;
pub use report::*;
pub use request::*;
pub use resource::*;

/// Errors surfaced by the lifecycle entry points.
///
/// Interrupt servicing never returns these to its caller; they are logged and
/// the interrupt is still claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
  /// The resource list carried no Serial/I²C connection descriptor.
  MissingRequiredResource,
  /// Opening the bus channel or the reset GPIO failed.
  ResourceOpenFailed(OpenError),
  /// A synchronous read or write of the reset GPIO failed.
  IoctlFailed,
  /// The touch engine reported a failure.
  Touch(TouchError),
  /// A resource-hub path did not fit its fixed-size buffer.
  PathTooLong,
  /// The entry point is not valid in the current lifecycle state.
  InvalidTransition(DeviceState),
}

impl From<TouchError> for Error {
  fn from(e: TouchError) -> Self {
    Error::Touch(e)
  }
}

impl From<OpenError> for Error {
  fn from(e: OpenError) -> Self {
    Error::ResourceOpenFailed(e)
  }
}

/// Device context for one touch controller instance.
///
/// The driver owns its collaborators: the resource hub used to open
/// endpoints, the touch engine, the host read-request queue, the idle
/// coordinator and a delay provider for the reset sequence. Create it with
/// [`RmiTouch::new`] and feed it the framework callbacks in order:
/// [`RmiTouch::prepare_hardware`], [`RmiTouch::on_d0_entry`],
/// [`RmiTouch::on_interrupt`] while running, [`RmiTouch::on_d0_exit`] and
/// finally [`RmiTouch::release_hardware`].
pub struct RmiTouch<H, T, Q, I, D>
where
  H: ResourceHub,
  T: TouchEngine<H::Bus>,
{
  hub: H,
  engine: T,
  queue: Q,
  idle: I,
  delay: D,
  config: Config,
  state: DeviceState,
  resources: Option<Resources>,
  hw: Option<Hardware<H::Bus, H::Gpio, T::Context>>,
  input_mode: InputMode,
  service_on_d0_entry: bool,
}

/// Endpoints and engine state that live from prepare to release.
///
/// Bundling them keeps the bus channel and touch context either both present
/// or both absent.
struct Hardware<B, G, C> {
  bus: BusChannel<B>,
  reset_gpio: Option<GpioHandle<G>>,
  touch: C,
}

impl<H, T, Q, I, D> RmiTouch<H, T, Q, I, D>
where
  H: ResourceHub,
  T: TouchEngine<H::Bus>,
  Q: RequestQueue,
  I: IdleCoordinator,
  D: DelayNs,
{
  /// Create an unbound device context.
  ///
  /// Nothing is opened until [`RmiTouch::prepare_hardware`] runs.
  pub fn new(hub: H, engine: T, queue: Q, idle: I, delay: D, config: Config) -> Self {
    Self {
      hub,
      engine,
      queue,
      idle,
      delay,
      input_mode: config.input_mode,
      config,
      state: DeviceState::Unbound,
      resources: None,
      hw: None,
      service_on_d0_entry: false,
    }
  }

  /// Current lifecycle state.
  pub fn state(&self) -> DeviceState {
    self.state
  }

  /// Resources resolved by the last successful [`RmiTouch::prepare_hardware`].
  pub fn resources(&self) -> Option<Resources> {
    self.resources
  }

  /// Input mode handed to the touch engine on every service pass.
  pub fn input_mode(&self) -> InputMode {
    self.input_mode
  }

  /// Change the input mode, e.g. on a HID SET_FEATURE from the host.
  ///
  /// Takes effect on the next interrupt service pass.
  pub fn set_input_mode(&mut self, mode: InputMode) {
    info!("input mode set to {:?}", mode);
    self.input_mode = mode;
  }

  /// Whether the next service pass will ask the engine for a full rescan.
  pub fn service_on_d0_entry(&self) -> bool {
    self.service_on_d0_entry
  }

  /// Staged configuration.
  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Host read-request queue.
  pub fn queue(&self) -> &Q {
    &self.queue
  }

  /// Mutable access to the host read-request queue.
  pub fn queue_mut(&mut self) -> &mut Q {
    &mut self.queue
  }

  /// Idle coordinator.
  pub fn idle_mut(&mut self) -> &mut I {
    &mut self.idle
  }

  /// Tear the context apart, returning its collaborators.
  ///
  /// Any hardware still held is closed without stopping the engine; call
  /// [`RmiTouch::release_hardware`] first.
  pub fn into_parts(self) -> (H, T, Q, I, D) {
    (self.hub, self.engine, self.queue, self.idle, self.delay)
  }
}
