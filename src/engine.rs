use crate::{HidInputReport, InputMode};

/// Failures reported by a touch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchError {
  /// Engine state could not be allocated.
  OutOfResources,
  /// The controller did not respond as expected.
  HardwareFault,
  /// A bus transfer failed; the next interrupt may succeed.
  TransientBusError,
}

/// Driver of the controller's register protocol.
///
/// The engine keeps its per-device state in [`TouchEngine::Context`] and does
/// all bus traffic through the channel it is handed. Apart from
/// [`TouchEngine::wake`] and [`TouchEngine::standby`] it is only called while
/// the device is in D0.
pub trait TouchEngine<B> {
  type Context;

  fn allocate_context(&mut self) -> Result<Self::Context, TouchError>;

  /// Configure the controller and arm its interrupt.
  fn start(&mut self, ctx: &mut Self::Context, bus: &mut B) -> Result<(), TouchError>;

  /// Put the controller in its run state.
  fn wake(&mut self, ctx: &mut Self::Context, bus: &mut B) -> Result<(), TouchError>;

  /// Quiesce the controller before the device leaves D0.
  fn standby(&mut self, ctx: &mut Self::Context, bus: &mut B) -> Result<(), TouchError>;

  /// Halt the controller before its resources go away.
  fn stop(&mut self, ctx: &mut Self::Context, bus: &mut B) -> Result<(), TouchError>;

  fn free_context(&mut self, ctx: Self::Context);

  /// Drain the controller's pending state into HID reports.
  ///
  /// `full_rescan` asks the engine to read every source regardless of the
  /// controller's interrupt status, because an assertion may have been missed
  /// while the device was out of D0. The returned reports only need to live
  /// until the caller has copied them out; an empty slice is a normal result.
  fn service_interrupts<'a>(
    &'a mut self,
    ctx: &'a mut Self::Context,
    bus: &mut B,
    mode: InputMode,
    full_rescan: bool,
  ) -> Result<&'a [HidInputReport], TouchError>;
}
