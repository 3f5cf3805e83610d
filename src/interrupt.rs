use embedded_hal::delay::DelayNs;
use embedded_hal_async::digital::Wait;

use crate::{
  dispatch, DeviceState, DispatchSummary, Error, IdleCoordinator, IrqPolarity, RequestQueue, ResourceHub, RmiTouch,
  TouchEngine,
};

impl<H, T, Q, I, D> RmiTouch<H, T, Q, I, D>
where
  H: ResourceHub,
  T: TouchEngine<H::Bus>,
  Q: RequestQueue,
  I: IdleCoordinator,
  D: DelayNs,
{
  /// Interrupt service routine for the controller's level-triggered line.
  ///
  /// Always claims the interrupt: a failed pass is logged and the next
  /// assertion retries. `message_id` is ignored; only line-based interrupts
  /// are supported.
  pub fn on_interrupt(&mut self, message_id: u32) -> bool {
    let _ = message_id;
    if let Err(e) = self.service_interrupt() {
      error!("error servicing touch interrupt: {:?}", e);
    }
    true
  }

  /// One service pass: drain the engine and dispatch its reports.
  ///
  /// Outside D0 the engine is left alone and nothing is dispatched.
  pub fn service_interrupt(&mut self) -> Result<DispatchSummary, Error> {
    if self.state != DeviceState::Running {
      debug!("interrupt while {:?}, ignoring", self.state);
      return Ok(DispatchSummary::default());
    }
    let Some(hw) = self.hw.as_mut() else {
      return Ok(DispatchSummary::default());
    };

    let full_rescan = core::mem::take(&mut self.service_on_d0_entry);
    let reports = match self.engine.service_interrupts(&mut hw.touch, hw.bus.bus(), self.input_mode, full_rescan) {
      Ok(reports) => reports,
      Err(e) => {
        // Keep the rescan request for the next pass.
        self.service_on_d0_entry |= full_rescan;
        return Err(e.into());
      }
    };

    trace!("serviced interrupt, {} reports", reports.len());
    Ok(dispatch::send_reports(&mut self.queue, reports))
  }

  /// Wait for the attention line to assert, then run one service pass.
  ///
  /// The line stays asserted while the controller holds data, so calling
  /// this in a loop keeps servicing until the source is drained. Returns
  /// `false` if the line could not be waited on.
  pub async fn service_on_assert<W: Wait>(&mut self, irq: &mut W) -> bool {
    let asserted = match self.config.irq_polarity {
      IrqPolarity::ActiveLow => irq.wait_for_low().await,
      IrqPolarity::ActiveHigh => irq.wait_for_high().await,
    };
    if asserted.is_err() {
      warn!("failed waiting on attention line");
      return false;
    }
    self.on_interrupt(0)
  }
}
