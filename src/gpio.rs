use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{ConnectionId, Error, ResetTiming, ResourceHub};

/// Open GPIO endpoint, released when dropped.
///
/// Pin values travel as single bytes: `0` is low, anything else is high.
pub struct GpioHandle<P> {
  id: ConnectionId,
  pin: P,
}

impl<P> GpioHandle<P>
where
  P: InputPin + OutputPin,
{
  /// Open the GPIO endpoint named by `id`.
  pub fn open<H>(hub: &mut H, id: ConnectionId) -> Result<Self, Error>
  where
    H: ResourceHub<Gpio = P>,
  {
    let path = id.hub_path()?;
    let pin = hub.open_gpio(&path).map_err(|e| {
      error!("failed to open GPIO target {:?}: {:?}", id, e);
      Error::ResourceOpenFailed(e)
    })?;
    info!("GPIO {:?} open", id);
    Ok(Self { id, pin })
  }

  pub fn id(&self) -> ConnectionId {
    self.id
  }

  /// Read the current pin level.
  pub fn read_pin(&mut self) -> Result<u8, Error> {
    let high = self.pin.is_high().map_err(|_| Error::IoctlFailed)?;
    Ok(high as u8)
  }

  /// Drive the pin and return the level it latched.
  pub fn write_pin(&mut self, value: u8) -> Result<u8, Error> {
    let result = if value == 0 { self.pin.set_low() } else { self.pin.set_high() };
    result.map_err(|_| Error::IoctlFailed)?;
    self.read_pin()
  }

  /// Hold the controller in reset, wait for the rail, release and wait until
  /// it answers on the bus.
  pub fn pulse_reset<D: DelayNs>(&mut self, delay: &mut D, timing: &ResetTiming) -> Result<(), Error> {
    info!("reset pulse on GPIO {:?}", self.id);
    self.write_pin(0)?;
    delay.delay_us(timing.power_rail_stable_us);
    self.write_pin(1)?;
    delay.delay_us(timing.delay_to_communicate_us);
    debug!("reset pulse done");
    Ok(())
  }

  pub fn close(self) {
    info!("GPIO {:?} closed", self.id);
  }
}
