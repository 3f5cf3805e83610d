use embedded_hal::delay::DelayNs;

use crate::{
  BusChannel, Error, GpioHandle, Hardware, IdleCoordinator, RequestQueue, ResourceDescriptor, ResourceHub, Resources,
  RmiTouch, TouchEngine,
};

/// Lifecycle of the device context.
///
/// `Unbound → Prepared → Running ⇄ LowPower → Released`, and a released
/// device may be prepared again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
  Unbound,
  Prepared,
  Running,
  LowPower,
  Released,
}

/// Device power states exposed to the host power manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
  D0,
  D3,
}

impl<H, T, Q, I, D> RmiTouch<H, T, Q, I, D>
where
  H: ResourceHub,
  T: TouchEngine<H::Bus>,
  Q: RequestQueue,
  I: IdleCoordinator,
  D: DelayNs,
{
  /// Bind the device to its resources and start the controller.
  ///
  /// Resolves the bus and reset line from `list`, brings the reset line up,
  /// opens the bus, allocates the engine context and starts the controller.
  /// On failure everything acquired so far is released and the device stays
  /// unbound.
  pub fn prepare_hardware(&mut self, list: &[ResourceDescriptor]) -> Result<(), Error> {
    if !matches!(self.state, DeviceState::Unbound | DeviceState::Released) {
      return Err(Error::InvalidTransition(self.state));
    }

    let resources = Resources::resolve(list)?;

    let reset_gpio = match resources.reset_gpio {
      Some(id) => Some(self.bring_out_of_reset(id)?),
      None => None,
    };

    let mut bus = BusChannel::open(&mut self.hub, resources.bus).map_err(|e| {
      error!("error in bus initialization: {:?}", e);
      e
    })?;

    let mut touch = self.engine.allocate_context().map_err(|e| {
      error!("error allocating touch context: {:?}", e);
      Error::from(e)
    })?;

    if let Err(e) = self.engine.start(&mut touch, bus.bus()) {
      error!("error starting touch device: {:?}", e);
      self.engine.free_context(touch);
      return Err(e.into());
    }

    info!("touch controller started on {:?}", resources.bus);
    self.hw = Some(Hardware { bus, reset_gpio, touch });
    self.resources = Some(resources);
    self.state = DeviceState::Prepared;
    Ok(())
  }

  fn bring_out_of_reset(&mut self, id: crate::ConnectionId) -> Result<GpioHandle<H::Gpio>, Error> {
    let mut gpio = GpioHandle::open(&mut self.hub, id)?;
    if self.config.reset.enabled {
      gpio.pulse_reset(&mut self.delay, &self.config.reset)?;
    } else {
      gpio.write_pin(1)?;
    }
    Ok(gpio)
  }

  /// Enter D0: wake the controller and release parked idle requests.
  ///
  /// The next interrupt pass is told to rescan the controller even when
  /// waking fails, since an assertion may have been missed while out of D0.
  pub fn on_d0_entry(&mut self, previous: PowerState) -> Result<(), Error> {
    if !matches!(self.state, DeviceState::Prepared | DeviceState::LowPower) {
      return Err(Error::InvalidTransition(self.state));
    }
    let hw = self.hw.as_mut().ok_or(Error::InvalidTransition(self.state))?;

    debug!("D0 entry from {:?}", previous);
    let status = self.engine.wake(&mut hw.touch, hw.bus.bus()).map_err(|e| {
      error!("error setting device to D0: {:?}", e);
      Error::from(e)
    });

    self.service_on_d0_entry = true;
    self.state = DeviceState::Running;
    self.idle.complete_idle_requests();

    status
  }

  /// Leave D0: put the controller in standby.
  ///
  /// Once this returns the engine is not serviced again until the next D0
  /// entry, whatever the outcome of standby.
  pub fn on_d0_exit(&mut self, target: PowerState) -> Result<(), Error> {
    if self.state != DeviceState::Running {
      return Err(Error::InvalidTransition(self.state));
    }
    let hw = self.hw.as_mut().ok_or(Error::InvalidTransition(self.state))?;

    debug!("D0 exit to {:?}", target);
    let status = self.engine.standby(&mut hw.touch, hw.bus.bus()).map_err(|e| {
      error!("error exiting D0: {:?}", e);
      Error::from(e)
    });

    self.state = DeviceState::LowPower;
    status
  }

  /// Stop the controller and release everything prepare acquired.
  ///
  /// Every step runs even when an earlier one fails; the first failure is
  /// returned.
  pub fn release_hardware(&mut self) -> Result<(), Error> {
    if !matches!(self.state, DeviceState::Prepared | DeviceState::LowPower) {
      return Err(Error::InvalidTransition(self.state));
    }
    let Some(Hardware { mut bus, reset_gpio, mut touch }) = self.hw.take() else {
      return Err(Error::InvalidTransition(self.state));
    };

    let mut status = Ok(());

    if let Err(e) = self.engine.stop(&mut touch, bus.bus()) {
      error!("error stopping device: {:?}", e);
      status = Err(Error::from(e));
    }

    self.engine.free_context(touch);
    self.idle.cancel_idle_requests();
    bus.close();
    if let Some(gpio) = reset_gpio {
      gpio.close();
    }

    self.service_on_d0_entry = false;
    self.resources = None;
    self.state = DeviceState::Released;
    info!("hardware released");
    status
  }
}
