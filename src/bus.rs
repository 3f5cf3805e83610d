use embedded_hal::digital::{InputPin, OutputPin};

use crate::{ConnectionId, Error, HubPath};

/// Failure to obtain an endpoint from the resource hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenError {
  /// The I/O target object could not be created.
  TargetCreateFailed,
  /// The target exists but opening it by path failed.
  OpenFailed,
}

/// Platform registry that turns resource-hub paths into endpoint handles.
///
/// Handles are closed by dropping them.
pub trait ResourceHub {
  /// Serial bus endpoint. Opaque to this crate; the touch engine drives it.
  type Bus;
  /// GPIO endpoint used for the controller reset line.
  type Gpio: InputPin + OutputPin;

  fn open_bus(&mut self, path: &HubPath) -> Result<Self::Bus, OpenError>;

  fn open_gpio(&mut self, path: &HubPath) -> Result<Self::Gpio, OpenError>;
}

/// Open I²C channel to the controller.
pub struct BusChannel<B> {
  id: ConnectionId,
  bus: B,
}

impl<B> BusChannel<B> {
  /// Open the bus endpoint named by `id`.
  pub fn open<H>(hub: &mut H, id: ConnectionId) -> Result<Self, Error>
  where
    H: ResourceHub<Bus = B>,
  {
    let path = id.hub_path()?;
    debug!("opening bus target {}", path.as_str());
    let bus = hub.open_bus(&path).map_err(|e| {
      error!("failed to open bus target {:?}: {:?}", id, e);
      Error::ResourceOpenFailed(e)
    })?;
    info!("bus channel {:?} open", id);
    Ok(Self { id, bus })
  }

  pub fn id(&self) -> ConnectionId {
    self.id
  }

  pub fn bus(&mut self) -> &mut B {
    &mut self.bus
  }

  /// Close the channel, handing the endpoint back to the hub by dropping it.
  pub fn close(self) {
    info!("bus channel {:?} closed", self.id);
  }
}
