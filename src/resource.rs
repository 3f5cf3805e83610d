use core::fmt::Write;

use heapless::String;

use crate::Error;

/// Capacity of a rendered resource-hub path, in characters.
pub const HUB_PATH_CAPACITY: usize = 260;

const HUB_PATH_PREFIX: &str = "\\\\.\\RESOURCE_HUB\\";

/// 64-bit resource-hub connection ID, split the way the platform hands it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionId {
  pub low: u32,
  pub high: u32,
}

impl ConnectionId {
  pub const fn new(low: u32, high: u32) -> Self {
    Self { low, high }
  }

  pub const fn as_u64(self) -> u64 {
    ((self.high as u64) << 32) | self.low as u64
  }

  /// Render the resource-hub path used to open this connection.
  pub fn hub_path(self) -> Result<HubPath, Error> {
    let mut path = String::new();
    write!(path, "{}{:016x}", HUB_PATH_PREFIX, self.as_u64()).map_err(|_| Error::PathTooLong)?;
    Ok(HubPath(path))
  }
}

impl From<u64> for ConnectionId {
  fn from(id: u64) -> Self {
    Self::new(id as u32, (id >> 32) as u32)
  }
}

impl From<ConnectionId> for u64 {
  fn from(id: ConnectionId) -> Self {
    id.as_u64()
  }
}

/// Resource-hub path naming a bus or GPIO endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubPath(String<HUB_PATH_CAPACITY>);

impl HubPath {
  pub fn as_str(&self) -> &str {
    self.0.as_str()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionClass {
  Gpio,
  Serial,
  FunctionConfig,
  Other(u8),
}

impl From<u8> for ConnectionClass {
  fn from(bits: u8) -> Self {
    match bits {
      0x01 => Self::Gpio,
      0x02 => Self::Serial,
      0x03 => Self::FunctionConfig,
      other => Self::Other(other),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionType {
  GpioIo,
  SerialI2c,
  SerialSpi,
  SerialUart,
  Other(u8),
}

impl ConnectionType {
  /// Decode a type code, which the platform scopes by connection class.
  pub fn from_bits(class: ConnectionClass, bits: u8) -> Self {
    match (class, bits) {
      (ConnectionClass::Gpio, 0x02) => Self::GpioIo,
      (ConnectionClass::Serial, 0x01) => Self::SerialI2c,
      (ConnectionClass::Serial, 0x02) => Self::SerialSpi,
      (ConnectionClass::Serial, 0x03) => Self::SerialUart,
      (_, other) => Self::Other(other),
    }
  }
}

/// One entry of the translated resource list handed over at prepare time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResourceDescriptor {
  Connection {
    class: ConnectionClass,
    kind: ConnectionType,
    id: ConnectionId,
  },
  Interrupt {
    vector: u32,
    level: u32,
  },
  Memory {
    start: u64,
    length: u32,
  },
  Other(u8),
}

impl ResourceDescriptor {
  pub const fn i2c(id: ConnectionId) -> Self {
    Self::Connection { class: ConnectionClass::Serial, kind: ConnectionType::SerialI2c, id }
  }

  pub const fn gpio_io(id: ConnectionId) -> Self {
    Self::Connection { class: ConnectionClass::Gpio, kind: ConnectionType::GpioIo, id }
  }
}

/// Connections the driver needs, pulled out of the resource list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Resources {
  pub bus: ConnectionId,
  pub reset_gpio: Option<ConnectionId>,
}

impl Resources {
  /// Walk the list in order and classify each connection.
  ///
  /// A Serial/I²C connection is mandatory, a GPIO I/O connection is taken as
  /// the reset line when present. Anything else is ignored. When a class
  /// shows up more than once the last entry wins.
  pub fn resolve(list: &[ResourceDescriptor]) -> Result<Self, Error> {
    let mut bus = None;
    let mut reset_gpio = None;

    for descriptor in list {
      match *descriptor {
        ResourceDescriptor::Connection { class: ConnectionClass::Serial, kind: ConnectionType::SerialI2c, id } => {
          if bus.replace(id).is_some() {
            warn!("duplicate I2C connection, using {:?}", id);
          }
        }
        ResourceDescriptor::Connection { class: ConnectionClass::Gpio, kind: ConnectionType::GpioIo, id } => {
          if reset_gpio.replace(id).is_some() {
            warn!("duplicate GPIO connection, using {:?}", id);
          }
        }
        _ => {}
      }
    }

    let Some(bus) = bus else {
      error!("no I2C connection resource found");
      return Err(Error::MissingRequiredResource);
    };

    Ok(Self { bus, reset_gpio })
  }
}
