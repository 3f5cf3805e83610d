/// Report format the touch engine should produce.
///
/// Mirrors the HID input-mode feature report: the host selects between a
/// mouse-compatible pointer and single- or multi-contact digitizer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum InputMode {
  Mouse = 0,
  SingleTouch = 1,
  #[default]
  MultiTouch = 2,
}

impl From<InputMode> for u8 {
  fn from(mode: InputMode) -> Self {
    mode as u8
  }
}

impl TryFrom<u8> for InputMode {
  type Error = ();

  fn try_from(bits: u8) -> Result<Self, Self::Error> {
    match bits {
      0 => Ok(Self::Mouse),
      1 => Ok(Self::SingleTouch),
      2 => Ok(Self::MultiTouch),
      _ => Err(()),
    }
  }
}

/// Level at which the controller holds its attention line while it has data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqPolarity {
  #[default]
  ActiveLow,
  ActiveHigh,
}

/// Reset pulse applied on the reset GPIO during hardware preparation.
///
/// When disabled the reset line, if present, is only driven high so the
/// controller is out of reset before the bus is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetTiming {
  pub enabled: bool,
  /// Time the line is held low so the power rail settles, in microseconds.
  pub power_rail_stable_us: u32,
  /// Time after release before the controller answers on the bus, in microseconds.
  pub delay_to_communicate_us: u32,
}

impl ResetTiming {
  pub const POWER_RAIL_STABLE_US: u32 = 2_000;
  pub const DELAY_TO_COMMUNICATE_US: u32 = 200_000;

  pub const fn new() -> Self {
    Self {
      enabled: false,
      power_rail_stable_us: Self::POWER_RAIL_STABLE_US,
      delay_to_communicate_us: Self::DELAY_TO_COMMUNICATE_US,
    }
  }

  /// Same timing with the pulse turned on.
  pub const fn pulsed(mut self) -> Self {
    self.enabled = true;
    self
  }
}

impl Default for ResetTiming {
  fn default() -> Self {
    Self::new()
  }
}

/// Driver configuration staged before [`crate::RmiTouch::prepare_hardware`].
///
/// # Example
/// ```no_run
/// use rmi_hid::{Config, InputMode, IrqPolarity, ResetTiming};
///
/// let config = Config::default()
///   .with_input_mode(InputMode::SingleTouch)
///   .with_reset(ResetTiming::new().pulsed())
///   .with_irq_polarity(IrqPolarity::ActiveLow);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
  pub input_mode: InputMode,
  pub reset: ResetTiming,
  pub irq_polarity: IrqPolarity,
}

impl Config {
  pub const fn new(input_mode: InputMode, reset: ResetTiming, irq_polarity: IrqPolarity) -> Self {
    Self { input_mode, reset, irq_polarity }
  }

  pub const fn with_input_mode(mut self, input_mode: InputMode) -> Self {
    self.input_mode = input_mode;
    self
  }

  pub const fn with_reset(mut self, reset: ResetTiming) -> Self {
    self.reset = reset;
    self
  }

  pub const fn with_irq_polarity(mut self, irq_polarity: IrqPolarity) -> Self {
    self.irq_polarity = irq_polarity;
    self
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::new(InputMode::MultiTouch, ResetTiming::new(), IrqPolarity::ActiveLow)
  }
}
