use bitfield_struct::bitfield;

/// Size in bytes of every HID input report this driver hands to the host.
pub const HID_INPUT_REPORT_SIZE: usize = 10;

/// Report ID of the single-contact digitizer report.
pub const REPORT_ID_TOUCH: u8 = 0x01;
/// Report ID of the mouse-compatible pointer report.
pub const REPORT_ID_MOUSE: u8 = 0x03;

/// Fixed-size HID input report, copied verbatim into host read buffers.
///
/// Touch engines usually build these with [`HidInputReport::touch`] or
/// [`HidInputReport::mouse`]; the bytes must match the report descriptor the
/// host was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidInputReport([u8; HID_INPUT_REPORT_SIZE]);

impl HidInputReport {
  pub const fn from_bytes(bytes: [u8; HID_INPUT_REPORT_SIZE]) -> Self {
    Self(bytes)
  }

  pub const fn as_bytes(&self) -> &[u8; HID_INPUT_REPORT_SIZE] {
    &self.0
  }

  pub const fn report_id(&self) -> u8 {
    self.0[0]
  }

  /// Encode one contact of a hybrid-mode multi-touch frame.
  ///
  /// A frame with several contacts is sent as several reports; only the first
  /// carries the frame's contact count, the rest carry zero.
  pub fn touch(contact: &TouchContact, scan_time: u16, contact_count: u8) -> Self {
    let mut b = [0u8; HID_INPUT_REPORT_SIZE];
    b[0] = REPORT_ID_TOUCH;
    b[1] = contact.flags.into_bits();
    b[2] = contact.id;
    b[3..5].copy_from_slice(&contact.x.to_le_bytes());
    b[5..7].copy_from_slice(&contact.y.to_le_bytes());
    b[7..9].copy_from_slice(&scan_time.to_le_bytes());
    b[9] = contact_count;
    Self(b)
  }

  /// Encode a pointer update for [`crate::InputMode::Mouse`].
  pub fn mouse(buttons: MouseButtons, x: u16, y: u16) -> Self {
    let mut b = [0u8; HID_INPUT_REPORT_SIZE];
    b[0] = REPORT_ID_MOUSE;
    b[1] = buttons.into_bits();
    b[2..4].copy_from_slice(&x.to_le_bytes());
    b[4..6].copy_from_slice(&y.to_le_bytes());
    Self(b)
  }

  /// Decode the contact carried by a touch report.
  pub fn touch_contact(&self) -> Option<TouchContact> {
    if self.report_id() != REPORT_ID_TOUCH {
      return None;
    }
    let b = &self.0;
    Some(TouchContact {
      flags: ContactFlags::from_bits(b[1]),
      id: b[2],
      x: u16::from_le_bytes([b[3], b[4]]),
      y: u16::from_le_bytes([b[5], b[6]]),
    })
  }
}

impl From<[u8; HID_INPUT_REPORT_SIZE]> for HidInputReport {
  fn from(bytes: [u8; HID_INPUT_REPORT_SIZE]) -> Self {
    Self(bytes)
  }
}

impl AsRef<[u8]> for HidInputReport {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct ContactFlags {
  pub tip_switch: bool,
  pub in_range: bool,
  pub confidence: bool,
  #[bits(5)]
  __: u8,
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct MouseButtons {
  pub left: bool,
  pub right: bool,
  pub middle: bool,
  #[bits(5)]
  __: u8,
}

/// One finger as seen by the digitizer collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchContact {
  pub flags: ContactFlags,
  pub id: u8,
  pub x: u16,
  pub y: u16,
}

impl TouchContact {
  /// A finger that is down and in range.
  pub fn down(id: u8, x: u16, y: u16) -> Self {
    let flags = ContactFlags::new().with_tip_switch(true).with_in_range(true).with_confidence(true);
    Self { flags, id, x, y }
  }

  /// A finger that has just been lifted.
  pub fn up(id: u8, x: u16, y: u16) -> Self {
    Self { flags: ContactFlags::new().with_confidence(true), id, x, y }
  }
}
