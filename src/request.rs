/// Reasons a host read request is completed without a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestError {
  /// The request carried no usable output buffer.
  NoOutputBuffer,
  /// The output buffer cannot hold a full HID input report.
  BufferTooSmall,
  /// The request was given up on, e.g. because the device went away.
  Cancelled,
}

/// Outcome a request is completed with: the number of bytes written, or why
/// nothing was.
pub type Completion = Result<usize, RequestError>;

/// Pending HID read request supplied by the host input stack.
pub trait ReadRequest {
  /// Output buffer the report is copied into.
  fn output_buffer(&mut self) -> Result<&mut [u8], RequestError>;

  /// Hand the request back to the host. Called exactly once per request.
  fn complete(self, completion: Completion);
}

/// Host-owned FIFO of pending read requests.
///
/// The driver only drains it. An empty queue, including one whose requests
/// were cancelled before they were seen, yields `None`.
pub trait RequestQueue {
  type Request: ReadRequest;

  fn retrieve_next_request(&mut self) -> Option<Self::Request>;
}

impl<Q: RequestQueue + ?Sized> RequestQueue for &mut Q {
  type Request = Q::Request;

  fn retrieve_next_request(&mut self) -> Option<Self::Request> {
    (**self).retrieve_next_request()
  }
}
