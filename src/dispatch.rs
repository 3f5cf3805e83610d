use crate::{HidInputReport, ReadRequest, RequestError, RequestQueue, HID_INPUT_REPORT_SIZE};

/// What happened to the reports of one service pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchSummary {
  /// Requests completed with a report.
  pub delivered: usize,
  /// Requests completed with an error; their reports are lost.
  pub failed: usize,
  /// Reports dropped because no request was pending.
  pub dropped: usize,
}

/// Pair each report with the next pending request, in order.
///
/// Every request taken from the queue is completed exactly once. Reports that
/// find the queue empty are dropped rather than buffered; the host queue is
/// the only buffer in the pipeline.
pub fn send_reports<Q: RequestQueue>(queue: &mut Q, reports: &[HidInputReport]) -> DispatchSummary {
  let mut summary = DispatchSummary::default();

  for report in reports {
    let Some(mut request) = queue.retrieve_next_request() else {
      error!("no request pending from the host, ignoring report {:#x}", report.report_id());
      summary.dropped += 1;
      continue;
    };

    let completion = fill(&mut request, report);
    match completion {
      Ok(_) => summary.delivered += 1,
      Err(_) => summary.failed += 1,
    }
    request.complete(completion);
  }

  if summary != DispatchSummary::default() {
    trace!("dispatch: {:?}", summary);
  }
  summary
}

fn fill<R: ReadRequest>(request: &mut R, report: &HidInputReport) -> Result<usize, RequestError> {
  let buffer = request.output_buffer().map_err(|e| {
    warn!("error retrieving read request output buffer: {:?}", e);
    e
  })?;

  if buffer.len() < HID_INPUT_REPORT_SIZE {
    warn!("read request buffer is too small ({} bytes)", buffer.len());
    return Err(RequestError::BufferTooSmall);
  }

  buffer[..HID_INPUT_REPORT_SIZE].copy_from_slice(report.as_bytes());
  Ok(HID_INPUT_REPORT_SIZE)
}
