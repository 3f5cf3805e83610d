use heapless::Deque;

use crate::RequestError;

/// Parks "wait until active" requests and releases them on D0 entry.
pub trait IdleCoordinator {
  /// Complete every parked idle request successfully. No-op when none are parked.
  fn complete_idle_requests(&mut self);

  /// Give up on every parked idle request.
  fn cancel_idle_requests(&mut self) {}
}

/// Coordinator for stacks without selective suspend.
impl IdleCoordinator for () {
  fn complete_idle_requests(&mut self) {}
}

impl<C: IdleCoordinator + ?Sized> IdleCoordinator for &mut C {
  fn complete_idle_requests(&mut self) {
    (**self).complete_idle_requests()
  }

  fn cancel_idle_requests(&mut self) {
    (**self).cancel_idle_requests()
  }
}

/// Host idle notification waiting for the device to become active.
pub trait IdleRequest {
  fn complete(self, status: Result<(), RequestError>);
}

/// Bounded park for idle requests.
pub struct IdleQueue<R, const N: usize> {
  parked: Deque<R, N>,
}

impl<R: IdleRequest, const N: usize> IdleQueue<R, N> {
  pub const fn new() -> Self {
    Self { parked: Deque::new() }
  }

  /// Park a request until the next D0 entry.
  ///
  /// A full queue hands the request back to the caller.
  pub fn park(&mut self, request: R) -> Result<(), R> {
    self.parked.push_back(request)
  }

  pub fn len(&self) -> usize {
    self.parked.len()
  }

  pub fn is_empty(&self) -> bool {
    self.parked.is_empty()
  }
}

impl<R: IdleRequest, const N: usize> Default for IdleQueue<R, N> {
  fn default() -> Self {
    Self::new()
  }
}

impl<R: IdleRequest, const N: usize> IdleCoordinator for IdleQueue<R, N> {
  fn complete_idle_requests(&mut self) {
    let mut completed = 0usize;
    while let Some(request) = self.parked.pop_front() {
      request.complete(Ok(()));
      completed += 1;
    }
    if completed > 0 {
      debug!("completed {} idle requests", completed);
    }
  }

  fn cancel_idle_requests(&mut self) {
    while let Some(request) = self.parked.pop_front() {
      request.complete(Err(RequestError::Cancelled));
    }
  }
}
