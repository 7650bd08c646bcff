use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use super::{RenderRequest, RenderResult, Renderer};

/// Render `request` and capture every failure mode as a [`RenderResult`].
///
/// Renderer errors and panics both become [`RenderResult::Failure`] tagged
/// with the request's sequence number.
pub fn render<R: Renderer>(renderer: &mut R, request: &RenderRequest) -> RenderResult<R::View> {
    let seq = request.seq;
    match panic::catch_unwind(AssertUnwindSafe(|| renderer.render(&request.content))) {
        Ok(Ok(view)) => RenderResult::Success { view, seq },
        Ok(Err(err)) => RenderResult::Failure {
            detail: err.to_string(),
            seq,
        },
        Err(payload) => RenderResult::Failure {
            detail: format!("renderer panicked: {}", panic_message(payload.as_ref())),
            seq,
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Background thread that owns a [`Renderer`].
///
/// Requests go in over a channel with room for a single request; results
/// come back in completion order.
pub struct RenderWorker<V> {
    requests: Option<Sender<RenderRequest>>,
    results: Receiver<RenderResult<V>>,
    handle: Option<JoinHandle<()>>,
}

impl<V: Send + 'static> RenderWorker<V> {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn spawn<R: Renderer<View = V>>(renderer: R) -> std::io::Result<Self> {
        let (req_tx, req_rx) = crossbeam_channel::bounded::<RenderRequest>(1);
        let (res_tx, res_rx) = crossbeam_channel::unbounded();
        let handle = thread::Builder::new()
            .name("markmate-render".to_string())
            .spawn(move || {
                let mut renderer = renderer;
                for request in &req_rx {
                    let _scope = crate::perf::scope("sync.render");
                    let result = render(&mut renderer, &request);
                    if res_tx.send(result).is_err() {
                        break;
                    }
                }
                tracing::debug!("render worker exiting");
            })?;
        Ok(Self {
            requests: Some(req_tx),
            results: res_rx,
            handle: Some(handle),
        })
    }

    /// Hand a request to the worker without blocking.
    ///
    /// # Errors
    ///
    /// Gives the request back if the worker is busy or has stopped.
    pub fn submit(&self, request: RenderRequest) -> Result<(), RenderRequest> {
        let Some(tx) = &self.requests else {
            return Err(request);
        };
        tx.try_send(request).map_err(|err| err.into_inner())
    }

    /// Take a finished result if one is waiting.
    pub fn try_recv(&self) -> Option<RenderResult<V>> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block up to `timeout` for the next result.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RenderResult<V>> {
        match self.results.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl<V> Drop for RenderWorker<V> {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop. A render that is
        // still running is left to finish on its own.
        self.requests = None;
        if let Some(handle) = self.handle.take()
            && handle.is_finished()
        {
            let _ = handle.join();
        }
    }
}

impl<V> std::fmt::Debug for RenderWorker<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderWorker")
            .field("running", &self.handle.as_ref().is_some_and(|h| !h.is_finished()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sync::RenderError;

    struct Shout;

    impl Renderer for Shout {
        type View = String;

        fn render(&mut self, source: &str) -> Result<String, RenderError> {
            if source.contains("boom") {
                panic!("boom in renderer");
            }
            if source.is_empty() {
                return Err(RenderError::Other("nothing to render".to_string()));
            }
            Ok(source.to_uppercase())
        }
    }

    fn request(seq: u64, content: &str) -> RenderRequest {
        RenderRequest {
            seq,
            content: Arc::from(content),
        }
    }

    #[test]
    fn test_render_success_carries_sequence() {
        let result = render(&mut Shout, &request(7, "hi"));
        assert_eq!(
            result,
            RenderResult::Success {
                view: "HI".to_string(),
                seq: 7
            }
        );
    }

    #[test]
    fn test_render_error_becomes_failure() {
        let result = render(&mut Shout, &request(3, ""));
        assert_eq!(
            result,
            RenderResult::Failure {
                detail: "nothing to render".to_string(),
                seq: 3
            }
        );
    }

    #[test]
    fn test_render_panic_becomes_failure() {
        let result = render(&mut Shout, &request(4, "boom"));
        let RenderResult::Failure { detail, seq } = result else {
            panic!("expected failure");
        };
        assert_eq!(seq, 4);
        assert!(detail.contains("boom in renderer"), "got: {detail}");
    }

    #[test]
    fn test_worker_renders_submitted_request() {
        let worker = RenderWorker::spawn(Shout).expect("spawn");
        worker.submit(request(1, "abc")).expect("submit");
        let result = worker.recv_timeout(Duration::from_secs(5)).expect("result");
        assert_eq!(result.seq(), 1);
        assert!(result.is_success());
    }

    #[test]
    fn test_worker_survives_renderer_panic() {
        let worker = RenderWorker::spawn(Shout).expect("spawn");
        worker.submit(request(1, "boom")).expect("submit");
        let first = worker.recv_timeout(Duration::from_secs(5)).expect("first");
        assert!(!first.is_success());

        worker.submit(request(2, "ok")).expect("submit");
        let second = worker.recv_timeout(Duration::from_secs(5)).expect("second");
        assert_eq!(
            second,
            RenderResult::Success {
                view: "OK".to_string(),
                seq: 2
            }
        );
    }
}
