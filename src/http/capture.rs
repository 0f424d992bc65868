//! Response body observation.
//!
//! [`ObservedBody`] wraps an outbound body, forwards every frame unchanged,
//! optionally copies data bytes into a bounded buffer, and runs a completion
//! callback exactly once: at end of stream, on a body error, or when the body
//! is dropped early (client went away).
//!
//! [`CompletionGuard`] carries the callback. Created before the inner
//! handler runs, it also fires if the handler future itself is dropped.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use http_body::{Body as HttpBody, Frame, SizeHint};

/// Bytes copied out of a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub bytes: Bytes,
    /// The body was longer than the capture limit.
    pub truncated: bool,
}

/// Passed to the completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The body reached end of stream.
    pub completed: bool,
    /// Captured bytes, when capture was requested and a body existed.
    pub body: Option<Captured>,
}

type Callback = Box<dyn FnOnce(Completion) + Send>;

/// Runs its callback once; on drop, with an aborted [`Completion`].
pub struct CompletionGuard {
    callback: Option<Callback>,
}

impl CompletionGuard {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    fn fire(&mut self, completion: Completion) {
        if let Some(callback) = self.callback.take() {
            callback(completion);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.callback.is_some()
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.fire(Completion {
            completed: false,
            body: None,
        });
    }
}

struct BodyCapture {
    buf: BytesMut,
    limit: usize,
    truncated: bool,
}

impl BodyCapture {
    fn new(limit: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            limit,
            truncated: false,
        }
    }

    fn observe(&mut self, chunk: &Bytes) {
        let room = self.limit.saturating_sub(self.buf.len());
        if chunk.len() > room {
            self.truncated = true;
            self.buf.extend_from_slice(&chunk[..room]);
        } else {
            self.buf.extend_from_slice(chunk);
        }
    }

    fn into_captured(self) -> Captured {
        Captured {
            bytes: self.buf.freeze(),
            truncated: self.truncated,
        }
    }
}

/// Pass-through body decorator. See the module docs.
pub struct ObservedBody {
    inner: Body,
    capture: Option<BodyCapture>,
    guard: CompletionGuard,
}

impl ObservedBody {
    /// Wrap `inner`. `capture_limit` enables byte capture up to that size.
    pub fn new(inner: Body, capture_limit: Option<usize>, guard: CompletionGuard) -> Self {
        Self {
            inner,
            capture: capture_limit.map(BodyCapture::new),
            guard,
        }
    }

    /// Convenience: wrap and re-box as an axum [`Body`].
    pub fn wrap(inner: Body, capture_limit: Option<usize>, guard: CompletionGuard) -> Body {
        Body::new(Self::new(inner, capture_limit, guard))
    }

    fn finish(&mut self, completed: bool) {
        if !self.guard.is_armed() {
            return;
        }
        let body = self.capture.take().map(BodyCapture::into_captured);
        self.guard.fire(Completion { completed, body });
    }
}

impl HttpBody for ObservedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let (Some(capture), Some(data)) = (this.capture.as_mut(), frame.data_ref()) {
                    capture.observe(data);
                }
                if this.inner.is_end_stream() {
                    this.finish(true);
                }
            }
            Poll::Ready(Some(Err(_))) => this.finish(false),
            Poll::Ready(None) => this.finish(true),
            Poll::Pending => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for ObservedBody {
    fn drop(&mut self) {
        self.finish(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (CompletionGuard, Arc<Mutex<Vec<Completion>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let guard = CompletionGuard::new(move |c| sink.lock().unwrap().push(c));
        (guard, seen)
    }

    #[tokio::test]
    async fn forwards_bytes_and_captures_them() {
        let (guard, seen) = recorder();
        let body = ObservedBody::wrap(Body::from("{\"ok\":true}"), Some(1024), guard);

        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"{\"ok\":true}");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].completed);
        let captured = seen[0].body.as_ref().unwrap();
        assert_eq!(&captured.bytes[..], b"{\"ok\":true}");
        assert!(!captured.truncated);
    }

    #[tokio::test]
    async fn capture_is_bounded_but_output_is_not() {
        let (guard, seen) = recorder();
        let body = ObservedBody::wrap(Body::from("abcdefghij"), Some(4), guard);

        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"abcdefghij");

        let seen = seen.lock().unwrap();
        let captured = seen[0].body.as_ref().unwrap();
        assert_eq!(&captured.bytes[..], b"abcd");
        assert!(captured.truncated);
    }

    #[test]
    fn dropped_body_fires_once_as_aborted() {
        let (guard, seen) = recorder();
        let body = ObservedBody::new(Body::from("never read"), Some(16), guard);
        drop(body);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0].completed);
        assert_eq!(seen[0].body.as_ref().map(|c| c.bytes.len()), Some(0));
    }

    #[test]
    fn dropped_guard_fires() {
        let (guard, seen) = recorder();
        drop(guard);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_capture_when_not_requested() {
        let (guard, seen) = recorder();
        let body = ObservedBody::wrap(Body::from("data"), None, guard);
        axum::body::to_bytes(body, usize::MAX).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].body.is_none());
    }
}
