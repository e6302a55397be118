//! The HTTP client seam.
//!
//! # Design
//! `send` never talks to the network itself: it hands a fully built
//! `http::Request` to a caller-owned [`Transport`] and gets back a response
//! whose body is still a stream. Connection pooling, TLS, proxies and
//! redirects are the transport's business. [`UreqTransport`] is the stock
//! implementation on top of a `ureq::Agent`.

use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ureq::AsSendBody;

use crate::context::Context;
use crate::error::TransportError;

/// Response body as handed back by a transport. Dropping it releases the
/// underlying connection.
pub type Body = Box<dyn Read + Send>;

/// Executes one fully built request.
///
/// Implementations must honor `ctx`: once it is canceled or its deadline
/// passes, `execute` returns promptly with [`TransportError::Canceled`] or
/// [`TransportError::DeadlineExceeded`].
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        ctx: &Context,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Body>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(
        &self,
        ctx: &Context,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Body>, TransportError> {
        (**self).execute(ctx, request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(
        &self,
        ctx: &Context,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Body>, TransportError> {
        (**self).execute(ctx, request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(
        &self,
        ctx: &Context,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Body>, TransportError> {
        (**self).execute(ctx, request)
    }
}

/// How often a waiting call looks at its context.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read size used when pumping a response body off the worker thread.
const CHUNK_SIZE: usize = 16 * 1024;

/// Chunks of a response body read ahead by the worker thread.
type Chunks = Receiver<io::Result<Vec<u8>>>;

/// [`Transport`] backed by a `ureq::Agent`.
///
/// Clones share the agent's connection pool. Every status code is returned as
/// data, whatever the agent's own `http_status_as_error` setting, and methods
/// outside the standard set are sent as-is.
///
/// The call and the body reads run on a worker thread while the caller polls
/// its context. When the context is canceled that worker is abandoned, not
/// stopped: with no deadline it holds its connection until the server answers
/// or closes.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_agent(ureq::Agent::new_with_defaults())
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &ureq::Agent {
        &self.agent
    }

    fn dispatch<S>(
        &self,
        ctx: &Context,
        request: http::Request<S>,
    ) -> Result<http::Response<Body>, TransportError>
    where
        S: AsSendBody + Send + 'static,
    {
        let mut config = self
            .agent
            .configure_request(request)
            .http_status_as_error(false)
            .allow_non_standard_methods(true);
        if let Some(remaining) = ctx.remaining() {
            config = config.timeout_global(Some(remaining));
        }
        let request = config.build();

        let agent = self.agent.clone();
        let (tx, rx) = mpsc::sync_channel(1);
        thread::spawn(move || {
            let response = match agent.run(request) {
                Ok(response) => response,
                Err(err) => {
                    let _ = tx.send(Err(err));
                    return;
                }
            };
            let (parts, body) = response.into_parts();
            let (chunk_tx, chunk_rx) = mpsc::sync_channel(4);
            if tx.send(Ok(http::Response::from_parts(parts, chunk_rx))).is_err() {
                return;
            }
            pump_body(body.into_reader(), &chunk_tx);
        });

        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(response)) => {
                    let (parts, chunks) = response.into_parts();
                    let body: Body = Box::new(ChunkReader::new(ctx.clone(), chunks));
                    return Ok(http::Response::from_parts(parts, body));
                }
                Ok(Err(err)) => return Err(map_error(ctx, err)),
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(err) = ctx.check() {
                        tracing::trace!(error = %err, "abandoning in-flight request");
                        return Err(err);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::Io(io::Error::other(
                        "transport worker exited without a result",
                    )));
                }
            }
        }
    }
}

/// Forward `reader` to `chunks` until end of body, a read error, or the
/// receiving side hanging up.
fn pump_body(mut reader: impl Read, chunks: &SyncSender<io::Result<Vec<u8>>>) {
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => {
                if chunks.send(Ok(buf[..n].to_vec())).is_err() {
                    return;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                let _ = chunks.send(Err(err));
                return;
            }
        }
    }
}

/// Body reader fed by the worker thread. Waiting for the next chunk polls the
/// context, so a stalled peer cannot outlast a cancel.
struct ChunkReader {
    ctx: Context,
    chunks: Chunks,
    current: Vec<u8>,
    pos: usize,
    done: bool,
}

impl ChunkReader {
    fn new(ctx: Context, chunks: Chunks) -> Self {
        Self {
            ctx,
            chunks,
            current: Vec::new(),
            pos: 0,
            done: false,
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.current.len() {
            if self.done {
                return Ok(0);
            }
            match self.chunks.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(chunk)) => {
                    self.current = chunk;
                    self.pos = 0;
                }
                Ok(Err(err)) => {
                    self.done = true;
                    return Err(err);
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.ctx.check().map_err(io::Error::other)?;
                }
                // The worker hangs up after the last chunk.
                Err(RecvTimeoutError::Disconnected) => self.done = true,
            }
        }
        let n = buf.len().min(self.current.len() - self.pos);
        buf[..n].copy_from_slice(&self.current[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        ctx: &Context,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Body>, TransportError> {
        ctx.check()?;
        if request.body().is_empty() {
            let (parts, _) = request.into_parts();
            self.dispatch(ctx, http::Request::from_parts(parts, ()))
        } else {
            self.dispatch(ctx, request)
        }
    }
}

fn map_error(ctx: &Context, err: ureq::Error) -> TransportError {
    if let Err(ctx_err) = ctx.check() {
        return ctx_err;
    }
    match err {
        ureq::Error::Io(io) => TransportError::Io(io),
        other => TransportError::client(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u16);

    impl Transport for Fixed {
        fn execute(
            &self,
            ctx: &Context,
            _request: http::Request<Vec<u8>>,
        ) -> Result<http::Response<Body>, TransportError> {
            ctx.check()?;
            let mut response = http::Response::new(Box::new(std::io::empty()) as Body);
            *response.status_mut() = http::StatusCode::from_u16(self.0).unwrap();
            Ok(response)
        }
    }

    fn request() -> http::Request<Vec<u8>> {
        http::Request::new(Vec::new())
    }

    #[test]
    fn shared_transports_delegate() {
        let ctx = Context::background();
        let arc: Arc<dyn Transport> = Arc::new(Fixed(201));
        assert_eq!(arc.execute(&ctx, request()).unwrap().status(), 201);

        let boxed: Box<dyn Transport> = Box::new(Fixed(202));
        assert_eq!((&boxed).execute(&ctx, request()).unwrap().status(), 202);
    }

    #[test]
    fn ureq_transport_refuses_a_canceled_context() {
        let (ctx, handle) = Context::background().with_cancel();
        handle.cancel();
        let err = UreqTransport::new()
            .execute(&ctx, http::Request::new(Vec::new()))
            .err().unwrap();
        assert!(matches!(err, TransportError::Canceled));
    }

    #[test]
    fn ureq_transport_refuses_an_expired_context() {
        let ctx = Context::background().with_timeout(Duration::ZERO);
        let err = UreqTransport::new()
            .execute(&ctx, http::Request::new(Vec::new()))
            .err().unwrap();
        assert!(matches!(err, TransportError::DeadlineExceeded));
        assert!(err.is_context());
    }

    #[test]
    fn chunk_reader_reassembles_chunks_across_small_reads() {
        let (tx, rx) = mpsc::sync_channel(4);
        tx.send(Ok(b"{\"id\":".to_vec())).unwrap();
        tx.send(Ok(b"1}".to_vec())).unwrap();
        drop(tx);

        let mut reader = ChunkReader::new(Context::background(), rx);
        let mut small = [0u8; 3];
        assert_eq!(reader.read(&mut small).unwrap(), 3);
        assert_eq!(&small, b"{\"i");

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"d\":1}");
    }

    #[test]
    fn chunk_reader_passes_read_errors_through() {
        let (tx, rx) = mpsc::sync_channel(4);
        tx.send(Ok(b"partial".to_vec())).unwrap();
        tx.send(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
            .unwrap();

        let mut reader = ChunkReader::new(Context::background(), rx);
        let err = reader.read_to_end(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn chunk_reader_gives_up_on_cancel_while_waiting() {
        // The sender stays alive and silent, like a peer stalled mid-body.
        let (_tx, rx) = mpsc::sync_channel::<io::Result<Vec<u8>>>(4);
        let (ctx, handle) = Context::background().with_cancel();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            handle.cancel();
        });

        let started = std::time::Instant::now();
        let mut reader = ChunkReader::new(ctx, rx);
        assert!(reader.read_to_end(&mut Vec::new()).is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
        canceller.join().unwrap();
    }
}
