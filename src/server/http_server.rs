use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// Starts a `may_minihttp` server for any cloneable service.
pub struct HttpServer<T>(pub T);

/// A listening server: its resolved address and the accept coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until a TCP connection to the server succeeds, for at most one second.
    ///
    /// # Errors
    ///
    /// `TimedOut` when the server never accepted a connection.
    pub fn wait_ready(&self) -> io::Result<()> {
        self.wait_ready_for(Duration::from_secs(1))
    }

    /// [`ServerHandle::wait_ready`] with a caller-chosen deadline.
    ///
    /// # Errors
    ///
    /// `TimedOut` when `timeout` elapses first.
    pub fn wait_ready_for(&self, timeout: Duration) -> io::Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("server on {} not ready after {timeout:?}", self.addr),
        ))
    }

    /// Cancel the accept coroutine and wait for it to finish.
    pub fn stop(self) {
        info!(addr = %self.addr, "HTTP server stopping");
        // SAFETY: cancel() is unsafe in the may runtime. The handle is ours
        // and the accept loop holds no state that outlives cancellation.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Block until the server exits.
    ///
    /// # Errors
    ///
    /// The panic payload if the accept coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` (the first address it resolves to) and start serving.
    ///
    /// # Errors
    ///
    /// When `addr` does not resolve or the port cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
        })?;
        let handle = may_minihttp::HttpServer(self.0).start(addr)?;
        info!(addr = %addr, "HTTP server listening");
        Ok(ServerHandle { addr, handle })
    }
}
