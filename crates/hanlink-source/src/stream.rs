use std::fmt;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::error::{Result, SourceError};
use crate::traits::ByteSource;

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Line speed for `serial://` targets that do not name one.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Where a [`StreamSource`] reads its bytes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTarget {
    /// A TCP bridge such as ser2net (`tcp://host:port`).
    Tcp(String),
    /// A Unix domain socket (`unix:///path/to/socket`).
    Unix(PathBuf),
    /// A serial port set to `baud`, 8 data bits, no parity and one stop bit
    /// on every open (`serial:///dev/ttyUSB0?baud=115200`).
    Serial { path: PathBuf, baud: u32 },
    /// A character device, FIFO or capture file.
    ///
    /// Device line settings are left as they are; use [`SourceTarget::Serial`]
    /// to have them applied.
    Path(PathBuf),
}

impl FromStr for SourceTarget {
    type Err = SourceError;

    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim();
        let invalid = || SourceError::InvalidTarget(input.to_string());
        if input.is_empty() {
            return Err(invalid());
        }

        if let Some(addr) = input.strip_prefix("tcp://") {
            if addr.is_empty() || !addr.contains(':') {
                return Err(invalid());
            }
            return Ok(Self::Tcp(addr.to_string()));
        }

        if let Some(path) = input.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        if let Some(rest) = input.strip_prefix("serial://") {
            let (path, baud) = match rest.split_once('?') {
                Some((path, query)) => {
                    let baud = query
                        .strip_prefix("baud=")
                        .and_then(|value| value.parse::<u32>().ok())
                        .filter(|baud| *baud > 0)
                        .ok_or_else(invalid)?;
                    (path, baud)
                }
                None => (rest, DEFAULT_BAUD_RATE),
            };
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::Serial {
                path: PathBuf::from(path),
                baud,
            });
        }

        Ok(Self::Path(PathBuf::from(input)))
    }
}

impl fmt::Display for SourceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTarget::Tcp(addr) => write!(f, "tcp://{addr}"),
            SourceTarget::Unix(path) => write!(f, "unix://{}", path.display()),
            SourceTarget::Serial { path, baud } if *baud == DEFAULT_BAUD_RATE => {
                write!(f, "serial://{}", path.display())
            }
            SourceTarget::Serial { path, baud } => {
                write!(f, "serial://{}?baud={baud}", path.display())
            }
            SourceTarget::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// An open link. A capture file ends for good at end of file; anything
/// else may come back after a reopen.
struct Link {
    reader: BoxedReader,
    capture: bool,
}

impl Link {
    fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            capture: false,
        }
    }

    fn capture(file: tokio::fs::File) -> Self {
        Self {
            reader: Box::new(file),
            capture: true,
        }
    }
}

async fn connect(target: &SourceTarget) -> io::Result<Link> {
    match target {
        SourceTarget::Tcp(addr) => {
            let stream = tokio::net::TcpStream::connect(addr.as_str()).await?;
            Ok(Link::stream(stream))
        }
        #[cfg(unix)]
        SourceTarget::Unix(path) => {
            let stream = tokio::net::UnixStream::connect(path).await?;
            Ok(Link::stream(stream))
        }
        #[cfg(unix)]
        SourceTarget::Serial { path, baud } => open_serial(path, *baud).map(Link::stream),
        #[cfg(not(unix))]
        SourceTarget::Unix(_) | SourceTarget::Serial { .. } => Err(io::Error::new(
            ErrorKind::Unsupported,
            "unix sockets and serial ports are not available on this platform",
        )),
        SourceTarget::Path(path) => open_path(path).await,
    }
}

async fn open_path(path: &Path) -> io::Result<Link> {
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.is_file() {
        let file = tokio::fs::File::open(path).await?;
        return Ok(Link::capture(file));
    }

    #[cfg(unix)]
    {
        open_device(path).map(Link::stream)
    }
    #[cfg(not(unix))]
    {
        let file = tokio::fs::File::open(path).await?;
        Ok(Link::stream(file))
    }
}

/// Open a FIFO or character device for readiness-driven reads.
///
/// The descriptor is non-blocking and owned by the reactor, so dropping the
/// receiver closes it at once even while a read is pending.
#[cfg(unix)]
fn open_device(path: &Path) -> io::Result<tokio::net::unix::pipe::Receiver> {
    tokio::net::unix::pipe::OpenOptions::new()
        .unchecked(true)
        .open_receiver(path)
}

/// Apply the line settings through `serialport`, then hand the device to the
/// reactor. The settings stay on the tty while the receiver holds it open.
#[cfg(unix)]
fn open_serial(path: &Path, baud: u32) -> io::Result<tokio::net::unix::pipe::Receiver> {
    let mut port = serialport::new(path.to_string_lossy(), baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .open_native()?;
    port.set_exclusive(false)?;

    let receiver = open_device(path)?;
    drop(port);
    debug!(path = %path.display(), baud, "serial line configured");
    Ok(receiver)
}

/// Byte source backed by any readable stream.
pub struct StreamSource {
    target: SourceTarget,
    link: Option<Link>,
}

impl StreamSource {
    /// Create a closed source for `target`.
    pub fn new(target: SourceTarget) -> Self {
        Self { target, link: None }
    }

    /// The configured target.
    pub fn target(&self) -> &SourceTarget {
        &self.target
    }

    /// Whether the link is currently open.
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }
}

impl ByteSource for StreamSource {
    async fn open(&mut self) -> Result<()> {
        if self.link.is_some() {
            debug!(target = %self.target, "source already open");
            return Ok(());
        }

        let link = connect(&self.target)
            .await
            .map_err(|source| SourceError::Open {
                target: self.target.to_string(),
                source,
            })?;
        info!(target = %self.target, capture = link.capture, "source opened");
        self.link = Some(link);
        Ok(())
    }

    async fn close(&mut self) {
        if self.link.take().is_some() {
            info!(target = %self.target, "source closed");
        }
    }

    async fn read_chunk(&mut self) -> Result<Bytes> {
        let link = self.link.as_mut().ok_or(SourceError::NotOpen)?;
        let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);
        loop {
            match link.reader.read_buf(&mut buf).await {
                Ok(0) if link.capture => return Err(SourceError::Exhausted),
                Ok(0) => return Err(SourceError::Closed),
                Ok(_) => return Ok(buf.freeze()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(SourceError::Io(err)),
            }
        }
    }

    fn describe(&self) -> String {
        self.target.to_string()
    }
}

impl fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSource")
            .field("target", &self.target)
            .field("open", &self.is_open())
            .finish()
    }
}
