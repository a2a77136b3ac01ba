//! Byte sources for a streamed response.
//!
//! A [`Transport`] yields raw chunks until it reports end of stream with
//! `Ok(None)`. Consumers take it by value, so a response body can only be
//! read once; reading it again means issuing the request again.

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

pub const DEFAULT_CHUNK_SIZE: usize = 4096;
/// Largest read buffer a [`ReaderTransport`] will allocate (1 MiB).
pub const MAX_CHUNK_SIZE: usize = 1 << 20;

#[derive(Debug)]
pub enum TransportError {
    /// The request could not be sent or the connection broke mid-body.
    Network(reqwest::Error),
    /// The server answered with a non-success status.
    Status { status: u16, message: Option<String> },
    /// Reading from a local source failed.
    Io(std::io::Error),
    /// The stream was closed from outside before it finished.
    Closed,
}

impl TransportError {
    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(err) => write!(f, "network error: {err}"),
            TransportError::Status {
                status,
                message: Some(message),
            } => write!(f, "server returned {status}: {message}"),
            TransportError::Status {
                status,
                message: None,
            } => write!(f, "server returned {status}"),
            TransportError::Io(err) => write!(f, "read error: {err}"),
            TransportError::Closed => write!(f, "stream closed before completion"),
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TransportError::Network(err) => Some(err),
            TransportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

#[async_trait]
pub trait Transport: Send {
    /// Next chunk of the body, `Ok(None)` at end of stream.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

/// Replays a fixed sequence of chunks and failures.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    steps: VecDeque<Result<Vec<u8>, TransportError>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Result<Vec<u8>, TransportError>>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    /// Chunks that all succeed, then end of stream.
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self::new(chunks.into_iter().map(|c| Ok(c.into())).collect())
    }

    /// Split `text` into pieces of at most `size` bytes, ignoring character
    /// boundaries the way a network would.
    pub fn split_bytes(text: &str, size: usize) -> Self {
        let size = size.max(1);
        Self::from_chunks(text.as_bytes().chunks(size).map(<[u8]>::to_vec))
    }

    pub fn then_fail(mut self, err: TransportError) -> Self {
        self.steps.push_back(Err(err));
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        match self.steps.pop_front() {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(err)) => {
                // A failed transport stays failed.
                self.steps.clear();
                Err(err)
            }
            None => Ok(None),
        }
    }
}

/// Reads fixed-size chunks from any async reader (a file, stdin, a socket).
pub struct ReaderTransport<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R> ReaderTransport<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// `chunk_size` is clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0; chunk_size.clamp(1, MAX_CHUNK_SIZE)],
            done: false,
        }
    }
}

#[async_trait]
impl<R> Transport for ReaderTransport<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.done {
            return Ok(None);
        }
        let read = self.reader.read(&mut self.buf).await?;
        if read == 0 {
            self.done = true;
            return Ok(None);
        }
        Ok(Some(self.buf[..read].to_vec()))
    }
}
