// src/exec/pump.rs

//! Background line reader for one child output stream.
//!
//! A [`StreamPump`] owns a Tokio task that reads the stream until EOF and
//! pushes every line into an unbounded channel. The relay loop only ever
//! calls [`StreamPump::try_pop`], so it never waits on the child.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Non-blocking pull interface over a blocking, line-oriented stream.
///
/// Lines come out in exactly the order they were read. Each line keeps its
/// trailing `\n` (a final unterminated line is delivered as-is). Invalid
/// UTF-8 is replaced with U+FFFD rather than ending the stream.
#[derive(Debug)]
pub struct StreamPump {
    lines: mpsc::UnboundedReceiver<String>,
    handle: JoinHandle<()>,
}

impl StreamPump {
    /// Start pumping `stream` on a background task.
    ///
    /// Must be called from within a Tokio runtime. `label` only shows up in
    /// logs (e.g. `"solution stdout"`).
    pub fn start<R>(stream: R, label: impl Into<String>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, lines) = mpsc::unbounded_channel();
        let label = label.into();
        let handle = tokio::spawn(read_loop(stream, tx, label));
        Self { lines, handle }
    }

    /// Oldest queued line, or `None` if nothing is queued right now.
    pub fn try_pop(&mut self) -> Option<String> {
        self.lines.try_recv().ok()
    }

    /// True until the reader has seen the end of the stream.
    ///
    /// Once this returns false it stays false; any lines read before EOF are
    /// still available through [`try_pop`](Self::try_pop).
    pub fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for StreamPump {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read_loop<R>(stream: R, tx: mpsc::UnboundedSender<String>, label: String)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).into_owned();
                trace!(stream = %label, line = %line.trim_end(), "pumped line");
                if tx.send(line).is_err() {
                    // Receiver dropped: nobody will ever read this stream again.
                    break;
                }
            }
            Err(e) => {
                debug!(stream = %label, error = %e, "read error; treating as end of stream");
                break;
            }
        }
    }

    debug!(stream = %label, "stream closed; pump finished");
}
