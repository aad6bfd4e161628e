use minesweeper_common::{
    decoder::StreamDecoder,
    protocol::{ClientMessage, ServerMessage},
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::Result;

const READ_CHUNK: usize = 4096;

/// Read half of a connection: raw bytes in, decoded server messages out.
pub struct MessageStream {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    decoder: StreamDecoder,
}

impl MessageStream {
    /// Receive the next server message.
    /// Returns None if the connection is closed
    pub async fn receive_message(&mut self) -> Result<Option<ServerMessage>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(message) = self.decoder.next_message()? {
                return Ok(Some(message));
            }

            let read = self.reader.read(&mut chunk).await?;
            if read == 0 {
                if self.decoder.buffered() > 0 {
                    debug!(
                        "Connection closed with {} undecoded bytes",
                        self.decoder.buffered()
                    );
                }
                info!("Server closed the connection");
                return Ok(None);
            }
            self.decoder.push(&chunk[..read]);
        }
    }
}

/// Line-protocol connection to a minesweeper server
pub struct MinesweeperConnection {
    pub(crate) stream: MessageStream,
    pub(crate) sender: mpsc::UnboundedSender<ClientMessage>,
    pub(crate) writer_task: JoinHandle<()>,
}

impl MinesweeperConnection {
    /// Connect to a server at `host:port`
    pub async fn connect(address: &str) -> Result<Self> {
        info!("Connecting to {}", address);

        let stream = TcpStream::connect(address).await?;
        info!("Connected successfully");

        Ok(Self::from_stream(stream))
    }

    /// Wrap an already established byte stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, mut writer) = tokio::io::split(stream);

        // Create MPSC channel for sending commands
        let (sender, mut receiver) = mpsc::unbounded_channel::<ClientMessage>();

        // Spawn writer task that handles all outgoing commands
        let writer_task = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                let line = message.render();
                debug!("Sending command: {}", message);

                if let Err(e) = writer.write_all(line.as_bytes()).await {
                    warn!("Failed to send command: {}", e);
                    break;
                }
            }

            // Close the writer when done
            let _ = writer.shutdown().await;
        });

        Self {
            stream: MessageStream {
                reader: Box::new(reader),
                decoder: StreamDecoder::new(),
            },
            sender,
            writer_task,
        }
    }

    /// Get a cloneable sender for sending commands
    pub fn get_sender(&self) -> mpsc::UnboundedSender<ClientMessage> {
        self.sender.clone()
    }

    /// Queue a command for the server
    pub fn send_message(&self, message: ClientMessage) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| "Connection sender channel closed")?;
        Ok(())
    }

    /// Receive the next server message
    /// Returns None if the connection is closed
    pub async fn receive_message(&mut self) -> Result<Option<ServerMessage>> {
        self.stream.receive_message().await
    }

    /// Flush queued commands and close the connection
    pub async fn close(self) -> Result<()> {
        // Drop the sender to signal the writer task to close
        drop(self.sender);

        // Wait for the writer task to complete
        let _ = self.writer_task.await;

        Ok(())
    }
}
