//! Scripted IRC server.
//!
//! Accepts bot connections on an ephemeral loopback port and lets a test
//! read the lines the bot sends and write server lines back.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Listening side.
pub struct FakeIrcd {
    listener: TcpListener,
}

impl FakeIrcd {
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    pub fn port(&self) -> u16 {
        self.listener
            .local_addr()
            .map(|a| a.port())
            .unwrap_or_default()
    }

    /// Wait for the bot to connect.
    pub async fn accept(&self) -> anyhow::Result<IrcdPeer> {
        let (stream, _) = timeout(RECV_TIMEOUT, self.listener.accept()).await??;
        let (read_half, write_half) = stream.into_split();
        Ok(IrcdPeer {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }
}

/// One accepted bot connection.
pub struct IrcdPeer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl IrcdPeer {
    /// Next line from the bot, without its terminator.
    pub async fn recv_line(&mut self) -> anyhow::Result<String> {
        self.recv_line_timeout(RECV_TIMEOUT).await
    }

    pub async fn recv_line_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("bot closed the connection");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read until a line equal to `expected` arrives; returns everything
    /// skipped on the way.
    pub async fn expect(&mut self, expected: &str) -> anyhow::Result<Vec<String>> {
        let mut skipped = Vec::new();
        loop {
            let line = self.recv_line().await?;
            if line == expected {
                return Ok(skipped);
            }
            skipped.push(line);
        }
    }

    /// True once the bot has closed its side.
    pub async fn wait_closed(&mut self) -> anyhow::Result<()> {
        loop {
            let mut line = String::new();
            if timeout(RECV_TIMEOUT, self.reader.read_line(&mut line)).await?? == 0 {
                return Ok(());
            }
        }
    }

    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Complete a plain registration: expect NICK and USER, answer with
    /// 001 and the user mode line.
    pub async fn register(&mut self, nick: &str) -> anyhow::Result<()> {
        self.expect(&format!("NICK {nick}")).await?;
        let user = self.recv_line().await?;
        anyhow::ensure!(user.starts_with("USER "), "expected USER, got {user}");
        self.send_line(&format!(":irc.test 001 {nick} :Welcome")).await?;
        self.send_line(&format!(":{nick} MODE {nick} :+i")).await
    }
}
