//! Tokio implementation of the readiness probe's TCP ports.

use std::io;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::application::ports::{BannerStream, PortDialer};

/// Dials real TCP sockets. Timeouts are applied by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDialer;

/// Open probe connection. The socket closes when this is dropped.
#[derive(Debug)]
pub struct TcpConn {
    stream: TcpStream,
}

impl PortDialer for TokioDialer {
    type Conn = TcpConn;

    async fn connect(&self, host: &str, port: u16) -> io::Result<TcpConn> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(TcpConn { stream })
    }
}

impl BannerStream for TcpConn {
    async fn read_banner(&mut self) -> io::Result<usize> {
        let mut buf = [0u8; 256];
        self.stream.read(&mut buf).await
    }
}
