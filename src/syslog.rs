use crate::error::{LoggingError, Result};
use std::io::{self, Write};
use std::net::{TcpStream, UdpSocket};

/// syslog 服务默认地址
pub const DEFAULT_SYSLOG_ADDR: &str = "localhost:514";

/// syslog 连接方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Udp,
    Tcp,
}

enum Connection {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

/// syslog 写入器
///
/// 构造时建立连接；调用 `disconnect` 之后，下一次写入会重新连接。
/// 每次 `write` 发送一个完整的 syslog 消息。
pub struct SyslogWriter {
    network: Network,
    addr: String,
    conn: Option<Connection>,
}

impl SyslogWriter {
    pub fn new(network: Network, addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let conn = connect(network, &addr)?;
        Ok(Self {
            network,
            addr,
            conn: Some(conn),
        })
    }

    /// 通过 UDP 连接本机 syslog 服务
    pub fn local() -> Result<Self> {
        Self::new(Network::Udp, DEFAULT_SYSLOG_ADDR)
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// 断开连接
    pub fn disconnect(&mut self) {
        if self.conn.take().is_some() {
            tracing::trace!(addr = %self.addr, "syslog disconnected");
        }
    }

    fn connection(&mut self) -> io::Result<&mut Connection> {
        if self.conn.is_none() {
            let conn = connect(self.network, &self.addr).map_err(|e| match e {
                LoggingError::Syslog { source, .. } => source,
                other => io::Error::other(other.to_string()),
            })?;
            self.conn = Some(conn);
        }

        self.conn
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }
}

fn connect(network: Network, addr: &str) -> Result<Connection> {
    let to_err = |source: io::Error| LoggingError::Syslog {
        addr: addr.to_string(),
        source,
    };

    let conn = match network {
        Network::Udp => {
            let socket = UdpSocket::bind("0.0.0.0:0").map_err(to_err)?;
            socket.connect(addr).map_err(to_err)?;
            Connection::Udp(socket)
        }
        Network::Tcp => Connection::Tcp(TcpStream::connect(addr).map_err(to_err)?),
    };

    tracing::debug!(addr, ?network, "syslog connected");
    Ok(conn)
}

impl Write for SyslogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = match self.connection()? {
            Connection::Udp(socket) => socket.send(buf),
            Connection::Tcp(stream) => stream.write_all(buf).map(|_| buf.len()),
        };

        // 出错后丢弃连接，下次写入时重连
        if result.is_err() {
            self.conn = None;
        }
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.conn {
            Some(Connection::Tcp(stream)) => stream.flush(),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_syslog_udp_write() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();

        let mut writer = SyslogWriter::new(Network::Udp, addr.clone()).unwrap();
        assert!(writer.is_connected());
        assert_eq!(writer.addr(), addr);

        writer.write_all(b"<14>1 hello").unwrap();

        let mut buf = [0u8; 64];
        let n = server.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"<14>1 hello");
    }

    #[test]
    fn test_syslog_reconnects_after_disconnect() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();

        let mut writer = SyslogWriter::new(Network::Udp, addr).unwrap();
        writer.disconnect();
        assert!(!writer.is_connected());

        writer.write_all(b"again").unwrap();
        assert!(writer.is_connected());

        let mut buf = [0u8; 16];
        let n = server.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"again");
    }

    #[test]
    fn test_syslog_tcp_connect_refused() {
        // 绑定后立即释放端口，使连接失败
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = SyslogWriter::new(Network::Tcp, addr).err().unwrap();
        assert!(matches!(err, LoggingError::Syslog { .. }));
    }
}
