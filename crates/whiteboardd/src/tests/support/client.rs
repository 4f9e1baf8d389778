//! Socket client speaking the broker's JSON-lines framing.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::protocol::{Message, MessageKind};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A participant connected over TCP.
pub struct Participant {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
    next_serial: u32,
}

impl Participant {
    /// Connects to the broker at `address`.
    #[must_use]
    pub fn connect(address: SocketAddr) -> Self {
        let stream = TcpStream::connect(address).expect("connect to broker");
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .expect("set read timeout");
        let reader = BufReader::new(stream.try_clone().expect("clone stream"));
        Self {
            writer: stream,
            reader,
            next_serial: 1,
        }
    }

    /// Writes `message`, assigning a serial when it has none; returns the
    /// serial used.
    pub fn send(&mut self, mut message: Message) -> u32 {
        if message.serial == 0 {
            message.serial = self.next_serial;
            self.next_serial += 1;
        }
        let mut line = serde_json::to_vec(&message).expect("encode message");
        line.push(b'\n');
        self.writer.write_all(&line).expect("write frame");
        self.writer.flush().expect("flush frame");
        message.serial
    }

    /// Reads the next message from the broker.
    pub fn receive(&mut self) -> Message {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).expect("read frame");
        assert!(read > 0, "broker closed the connection");
        serde_json::from_str(&line).expect("decode frame")
    }

    /// Sends a call and reads until its return arrives. Other traffic read
    /// on the way is discarded.
    pub fn call(&mut self, message: Message) -> Message {
        let serial = self.send(message);
        loop {
            let reply = self.receive();
            if matches!(reply.kind, MessageKind::Return | MessageKind::Error)
                && reply.reply_serial == Some(serial)
            {
                return reply;
            }
        }
    }
}
