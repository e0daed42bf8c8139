//! Parsers for syslog messages and octet-counted syslog streams.
//!
//! * [`rfc3164`]: the older [RFC 3164](https://tools.ietf.org/html/rfc3164)
//!   BSD syslog format, with optional best-effort recovery, optional PRI and
//!   RFC3339 timestamps.
//! * [`rfc5424`]: [RFC 5424](https://tools.ietf.org/html/rfc5424) messages,
//!   including Structured Data.
//! * [`rfc5425`]: `MSGLEN SP SYSLOG-MSG` framing, with any of the above as
//!   the inner parser.
//!
//! Every parser works on raw bytes and reports failures with the byte offset
//! at which the input stopped matching.
//!
//! # Example
//!
//! A simple syslog server
//!
//! ```no_run
//! use std::net::UdpSocket;
//!
//! use syslog_ingest::rfc3164::Rfc3164Parser;
//! use syslog_ingest::Parser;
//!
//! let parser = Rfc3164Parser::new().best_effort();
//! let s = UdpSocket::bind("127.0.0.1:10514").unwrap();
//! let mut buf = [0u8; 2048];
//! loop {
//!     let (data_read, _) = s.recv_from(&mut buf).unwrap();
//!     match parser.parse(&buf[..data_read]) {
//!         Ok(msg) => println!("{:?} {:?} {:?}", msg.facility(), msg.hostname, msg.msg_str()),
//!         Err(err) => eprintln!("{err}"),
//!     }
//! }
//! ```
//!
//! Reading frames from a TCP or TLS connection:
//!
//! ```no_run
//! use std::io::BufReader;
//! use std::net::TcpStream;
//!
//! use syslog_ingest::rfc5424::Rfc5424Parser;
//! use syslog_ingest::rfc5425::FrameParser;
//!
//! let stream = TcpStream::connect("127.0.0.1:6514").unwrap();
//! for result in FrameParser::new(BufReader::new(stream), Rfc5424Parser::new()) {
//!     match result {
//!         Ok(msg) => println!("{:?}", msg.appname),
//!         Err(err) => eprintln!("{err}"),
//!     }
//! }
//! ```

mod cursor;
mod error;
mod message;
mod parser;
mod priority;
pub mod rfc3164;
pub mod rfc5424;
pub mod rfc5425;
pub mod scanner;
pub mod timestamp;

pub use error::{
    Error, InvalidCode, ParseError, ParseResult, TimestampError, TimestampFormat,
};
pub use message::{Message, ProcId, Protocol, StructuredElement, Syslog};
pub use parser::Parser;
pub use priority::{decode as decode_priority, Facility, Severity, MAX_PRIORITY};
pub use timestamp::{CurrentYear, FixedYear, Timezone, YearOffset, YearOperator};
