use std::io::{BufReader, Cursor, Read};

use syslog_ingest::rfc3164::Rfc3164Parser;
use syslog_ingest::rfc5424::Rfc5424Parser;
use syslog_ingest::rfc5425::{parse_stream, FrameParser};
use syslog_ingest::scanner::TokenKind;
use syslog_ingest::{Error, FixedYear, Parser, ProcId};

fn frame(msg: &str) -> String {
    format!("{} {}", msg.len(), msg)
}

#[test]
fn counts_multibyte_body_by_octets() {
    let input = "23 <1>1 - - - - - - hellø";

    let messages: Vec<_> = FrameParser::new(input.as_bytes(), Rfc5424Parser::new()).collect();
    assert_eq!(messages.len(), 1);
    let msg = messages[0].as_ref().unwrap();
    assert_eq!(msg.priority, Some(1));
    assert_eq!(msg.msg_str(), Some("hellø"));
}

#[test]
fn many_frames() {
    let bodies = [
        "<34>1 2003-10-11T22:14:15.003Z mymachine.example.com su - ID47 - 'su root' failed",
        "<165>1 2003-10-11T22:14:15.003Z host evntslog - ID47 [exampleSDID@32473 iut=\"3\"] entry",
        "<13>1 - - app 42 - - ünïcødé",
    ];
    let input: String = bodies.iter().map(|b| frame(b)).collect();

    let messages = FrameParser::new(input.as_bytes(), Rfc5424Parser::new())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].appname.as_deref(), Some("su"));
    assert_eq!(messages[1].structured_data.len(), 1);
    assert_eq!(messages[2].procid, Some(ProcId::PID(42)));
    assert_eq!(messages[2].msg_str(), Some("ünïcødé"));
}

#[test]
fn rfc3164_inner_parser() {
    let input = frame("<13>Dec  2 16:31:03 host app[7]: Test") + &frame("<14>Dec  2 16:31:04 host app[7]: Again");
    let parser = Rfc3164Parser::new().with_year(FixedYear(2023));

    let messages = FrameParser::new(input.as_bytes(), parser)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].msg_str(), Some("Test"));
    assert_eq!(messages[1].priority, Some(14));
}

#[test]
fn inner_errors_do_not_stop_the_stream() {
    let input = frame("<999>1 - - - - - -") + &frame("<1>1 - - - - - - ok");

    let results: Vec<_> = FrameParser::new(input.as_bytes(), Rfc5424Parser::new()).collect();
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0].as_ref().unwrap_err().error(),
        Error::PriValueOutOfRange(3)
    ));
    assert_eq!(results[1].as_ref().unwrap().msg_str(), Some("ok"));
}

#[test]
fn best_effort_partial_survives_the_frame() {
    let input = frame("<13>Dec  2 16:31:03 -");
    let parser = Rfc3164Parser::new()
        .with_year(FixedYear(2023))
        .best_effort();

    let mut results = FrameParser::new(input.as_bytes(), parser);
    let err = results.next().unwrap().unwrap_err();
    assert!(matches!(err.error(), Error::HostnameInvalid(21)));
    assert_eq!(err.partial().unwrap().priority, Some(13));
    assert!(results.next().is_none());
}

#[test]
fn token_error_aborts_the_stream() {
    let input = frame("<1>1 - - - - - - one") + "x" + &frame("<1>1 - - - - - - two");

    let results: Vec<_> = FrameParser::new(input.as_bytes(), Rfc5424Parser::new()).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1].as_ref().unwrap_err().error(),
        Error::FrameTokenMismatch {
            offset: 23,
            expected: TokenKind::MsgLen,
            found: TokenKind::Illegal
        }
    ));
}

#[test]
fn resync_recovers_the_next_frame() {
    let input = frame("<1>1 - - - - - - one") + "\r\n" + &frame("<1>1 - - - - - - two");

    let results: Vec<_> = FrameParser::new(input.as_bytes(), Rfc5424Parser::new())
        .with_resync(true)
        .collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().msg_str(), Some("one"));
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().msg_str(), Some("two"));
}

#[test]
fn truncated_stream() {
    let input = frame("<1>1 - - - - - - one") + "40 <1>1 - -";

    let results: Vec<_> = FrameParser::new(input.as_bytes(), Rfc5424Parser::new())
        .with_resync(true)
        .collect();
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[1].as_ref().unwrap_err().error(),
        Error::FrameIncomplete {
            expected: 40,
            got: 8
        }
    ));
}

#[test]
fn max_length() {
    let input = frame("<1>1 - - - - - - short") + &frame(&format!("<1>1 - - - - - - {}", "x".repeat(200)));

    let results: Vec<_> = FrameParser::new(input.as_bytes(), Rfc5424Parser::new())
        .with_max_length(128)
        .collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1].as_ref().unwrap_err().error(),
        Error::FrameTooLarge {
            length: 217,
            max: 128
        }
    ));
}

#[test]
fn resync_never_reads_inside_a_rejected_frame() {
    let body = format!("<1>1 - - - - - - {} 16 <1>1 - - - - - -", "x".repeat(149));
    assert_eq!(body.len(), 186);
    let input = frame(&body) + &frame("<1>1 - - - - - - after");

    let results: Vec<_> = FrameParser::new(input.as_bytes(), Rfc5424Parser::new())
        .with_max_length(64)
        .with_resync(true)
        .collect();
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0].as_ref().unwrap_err().error(),
        Error::FrameTooLarge {
            length: 186,
            max: 64
        }
    ));
    let msg = results[1].as_ref().unwrap();
    assert_eq!(msg.msg_str(), Some("after"));
}

/// Hands out at most `n` bytes per read, so frames straddle buffer refills.
struct Trickle<R> {
    inner: R,
    n: usize,
}

impl<R: Read> Read for Trickle<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.n);
        self.inner.read(&mut buf[..n])
    }
}

#[test]
fn frames_across_small_reads() {
    let input = frame("<13>1 - host app - - - ¡hola!") + &frame("<13>1 - host app - - - adiós");
    let reader = BufReader::with_capacity(
        4,
        Trickle {
            inner: Cursor::new(input.into_bytes()),
            n: 3,
        },
    );

    let messages = FrameParser::new(reader, Rfc5424Parser::new())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].msg_str(), Some("¡hola!"));
    assert_eq!(messages[1].msg_str(), Some("adiós"));
}

#[test]
fn push_callback() {
    let input = frame("<1>1 - - - - - - one") + &frame("<1>1 - - - - - - two") + "0";

    let mut seen = Vec::new();
    parse_stream(input.as_bytes(), Rfc5424Parser::new(), |result| {
        seen.push(match result {
            Ok(msg) => msg.msg_str().unwrap_or_default().to_owned(),
            Err(err) => err.to_string(),
        });
    });

    assert_eq!(
        seen,
        vec![
            "one".to_owned(),
            "two".to_owned(),
            "expecting MSGLEN but got ILLEGAL at stream offset 46".to_owned(),
        ]
    );
}

#[test]
fn boxed_inner_parser() {
    let parser: Box<dyn Parser> = Box::new(Rfc5424Parser::new().best_effort());
    let input = frame("<1>1 - - - - - - boxed");

    let messages: Vec<_> = FrameParser::new(input.as_bytes(), parser).collect();
    assert_eq!(messages[0].as_ref().unwrap().msg_str(), Some("boxed"));
}
