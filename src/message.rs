//! In-memory representation of a single Syslog message.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset};

use crate::priority::{self, Facility, Severity};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Protocol {
    RFC3164,
    RFC5424(u32),
}

/// `ProcID`s are usually numeric PIDs; however, on some systems, they may be something else
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcId<'a> {
    PID(i32),
    Name(Cow<'a, str>),
}

impl<'a> From<&'a str> for ProcId<'a> {
    fn from(s: &'a str) -> ProcId<'a> {
        match s.parse() {
            Ok(pid) => ProcId::PID(pid),
            Err(_) => ProcId::Name(Cow::Borrowed(s)),
        }
    }
}

impl ProcId<'_> {
    pub fn into_owned(self) -> ProcId<'static> {
        match self {
            ProcId::PID(pid) => ProcId::PID(pid),
            ProcId::Name(name) => ProcId::Name(Cow::Owned(name.into_owned())),
        }
    }
}

/// One `[id key="value" ...]` block of RFC5424 structured data.
///
/// Param values are kept as they appear on the wire, escapes included.
#[derive(Clone, Debug, Eq)]
pub struct StructuredElement<'a> {
    pub id: Cow<'a, str>,
    pub params: Vec<(Cow<'a, str>, Cow<'a, str>)>,
}

impl StructuredElement<'_> {
    pub fn into_owned(self) -> StructuredElement<'static> {
        StructuredElement {
            id: Cow::Owned(self.id.into_owned()),
            params: self
                .params
                .into_iter()
                .map(|(k, v)| (Cow::Owned(k.into_owned()), Cow::Owned(v.into_owned())))
                .collect(),
        }
    }
}

/// Params compare without regard to order.
impl PartialEq for StructuredElement<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.id != other.id || self.params.len() != other.params.len() {
            return false;
        }

        let mut params1 = self.params.clone();
        params1.sort();

        let mut params2 = other.params.clone();
        params2.sort();

        params1 == params2
    }
}

/// A parsed syslog message, RFC3164 or RFC5424.
///
/// Text fields borrow from the input where possible. `msg` is the raw tail of
/// the input and is never decoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message<'a> {
    pub protocol: Protocol,
    pub priority: Option<u8>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub hostname: Option<Cow<'a, str>>,
    pub appname: Option<Cow<'a, str>>,
    pub procid: Option<ProcId<'a>>,
    pub msgid: Option<Cow<'a, str>>,
    pub structured_data: Vec<StructuredElement<'a>>,
    pub msg: Option<Cow<'a, [u8]>>,
}

impl Message<'_> {
    pub fn facility(&self) -> Option<Facility> {
        self.priority.and_then(priority::decode).map(|(f, _)| f)
    }

    pub fn severity(&self) -> Option<Severity> {
        self.priority.and_then(priority::decode).map(|(_, s)| s)
    }

    /// The message body as text, if it is valid UTF-8.
    pub fn msg_str(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .and_then(|msg| std::str::from_utf8(msg).ok())
    }

    /// Detach from the input buffer.
    pub fn into_owned(self) -> Message<'static> {
        Message {
            protocol: self.protocol,
            priority: self.priority,
            timestamp: self.timestamp,
            hostname: self.hostname.map(|s| Cow::Owned(s.into_owned())),
            appname: self.appname.map(|s| Cow::Owned(s.into_owned())),
            procid: self.procid.map(ProcId::into_owned),
            msgid: self.msgid.map(|s| Cow::Owned(s.into_owned())),
            structured_data: self
                .structured_data
                .into_iter()
                .map(StructuredElement::into_owned)
                .collect(),
            msg: self.msg.map(|m| Cow::Owned(m.into_owned())),
        }
    }
}

/// Read access to the fields every syslog flavour shares, for code that
/// reports or exports messages without caring how they were parsed.
pub trait Syslog {
    fn priority(&self) -> Option<u8>;
    fn facility(&self) -> Option<Facility>;
    fn severity(&self) -> Option<Severity>;
    fn timestamp(&self) -> Option<&DateTime<FixedOffset>>;
    fn hostname(&self) -> Option<&str>;
    fn appname(&self) -> Option<&str>;
    fn procid(&self) -> Option<&ProcId<'_>>;
    fn message(&self) -> Option<&[u8]>;
}

impl Syslog for Message<'_> {
    fn priority(&self) -> Option<u8> {
        self.priority
    }

    fn facility(&self) -> Option<Facility> {
        Message::facility(self)
    }

    fn severity(&self) -> Option<Severity> {
        Message::severity(self)
    }

    fn timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        self.timestamp.as_ref()
    }

    fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    fn appname(&self) -> Option<&str> {
        self.appname.as_deref()
    }

    fn procid(&self) -> Option<&ProcId<'_>> {
        self.procid.as_ref()
    }

    fn message(&self) -> Option<&[u8]> {
        self.msg.as_deref()
    }
}

/// Collects fields as a parser commits them.
///
/// Each field is set at most once and never cleared, so whatever the builder
/// holds when a parse fails is exactly the prefix that matched.
#[derive(Debug)]
pub(crate) struct MessageBuilder<'a> {
    message: Message<'a>,
}

macro_rules! set_once {
    ($name:ident, $field:ident, $ty:ty) => {
        #[inline]
        pub(crate) fn $name(&mut self, value: $ty) {
            debug_assert!(self.message.$field.is_none(), "{} set twice", stringify!($field));
            if self.message.$field.is_none() {
                self.message.$field = Some(value);
            }
        }
    };
}

impl<'a> MessageBuilder<'a> {
    pub(crate) fn new(protocol: Protocol) -> Self {
        Self {
            message: Message {
                protocol,
                priority: None,
                timestamp: None,
                hostname: None,
                appname: None,
                procid: None,
                msgid: None,
                structured_data: Vec::new(),
                msg: None,
            },
        }
    }

    /// The RFC5424 version is only known once the header is read.
    pub(crate) fn protocol(&mut self, protocol: Protocol) {
        self.message.protocol = protocol;
    }

    set_once!(priority, priority, u8);
    set_once!(timestamp, timestamp, DateTime<FixedOffset>);
    set_once!(hostname, hostname, Cow<'a, str>);
    set_once!(appname, appname, Cow<'a, str>);
    set_once!(procid, procid, ProcId<'a>);
    set_once!(msgid, msgid, Cow<'a, str>);
    set_once!(msg, msg, Cow<'a, [u8]>);

    pub(crate) fn structured_element(&mut self, element: StructuredElement<'a>) {
        self.message.structured_data.push(element);
    }

    /// A partial message is worth returning once its priority is known.
    pub(crate) fn is_valid(&self) -> bool {
        self.message.priority.is_some()
    }

    pub(crate) fn build(self) -> Message<'a> {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procid_from_str() {
        assert_eq!(ProcId::from("1234"), ProcId::PID(1234));
        assert_eq!(
            ProcId::from("worker-1"),
            ProcId::Name(Cow::Borrowed("worker-1"))
        );
    }

    #[test]
    fn derived_fields() {
        let mut builder = MessageBuilder::new(Protocol::RFC3164);
        assert!(!builder.is_valid());
        builder.priority(13);
        assert!(builder.is_valid());
        builder.msg(Cow::Borrowed(&b"Test"[..]));

        let msg = builder.build();
        assert_eq!(msg.facility(), Some(Facility::USER));
        assert_eq!(msg.severity(), Some(Severity::NOTICE));
        assert_eq!(msg.msg_str(), Some("Test"));
        assert_eq!(Syslog::message(&msg), Some(&b"Test"[..]));
    }

    #[test]
    fn no_priority_no_facility() {
        let msg = MessageBuilder::new(Protocol::RFC3164).build();
        assert_eq!(msg.facility(), None);
        assert_eq!(msg.severity(), None);
        assert_eq!(msg.msg_str(), None);
    }

    #[test]
    fn invalid_utf8_body_is_kept() {
        let mut builder = MessageBuilder::new(Protocol::RFC3164);
        builder.msg(Cow::Borrowed(&[0xff, 0xfe][..]));
        let msg = builder.build();
        assert_eq!(msg.msg_str(), None);
        assert_eq!(msg.msg.as_deref(), Some(&[0xff, 0xfe][..]));
    }

    #[test]
    fn structured_element_order_insensitive() {
        let a = StructuredElement {
            id: "meta".into(),
            params: vec![("a".into(), "1".into()), ("b".into(), "2".into())],
        };
        let b = StructuredElement {
            id: "meta".into(),
            params: vec![("b".into(), "2".into()), ("a".into(), "1".into())],
        };
        assert_eq!(a, b);
        assert_eq!(a.clone().into_owned(), b);
    }

    #[test]
    fn into_owned_keeps_fields() {
        let mut builder = MessageBuilder::new(Protocol::RFC5424(1));
        builder.priority(165);
        builder.hostname(Cow::Borrowed("host"));
        builder.procid(ProcId::from("sshd"));
        let msg = builder.build();
        let owned = msg.clone().into_owned();
        assert_eq!(owned, msg);
        assert_eq!(Syslog::hostname(&owned), Some("host"));
    }
}
