use crate::error::ParseResult;

/// Something that turns one complete syslog message into a [`Message`].
///
/// Implementations keep no state between calls, so one instance can parse
/// any number of messages, and the frame parser can hand it one frame body
/// at a time.
///
/// [`Message`]: crate::Message
pub trait Parser {
    fn parse<'a>(&self, input: &'a [u8]) -> ParseResult<'a>;
}

impl<P: Parser + ?Sized> Parser for &P {
    fn parse<'a>(&self, input: &'a [u8]) -> ParseResult<'a> {
        (**self).parse(input)
    }
}

impl<P: Parser + ?Sized> Parser for Box<P> {
    fn parse<'a>(&self, input: &'a [u8]) -> ParseResult<'a> {
        (**self).parse(input)
    }
}
