//! Bounds-checked DER/BER primitive reader and a minimal DER writer.
//!
//! A [`Reader`] is a cursor over the *whole* input buffer with an upper
//! bound (`max_index`). Nested readers returned by [`Reader::read_sequence`]
//! share the same buffer with a narrower bound, so every offset reported by
//! the decoder is an absolute offset into the original input.
//!
//! Every read either advances past one well-formed element or fails and
//! leaves the cursor where it was.

use crate::{Error, Result};

/// Universal and context tag bytes used by the decoders.
pub mod tag {
    pub const BOOLEAN: u8 = 0x01;
    pub const INTEGER: u8 = 0x02;
    pub const BIT_STRING: u8 = 0x03;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OID: u8 = 0x06;
    pub const ENUMERATED: u8 = 0x0a;
    pub const UTF8_STRING: u8 = 0x0c;
    pub const NUMERIC_STRING: u8 = 0x12;
    pub const PRINTABLE_STRING: u8 = 0x13;
    pub const T61_STRING: u8 = 0x14;
    pub const IA5_STRING: u8 = 0x16;
    pub const UTC_TIME: u8 = 0x17;
    pub const GENERALIZED_TIME: u8 = 0x18;
    pub const VISIBLE_STRING: u8 = 0x1a;
    pub const UNIVERSAL_STRING: u8 = 0x1c;
    pub const BMP_STRING: u8 = 0x1e;
    pub const SEQUENCE: u8 = 0x30;
    pub const SET: u8 = 0x31;

    /// Primitive context-specific tag `[n]`.
    pub const fn context(n: u8) -> u8 {
        0x80 | n
    }

    /// Constructed context-specific tag `[n]`, as used for EXPLICIT tagging.
    pub const fn explicit(n: u8) -> u8 {
        0xa0 | n
    }
}

/// Longest long-form length we accept (lengths up to 4 GiB).
const MAX_LENGTH_OCTETS: usize = 4;

/// Cursor over a DER buffer, bounded by `max_index`.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

/// One complete TLV element located in the source buffer.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    data: &'a [u8],
    /// Tag byte.
    pub tag: u8,
    /// Offset of the tag byte.
    pub start: usize,
    /// Offset of the first content byte.
    pub content_start: usize,
    /// Offset one past the last content byte.
    pub end: usize,
}

impl<'a> Element<'a> {
    /// The whole TLV (tag, length and content).
    pub fn raw(&self) -> &'a [u8] {
        self.data.get(self.start..self.end).unwrap_or_default()
    }

    /// Content octets only.
    pub fn content(&self) -> &'a [u8] {
        self.data
            .get(self.content_start..self.end)
            .unwrap_or_default()
    }

    /// A reader positioned on the content octets.
    pub fn reader(&self) -> Reader<'a> {
        Reader {
            data: self.data,
            pos: self.content_start,
            end: self.end,
        }
    }

    /// Whether the constructed bit is set.
    pub fn is_constructed(&self) -> bool {
        self.tag & 0x20 != 0
    }
}

/// Decoded BIT STRING.
#[derive(Debug, Clone, Copy)]
pub struct BitString<'a> {
    /// Number of unused bits in the last content byte (0-7).
    pub unused_bits: u8,
    /// Content bytes after the unused-bits octet.
    pub bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Reader over the entire buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Reader {
            data,
            pos: 0,
            end: data.len(),
        }
    }

    /// Current absolute offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Offset one past the last byte this reader may consume.
    pub fn max_index(&self) -> usize {
        self.end
    }

    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Tag byte at the cursor, if any.
    pub fn peek_tag(&self) -> Option<u8> {
        if self.pos < self.end {
            self.data.get(self.pos).copied()
        } else {
            None
        }
    }

    fn byte_at(&self, offset: usize) -> Result<u8> {
        if offset >= self.end {
            return Err(Error::BufferTooShort { offset });
        }
        self.data
            .get(offset)
            .copied()
            .ok_or(Error::BufferTooShort { offset })
    }

    /// Read a length at the cursor (short or long form).
    ///
    /// Fails with [`Error::BufferTooShort`] when the declared length runs
    /// past `max_index`, and with [`Error::InvalidLength`] for the indefinite
    /// form or lengths wider than four octets.
    pub fn read_length(&mut self) -> Result<usize> {
        let start = self.pos;
        let first = self.byte_at(start)?;
        let mut cur = start + 1;
        let len = if first < 0x80 {
            usize::from(first)
        } else {
            let count = usize::from(first & 0x7f);
            if count == 0 || count > MAX_LENGTH_OCTETS {
                return Err(Error::InvalidLength { offset: start });
            }
            let mut len = 0usize;
            for _ in 0..count {
                len = (len << 8) | usize::from(self.byte_at(cur)?);
                cur += 1;
            }
            len
        };
        if len > self.end.saturating_sub(cur) {
            return Err(Error::BufferTooShort { offset: cur });
        }
        self.pos = cur;
        Ok(len)
    }

    /// Read any tag and its length.
    pub fn read_header(&mut self) -> Result<(u8, usize)> {
        let found = self.byte_at(self.pos)?;
        let mut probe = *self;
        probe.pos += 1;
        let len = probe.read_length()?;
        *self = probe;
        Ok((found, len))
    }

    /// Require `expected` at the cursor and return the element length.
    pub fn read_tagged_header(&mut self, expected: u8) -> Result<usize> {
        let found = self.byte_at(self.pos)?;
        if found != expected {
            return Err(Error::UnexpectedTag {
                expected,
                found,
                offset: self.pos,
            });
        }
        self.read_header().map(|(_, len)| len)
    }

    /// Read one whole element whatever its tag.
    pub fn read_element(&mut self) -> Result<Element<'a>> {
        let start = self.pos;
        let mut probe = *self;
        let (tag, len) = probe.read_header()?;
        let content_start = probe.pos;
        probe.pos += len;
        *self = probe;
        Ok(Element {
            data: self.data,
            tag,
            start,
            content_start,
            end: content_start + len,
        })
    }

    /// Read one element that must carry `expected`.
    pub fn read_expected(&mut self, expected: u8) -> Result<Element<'a>> {
        let found = self.byte_at(self.pos)?;
        if found != expected {
            return Err(Error::UnexpectedTag {
                expected,
                found,
                offset: self.pos,
            });
        }
        self.read_element()
    }

    /// Read an element tagged `expected` if it is next, otherwise leave the
    /// cursor untouched.
    pub fn read_optional(&mut self, expected: u8) -> Result<Option<Element<'a>>> {
        if self.peek_tag() == Some(expected) {
            self.read_element().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Content octets of an element tagged `expected`.
    pub fn read_content(&mut self, expected: u8) -> Result<&'a [u8]> {
        self.read_expected(expected).map(|el| el.content())
    }

    /// Skip the next element.
    pub fn skip(&mut self) -> Result<()> {
        self.read_element().map(|_| ())
    }

    /// Read a non-negative INTEGER and return its magnitude.
    ///
    /// A single 0x00 pad byte is stripped when the following byte has its
    /// high bit set; a pad in front of a byte without the high bit is
    /// non-minimal and rejected, as is a negative value or empty content.
    /// The value zero is returned as the single byte `[0x00]`.
    pub fn read_integer(&mut self) -> Result<&'a [u8]> {
        let offset = self.pos;
        let mut probe = *self;
        let content = probe.read_content(tag::INTEGER)?;
        let value = match content {
            [] => return Err(Error::MalformedInteger { offset }),
            [0x00] => content,
            [0x00, rest @ ..] => {
                if rest.first().is_some_and(|b| b & 0x80 != 0) {
                    rest
                } else {
                    return Err(Error::MalformedInteger { offset });
                }
            }
            [first, ..] if first & 0x80 != 0 => {
                return Err(Error::MalformedInteger { offset });
            }
            _ => content,
        };
        *self = probe;
        Ok(value)
    }

    /// Read a small non-negative INTEGER (at most four magnitude bytes).
    pub fn read_small_integer(&mut self) -> Result<u32> {
        let offset = self.pos;
        let mut probe = *self;
        let bytes = probe.read_integer()?;
        let value = fold_u32(bytes).ok_or(Error::MalformedInteger { offset })?;
        *self = probe;
        Ok(value)
    }

    /// Read an ENUMERATED value (at most four bytes).
    pub fn read_enumerated(&mut self) -> Result<u32> {
        let offset = self.pos;
        let mut probe = *self;
        let bytes = probe.read_content(tag::ENUMERATED)?;
        if bytes.is_empty() {
            return Err(Error::MalformedInteger { offset });
        }
        let value = fold_u32(bytes).ok_or(Error::MalformedInteger { offset })?;
        *self = probe;
        Ok(value)
    }

    /// Read a BOOLEAN. Any non-zero octet is true, as BER allows.
    pub fn read_boolean(&mut self) -> Result<bool> {
        let mut probe = *self;
        match probe.read_content(tag::BOOLEAN)? {
            [value] => {
                *self = probe;
                Ok(*value != 0)
            }
            _ => Err(Error::Malformed("BOOLEAN")),
        }
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        let mut probe = *self;
        if !probe.read_content(tag::NULL)?.is_empty() {
            return Err(Error::Malformed("NULL"));
        }
        *self = probe;
        Ok(())
    }

    /// Read a BIT STRING, validating the unused-bits octet and that the
    /// unused low bits of the last byte are zero.
    pub fn read_bit_string(&mut self, expect_zero_unused: bool) -> Result<BitString<'a>> {
        let offset = self.pos;
        let mut probe = *self;
        let content = probe.read_content(tag::BIT_STRING)?;
        let (&unused_bits, bytes) = content
            .split_first()
            .ok_or(Error::MalformedBitString { offset })?;
        if unused_bits > 7
            || (expect_zero_unused && unused_bits != 0)
            || (bytes.is_empty() && unused_bits != 0)
        {
            return Err(Error::MalformedBitString { offset });
        }
        if let Some(&last) = bytes.last() {
            let mask = (1u8 << unused_bits) - 1;
            if last & mask != 0 {
                return Err(Error::MalformedBitString { offset });
            }
        }
        *self = probe;
        Ok(BitString { unused_bits, bytes })
    }

    pub fn read_octet_string(&mut self) -> Result<&'a [u8]> {
        self.read_content(tag::OCTET_STRING)
    }

    /// Read an OBJECT IDENTIFIER and return its raw content bytes.
    pub fn read_object_id(&mut self) -> Result<&'a [u8]> {
        let mut probe = *self;
        let content = probe.read_content(tag::OID)?;
        match content.last() {
            Some(last) if last & 0x80 == 0 => {
                *self = probe;
                Ok(content)
            }
            _ => Err(Error::Malformed("OBJECT IDENTIFIER")),
        }
    }

    /// Read a SEQUENCE and return a reader bounded to its content.
    pub fn read_sequence(&mut self) -> Result<Reader<'a>> {
        self.read_expected(tag::SEQUENCE).map(|el| el.reader())
    }

    /// Read a SET and return a reader bounded to its content.
    pub fn read_set(&mut self) -> Result<Reader<'a>> {
        self.read_expected(tag::SET).map(|el| el.reader())
    }

    /// Read an EXPLICIT `[n]` wrapper and return a reader over its content.
    pub fn read_explicit(&mut self, n: u8) -> Result<Reader<'a>> {
        self.read_expected(tag::explicit(n)).map(|el| el.reader())
    }

    /// Fail unless every byte up to `max_index` has been consumed.
    pub fn finish(&self, what: &'static str) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::TrailingData(what))
        }
    }
}

fn fold_u32(bytes: &[u8]) -> Option<u32> {
    if bytes.len() > 4 {
        return None;
    }
    Some(bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
}

/// Encode a DER length, short form below 128 and minimal long form above.
pub fn encode_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = bytes.get(skip..).unwrap_or_default();
    let mut out = Vec::with_capacity(significant.len() + 1);
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
    out
}

/// Append-only DER writer used for OCSP requests and test fixtures.
///
/// Constructed values are written through closures so nesting in the code
/// mirrors nesting in the ASN.1.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Append pre-encoded bytes verbatim.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append one primitive element.
    pub fn element(&mut self, tag: u8, content: &[u8]) -> &mut Self {
        self.buf.push(tag);
        self.buf.extend_from_slice(&encode_length(content.len()));
        self.buf.extend_from_slice(content);
        self
    }

    /// Append a constructed element whose content is produced by `f`.
    pub fn constructed(&mut self, tag: u8, f: impl FnOnce(&mut Writer)) -> &mut Self {
        let mut inner = Writer::new();
        f(&mut inner);
        self.element(tag, &inner.buf)
    }

    pub fn sequence(&mut self, f: impl FnOnce(&mut Writer)) -> &mut Self {
        self.constructed(tag::SEQUENCE, f)
    }

    pub fn set(&mut self, f: impl FnOnce(&mut Writer)) -> &mut Self {
        self.constructed(tag::SET, f)
    }

    /// EXPLICIT `[n]` wrapper.
    pub fn explicit(&mut self, n: u8, f: impl FnOnce(&mut Writer)) -> &mut Self {
        self.constructed(tag::explicit(n), f)
    }

    /// Non-negative INTEGER from a big-endian magnitude; leading zeros are
    /// dropped and a pad byte added when the high bit is set.
    pub fn integer(&mut self, magnitude: &[u8]) -> &mut Self {
        let skip = magnitude.iter().take_while(|b| **b == 0).count();
        let significant = magnitude.get(skip..).unwrap_or_default();
        let mut content = Vec::with_capacity(significant.len() + 1);
        match significant.first() {
            None => content.push(0),
            Some(b) if b & 0x80 != 0 => content.push(0),
            Some(_) => {}
        }
        content.extend_from_slice(significant);
        self.element(tag::INTEGER, &content)
    }

    pub fn small_integer(&mut self, value: u64) -> &mut Self {
        self.integer(&value.to_be_bytes())
    }

    pub fn boolean(&mut self, value: bool) -> &mut Self {
        self.element(tag::BOOLEAN, &[if value { 0xff } else { 0x00 }])
    }

    pub fn null(&mut self) -> &mut Self {
        self.element(tag::NULL, &[])
    }

    /// OBJECT IDENTIFIER from its content bytes.
    pub fn oid(&mut self, der: &[u8]) -> &mut Self {
        self.element(tag::OID, der)
    }

    pub fn octet_string(&mut self, bytes: &[u8]) -> &mut Self {
        self.element(tag::OCTET_STRING, bytes)
    }

    /// BIT STRING with zero unused bits.
    pub fn bit_string(&mut self, bytes: &[u8]) -> &mut Self {
        let mut content = Vec::with_capacity(bytes.len() + 1);
        content.push(0);
        content.extend_from_slice(bytes);
        self.element(tag::BIT_STRING, &content)
    }

    pub fn utf8_string(&mut self, value: &str) -> &mut Self {
        self.element(tag::UTF8_STRING, value.as_bytes())
    }

    pub fn printable_string(&mut self, value: &str) -> &mut Self {
        self.element(tag::PRINTABLE_STRING, value.as_bytes())
    }

    pub fn ia5_string(&mut self, value: &str) -> &mut Self {
        self.element(tag::IA5_STRING, value.as_bytes())
    }

    /// UTCTime from its `YYMMDDHHMMSSZ` text.
    pub fn utc_time(&mut self, value: &str) -> &mut Self {
        self.element(tag::UTC_TIME, value.as_bytes())
    }

    /// GeneralizedTime from its `YYYYMMDDHHMMSSZ` text.
    pub fn generalized_time(&mut self, value: &str) -> &mut Self {
        self.element(tag::GENERALIZED_TIME, value.as_bytes())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn header_for(len: usize) -> Vec<u8> {
        let mut buf = vec![tag::OCTET_STRING];
        buf.extend_from_slice(&encode_length(len));
        buf.extend(std::iter::repeat(0xab).take(len));
        buf
    }

    // ---- lengths ----

    #[test]
    fn length_round_trip_across_forms() {
        for len in [0usize, 1, 126, 127, 128, 129, 255, 256, 4095, 65_535, 65_536, 70_000] {
            let buf = header_for(len);
            let mut r = Reader::new(&buf);
            assert_eq!(r.read_tagged_header(tag::OCTET_STRING).unwrap(), len);
            assert_eq!(r.remaining(), len);
        }
    }

    #[test]
    fn length_boundary_encodings() {
        assert_eq!(encode_length(127), vec![0x7f]);
        assert_eq!(encode_length(128), vec![0x81, 0x80]);
        assert_eq!(encode_length(256), vec![0x82, 0x01, 0x00]);
    }

    #[test]
    fn length_past_buffer_is_rejected() {
        let buf = [0x04, 0x05, 0x01, 0x02];
        let mut r = Reader::new(&buf);
        assert!(matches!(
            r.read_tagged_header(tag::OCTET_STRING),
            Err(Error::BufferTooShort { .. })
        ));
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn indefinite_and_oversized_lengths_are_rejected() {
        let mut r = Reader::new(&[0x30, 0x80, 0x00, 0x00]);
        assert!(matches!(r.read_sequence(), Err(Error::InvalidLength { .. })));
        let mut r = Reader::new(&[0x30, 0x85, 1, 0, 0, 0, 0]);
        assert!(matches!(r.read_sequence(), Err(Error::InvalidLength { .. })));
    }

    #[test]
    fn nested_reader_is_bounded_by_parent() {
        // SEQUENCE { OCTET STRING (declares 3 bytes, only 1 inside the SEQUENCE) } + trailing bytes
        let buf = [0x30, 0x03, 0x04, 0x03, 0xaa, 0xbb, 0xcc];
        let mut outer = Reader::new(&buf);
        let mut inner = outer.read_sequence().unwrap();
        assert_eq!(inner.max_index(), 5);
        assert!(matches!(
            inner.read_octet_string(),
            Err(Error::BufferTooShort { .. })
        ));
    }

    // ---- tags ----

    #[test]
    fn tag_mismatch_does_not_advance() {
        let buf = [0x02, 0x01, 0x05];
        let mut r = Reader::new(&buf);
        match r.read_sequence() {
            Err(Error::UnexpectedTag {
                expected, found, ..
            }) => {
                assert_eq!(expected, tag::SEQUENCE);
                assert_eq!(found, tag::INTEGER);
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_small_integer().unwrap(), 5);
    }

    // ---- integers ----

    #[test]
    fn integer_required_padding_is_stripped() {
        let mut r = Reader::new(&[0x02, 0x02, 0x00, 0x80]);
        assert_eq!(r.read_integer().unwrap(), &[0x80]);
    }

    #[test]
    fn integer_non_minimal_padding_is_rejected() {
        let mut r = Reader::new(&[0x02, 0x02, 0x00, 0x7f]);
        assert!(matches!(
            r.read_integer(),
            Err(Error::MalformedInteger { offset: 0 })
        ));
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn integer_missing_padding_is_rejected() {
        let mut r = Reader::new(&[0x02, 0x01, 0x80]);
        assert!(matches!(r.read_integer(), Err(Error::MalformedInteger { .. })));
    }

    #[test]
    fn integer_zero_and_empty() {
        let mut r = Reader::new(&[0x02, 0x01, 0x00]);
        assert_eq!(r.read_integer().unwrap(), &[0x00]);
        let mut r = Reader::new(&[0x02, 0x00]);
        assert!(matches!(r.read_integer(), Err(Error::MalformedInteger { .. })));
    }

    #[test]
    fn small_integer_width_limit() {
        let mut r = Reader::new(&[0x02, 0x04, 0x7f, 0xff, 0xff, 0xff]);
        assert_eq!(r.read_small_integer().unwrap(), 0x7fff_ffff);
        let mut r = Reader::new(&[0x02, 0x05, 0x01, 0, 0, 0, 0]);
        assert!(r.read_small_integer().is_err());
    }

    // ---- bit strings ----

    #[test]
    fn bit_string_unused_bits_validation() {
        // 1 unused bit, last byte low bit clear
        let mut r = Reader::new(&[0x03, 0x02, 0x01, 0x86]);
        let bits = r.read_bit_string(false).unwrap();
        assert_eq!(bits.unused_bits, 1);
        assert_eq!(bits.bytes, &[0x86]);

        // unused bit set in the padding
        let mut r = Reader::new(&[0x03, 0x02, 0x01, 0x87]);
        assert!(matches!(
            r.read_bit_string(false),
            Err(Error::MalformedBitString { .. })
        ));

        // caller requires zero unused bits
        let mut r = Reader::new(&[0x03, 0x02, 0x01, 0x86]);
        assert!(r.read_bit_string(true).is_err());

        // count above 7
        let mut r = Reader::new(&[0x03, 0x02, 0x08, 0x00]);
        assert!(r.read_bit_string(false).is_err());
    }

    #[test]
    fn empty_bit_string_needs_zero_unused() {
        let mut r = Reader::new(&[0x03, 0x01, 0x00]);
        assert!(r.read_bit_string(true).unwrap().bytes.is_empty());
        let mut r = Reader::new(&[0x03, 0x01, 0x03]);
        assert!(r.read_bit_string(false).is_err());
    }

    // ---- misc primitives ----

    #[test]
    fn boolean_null_and_oid() {
        let buf = [0x01, 0x01, 0xff, 0x05, 0x00, 0x06, 0x03, 0x55, 0x1d, 0x13];
        let mut r = Reader::new(&buf);
        assert!(r.read_boolean().unwrap());
        r.read_null().unwrap();
        assert_eq!(r.read_object_id().unwrap(), &[0x55, 0x1d, 0x13]);
        r.finish("test").unwrap();
    }

    #[test]
    fn truncated_oid_is_rejected() {
        let mut r = Reader::new(&[0x06, 0x02, 0x2a, 0x86]);
        assert!(matches!(r.read_object_id(), Err(Error::Malformed(_))));
    }

    #[test]
    fn optional_element_leaves_cursor() {
        let buf = [0x02, 0x01, 0x01];
        let mut r = Reader::new(&buf);
        assert!(r.read_optional(tag::explicit(0)).unwrap().is_none());
        assert_eq!(r.position(), 0);
    }

    // ---- writer ----

    #[test]
    fn writer_nested_structure_reads_back() {
        let mut w = Writer::new();
        w.sequence(|w| {
            w.small_integer(0x80).explicit(0, |w| {
                w.boolean(true);
            });
        });
        let bytes = w.into_bytes();
        assert_eq!(
            bytes,
            vec![0x30, 0x09, 0x02, 0x02, 0x00, 0x80, 0xa0, 0x03, 0x01, 0x01, 0xff]
        );

        let mut r = Reader::new(&bytes);
        let mut seq = r.read_sequence().unwrap();
        assert_eq!(seq.read_integer().unwrap(), &[0x80]);
        let mut explicit = seq.read_explicit(0).unwrap();
        assert!(explicit.read_boolean().unwrap());
        seq.finish("sequence").unwrap();
    }

    #[test]
    fn writer_integer_normalizes_magnitude() {
        let mut w = Writer::new();
        w.integer(&[0, 0, 0x01, 0x02]).integer(&[]).integer(&[0xff]);
        assert_eq!(
            w.as_bytes(),
            &[0x02, 0x02, 0x01, 0x02, 0x02, 0x01, 0x00, 0x02, 0x02, 0x00, 0xff]
        );
    }
}
