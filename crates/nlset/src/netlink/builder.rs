//! Message builder for constructing netlink requests.

use super::attr::{NLA_F_NESTED, NLA_HDRLEN, NlAttr, nla_align};
use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Token returned when starting a nested attribute.
///
/// Must be handed back to [`MessageBuilder::nest_end`] exactly once, in
/// LIFO order when nests are stacked.
#[derive(Debug, Clone, Copy)]
pub struct NestToken {
    /// Offset of the nested attribute header in the buffer.
    offset: usize,
}

/// Builder for constructing netlink messages.
///
/// The buffer grows as attributes are appended but is capped at the
/// capacity given to [`new`](Self::new); appends that would exceed it fail
/// with [`Error::MessageTooLarge`] instead of writing. The buffer end stays
/// 4-byte aligned after every append, so attribute headers always land on
/// an aligned offset.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
    capacity: usize,
}

impl MessageBuilder {
    /// Create a new message builder with the given type, flags, and byte cap.
    pub fn new(msg_type: u16, flags: u16, capacity: usize) -> Self {
        debug_assert!(capacity >= NLMSG_HDRLEN);
        let header = NlMsgHdr::new(msg_type, flags);
        let mut buf = Vec::with_capacity(capacity);
        buf.extend_from_slice(header.as_bytes());
        Self { buf, capacity }
    }

    /// Get the current message length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the message is empty (header only).
    pub fn is_empty(&self) -> bool {
        self.buf.len() == NLMSG_HDRLEN
    }

    /// Check that `additional` more bytes (plus padding) fit under the cap.
    fn ensure(&self, additional: usize) -> Result<()> {
        let needed = nlmsg_align(self.buf.len() + additional);
        if needed > self.capacity {
            return Err(Error::MessageTooLarge {
                needed,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Append raw bytes to the message (with alignment padding).
    pub fn append_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.ensure(data.len())?;
        self.buf.extend_from_slice(data);
        // Pad to alignment
        let aligned = nlmsg_align(self.buf.len());
        self.buf.resize(aligned, 0);
        Ok(())
    }

    /// Append an attribute with the given type and payload.
    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) -> Result<()> {
        self.ensure(NLA_HDRLEN + data.len())?;
        let attr = NlAttr::new(attr_type, data.len());
        self.buf.extend_from_slice(attr.as_bytes());
        self.buf.extend_from_slice(data);
        // Pad to alignment
        let aligned = nla_align(self.buf.len());
        self.buf.resize(aligned, 0);
        Ok(())
    }

    /// Append a u8 attribute.
    pub fn append_attr_u8(&mut self, attr_type: u16, value: u8) -> Result<()> {
        self.append_attr(attr_type, &[value])
    }

    /// Append a u32 attribute (big endian / network order).
    pub fn append_attr_u32_be(&mut self, attr_type: u16, value: u32) -> Result<()> {
        self.append_attr(attr_type, &value.to_be_bytes())
    }

    /// Append a null-terminated string attribute.
    pub fn append_attr_str(&mut self, attr_type: u16, value: &str) -> Result<()> {
        let mut data = value.as_bytes().to_vec();
        data.push(0); // null terminator
        self.append_attr(attr_type, &data)
    }

    /// Start a nested attribute. Returns a token to finalize it.
    pub fn nest_start(&mut self, attr_type: u16) -> Result<NestToken> {
        self.ensure(NLA_HDRLEN)?;
        let offset = self.buf.len();
        // Write placeholder header with the nested flag; the length is
        // backpatched by nest_end once the children are in place.
        let attr = NlAttr::new(attr_type | NLA_F_NESTED, 0);
        self.buf.extend_from_slice(attr.as_bytes());
        Ok(NestToken { offset })
    }

    /// End a nested attribute started with `nest_start`.
    pub fn nest_end(&mut self, token: NestToken) {
        debug_assert!(token.offset + NLA_HDRLEN <= self.buf.len());
        let len = self.buf.len() - token.offset;
        // Update the length in the nested attribute header
        let len_bytes = (len as u16).to_ne_bytes();
        self.buf[token.offset] = len_bytes[0];
        self.buf[token.offset + 1] = len_bytes[1];
        // Ensure alignment
        let aligned = nla_align(self.buf.len());
        self.buf.resize(aligned, 0);
    }

    /// Finalize and return the message bytes.
    pub fn finish(mut self) -> Vec<u8> {
        // Update message length in header
        let len = self.buf.len() as u32;
        let len_bytes = len.to_ne_bytes();
        self.buf[0..4].copy_from_slice(&len_bytes);
        self.buf
    }

    /// Get the current buffer for inspection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::AttrIter;
    use crate::netlink::message::NLM_F_REQUEST;

    #[test]
    fn empty_message() {
        let msg = MessageBuilder::new(16, NLM_F_REQUEST, 256).finish();
        assert_eq!(msg.len(), NLMSG_HDRLEN);

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_len as usize, NLMSG_HDRLEN);
        assert_eq!(header.nlmsg_type, 16);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST);
    }

    #[test]
    fn attribute_is_padded_but_length_is_not() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST, 256);
        builder.append_attr(1, &[0xab]).unwrap();
        let msg = builder.finish();

        // One byte of payload occupies a full aligned slot in the buffer...
        assert_eq!(msg.len(), NLMSG_HDRLEN + NLA_HDRLEN + 4);
        // ...but the declared attribute length counts only header + payload.
        let attr = NlAttr::from_bytes(&msg[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(attr.nla_len as usize, NLA_HDRLEN + 1);
        // Padding reads as zero.
        assert_eq!(msg[NLMSG_HDRLEN + 5..], [0, 0, 0]);
    }

    #[test]
    fn buffer_end_stays_aligned() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST, 256);
        for payload_len in [1usize, 2, 3, 4, 5] {
            builder.append_attr(1, &vec![0xff; payload_len]).unwrap();
            assert_eq!(builder.len() % 4, 0);
        }
    }

    #[test]
    fn nested_length_is_backpatched() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST, 256);
        let nest = builder.nest_start(7).unwrap();
        builder.append_attr_u32_be(2, 100).unwrap();
        builder.nest_end(nest);
        let msg = builder.finish();

        let attr = NlAttr::from_bytes(&msg[NLMSG_HDRLEN..]).unwrap();
        assert!(attr.is_nested());
        assert_eq!(attr.kind(), 7);
        // Nest header + one u32 attribute inside.
        assert_eq!(attr.nla_len as usize, NLA_HDRLEN + NLA_HDRLEN + 4);
    }

    #[test]
    fn empty_nest_declares_header_only_length() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST, 256);
        let nest = builder.nest_start(7).unwrap();
        builder.nest_end(nest);
        let msg = builder.finish();

        let attr = NlAttr::from_bytes(&msg[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(attr.nla_len as usize, NLA_HDRLEN);
    }

    #[test]
    fn two_level_nest_round_trips() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST, 256);
        let outer = builder.nest_start(7).unwrap();
        let inner = builder.nest_start(1).unwrap();
        builder.append_attr(1, &[192, 168, 1, 1]).unwrap();
        builder.nest_end(inner);
        builder.nest_end(outer);
        let msg = builder.finish();

        let (kind, outer_payload) = AttrIter::new(&msg[NLMSG_HDRLEN..]).next().unwrap();
        assert_eq!(kind, 7);
        let (kind, inner_payload) = AttrIter::new(outer_payload).next().unwrap();
        assert_eq!(kind, 1);
        let (kind, addr) = AttrIter::new(inner_payload).next().unwrap();
        assert_eq!(kind, 1);
        assert_eq!(addr, [192, 168, 1, 1]);
    }

    #[test]
    fn append_past_capacity_fails_without_writing() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST, 32);
        builder.append_attr(1, &[0; 8]).unwrap();
        let len_before = builder.len();

        let err = builder.append_attr(2, &[0; 64]).unwrap_err();
        match err {
            Error::MessageTooLarge { needed, capacity } => {
                assert!(needed > capacity);
                assert_eq!(capacity, 32);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(builder.len(), len_before);
    }

    #[test]
    fn nest_start_respects_capacity() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST, NLMSG_HDRLEN + 4);
        builder.nest_start(7).unwrap();
        assert!(builder.nest_start(1).is_err());
    }

    #[test]
    fn finish_backpatches_total_length() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST, 256);
        builder.append_attr_str(2, "blocklist").unwrap();
        let expected = builder.len();
        let msg = builder.finish();

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_len as usize, expected);
        assert_eq!(header.nlmsg_len as usize, msg.len());
    }
}
