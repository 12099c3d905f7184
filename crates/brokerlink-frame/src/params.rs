use bytes::{BufMut, Bytes, BytesMut};

use crate::error::EncodeError;

/// Widest value the three-digit length field can carry.
pub const MAX_ITEM_LEN: usize = 999;

/// Maximum items a list count prefix can describe.
pub const MAX_LIST_ITEMS: usize = 999;

/// Default word-processing chunk size in lines. The server's line-oriented
/// buffers reject larger pages.
pub const DEFAULT_MAX_LINES_PER_CHUNK: usize = 300;

/// Marker emitted between word-processing chunks.
pub const CONTINUATION_MARK: u8 = b'~';

const TAG_LITERAL: u8 = b'0';
const TAG_REFERENCE: u8 = b'1';
const TAG_LIST: u8 = b'2';
const TAG_WORD_PROCESSING: u8 = b'3';
const TAG_EMPTY: u8 = b'4';
const BLOCK_INTRO: u8 = b'5';
const ITEM_END: u8 = b'f';

/// One procedure-call argument.
///
/// The server binds strictly by position; order is preserved exactly as
/// supplied. The closed set of variants keeps encoding exhaustive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    /// A single scalar rendered as text.
    Literal(String),
    /// A positional table passed as one argument.
    List(Vec<String>),
    /// A pointer to server-side storage rather than inline data.
    Reference(String),
    /// A pre-encoded payload passed through unmodified.
    Encoded(Bytes),
    /// Multi-line free text, chunked for transmission.
    WordProcessing(Vec<String>),
}

impl ParameterValue {
    /// Shorthand for a literal built from anything displayable.
    pub fn literal(value: impl ToString) -> Self {
        ParameterValue::Literal(value.to_string())
    }
}

/// Encode an ordered parameter sequence into the wire parameter block.
///
/// The block is introduced by `5`; an empty sequence becomes the `4f`
/// empty marker. Fails before any I/O if a value violates the grammar.
pub fn encode_params(
    params: &[ParameterValue],
    max_lines_per_chunk: usize,
    dst: &mut BytesMut,
) -> Result<(), EncodeError> {
    dst.put_u8(BLOCK_INTRO);
    if params.is_empty() {
        dst.put_u8(TAG_EMPTY);
        dst.put_u8(ITEM_END);
        return Ok(());
    }

    for param in params {
        match param {
            ParameterValue::Literal(value) => {
                dst.put_u8(TAG_LITERAL);
                put_item(dst, value.as_bytes())?;
                dst.put_u8(ITEM_END);
            }
            ParameterValue::Reference(name) => {
                if name.is_empty() {
                    return Err(EncodeError::EmptyReference);
                }
                dst.put_u8(TAG_REFERENCE);
                put_item(dst, name.as_bytes())?;
                dst.put_u8(ITEM_END);
            }
            ParameterValue::List(items) => {
                if items.len() > MAX_LIST_ITEMS {
                    return Err(EncodeError::TooManyItems {
                        count: items.len(),
                        max: MAX_LIST_ITEMS,
                    });
                }
                dst.put_u8(TAG_LIST);
                put_count(dst, items.len());
                for item in items {
                    put_item(dst, item.as_bytes())?;
                }
                dst.put_u8(ITEM_END);
            }
            ParameterValue::WordProcessing(lines) => {
                for (index, line) in lines.iter().enumerate() {
                    if line.len() > MAX_ITEM_LEN {
                        return Err(EncodeError::LineTooLong {
                            index,
                            len: line.len(),
                            max: MAX_ITEM_LEN,
                        });
                    }
                }
                dst.put_u8(TAG_WORD_PROCESSING);
                if lines.is_empty() {
                    put_count(dst, 0);
                }
                for (i, chunk) in chunk_lines(lines, max_lines_per_chunk).iter().enumerate() {
                    if i > 0 {
                        dst.put_u8(CONTINUATION_MARK);
                    }
                    put_count(dst, chunk.len());
                    for line in *chunk {
                        put_item(dst, line.as_bytes())?;
                    }
                }
                dst.put_u8(ITEM_END);
            }
            ParameterValue::Encoded(raw) => {
                dst.put_slice(raw);
            }
        }
    }
    Ok(())
}

/// Encode a single literal item the way [`encode_params`] would, returning
/// the bytes directly. Used for values that are not valid UTF-8, such as
/// cipher output, which are then wrapped in [`ParameterValue::Encoded`].
pub fn encode_literal_item(value: &[u8]) -> Result<Bytes, EncodeError> {
    let mut dst = BytesMut::with_capacity(value.len() + 5);
    dst.put_u8(TAG_LITERAL);
    put_item(&mut dst, value)?;
    dst.put_u8(ITEM_END);
    Ok(dst.freeze())
}

/// Split `lines` into chunks of at most `max_per_chunk` lines.
///
/// The single chunking policy shared by word-processing encoding; kept
/// separate from the socket layer so it can be tested in isolation. A zero
/// limit is treated as one line per chunk.
pub fn chunk_lines<T>(lines: &[T], max_per_chunk: usize) -> Vec<&[T]> {
    let size = max_per_chunk.max(1);
    lines.chunks(size).collect()
}

fn put_count(dst: &mut BytesMut, count: usize) {
    // Callers bound `count` by MAX_LIST_ITEMS / chunking before this point.
    dst.put_slice(format!("{count:03}").as_bytes());
}

fn put_item(dst: &mut BytesMut, bytes: &[u8]) -> Result<(), EncodeError> {
    if bytes.len() > MAX_ITEM_LEN {
        return Err(EncodeError::ItemTooLong {
            len: bytes.len(),
            max: MAX_ITEM_LEN,
        });
    }
    dst.put_slice(format!("{:03}", bytes.len()).as_bytes());
    dst.put_slice(bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference decoder for the parameter block grammar, used to verify
    /// the encoder round-trips. Mirrors the wire grammar independently of
    /// the encoder implementation.
    mod reference {
        use super::*;

        #[derive(Debug, PartialEq, Eq)]
        pub enum Decoded {
            Literal(String),
            Reference(String),
            List(Vec<String>),
            WordProcessing(Vec<Vec<String>>),
        }

        pub fn decode_block(block: &[u8]) -> Vec<Decoded> {
            assert_eq!(block[0], BLOCK_INTRO, "block must start with intro");
            let mut rest = &block[1..];
            let mut out = Vec::new();
            if rest == [TAG_EMPTY, ITEM_END] {
                return out;
            }
            while !rest.is_empty() {
                let tag = rest[0];
                rest = &rest[1..];
                match tag {
                    TAG_LITERAL => {
                        let (item, r) = take_item(rest);
                        rest = expect_end(r);
                        out.push(Decoded::Literal(item));
                    }
                    TAG_REFERENCE => {
                        let (item, r) = take_item(rest);
                        rest = expect_end(r);
                        out.push(Decoded::Reference(item));
                    }
                    TAG_LIST => {
                        let (count, mut r) = take_count(rest);
                        let mut items = Vec::with_capacity(count);
                        for _ in 0..count {
                            let (item, r2) = take_item(r);
                            items.push(item);
                            r = r2;
                        }
                        rest = expect_end(r);
                        out.push(Decoded::List(items));
                    }
                    TAG_WORD_PROCESSING => {
                        let mut chunks = Vec::new();
                        let mut r = rest;
                        loop {
                            let (count, mut r2) = take_count(r);
                            let mut lines = Vec::with_capacity(count);
                            for _ in 0..count {
                                let (item, r3) = take_item(r2);
                                lines.push(item);
                                r2 = r3;
                            }
                            chunks.push(lines);
                            match r2.first() {
                                Some(&CONTINUATION_MARK) => r = &r2[1..],
                                Some(&ITEM_END) => {
                                    rest = &r2[1..];
                                    break;
                                }
                                other => panic!("bad word-processing frame: {other:?}"),
                            }
                        }
                        out.push(Decoded::WordProcessing(chunks));
                    }
                    other => panic!("unknown tag {other}"),
                }
            }
            out
        }

        fn take_count(rest: &[u8]) -> (usize, &[u8]) {
            let count = std::str::from_utf8(&rest[..3]).unwrap().parse().unwrap();
            (count, &rest[3..])
        }

        fn take_item(rest: &[u8]) -> (String, &[u8]) {
            let (len, rest) = take_count(rest);
            let item = String::from_utf8(rest[..len].to_vec()).unwrap();
            (item, &rest[len..])
        }

        fn expect_end(rest: &[u8]) -> &[u8] {
            assert_eq!(rest[0], ITEM_END);
            &rest[1..]
        }
    }

    use reference::{decode_block, Decoded};

    fn encode(params: &[ParameterValue]) -> BytesMut {
        let mut dst = BytesMut::new();
        encode_params(params, DEFAULT_MAX_LINES_PER_CHUNK, &mut dst).unwrap();
        dst
    }

    #[test]
    fn empty_params_marker() {
        assert_eq!(encode(&[]).as_ref(), b"54f");
    }

    #[test]
    fn literal_layout() {
        let block = encode(&[ParameterValue::literal("A")]);
        assert_eq!(block.as_ref(), b"50001Af");
    }

    #[test]
    fn reference_layout() {
        let block = encode(&[ParameterValue::Reference("DUZ".into())]);
        assert_eq!(block.as_ref(), b"51003DUZf");
    }

    #[test]
    fn list_count_prefixed() {
        let block = encode(&[ParameterValue::List(vec!["B".into(), "C".into()])]);
        assert_eq!(block.as_ref(), b"52002001B001Cf");
    }

    #[test]
    fn empty_reference_rejected() {
        let mut dst = BytesMut::new();
        let err = encode_params(
            &[ParameterValue::Reference(String::new())],
            DEFAULT_MAX_LINES_PER_CHUNK,
            &mut dst,
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::EmptyReference));
    }

    #[test]
    fn oversized_literal_rejected() {
        let mut dst = BytesMut::new();
        let err = encode_params(
            &[ParameterValue::Literal("x".repeat(MAX_ITEM_LEN + 1))],
            DEFAULT_MAX_LINES_PER_CHUNK,
            &mut dst,
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::ItemTooLong { len: 1000, .. }));
    }

    #[test]
    fn long_word_processing_line_rejected_not_truncated() {
        let mut dst = BytesMut::new();
        let err = encode_params(
            &[ParameterValue::WordProcessing(vec![
                "ok".into(),
                "y".repeat(MAX_ITEM_LEN + 1),
            ])],
            DEFAULT_MAX_LINES_PER_CHUNK,
            &mut dst,
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::LineTooLong { index: 1, .. }));
        // Nothing usable was produced for the failed parameter.
    }

    #[test]
    fn list_roundtrip_through_reference_decoder() {
        let items: Vec<String> = (0..17).map(|i| format!("item-{i}")).collect();
        let block = encode(&[ParameterValue::List(items.clone())]);
        let decoded = decode_block(&block);
        assert_eq!(decoded, vec![Decoded::List(items)]);
    }

    #[test]
    fn mixed_params_preserve_order() {
        let block = encode(&[
            ParameterValue::literal("A"),
            ParameterValue::List(vec!["B".into(), "C".into()]),
            ParameterValue::Reference("^TMP".into()),
        ]);
        let decoded = decode_block(&block);
        assert_eq!(
            decoded,
            vec![
                Decoded::Literal("A".into()),
                Decoded::List(vec!["B".into(), "C".into()]),
                Decoded::Reference("^TMP".into()),
            ]
        );
    }

    #[test]
    fn word_processing_chunked_at_300() {
        let lines: Vec<String> = (0..900).map(|i| format!("line {i}")).collect();
        let block = encode(&[ParameterValue::WordProcessing(lines.clone())]);
        let decoded = decode_block(&block);

        let Decoded::WordProcessing(chunks) = &decoded[0] else {
            panic!("expected word-processing parameter");
        };
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= 300));
        let reassembled: Vec<String> = chunks.iter().flatten().cloned().collect();
        assert_eq!(reassembled, lines);
    }

    #[test]
    fn word_processing_uneven_tail_chunk() {
        let lines: Vec<String> = (0..301).map(|i| i.to_string()).collect();
        let block = encode(&[ParameterValue::WordProcessing(lines.clone())]);
        let Decoded::WordProcessing(chunks) = &decode_block(&block)[0] else {
            panic!("expected word-processing parameter");
        };
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 300);
        assert_eq!(chunks[1].len(), 1);
    }

    #[test]
    fn chunk_lines_policy() {
        let lines: Vec<u32> = (0..10).collect();
        assert_eq!(chunk_lines(&lines, 4).len(), 3);
        assert_eq!(chunk_lines(&lines, 10).len(), 1);
        assert_eq!(chunk_lines(&lines, 100).len(), 1);
        // Zero is clamped rather than panicking.
        assert_eq!(chunk_lines(&lines, 0).len(), 10);
        let empty: Vec<u32> = Vec::new();
        assert!(chunk_lines(&empty, 4).is_empty());
    }

    #[test]
    fn encoded_passthrough() {
        let raw = encode_literal_item(&[0x01, 0xFE, 0x7F]).unwrap();
        let block = encode(&[ParameterValue::Encoded(raw.clone())]);
        assert_eq!(&block[1..], raw.as_ref());
    }

    #[test]
    fn encode_literal_item_layout() {
        let item = encode_literal_item(b"abc").unwrap();
        assert_eq!(item.as_ref(), b"0003abcf");
    }
}
