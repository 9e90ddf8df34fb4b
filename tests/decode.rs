//! Decoding COPY binary streams delivered in arbitrary chunks.

use zero_pgcopy::conversion::FnConverter;
use zero_pgcopy::protocol::codec::{write_bytes, write_i32, write_u16, write_u32};
use zero_pgcopy::protocol::copy::SIGNATURE;
use zero_pgcopy::protocol::types::oid;
use zero_pgcopy::{
    CollectHandler, Column, CopyHandler, CopyOptions, CopyOutDecoder, Error, FromRow,
    OwnedRecord, Progress, Record, Value,
};

/// Builds a COPY binary stream.
struct Fixture {
    buf: Vec<u8>,
}

impl Fixture {
    fn new() -> Self {
        let mut buf = Vec::new();
        write_bytes(&mut buf, &SIGNATURE);
        write_u32(&mut buf, 0);
        write_u32(&mut buf, 0);
        Self { buf }
    }

    fn row(mut self, fields: &[Option<&[u8]>]) -> Self {
        write_u16(&mut self.buf, fields.len() as u16);
        for field in fields {
            match field {
                Some(bytes) => {
                    write_u32(&mut self.buf, bytes.len() as u32);
                    write_bytes(&mut self.buf, bytes);
                }
                None => write_i32(&mut self.buf, -1),
            }
        }
        self
    }

    fn finish(mut self) -> Vec<u8> {
        write_u16(&mut self.buf, 0xFFFF);
        self.buf
    }
}

fn people() -> Vec<u8> {
    Fixture::new()
        .row(&[Some(&1_i32.to_be_bytes()), Some(b"alice")])
        .row(&[Some(&2_i32.to_be_bytes()), None])
        .row(&[Some(&3_i32.to_be_bytes()), Some(b"")])
        .finish()
}

fn decode_in_chunks(stream: &[u8], size: usize) -> CollectHandler<Value> {
    let mut decoder = CopyOutDecoder::new();
    let mut handler = CollectHandler::new();
    for chunk in stream.chunks(size) {
        decoder.feed(chunk, &mut handler).unwrap();
    }
    decoder.finish(&mut handler).unwrap();
    handler
}

#[test]
fn test_chunk_size_does_not_change_output() {
    let stream = people();
    let expected = decode_in_chunks(&stream, stream.len()).into_records();
    assert_eq!(expected.len(), 3);
    for size in 1..stream.len() {
        assert_eq!(
            decode_in_chunks(&stream, size).into_records(),
            expected,
            "chunk size {size}"
        );
    }
}

#[test]
fn test_null_and_empty_are_distinct() {
    let records = decode_in_chunks(&people(), 4).into_records();
    assert_eq!(records[1].as_positional().unwrap()[1], None);
    assert_eq!(records[2].as_positional().unwrap()[1], Some(Vec::new()));
}

#[test]
fn test_mapped_with_wire_converter() {
    let mut decoder = CopyOutDecoder::with_mapping(vec![
        Column::new("id", oid::INT4),
        Column::new("name", oid::TEXT),
    ]);
    let mut handler = CollectHandler::new();
    for chunk in people().chunks(7) {
        decoder.feed(chunk, &mut handler).unwrap();
    }
    assert!(decoder.is_finished());

    let records = handler.into_records();
    assert_eq!(
        records[0],
        OwnedRecord::Mapped(vec![
            ("id".into(), Some(Value::Int4(1))),
            ("name".into(), Some(Value::Text("alice".into()))),
        ])
    );
    assert_eq!(records[1].get("name"), Some(None));
    assert_eq!(records[2].get("name"), Some(Some(&Value::Text(String::new()))));
}

#[test]
fn test_injected_converter_sees_declared_type() {
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Kind {
        Int,
        Str,
    }

    let converter = FnConverter::new(|bytes: &[u8], kind: &Kind| match kind {
        Kind::Int => Ok(format!("int:{}", bytes.len())),
        Kind::Str => Ok(format!("str:{}", String::from_utf8_lossy(bytes))),
    });
    let mut decoder = CopyOutDecoder::with_converter(
        vec![Column::new("id", Kind::Int), Column::new("name", Kind::Str)],
        converter,
    );
    let mut handler = CollectHandler::new();
    decoder.feed(&people(), &mut handler).unwrap();
    assert_eq!(
        handler.records()[0].get("name"),
        Some(Some(&"str:alice".to_string()))
    );
    assert_eq!(
        handler.records()[0].get("id"),
        Some(Some(&"int:4".to_string()))
    );
}

/// Decodes positional rows into typed tuples.
struct TypedHandler {
    types: Vec<u32>,
    rows: Vec<(i32, Option<String>)>,
}

impl<V> CopyHandler<V> for TypedHandler {
    fn row(&mut self, record: Record<'_, V>) -> zero_pgcopy::Result<()> {
        match record {
            Record::Positional(row) => {
                self.rows.push(FromRow::from_row(&self.types, row)?);
                Ok(())
            }
            Record::Mapped(_) => Err(Error::Unsupported("mapped record".into())),
        }
    }
}

#[test]
fn test_typed_rows() {
    let mut handler = TypedHandler {
        types: vec![oid::INT4, oid::TEXT],
        rows: Vec::new(),
    };
    let mut decoder = CopyOutDecoder::new();
    assert_eq!(
        decoder.feed(&people(), &mut handler).unwrap(),
        Progress::Finished
    );
    assert_eq!(
        handler.rows,
        vec![
            (1, Some("alice".to_string())),
            (2, None),
            (3, Some(String::new()))
        ]
    );
}

#[test]
fn test_legacy_options() {
    let stream = people();
    let mut decoder = CopyOutDecoder::new().with_options(CopyOptions::legacy());
    let mut handler = CollectHandler::new();

    // One row per delivered chunk, whatever the chunk holds.
    decoder.feed(&stream, &mut handler).unwrap();
    assert_eq!(handler.len(), 1);
    decoder.feed(&[], &mut handler).unwrap();
    assert_eq!(handler.len(), 2);
    decoder.finish(&mut handler).unwrap();
    assert_eq!(handler.len(), 3);
    assert!(handler.is_ended());
}

#[test]
fn test_header_with_extension_is_rejected() {
    let mut stream = people();
    stream[18] = 4;
    let mut decoder = CopyOutDecoder::new();
    let mut handler = CollectHandler::new();
    assert!(matches!(
        decoder.feed(&stream, &mut handler),
        Err(Error::Unsupported(_))
    ));
    assert!(matches!(
        decoder.feed(&[], &mut handler),
        Err(Error::Broken)
    ));
}

#[test]
fn test_zero_field_row() {
    let stream = Fixture::new().row(&[]).finish();
    let handler = decode_in_chunks(&stream, 1);
    assert_eq!(handler.records(), &[OwnedRecord::Positional(Vec::new())]);
}
