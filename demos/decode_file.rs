//! Example: Decode a COPY binary dump
//!
//! Reads a file written by `COPY ... TO '/path' (FORMAT binary)` (or
//! `\copy ... to 'file' with (format binary)` in psql) and prints its rows.
//! With a list of column types the fields are converted, otherwise they are
//! printed as raw bytes.
//!
//! Usage:
//!   cargo run --example decode_file -- dump.bin
//!   cargo run --example decode_file -- dump.bin int4,text,float8

use std::env;
use std::fs::File;
use std::io::BufReader;

use zero_pgcopy::protocol::types::{Oid, oid};
use zero_pgcopy::sync::CopyOutReader;
use zero_pgcopy::{Column, CopyOutDecoder, OwnedRecord};

fn type_oid(name: &str) -> Oid {
    match name {
        "bool" => oid::BOOL,
        "bytea" => oid::BYTEA,
        "int2" => oid::INT2,
        "int4" => oid::INT4,
        "int8" => oid::INT8,
        "float4" => oid::FLOAT4,
        "float8" => oid::FLOAT8,
        "numeric" => oid::NUMERIC,
        "json" => oid::JSON,
        "jsonb" => oid::JSONB,
        "uuid" => oid::UUID,
        "date" => oid::DATE,
        "timestamp" => oid::TIMESTAMP,
        "timestamptz" => oid::TIMESTAMPTZ,
        _ => oid::TEXT,
    }
}

fn main() -> zero_pgcopy::Result<()> {
    let mut args = env::args().skip(1);
    let path = args.next().expect("usage: decode_file <file> [type,type,...]");
    let file = BufReader::new(File::open(&path)?);

    let decoder = match args.next() {
        Some(types) => CopyOutDecoder::with_mapping(
            types
                .split(',')
                .enumerate()
                .map(|(i, name)| Column::new(format!("col{}", i + 1), type_oid(name)))
                .collect(),
        ),
        None => CopyOutDecoder::new(),
    };

    let mut reader = CopyOutReader::with_decoder(file, decoder);
    while let Some(record) = reader.next_record()? {
        match record {
            OwnedRecord::Positional(fields) => println!("{:?}", fields),
            OwnedRecord::Mapped(fields) => {
                let cells: Vec<String> = fields
                    .iter()
                    .map(|(key, value)| match value {
                        Some(value) => format!("{}={:?}", key, value),
                        None => format!("{}=NULL", key),
                    })
                    .collect();
                println!("{}", cells.join(" "));
            }
        }
    }

    println!("\n{} rows", reader.decoder().rows_emitted());
    Ok(())
}
