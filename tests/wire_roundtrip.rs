//! End-to-end row stream round trips over the full column kind set.

use rowbin::io::{ByteInput, ByteOutput};
use rowbin::{
    Bitmap, CodecConfig, Column, ColumnKind, Fetch, RowFormat, RowStreamReader, RowStreamWriter,
    Value,
};

fn wide_schema() -> Vec<Column> {
    vec![
        Column::new("id", ColumnKind::UInt64),
        Column::new("flag", ColumnKind::Bool),
        Column::new("note", ColumnKind::String).nullable(),
        Column::decimal("price", 18, 4),
        Column::datetime64("ts", 3),
        Column::new("addr", ColumnKind::Ipv6),
        Column::array("tags", Column::new("", ColumnKind::String)),
        Column::map(
            "attrs",
            Column::new("", ColumnKind::String),
            Column::new("", ColumnKind::Int64),
        ),
        Column::tuple(
            "pair",
            vec![
                Column::new("", ColumnKind::Int32),
                Column::new("", ColumnKind::Float64),
            ],
        ),
        Column::new("location", ColumnKind::Point),
        Column::aggregate("seen", "groupBitmap", Column::new("", ColumnKind::UInt32)),
    ]
}

fn wide_rows() -> Vec<Vec<Value>> {
    vec![
        vec![
            Value::UInt64(1),
            Value::Bool(true),
            Value::Text("first".into()),
            Value::Decimal { unscaled: 1_234_5678, scale: 4 },
            Value::DateTime64 { ticks: 1_700_000_000_123, scale: 3 },
            Value::Ipv6([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
            Value::Array(vec![Value::Text("a".into()), Value::Text("b".into())]),
            Value::Map(vec![
                (Value::Text("k1".into()), Value::Int64(10)),
                (Value::Text("k2".into()), Value::Int64(20)),
            ]),
            Value::Tuple(vec![Value::Int32(-5), Value::Float64(2.5)]),
            Value::Point(12.5, -3.25),
            Value::Bitmap(Bitmap::from_values(vec![1, 2, 3])),
        ],
        vec![
            Value::UInt64(2),
            Value::Bool(false),
            Value::Null,
            Value::Decimal { unscaled: -99, scale: 4 },
            Value::DateTime64 { ticks: 0, scale: 3 },
            Value::Ipv6([0xff; 16]),
            Value::Array(Vec::new()),
            Value::Map(Vec::new()),
            Value::Tuple(vec![Value::Int32(0), Value::Float64(0.0)]),
            Value::Point(0.0, 0.0),
            Value::Bitmap(Bitmap::from_values((0..500).collect())),
        ],
    ]
}

fn write_rows(config: &CodecConfig, columns: Vec<Column>, rows: &[Vec<Value>]) -> Vec<u8> {
    let mut writer =
        RowStreamWriter::new(config.clone(), columns, ByteOutput::in_memory()).unwrap();
    for row in rows {
        writer.write_row(row).unwrap();
    }
    writer.into_bytes()
}

fn read_all(config: CodecConfig, columns: Option<Vec<Column>>, bytes: Vec<u8>) -> Vec<Vec<Value>> {
    let mut reader =
        RowStreamReader::new(config, columns, ByteInput::from_bytes(bytes)).unwrap();
    let mut rows = Vec::new();
    loop {
        match reader.next_row().unwrap() {
            Fetch::Ready => rows.push(reader.row().to_vec()),
            Fetch::Done => return rows,
            Fetch::Pending => panic!("fixed buffer must never pend"),
        }
    }
}

#[test]
fn wide_schema_round_trips_with_header() {
    let config = CodecConfig::default();
    let rows = wide_rows();
    let bytes = write_rows(&config, wide_schema(), &rows);
    // Schema travels in the header; the reader starts blind.
    let decoded = read_all(config, None, bytes);
    assert_eq!(decoded, rows);
}

#[test]
fn wide_schema_round_trips_without_header() {
    let config = CodecConfig {
        format: RowFormat::RowBinary,
        ..CodecConfig::default()
    };
    let rows = wide_rows();
    let bytes = write_rows(&config, wide_schema(), &rows);
    let decoded = read_all(config, Some(wide_schema()), bytes);
    assert_eq!(decoded, rows);
}

#[test]
fn header_preserves_descriptors_exactly() {
    let config = CodecConfig::default();
    let columns = wide_schema();
    let bytes = write_rows(&config, columns.clone(), &[]);

    let mut reader =
        RowStreamReader::new(config, None, ByteInput::from_bytes(bytes)).unwrap();
    assert_eq!(reader.next_row().unwrap(), Fetch::Done);
    assert_eq!(reader.columns(), columns.as_slice());
}

#[test]
fn parsed_schema_matches_builder_schema() {
    let parsed = vec![
        Column::parse("id", "UInt64").unwrap(),
        Column::parse("attrs", "Map(String, Int64)").unwrap(),
        Column::parse("note", "Nullable(String)").unwrap(),
    ];
    let built = vec![
        Column::new("id", ColumnKind::UInt64),
        Column::map(
            "attrs",
            Column::new("", ColumnKind::String),
            Column::new("", ColumnKind::Int64),
        ),
        Column::new("note", ColumnKind::String).nullable(),
    ];
    assert_eq!(parsed, built);
}

#[test]
fn widened_rows_can_be_written_back() {
    // Decode a UInt32 column (widened to Int64 slots), then feed the decoded
    // rows straight back into a writer for the same schema.
    let config = CodecConfig {
        format: RowFormat::RowBinary,
        ..CodecConfig::default()
    };
    let columns = vec![Column::new("n", ColumnKind::UInt32)];
    let original = vec![vec![Value::UInt32(0)], vec![Value::UInt32(u32::MAX)]];
    let bytes = write_rows(&config, columns.clone(), &original);

    let decoded = read_all(config.clone(), Some(columns.clone()), bytes.clone());
    assert_eq!(
        decoded,
        vec![
            vec![Value::Int64(0)],
            vec![Value::Int64(u64::from(u32::MAX) as i64)]
        ]
    );

    let rewritten = write_rows(&config, columns, &decoded);
    assert_eq!(rewritten, bytes);
}

#[test]
fn unknown_header_type_fails_cleanly() {
    let mut output = ByteOutput::in_memory();
    output.write_varint(1);
    output.write_utf8("c");
    output.write_utf8("LowCardinality(String)");

    let mut reader = RowStreamReader::new(
        CodecConfig::default(),
        None,
        ByteInput::from_bytes(output.into_bytes()),
    )
    .unwrap();
    let err = reader.next_row().unwrap_err();
    assert!(matches!(
        rowbin::WireError::of(&err),
        Some(rowbin::WireError::UnsupportedType(_))
    ));
}
