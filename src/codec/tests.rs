use super::*;
use crate::config::CodecConfig;
use crate::error::WireError;
use crate::io::{ByteInput, ByteOutput};
use crate::types::{Column, ColumnKind};
use crate::value::{Bitmap, Value};

fn encode_one(config: &CodecConfig, column: &Column, value: &Value) -> Vec<u8> {
    let encoder = build_encoder(config, column).unwrap();
    let mut output = ByteOutput::in_memory();
    encoder.encode(value, &mut output).unwrap();
    output.into_bytes()
}

fn decode_one(config: &CodecConfig, column: &Column, bytes: &[u8]) -> Value {
    let decoder = build_decoder(config, column).unwrap();
    let mut input = ByteInput::from_bytes(bytes.to_vec());
    let mut slot = Value::Null;
    decoder.decode(&mut slot, &mut input).unwrap();
    assert!(input.exhausted().unwrap(), "decoder left trailing bytes");
    slot
}

fn round_trip(column: &Column, value: Value) -> Value {
    let config = CodecConfig::default();
    let bytes = encode_one(&config, column, &value);
    decode_one(&config, column, &bytes)
}

#[test]
fn int32_wire_image_is_little_endian() {
    let column = Column::new("v", ColumnKind::Int32);
    let config = CodecConfig::default();
    let bytes = encode_one(&config, &column, &Value::Int32(42));
    assert_eq!(bytes, vec![0x2a, 0x00, 0x00, 0x00]);
    assert_eq!(decode_one(&config, &column, &bytes), Value::Int32(42));
}

#[test]
fn scalar_round_trips() {
    assert_eq!(
        round_trip(&Column::new("v", ColumnKind::Bool), Value::Bool(true)),
        Value::Bool(true)
    );
    assert_eq!(
        round_trip(&Column::new("v", ColumnKind::Int64), Value::Int64(-7)),
        Value::Int64(-7)
    );
    assert_eq!(
        round_trip(&Column::new("v", ColumnKind::Float64), Value::Float64(1.5)),
        Value::Float64(1.5)
    );
    assert_eq!(
        round_trip(&Column::new("v", ColumnKind::String), Value::Text("héllo".into())),
        Value::Text("héllo".into())
    );
    assert_eq!(
        round_trip(&Column::new("v", ColumnKind::Date), Value::Date(19000)),
        Value::Date(19000)
    );
    assert_eq!(
        round_trip(&Column::new("v", ColumnKind::Uuid), Value::Uuid([7; 16])),
        Value::Uuid([7; 16])
    );
    assert_eq!(
        round_trip(&Column::new("v", ColumnKind::Ipv4), Value::Ipv4([127, 0, 0, 1])),
        Value::Ipv4([127, 0, 0, 1])
    );
}

#[test]
fn unsigned_columns_widen_by_default() {
    let config = CodecConfig::default();
    let column = Column::new("v", ColumnKind::UInt8);
    let decoded = decode_one(&config, &column, &[0xff]);
    assert_eq!(decoded, Value::Int16(255));

    let column = Column::new("v", ColumnKind::UInt32);
    let decoded = decode_one(&config, &column, &[0xff, 0xff, 0xff, 0xff]);
    assert_eq!(decoded, Value::Int64(u64::from(u32::MAX) as i64));
}

#[test]
fn unsigned_columns_reinterpret_without_widening() {
    let config = CodecConfig {
        widen_unsigned_types: false,
        ..CodecConfig::default()
    };
    let column = Column::new("v", ColumnKind::UInt8);
    assert_eq!(decode_one(&config, &column, &[0xff]), Value::Int8(-1));

    let column = Column::new("v", ColumnKind::UInt16);
    assert_eq!(decode_one(&config, &column, &[0xff, 0xff]), Value::Int16(-1));
}

#[test]
fn uint64_and_wider_stay_unsigned() {
    let column = Column::new("v", ColumnKind::UInt64);
    assert_eq!(
        round_trip(&column, Value::UInt64(u64::MAX)),
        Value::UInt64(u64::MAX)
    );
    let column = Column::new("v", ColumnKind::UInt128);
    assert_eq!(
        round_trip(&column, Value::UInt128(u128::MAX)),
        Value::UInt128(u128::MAX)
    );
}

#[test]
fn widened_values_write_back_byte_identically() {
    // A widened Int16(255) must serialize to the same single byte a UInt8
    // column produced.
    let config = CodecConfig::default();
    let column = Column::new("v", ColumnKind::UInt8);
    let bytes = encode_one(&config, &column, &Value::Int16(255));
    assert_eq!(bytes, vec![0xff]);
}

#[test]
fn nullable_null_is_exactly_one_byte() {
    let config = CodecConfig::default();
    let column = Column::new("v", ColumnKind::Int32).nullable();
    let bytes = encode_one(&config, &column, &Value::Null);
    assert_eq!(bytes, vec![1]);
    assert_eq!(decode_one(&config, &column, &bytes), Value::Null);
}

#[test]
fn nullable_present_prepends_zero_flag() {
    let config = CodecConfig::default();
    let column = Column::new("v", ColumnKind::Int32).nullable();
    let bytes = encode_one(&config, &column, &Value::Int32(42));
    assert_eq!(bytes, vec![0, 0x2a, 0x00, 0x00, 0x00]);
    assert_eq!(decode_one(&config, &column, &bytes), Value::Int32(42));
}

#[test]
fn null_outside_nullable_is_a_shape_error() {
    let config = CodecConfig::default();
    let encoder = build_encoder(&config, &Column::new("v", ColumnKind::Int32)).unwrap();
    let mut output = ByteOutput::in_memory();
    assert!(encoder.encode(&Value::Null, &mut output).is_err());
}

#[test]
fn string_decodes_as_bytes_when_configured() {
    let config = CodecConfig {
        use_binary_string: true,
        ..CodecConfig::default()
    };
    let column = Column::new("v", ColumnKind::String);
    let bytes = encode_one(&config, &column, &Value::Text("ab".into()));
    assert_eq!(decode_one(&config, &column, &bytes), Value::Bytes(vec![b'a', b'b']));
}

#[test]
fn non_utf8_text_string_fails_cleanly() {
    let config = CodecConfig::default();
    let column = Column::new("v", ColumnKind::String);
    let decoder = build_decoder(&config, &column).unwrap();
    let mut input = ByteInput::from_bytes(vec![2, 0xff, 0xfe]);
    let mut slot = Value::Null;
    assert!(decoder.decode(&mut slot, &mut input).is_err());
}

#[test]
fn fixed_string_pads_and_bounds() {
    let config = CodecConfig::default();
    let column = Column::fixed_string("v", 4);
    let bytes = encode_one(&config, &column, &Value::Bytes(vec![b'a', b'b']));
    assert_eq!(bytes, vec![b'a', b'b', 0, 0]);

    let encoder = build_encoder(&config, &column).unwrap();
    let mut output = ByteOutput::in_memory();
    let long = Value::Text("abcde".into());
    assert!(encoder.encode(&long, &mut output).is_err());
}

#[test]
fn decimal_width_follows_precision() {
    let config = CodecConfig::default();
    let value = Value::Decimal { unscaled: -12345, scale: 2 };

    let narrow = encode_one(&config, &Column::decimal("v", 9, 2), &value);
    assert_eq!(narrow.len(), 4);
    let wide = encode_one(&config, &Column::decimal("v", 38, 2), &value);
    assert_eq!(wide.len(), 16);

    assert_eq!(
        decode_one(&config, &Column::decimal("v", 9, 2), &narrow),
        value
    );
}

#[test]
fn decimal256_keeps_raw_image() {
    let mut raw = [0u8; 32];
    raw[0] = 0x2a;
    let column = Column::decimal("v", 76, 0);
    assert_eq!(
        round_trip(&column, Value::Decimal256 { unscaled: raw, scale: 0 }),
        Value::Decimal256 { unscaled: raw, scale: 0 }
    );
}

#[test]
fn enums_carry_their_wire_integer() {
    let column = Column::enum8("v", vec![("a".into(), 1), ("b".into(), 2)]);
    assert_eq!(round_trip(&column, Value::Int8(2)), Value::Int8(2));

    let column = Column::enum16("v", vec![("neg".into(), -300)]);
    assert_eq!(round_trip(&column, Value::Int16(-300)), Value::Int16(-300));
}

#[test]
fn map_preserves_insertion_order() {
    let column = Column::map(
        "attrs",
        Column::new("", ColumnKind::String),
        Column::new("", ColumnKind::Int32),
    );
    let config = CodecConfig::default();
    let value = Value::Map(vec![
        (Value::Text("a".into()), Value::Int32(1)),
        (Value::Text("b".into()), Value::Int32(2)),
    ]);
    let bytes = encode_one(&config, &column, &value);
    assert_eq!(
        bytes,
        vec![2, 1, b'a', 0x01, 0, 0, 0, 1, b'b', 0x02, 0, 0, 0]
    );
    assert_eq!(decode_one(&config, &column, &bytes), value);
}

#[test]
fn empty_map_is_one_varint_byte() {
    let column = Column::map(
        "m",
        Column::new("", ColumnKind::String),
        Column::new("", ColumnKind::Int32),
    );
    let config = CodecConfig::default();
    let bytes = encode_one(&config, &column, &Value::Map(Vec::new()));
    assert_eq!(bytes, vec![0]);
    assert_eq!(decode_one(&config, &column, &bytes), Value::Map(Vec::new()));
}

#[test]
fn arrays_of_nullable_elements_round_trip() {
    let column = Column::array("v", Column::new("", ColumnKind::Int64).nullable());
    let value = Value::Array(vec![Value::Int64(1), Value::Null, Value::Int64(3)]);
    assert_eq!(round_trip(&column, value.clone()), value);
}

#[test]
fn nested_arrays_round_trip() {
    let column = Column::array("v", Column::array("", Column::new("", ColumnKind::String)));
    let value = Value::Array(vec![
        Value::Array(vec![Value::Text("x".into())]),
        Value::Array(Vec::new()),
    ]);
    assert_eq!(round_trip(&column, value.clone()), value);
}

#[test]
fn bulk_and_generic_array_paths_agree() {
    let element = Column::new("", ColumnKind::UInt16);
    let column = Column::array("v", element);
    let value = Value::Array(vec![Value::Int32(0), Value::Int32(65535), Value::Int32(7)]);

    let bulk = CodecConfig::default();
    let generic = CodecConfig {
        use_bulk_arrays: false,
        ..CodecConfig::default()
    };
    assert!(matches!(build_decoder(&bulk, &column).unwrap(), Decoder::BulkArray(_)));
    assert!(matches!(build_decoder(&generic, &column).unwrap(), Decoder::Array(_)));

    let bytes = encode_one(&bulk, &column, &value);
    assert_eq!(decode_one(&bulk, &column, &bytes), value);
    assert_eq!(decode_one(&generic, &column, &bytes), value);
}

#[test]
fn overflowing_array_count_is_invalid_data() {
    // A 9-byte varint encoding 2^61: the byte length of a UInt64 array with
    // that count wraps usize, which must surface as an error rather than a
    // silently empty array (or a debug-build panic).
    let config = CodecConfig::default();
    let column = Column::array("v", Column::new("", ColumnKind::UInt64));
    let decoder = build_decoder(&config, &column).unwrap();

    let mut bytes = vec![0x80u8; 8];
    bytes.push(0x20);
    let mut input = ByteInput::from_bytes(bytes);
    let mut slot = Value::Null;
    let err = decoder.decode(&mut slot, &mut input).unwrap_err();
    assert!(matches!(WireError::of(&err), Some(WireError::InvalidData(_))));
}

#[test]
fn bulk_and_generic_encoders_emit_identical_bytes() {
    let column = Column::array("v", Column::new("", ColumnKind::Float64));
    let value = Value::Array(vec![
        Value::Float64(1.5),
        Value::Float64(-0.25),
        Value::Float64(f64::MAX),
    ]);

    let bulk = CodecConfig::default();
    let generic = CodecConfig {
        use_bulk_arrays: false,
        ..CodecConfig::default()
    };
    assert!(matches!(build_encoder(&bulk, &column).unwrap(), Encoder::BulkArray(_)));
    assert!(matches!(build_encoder(&generic, &column).unwrap(), Encoder::Array(_)));

    assert_eq!(
        encode_one(&bulk, &column, &value),
        encode_one(&generic, &column, &value)
    );
}

#[test]
fn bulk_encoder_accepts_widened_elements() {
    // A decoded Array(UInt16) holds widened Int32 slots; writing it back
    // through the bulk path must reproduce the original bytes.
    let config = CodecConfig::default();
    let column = Column::array("v", Column::new("", ColumnKind::UInt16));
    let wire = encode_one(
        &config,
        &column,
        &Value::Array(vec![Value::Int32(65535), Value::Int32(7)]),
    );
    assert_eq!(wire, vec![2, 0xff, 0xff, 0x07, 0x00]);
    assert_eq!(decode_one(&config, &column, &wire), Value::Array(vec![
        Value::Int32(65535),
        Value::Int32(7),
    ]));
}

#[test]
fn bulk_path_skips_nullable_elements() {
    let config = CodecConfig::default();
    let column = Column::array("v", Column::new("", ColumnKind::Int32).nullable());
    assert!(matches!(build_decoder(&config, &column).unwrap(), Decoder::Array(_)));
}

#[test]
fn tuples_check_arity_on_write() {
    let column = Column::tuple(
        "v",
        vec![
            Column::new("", ColumnKind::Int32),
            Column::new("", ColumnKind::String),
        ],
    );
    let value = Value::Tuple(vec![Value::Int32(1), Value::Text("x".into())]);
    assert_eq!(round_trip(&column, value.clone()), value);

    let config = CodecConfig::default();
    let encoder = build_encoder(&config, &column).unwrap();
    let mut output = ByteOutput::in_memory();
    let short = Value::Tuple(vec![Value::Int32(1)]);
    assert!(encoder.encode(&short, &mut output).is_err());
}

#[test]
fn nested_encodes_as_tuple_of_field_arrays() {
    let column = Column::nested(
        "n",
        vec![
            Column::new("id", ColumnKind::Int32),
            Column::new("tag", ColumnKind::String),
        ],
    );
    let value = Value::Tuple(vec![
        Value::Array(vec![Value::Int32(1), Value::Int32(2)]),
        Value::Array(vec![Value::Text("a".into()), Value::Text("b".into())]),
    ]);
    assert_eq!(round_trip(&column, value.clone()), value);
}

#[test]
fn geo_kinds_are_point_arrays() {
    let ring = Column::new("r", ColumnKind::Ring);
    let value = Value::Array(vec![Value::Point(0.0, 0.0), Value::Point(1.0, 2.0)]);
    assert_eq!(round_trip(&ring, value.clone()), value);

    let polygon = Column::new("p", ColumnKind::Polygon);
    let value = Value::Array(vec![Value::Array(vec![Value::Point(3.5, -1.0)])]);
    assert_eq!(round_trip(&polygon, value.clone()), value);
}

#[test]
fn point_accepts_two_element_tuples() {
    let config = CodecConfig::default();
    let column = Column::new("p", ColumnKind::Point);
    let tuple = Value::Tuple(vec![Value::Float64(1.0), Value::Float64(2.0)]);
    let bytes = encode_one(&config, &column, &tuple);
    assert_eq!(decode_one(&config, &column, &bytes), Value::Point(1.0, 2.0));
}

#[test]
fn simple_aggregate_delegates_to_inner() {
    let column = Column::simple_aggregate("v", "max", Column::new("", ColumnKind::Int64));
    assert_eq!(round_trip(&column, Value::Int64(9)), Value::Int64(9));
}

#[test]
fn small_bitmap_round_trips() {
    let column = Column::aggregate("v", "groupBitmap", Column::new("", ColumnKind::UInt32));
    let value = Value::Bitmap(Bitmap::from_values(vec![1, 5, 100]));
    assert_eq!(round_trip(&column, value.clone()), value);
}

#[test]
fn roaring_bitmap_round_trips() {
    let column = Column::aggregate("v", "groupBitmap", Column::new("", ColumnKind::UInt32));
    let value = Value::Bitmap(Bitmap::from_values((0..1000).collect()));
    let round = round_trip(&column, value.clone());
    let bitmap = round.as_bitmap().unwrap();
    assert_eq!(bitmap.cardinality(), 1000);
    assert!(bitmap.contains(999));
    assert!(!bitmap.contains(1000));
}

#[test]
fn large_64_bit_bitmap_is_unsupported_on_write() {
    let column = Column::aggregate("v", "groupBitmap", Column::new("", ColumnKind::UInt64));
    let config = CodecConfig::default();
    let encoder = build_encoder(&config, &column).unwrap();
    let mut output = ByteOutput::in_memory();
    let big = Value::Bitmap(Bitmap::from_values((0..1000).collect()));
    let err = encoder.encode(&big, &mut output).unwrap_err();
    assert!(matches!(WireError::of(&err), Some(WireError::UnsupportedType(_))));
}

#[test]
fn unsupported_aggregate_fails_at_build_time() {
    let config = CodecConfig::default();
    let column = Column::aggregate("v", "uniqState", Column::new("", ColumnKind::UInt64));
    let err = build_decoder(&config, &column).unwrap_err();
    assert!(matches!(WireError::of(&err), Some(WireError::UnsupportedType(_))));
}

#[test]
fn truncated_value_reports_incomplete_read() {
    let config = CodecConfig::default();
    let decoder = build_decoder(&config, &Column::new("v", ColumnKind::Int64)).unwrap();
    let mut input = ByteInput::from_bytes(vec![1, 2, 3]);
    let mut slot = Value::Null;
    let err = decoder.decode(&mut slot, &mut input).unwrap_err();
    assert!(matches!(
        WireError::of(&err),
        Some(WireError::IncompleteRead { .. })
    ));
}

#[test]
fn nothing_consumes_no_bytes() {
    let config = CodecConfig::default();
    let decoder = build_decoder(&config, &Column::new("v", ColumnKind::Nothing)).unwrap();
    let mut input = ByteInput::from_bytes(Vec::new());
    let mut slot = Value::Int32(1);
    decoder.decode(&mut slot, &mut input).unwrap();
    assert!(slot.is_null());
    assert!(input.exhausted().unwrap());
}
