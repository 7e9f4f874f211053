use super::{SerializeError, SerializeErrorKind, deserialize_bounded, serialize};
use crate::error::{ErrorClass, ErrorOrigin, InternalError};

#[test]
fn bounded_decode_rejects_oversized_payload_before_parsing() {
    let bytes = serialize(&vec![7u32; 16]).expect("vec should serialize");
    let err = deserialize_bounded::<Vec<u32>>(&bytes, 4).expect_err("limit must be enforced");

    assert_eq!(err.kind(), SerializeErrorKind::DeserializeSizeLimitExceeded);
}

#[test]
fn bounded_decode_reports_garbage_as_deserialize_error() {
    let err = deserialize_bounded::<String>(&[0xff, 0x00, 0x13], 64)
        .expect_err("garbage must not decode");

    assert_eq!(err.kind(), SerializeErrorKind::Deserialize);
}

#[test]
fn decode_failures_map_to_serialize_corruption() {
    let err: InternalError = SerializeError::Deserialize("bad".into()).into();
    assert_eq!(err.class, ErrorClass::Corruption);
    assert_eq!(err.origin, ErrorOrigin::Serialize);

    let err: InternalError = SerializeError::Serialize("bad".into()).into();
    assert_eq!(err.class, ErrorClass::Internal);
}
