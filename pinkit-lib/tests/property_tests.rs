//! Property-based tests for the payload codec.

use base64::Engine;
use pinkit_lib::codec;
use pinkit_lib::record::{ContentEncoding, Operation, ProtocolRecord};
use proptest::prelude::*;

fn record_strategy() -> impl Strategy<Value = ProtocolRecord> {
    let body = prop_oneof![
        "[ -~]{0,64}".prop_map(|s| (ContentEncoding::Utf8, s)),
        proptest::collection::vec(any::<u8>(), 0..64).prop_map(|b| {
            (
                ContentEncoding::Base64,
                base64::engine::general_purpose::STANDARD.encode(&b),
            )
        }),
        proptest::collection::vec(any::<u8>(), 0..64)
            .prop_map(|b| (ContentEncoding::Hex, hex::encode(&b))),
    ];
    let target = prop_oneof![
        "[a-z]{1,12}".prop_map(|s| (Operation::Create, format!("/info/{s}"))),
        "[0-9a-f]{16}".prop_map(|id| (Operation::Modify, id)),
    ];
    let content_type = prop_oneof![
        Just("text/plain".to_string()),
        Just("image/jpeg;binary".to_string()),
        Just("application/json".to_string()),
    ];
    (body, target, content_type).prop_map(|((encoding, body), (operation, target), ct)| {
        match operation {
            Operation::Create => ProtocolRecord::create(target, &body, encoding, ct).unwrap(),
            Operation::Modify => ProtocolRecord::modify(&target, &body, encoding, ct).unwrap(),
        }
    })
}

proptest! {
    #[test]
    fn round_trip(record in record_strategy()) {
        let decoded = codec::decode(&codec::encode(&record)).unwrap();
        prop_assert_eq!(decoded, record);
    }

    #[test]
    fn encoding_is_deterministic(record in record_strategy()) {
        prop_assert_eq!(codec::encode(&record), codec::encode(&record));
    }

    #[test]
    fn script_starts_with_the_unspendable_prefix(record in record_strategy()) {
        let script = codec::encode(&record);
        prop_assert_eq!(&script[..2], &[0x00, 0x6a]);
    }
}
