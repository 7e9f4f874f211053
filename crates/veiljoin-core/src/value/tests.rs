use super::*;

#[test]
fn kind_matches_variant() {
    assert_eq!(Value::Int(1).kind(), ColumnKind::Int);
    assert_eq!(Value::Url("a".into()).kind(), ColumnKind::Url);
    assert_eq!(Value::from("x").kind(), ColumnKind::Text);
}

#[test]
fn validate_rejects_text_over_kind_limit() {
    let code = Value::CountryCode("USAX".into());
    assert_eq!(
        code.validate(),
        Err(ValueError::TooLong {
            kind: ColumnKind::CountryCode,
            len: 4,
            max: 3,
        })
    );
    assert!(Value::CountryCode("USA".into()).validate().is_ok());
    assert!(Value::Long(i64::MAX).validate().is_ok());
}

#[test]
fn float_rejects_non_finite_and_normalizes_negative_zero() {
    assert!(Float32::try_new(f32::NAN).is_none());
    assert!(Float32::try_new(f32::INFINITY).is_none());

    let neg = Float32::try_new(-0.0).expect("zero is finite");
    let pos = Float32::try_new(0.0).expect("zero is finite");
    assert_eq!(neg, pos);
}

#[test]
fn same_kind_values_order_by_payload() {
    assert!(Value::Int(1) < Value::Int(2));
    assert!(Value::Text("a".into()) < Value::Text("b".into()));
}
