use greentic_lease_spec::{Duration, InternalData, LeaseDescriptor, RenewalRequest};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use serde_json::{Value, json};

fn finite_f64() -> impl Strategy<Value = f64> {
    use proptest::num::f64::{NEGATIVE, NORMAL, POSITIVE, SUBNORMAL, ZERO};
    POSITIVE | NEGATIVE | NORMAL | SUBNORMAL | ZERO
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        finite_f64().prop_map(Value::from),
        "[a-zA-Z0-9 _\\-\"]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(Value::Array),
            btree_map("[a-z_]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn payload() -> impl Strategy<Value = InternalData> {
    btree_map("[a-z_]{1,8}", json_value(), 0..6).prop_map(InternalData::from)
}

#[test]
fn issuance_shape_never_carries_an_increment() {
    let issued = LeaseDescriptor::new(Duration::seconds(30))
        .with_internal_data(InternalData::new().with("lease_ref", "r-1"));
    assert!(!issued.renewable);

    let encoded = serde_json::to_string(&issued).unwrap();
    let raw: Value = serde_json::from_str(&encoded).unwrap();
    let object = raw.as_object().unwrap();
    assert_eq!(
        object.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["internal_data", "lease", "lease_grace_period", "renewable"]
    );
    assert!(!encoded.contains("increment"));

    let decoded: LeaseDescriptor = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, issued);
}

#[test]
fn internal_data_round_trips_structurally() {
    let payload = json!({
        "credential": {
            "username": "v-token-7f3",
            "roles": ["read", "list"],
            "limits": {"rps": 10, "burst": 2.5},
            "labels": {},
        },
        "empty": {},
        "enabled": true,
        "parent": null,
    });
    let data: InternalData = serde_json::from_value(payload.clone()).unwrap();
    let descriptor = LeaseDescriptor::new(Duration::hours(1)).with_internal_data(data.clone());

    let bytes = serde_json::to_vec(&descriptor).unwrap();
    let decoded: LeaseDescriptor = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(decoded.internal_data, data);
    assert_eq!(serde_json::to_value(&decoded.internal_data).unwrap(), payload);
    assert_eq!(serde_json::to_vec(&decoded).unwrap(), bytes);
}

#[test]
fn hard_floats_survive_the_wire() {
    let data = InternalData::new()
        .with("ratio", 1.0715660391465826e-75)
        .with("tiny", 5e-324)
        .with("big", f64::MAX)
        .with("id", u64::MAX);
    let descriptor = LeaseDescriptor::new(Duration::minutes(1)).with_internal_data(data.clone());

    let bytes = serde_json::to_vec(&descriptor).unwrap();
    let decoded: LeaseDescriptor = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(decoded.internal_data, data);
    assert_eq!(serde_json::to_vec(&decoded).unwrap(), bytes);
}

proptest! {
    #[test]
    fn arbitrary_internal_data_round_trips(data in payload(), renewable in any::<bool>()) {
        let descriptor = LeaseDescriptor::new(Duration::minutes(10))
            .with_renewable(renewable)
            .with_internal_data(data.clone());

        let bytes = serde_json::to_vec(&descriptor).unwrap();
        let decoded: LeaseDescriptor = serde_json::from_slice(&bytes).unwrap();
        prop_assert_eq!(&decoded.internal_data, &data);
        prop_assert_eq!(serde_json::to_vec(&decoded).unwrap(), bytes);
    }
}

#[test]
fn missing_internal_data_is_rejected() {
    let err = serde_json::from_value::<LeaseDescriptor>(json!({
        "lease": 1_000_000_000i64,
        "lease_grace_period": 0,
        "renewable": false,
    }))
    .unwrap_err();
    assert!(err.to_string().contains("missing field `internal_data`"));
}

#[test]
fn null_internal_data_is_read_as_empty() {
    let decoded: LeaseDescriptor = serde_json::from_value(json!({
        "internal_data": null,
        "lease": 1_000_000_000i64,
        "lease_grace_period": 0,
        "renewable": false,
    }))
    .unwrap();
    assert!(decoded.internal_data.is_empty());
}

#[test]
fn empty_internal_data_stays_an_object() {
    let descriptor = LeaseDescriptor::new(Duration::seconds(5));
    let value = serde_json::to_value(&descriptor).unwrap();
    assert_eq!(value["internal_data"], json!({}));
}

#[test]
fn renewal_request_carries_increment_but_its_response_does_not() {
    let stored = LeaseDescriptor::new(Duration::minutes(5)).with_renewable(true);
    let request = RenewalRequest::new(stored, Some(Duration::minutes(15)));

    let on_wire = serde_json::to_value(&request).unwrap();
    assert_eq!(on_wire["lease_increment"], json!(900_000_000_000i64));

    let response = request.respond(request.granted_lease(Duration::minutes(5), None));
    let response_wire = serde_json::to_value(&response).unwrap();
    assert!(response_wire.get("lease_increment").is_none());
    assert_eq!(response.lease, Duration::minutes(15));
}
