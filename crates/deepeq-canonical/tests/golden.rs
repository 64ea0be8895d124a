use deepeq_canonical::{
    hash_value, Canonicalizer, DigestAlg, DigestEncoding, HashOptions, Normalized, Normalizer,
    Options, Structure, Transform,
};
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Serialize)]
struct Coordinate {
    x: i32,
    y: i32,
}

#[derive(Serialize)]
enum Shape {
    Dot,
    Circle { radius: u32 },
}

fn hash(value: &serde_json::Value) -> String {
    hash_value(value, &HashOptions::default()).unwrap()
}

#[test]
fn canonical_text_is_golden() {
    let value = Structure::from_serialize(&Point { x: 1, y: -2 }).unwrap();
    assert_eq!(
        Canonicalizer::new().canonicalize(value),
        "named:5:Point:object:2:{string:1:x=>int:1,string:1:y=>int:-2}"
    );

    let shape = Structure::from_serialize(&Shape::Circle { radius: 3 }).unwrap();
    assert_eq!(
        Canonicalizer::new().canonicalize(shape),
        "variant:5:Shape:6:Circle:object:1:{string:6:radius=>int:3}"
    );
    let dot = Structure::from_serialize(&Shape::Dot).unwrap();
    assert_eq!(Canonicalizer::new().canonicalize(dot), "variant:5:Shape:3:Dot:unit");
}

#[test]
fn hash_sanity_checks() {
    assert_eq!(hash(&json!({})), hash(&json!({})));
    assert_eq!(
        hash(&json!({"a": "hi", "b": "bye"})),
        hash(&json!({"b": "bye", "a": "hi"}))
    );
    assert_eq!(hash(&json!(["blah"])), hash(&json!(["blah"])));

    assert_ne!(hash(&json!({"a": "hi", "b": "bye"})), hash(&json!({"a": "hi"})));
    assert_ne!(
        hash(&json!({"a": "hi", "b": "bye"})),
        hash(&json!({"a": "hi", "b": "bye bye"}))
    );
    assert_ne!(hash(&json!(["bleep", "bloop"])), hash(&json!(["bloop", "bleep"])));
}

#[test]
fn plain_json_hashing_ignores_type_names() {
    let typed = HashOptions::default();
    let plain = HashOptions {
        plain_json: true,
        ..HashOptions::default()
    };
    let point = Point { x: 1, y: 2 };
    let coordinate = Coordinate { x: 1, y: 2 };

    assert_ne!(
        hash_value(&point, &typed).unwrap(),
        hash_value(&coordinate, &typed).unwrap()
    );
    assert_eq!(
        hash_value(&point, &plain).unwrap(),
        hash_value(&coordinate, &plain).unwrap()
    );
}

#[test]
fn sha256_base64url_digest_of_canonical_text() {
    let options = HashOptions {
        algorithm: DigestAlg::Sha256,
        encoding: DigestEncoding::Base64Url,
        ..HashOptions::default()
    };
    let digest = hash_value(&json!({"a": 1}), &options).unwrap();
    assert_eq!(digest.len(), 43);
    assert!(!digest.contains('='));

    let passthrough = HashOptions {
        algorithm: DigestAlg::Passthrough,
        ..HashOptions::default()
    };
    assert_eq!(
        hash_value(&json!({"a": 1}), &passthrough).unwrap(),
        "object:1:{string:1:a=>int:1}"
    );
}

#[test]
fn to_json_transform_and_transformer_compose() {
    let tag_only = Transform::custom(|node| match node.get("x") {
        Some(x) => x.clone(),
        None => node,
    });
    let normalizer = Normalizer::new(
        &Options::new()
            .with_to_json_transform(true)
            .with_transformer(tag_only),
    );
    assert_eq!(
        normalizer.normalize_key(&Point { x: 7, y: 1 }).unwrap(),
        Normalized::Int(7)
    );
    assert_eq!(
        normalizer.normalize_key(&Point { x: 7, y: 1 }).unwrap(),
        normalizer.normalize_key(&Coordinate { x: 7, y: 9 }).unwrap()
    );
}

#[test]
fn options_load_from_json_and_drive_the_normalizer() {
    let options =
        Options::from_json_str(r#"{"algorithm": "sha-256", "encoding": "base64url"}"#).unwrap();
    let normalizer = Normalizer::new(&options);
    match normalizer.normalize_key(&json!([1, 2])).unwrap() {
        Normalized::Digest(d) => assert_eq!(d.len(), 43),
        other => panic!("expected a digest, got {other:?}"),
    }
}
