use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use jsonwebtoken::{encode, EncodingKey, Header};
use portal_session::auth::{decode_token, is_token_expired, seconds_remaining};

fn sample_token() -> String {
    let claims = serde_json::json!({
        "token_type": "access",
        "exp": chrono::Utc::now().timestamp() + 300,
        "iat": chrono::Utc::now().timestamp(),
        "jti": "0f6e4c6bb1b34c5c8e0a2b1f3d4e5a6b",
        "user_id": 1042,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"bench")).unwrap()
}

fn bench_decode(c: &mut Criterion) {
    let token = sample_token();

    c.bench_function("decode_token", |b| {
        b.iter(|| decode_token(black_box(&token)))
    });

    c.bench_function("decode_token_malformed", |b| {
        b.iter(|| decode_token(black_box("not.a-valid.token")))
    });
}

fn bench_freshness(c: &mut Criterion) {
    let token = sample_token();

    c.bench_function("is_token_expired", |b| {
        b.iter(|| is_token_expired(black_box(&token)))
    });

    c.bench_function("seconds_remaining", |b| {
        b.iter(|| seconds_remaining(black_box(&token)))
    });
}

criterion_group!(benches, bench_decode, bench_freshness);
criterion_main!(benches);
