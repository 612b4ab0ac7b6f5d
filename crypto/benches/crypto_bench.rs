use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizpay_crypto::{decrypt, encrypt, CipherKey, PayerKeys};

const PAYLOAD: &str = r#"{"course":"Intro","lesson":"L1","quiz":5,"account":"rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh","amount":10,"status":"payPENDING"}"#;

fn cipher_encrypt_bench(c: &mut Criterion) {
    let key = CipherKey::new([7u8; 32]);

    c.bench_function("aes256cbc_encrypt_payload", |b| {
        b.iter(|| encrypt(black_box(PAYLOAD), &key))
    });
}

fn cipher_decrypt_bench(c: &mut Criterion) {
    let key = CipherKey::new([7u8; 32]);
    let encrypted = encrypt(PAYLOAD, &key).expect("encrypt");

    c.bench_function("aes256cbc_decrypt_payload", |b| {
        b.iter(|| decrypt(black_box(&encrypted), &key))
    });
}

fn ed25519_sign_bench(c: &mut Criterion) {
    let keys = PayerKeys::from_entropy(&[1u8; 16]);
    let msg = [42u8; 256];

    c.bench_function("ed25519_sign_256B", |b| b.iter(|| keys.sign(black_box(&msg))));
}

criterion_group!(
    benches,
    cipher_encrypt_bench,
    cipher_decrypt_bench,
    ed25519_sign_bench
);
criterion_main!(benches);
