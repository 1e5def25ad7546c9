//! Encrypt/decrypt hot path benchmarks (C4/C5).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use knet_core::{Handle, HandleConfig};
use knet_crypto_abi::CryptoConfig;

fn handle_with(model: &str, cipher: &str, hash: &str) -> Handle {
    let h = Handle::new(HandleConfig::default());
    h.handle_crypto_set_config(
        &CryptoConfig {
            crypto_model: model.into(),
            crypto_cipher_type: cipher.into(),
            crypto_hash_type: hash.into(),
            private_key: vec![0xAB; 32],
        },
        1,
    )
    .unwrap();
    h.handle_crypto_use_config(1).unwrap();
    h
}

fn bench_send(c: &mut Criterion) {
    let sizes: &[usize] = &[64, 512, 1500, 9000];
    let mut group = c.benchmark_group("send");

    for backend in ["nss", "openssl"] {
        let (cipher, hash) = if backend == "nss" {
            ("aes256", "sha256")
        } else {
            ("chacha20", "blake3")
        };
        let handle = handle_with(backend, cipher, hash);

        for &size in sizes {
            let plaintext = vec![0x42u8; size];
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(backend, size), &size, |b, _| {
                b.iter(|| black_box(handle.send(&plaintext).unwrap()));
            });
        }
    }
    group.finish();
}

fn bench_recv(c: &mut Criterion) {
    let sizes: &[usize] = &[64, 512, 1500, 9000];
    let mut group = c.benchmark_group("recv");

    for backend in ["nss", "openssl"] {
        let (cipher, hash) = if backend == "nss" {
            ("aes256", "sha256")
        } else {
            ("chacha20", "blake3")
        };
        let handle = handle_with(backend, cipher, hash);

        for &size in sizes {
            let plaintext = vec![0x42u8; size];
            let ciphertext = handle.send(&plaintext).unwrap();
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(backend, size), &size, |b, _| {
                b.iter(|| black_box(handle.recv(&ciphertext).unwrap()));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_send, bench_recv);
criterion_main!(benches);
