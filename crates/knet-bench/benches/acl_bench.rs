//! ACL validate hot path benchmarks (C6).

use std::net::IpAddr;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use knet_core::{AclAction, AclEntry, AclTable};

fn table_with(entries: usize) -> AclTable {
    let mut table = AclTable::default();
    for i in 0..entries {
        let octet = u8::try_from(i % 254).unwrap() + 1;
        table.add(AclEntry::address(
            IpAddr::from([10, 0, 0, octet]),
            AclAction::Accept,
        ));
    }
    table
}

fn bench_validate(c: &mut Criterion) {
    let depths: &[usize] = &[1, 16, 128, 1024];
    let mut group = c.benchmark_group("acl_validate");

    for &depth in depths {
        let table = table_with(depth);
        let last_match: IpAddr = IpAddr::from([10, 0, 0, u8::try_from(depth % 254).unwrap()]);
        let no_match: IpAddr = IpAddr::from([192, 168, 0, 1]);

        group.bench_with_input(BenchmarkId::new("worst_case_match", depth), &depth, |b, _| {
            b.iter(|| black_box(table.validate(last_match)));
        });
        group.bench_with_input(BenchmarkId::new("default_reject", depth), &depth, |b, _| {
            b.iter(|| black_box(table.validate(no_match)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
