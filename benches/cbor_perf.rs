use cardano_cbor::cardano::{ExUnits, PlutusData, ProtocolParamUpdate};
use cardano_cbor::union::DispatchCache;
use cardano_cbor::{Rational, from_slice, to_vec};
use codspeed_criterion_compat::*;
use std::hint::black_box;

fn datum() -> PlutusData {
    let leaf = |i: i128| {
        PlutusData::constr(
            0,
            vec![
                PlutusData::int(i),
                PlutusData::bytes(vec![i as u8; 28]),
                PlutusData::list(vec![PlutusData::int(-i), PlutusData::int(i << 70)]),
            ],
        )
    };
    PlutusData::list((0..64).map(leaf).collect())
}

fn param_update() -> ProtocolParamUpdate {
    ProtocolParamUpdate {
        min_fee_a: Some(44),
        min_fee_b: Some(155_381),
        pool_pledge_influence: Some(Rational::new(3, 10)),
        max_tx_ex_units: Some(ExUnits {
            mem: 14_000_000,
            steps: 10_000_000_000,
        }),
        ..Default::default()
    }
}

fn bench_plutus_data(c: &mut Criterion) {
    let value = datum();
    let bytes = to_vec(&value).unwrap();

    let mut group = c.benchmark_group("plutus-data");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode", |b| b.iter(|| to_vec(black_box(&value)).unwrap()));
    group.bench_function("decode-warm", |b| {
        b.iter(|| from_slice::<PlutusData>(black_box(&bytes)).unwrap())
    });
    group.bench_function("decode-cold", |b| {
        b.iter(|| {
            DispatchCache::global().clear_type::<PlutusData>();
            from_slice::<PlutusData>(black_box(&bytes)).unwrap()
        })
    });
    group.finish();
}

fn bench_records(c: &mut Criterion) {
    let update = param_update();
    let bytes = to_vec(&update).unwrap();

    let mut group = c.benchmark_group("records");
    group.bench_function("param-update-encode", |b| {
        b.iter(|| to_vec(black_box(&update)).unwrap())
    });
    group.bench_function("param-update-decode", |b| {
        b.iter(|| from_slice::<ProtocolParamUpdate>(black_box(&bytes)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_plutus_data, bench_records);
criterion_main!(benches);
