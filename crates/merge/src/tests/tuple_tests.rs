use super::helpers::*;
use crate::*;
use anyhow::Result;
use sample::{encode_blob, Payload, Sample, HEADER_BYTES, KIND_BLOB};

fn points(id: u64, ts: &[u64], direction: Direction) -> MemTupleOperator {
    MemTupleOperator::from_points(id, ts.iter().map(|&t| (t, t as f64)), direction)
}

// -------------------- Ordering --------------------

#[test]
fn records_interleave_by_timestamp() -> Result<()> {
    let mut merge = TupleMerge::new(vec![
        points(1, &[0, 2, 4], Direction::Forward),
        points(2, &[1, 3, 5], Direction::Forward),
    ])?;

    let (out, _) = drain(&mut merge, records(64))?;
    assert_eq!(
        keys(&out),
        vec![(0, 1), (1, 2), (2, 1), (3, 2), (4, 1), (5, 2)]
    );
    Ok(())
}

#[test]
fn equal_timestamps_order_by_series() -> Result<()> {
    let mut merge = TupleMerge::new(vec![
        points(7, &[10, 20], Direction::Forward),
        points(3, &[10, 20], Direction::Forward),
    ])?;

    let (out, _) = drain(&mut merge, records(64))?;
    assert_eq!(keys(&out), vec![(10, 3), (10, 7), (20, 3), (20, 7)]);
    Ok(())
}

#[test]
fn backward_tuple_merge_descends() -> Result<()> {
    let mut merge = TupleMerge::new(vec![
        points(1, &[4, 2, 0], Direction::Backward),
        points(2, &[5, 3, 1], Direction::Backward),
    ])?;
    assert_eq!(merge.direction(), Direction::Backward);

    let (out, _) = drain(&mut merge, records(3))?;
    assert_eq!(
        keys(&out),
        vec![(5, 2), (4, 1), (3, 2), (2, 1), (1, 2), (0, 1)]
    );
    Ok(())
}

#[test]
fn input_may_interleave_several_series() -> Result<()> {
    let a = MemTupleOperator::from_samples(
        &[
            Sample::float(1, 5, 1.0),
            Sample::float(1, 6, 1.0),
            Sample::float(4, 5, 4.0),
        ],
        Direction::Forward,
    )?;
    let b = points(4, &[1, 2, 3], Direction::Forward);

    let mut merge = TupleMerge::new(vec![a, b])?;
    let (out, _) = drain(&mut merge, records(64))?;
    assert_eq!(
        keys(&out),
        vec![(1, 4), (1, 5), (1, 6), (2, 4), (3, 4), (4, 5)]
    );
    Ok(())
}

// -------------------- Variable-size records --------------------

fn blobs(id: u64, items: &[(u64, usize)]) -> Result<MemTupleOperator> {
    let mut bytes = Vec::new();
    for &(ts, len) in items {
        encode_blob(&mut bytes, ts, id, KIND_BLOB, &vec![id as u8; len])?;
    }
    Ok(MemTupleOperator::new(bytes, Direction::Forward)?)
}

#[test]
fn variable_records_are_copied_verbatim() -> Result<()> {
    let mut merge = TupleMerge::new(vec![
        blobs(1, &[(1, 0), (3, 100)])?,
        blobs(2, &[(2, 7), (4, 1)])?,
    ])?;

    let (out, _) = drain(&mut merge, 4096)?;
    let samples = decode(&out);
    let shape: Vec<(u64, usize)> = samples
        .iter()
        .map(|s| match &s.payload {
            Payload::Raw { kind, bytes } => {
                assert_eq!(*kind, KIND_BLOB);
                assert!(bytes.iter().all(|&b| b == s.series_id as u8));
                (s.timestamp, bytes.len())
            }
            Payload::Float(_) => panic!("unexpected float"),
        })
        .collect();
    assert_eq!(shape, vec![(1, 0), (2, 7), (3, 100), (4, 1)]);
    Ok(())
}

#[test]
fn record_that_does_not_fit_waits_for_next_call() -> Result<()> {
    let mut merge = TupleMerge::new(vec![blobs(1, &[(1, 8), (2, 200)])?])?;
    let mut buf = vec![0u8; HEADER_BYTES + 100];

    assert_eq!(merge.read(&mut buf)?, (Status::Success, HEADER_BYTES + 8));
    // still too small for the 200-byte payload
    assert_eq!(merge.read(&mut buf)?, (Status::Success, 0));

    let mut big = vec![0u8; HEADER_BYTES + 200];
    assert_eq!(merge.read(&mut big)?, (Status::NoData, HEADER_BYTES + 200));
    Ok(())
}

#[test]
fn record_larger_than_range_is_an_error() -> Result<()> {
    // 24-byte header + 40-byte payload, against a one-float (32-byte) range
    let cfg = MergeConfig::default().with_range_size(1);
    let mut merge = TupleMerge::with_config(vec![blobs(1, &[(1, 40)])?], cfg)?;
    let mut buf = vec![0u8; 4096];

    for _ in 0..3 {
        assert!(matches!(
            merge.read(&mut buf),
            Err(MergeError::RecordTooLarge {
                len: 64,
                capacity: 32
            })
        ));
    }
    Ok(())
}

#[test]
fn mem_tuple_operator_rejects_short_buffer() -> Result<()> {
    let mut op = blobs(1, &[(1, 8), (2, 40)])?;
    let mut buf = vec![0u8; HEADER_BYTES + 8];

    assert_eq!(op.read(&mut buf)?, (Status::Success, HEADER_BYTES + 8));
    assert!(matches!(
        op.read(&mut buf),
        Err(MergeError::RecordTooLarge { len: 64, .. })
    ));
    // nothing was consumed by the failed read
    let mut big = vec![0u8; 64];
    assert_eq!(op.read(&mut big)?, (Status::NoData, 64));
    Ok(())
}

#[test]
fn malformed_input_aborts_the_call() -> Result<()> {
    let mut bytes = Vec::new();
    sample::append_float(&mut bytes, 1, 1, 1.0);
    bytes.extend_from_slice(&[0u8; 5]);
    let bad = RawChunks {
        chunks: vec![(Status::NoData, bytes)],
        claim_extra: 0,
    };
    let inputs: Vec<Box<dyn TupleOperator>> =
        vec![Box::new(points(2, &[1], Direction::Forward)), Box::new(bad)];
    let mut merge: TupleMerge = TupleMerge::new(inputs)?;

    let mut buf = vec![0u8; records(8)];
    assert!(matches!(
        merge.read(&mut buf),
        Err(MergeError::MalformedRecord { offset: 32, .. })
    ));
    Ok(())
}

// -------------------- Composition --------------------

#[test]
fn scalar_merges_feed_a_tuple_merge() -> Result<()> {
    let left = ScalarMerge::new(
        vec![1, 2],
        vec![
            scalar_ts(&[0, 4], Direction::Forward),
            scalar_ts(&[2], Direction::Forward),
        ],
    )?;
    let right = ScalarMerge::new(vec![3], vec![scalar_ts(&[1, 3], Direction::Forward)])?;

    let mut merge = TupleMerge::new(vec![left, right])?;
    let (out, _) = drain(&mut merge, records(2))?;
    // the left merge emits id 1's run before id 2's, so the tuple merge sees
    // (0,1) (4,1) (2,2) from it; only per-input order is guaranteed
    assert_eq!(keys(&out), vec![(0, 1), (1, 3), (3, 3), (4, 1), (2, 2)]);
    Ok(())
}

#[test]
fn tuple_merges_nest() -> Result<()> {
    let inner = TupleMerge::new(vec![
        points(1, &[1, 5], Direction::Forward),
        points(2, &[3], Direction::Forward),
    ])?;
    let other = TupleMerge::new(vec![points(3, &[2, 4, 6], Direction::Forward)])?;

    let mut outer = TupleMerge::new(vec![inner, other])?;
    let (out, _) = drain(&mut outer, records(1))?;
    let ts: Vec<u64> = keys(&out).into_iter().map(|(t, _)| t).collect();
    assert_eq!(ts, vec![1, 2, 3, 4, 5, 6]);
    Ok(())
}

#[test]
fn empty_tuple_merge() -> Result<()> {
    let mut merge: TupleMerge<MemTupleOperator> = TupleMerge::new(vec![])?;
    let mut buf = vec![0u8; 64];
    assert_eq!(merge.read(&mut buf)?, (Status::NoData, 0));
    assert!(merge.is_exhausted());
    Ok(())
}

#[test]
fn tuple_direction_mismatch() {
    let err = TupleMerge::new(vec![
        points(1, &[1], Direction::Backward),
        points(2, &[1], Direction::Forward),
    ])
    .unwrap_err();
    assert!(matches!(err, MergeError::DirectionMismatch { index: 1, .. }));
}
