//! Framing + reconstruction without any symbol engine in between.

use qrx_core::pack::encoder::frame_file;
use qrx_core::diagnostics::IndexRange;
use qrx_core::{DecodePolicy, Diagnostic, reconstruct};

/// Deterministic pseudo-random bytes (xorshift).
fn noise(len: usize, mut seed: u64) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed >> 24) as u8
        })
        .collect()
}

fn tagged(payloads: &[String]) -> Vec<(String, String)> {
    payloads
        .iter()
        .enumerate()
        .map(|(i, p)| (format!("img-{i}"), p.clone()))
        .collect()
}

#[test]
fn five_thousand_bytes_in_four_chunks() {
    let data = noise(5000, 0x5eed);
    let payloads = frame_file("bin/blob.dat", &data, 2000).unwrap();
    assert_eq!(payloads.len(), 4);
    let data_lens: Vec<_> = payloads
        .iter()
        .map(|p| p.splitn(4, '|').nth(3).unwrap().len())
        .collect();
    assert_eq!(data_lens, vec![2000, 2000, 2000, 668]);

    for order in [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1]] {
        let shuffled: Vec<String> = order.iter().map(|&i| payloads[i].clone()).collect();
        let r = reconstruct(tagged(&shuffled), DecodePolicy::default());
        assert!(r.diagnostics.is_empty(), "{:?}", r.diagnostics);
        assert_eq!(r.files.len(), 1);
        assert_eq!(r.files[0].path, "bin/blob.dat");
        assert_eq!(r.files[0].bytes, data);
    }
}

#[test]
fn round_trips_edge_inputs_at_many_chunk_sizes() {
    let all_bytes: Vec<u8> = (0..=255u8).collect();
    let inputs: Vec<Vec<u8>> = vec![Vec::new(), vec![0], all_bytes, noise(1031, 7)];
    for data in &inputs {
        for chunk_size in [1, 2, 3, 4, 5, 63, 64, 1000, 5000] {
            let payloads = frame_file("f", data, chunk_size).unwrap();
            let b64_len = data.len().div_ceil(3) * 4;
            let expected = if b64_len == 0 {
                1
            } else {
                b64_len.div_ceil(chunk_size)
            };
            assert_eq!(payloads.len(), expected);

            let mut rev = payloads.clone();
            rev.reverse();
            let r = reconstruct(tagged(&rev), DecodePolicy::default());
            assert!(r.diagnostics.is_empty());
            assert_eq!(&r.files[0].bytes, data, "chunk_size={chunk_size}");
        }
    }
}

#[test]
fn several_files_interleaved() {
    let a = noise(300, 1);
    let b = noise(17, 2);
    let pa = frame_file("a.bin", &a, 40).unwrap();
    let pb = frame_file("dir/b.bin", &b, 8).unwrap();
    let mut ia = pa.iter().rev().cloned();
    let mut ib = pb.iter().cloned();
    let mut mixed = Vec::new();
    loop {
        match (ib.next(), ia.next()) {
            (None, None) => break,
            (x, y) => {
                mixed.extend(x);
                mixed.extend(y);
            }
        }
    }
    let r = reconstruct(tagged(&mixed), DecodePolicy::default());
    assert!(r.diagnostics.is_empty());
    assert_eq!(r.files.len(), 2);
    assert_eq!(r.files[0].bytes, a);
    assert_eq!(r.files[1].bytes, b);
}

#[test]
fn dropping_a_chunk_is_lossy_but_survivable() {
    let data = noise(3000, 99);
    let mut payloads = frame_file("lossy.bin", &data, 400).unwrap();
    assert!(payloads.len() > 2);
    payloads.remove(1);

    let r = reconstruct(tagged(&payloads), DecodePolicy::default());
    assert!(matches!(
        &r.diagnostics[..],
        [Diagnostic::MissingChunk { path, missing, .. }] if path == "lossy.bin" && missing == &vec![IndexRange::single(2)]
    ));
    assert_eq!(r.files.len(), 1);
    assert_ne!(r.files[0].bytes, data);
    assert_eq!(r.files[0].bytes.len(), data.len() - 300);
    assert!(!r.files[0].complete);
}

#[test]
fn duplicate_resolution_follows_input_order() {
    let first = "f|1|1|aGk=".to_string();
    let second = "f|1|1|eW8=".to_string();
    let r = reconstruct(
        tagged(&[first.clone(), second.clone()]),
        DecodePolicy::default(),
    );
    assert_eq!(r.files[0].bytes, b"yo");
    assert_eq!(r.diagnostics[0].kind(), "duplicate-chunk");

    let r = reconstruct(tagged(&[second, first]), DecodePolicy::default());
    assert_eq!(r.files[0].bytes, b"hi");
}

#[test]
fn malformed_text_leaves_other_files_alone() {
    let data = noise(100, 3);
    let mut inputs = tagged(&frame_file("good.bin", &data, 50).unwrap());
    inputs.insert(1, ("stray.png".into(), "just|three|fields".into()));

    let r = reconstruct(inputs, DecodePolicy::default());
    assert_eq!(r.diagnostics.len(), 1);
    assert!(matches!(
        &r.diagnostics[0],
        Diagnostic::MalformedPayload { source_id, .. } if source_id == "stray.png"
    ));
    assert_eq!(r.files.len(), 1);
    assert_eq!(r.files[0].bytes, data);
}
