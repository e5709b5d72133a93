//! The canonical fixtures from section 8.4 not already exercised by an in-module unit
//! test. Fixture 2 has no accessible reference-file bytes in this environment, so it is
//! approximated by encoding the three documented sample rows and decoding them back,
//! rather than parsing real recorded bytes; fixtures 1, 3, 4, and 6 are covered by
//! `mark5b::header`'s, `bcd`'s, and `vdif::frame`'s own unit tests.

use std::collections::HashMap;
use std::io::Cursor;

use vlbi_baseband::codec::OPTIMAL_2BIT_HIGH;
use vlbi_baseband::mark5b::Mark5bPayload;
use vlbi_baseband::vdif::{VdifFrameSet, VdifHeader, VdifVariant};

const HIGH: f32 = OPTIMAL_2BIT_HIGH;

/// Fixture 2: the first three decoded sample rows of a Mark 5B payload, `+3`/`-3` standing
/// in for `+OPTIMAL_2BIT_HIGH`/`-OPTIMAL_2BIT_HIGH`.
fn fixture_rows() -> [[f32; 8]; 3] {
    [
        [-HIGH, -1.0, 1.0, -1.0, HIGH, -HIGH, -HIGH, HIGH],
        [-HIGH, HIGH, -1.0, HIGH, -1.0, -1.0, -1.0, 1.0],
        [HIGH, -1.0, HIGH, HIGH, 1.0, -1.0, HIGH, -1.0],
    ]
}

#[test]
fn mark5b_payload_preserves_the_canonical_sample_rows() {
    let mut samples = vec![[1.0f32; 8]; 5000];
    samples[0..3].copy_from_slice(&fixture_rows());

    let payload = Mark5bPayload::from_samples(&samples).unwrap();
    let decoded = payload.decode().unwrap();

    assert_eq!(decoded.len(), 5000);
    assert_eq!(decoded[0..3], fixture_rows());
}

fn thread_values(thread_id: u64) -> HashMap<&'static str, u64> {
    let mut values = HashMap::new();
    for (name, value) in [
        ("ref_epoch", 28u64),
        ("seconds", 0),
        ("frame_nr", 0),
        ("vdif_version", 0),
        ("lg2_nchan", 3),
        ("frame_length", 1254),
        ("complex_data", 0),
        ("bits_per_sample", 1),
        ("thread_id", thread_id),
        ("station_id", 0),
        ("m5b_bcd_jday", 0x821),
        ("m5b_bcd_seconds", 0x19801),
    ] {
        values.insert(name, value);
    }
    values
}

fn thread_frame_bytes(thread_id: u64) -> Vec<u8> {
    let header = VdifHeader::from_keys(VdifVariant::Mark5bOverVdif, &thread_values(thread_id)).unwrap();
    let samples_per_frame = header.samples_per_frame().unwrap();
    let samples: Vec<Vec<f32>> = (0..samples_per_frame).map(|i| (0..8).map(|c| if (i + c) % 2 == 0 { HIGH } else { -1.0 }).collect()).collect();
    let payload_bytes = vlbi_baseband::codec::encode(8, 2, 4, &samples).unwrap();
    let mut bytes = header.to_bytes();
    bytes.extend(payload_bytes);
    bytes
}

/// Fixture 5: frames gathered out of thread-id order sort ascending, and the decoded
/// `data()` shape is `(nthreads, samples_per_frame, nchan)`.
#[test]
fn vdif_frameset_sorts_threads_and_reports_the_canonical_shape() {
    let mut bytes = Vec::new();
    for t in [2u64, 0, 1] {
        bytes.extend(thread_frame_bytes(t));
    }
    let mut cursor = Cursor::new(bytes);
    let set = VdifFrameSet::from_reader(&mut cursor, &[], true).unwrap();

    let ids: Vec<u64> = set.frames().iter().map(|f| f.header.get_u64("thread_id").unwrap()).collect();
    for pair in ids.windows(2) {
        assert!(pair[0] <= pair[1]);
    }

    let data = set.data().unwrap();
    let samples_per_frame = set.header0().samples_per_frame().unwrap();
    assert_eq!(data.len(), 3);
    for thread_data in &data {
        assert_eq!(thread_data.len(), samples_per_frame);
        for row in thread_data {
            assert_eq!(row.len(), 8);
        }
    }
}
