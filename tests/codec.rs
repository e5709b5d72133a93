//! Coverage for the sample codec registry from a caller's perspective: known layouts
//! round-trip, unknown ones fail cleanly, and the canonical quantization levels survive.

use vlbi_baseband::codec::{self, OPTIMAL_2BIT_HIGH};
use vlbi_baseband::VdifError;

#[test]
fn registered_layout_round_trips_arbitrary_samples() {
    let samples: Vec<Vec<f32>> = (0..2000)
        .map(|i| (0..8).map(|c| [OPTIMAL_2BIT_HIGH, 1.0, -1.0, -OPTIMAL_2BIT_HIGH][(i + c) % 4]).collect())
        .collect();
    let bytes = codec::encode(8, 2, 4, &samples).unwrap();
    assert_eq!(bytes.len(), (2000 / 4) * 8);
    let decoded = codec::decode(8, 2, 4, &bytes).unwrap();
    assert_eq!(decoded, samples);
}

#[test]
fn unregistered_layout_reports_which_parameters_were_asked_for() {
    let err = codec::decode(16, 2, 4, &[]).unwrap_err();
    match err {
        VdifError::UnsupportedLayout { nchan, bps, fanout } => {
            assert_eq!((nchan, bps, fanout), (16, 2, 4));
        }
        other => panic!("expected UnsupportedLayout, got {other:?}"),
    }
}

#[test]
fn encode_rejects_a_row_with_the_wrong_channel_count() {
    let samples = vec![vec![0.0f32; 4]]; // 4 channels instead of 8
    let err = codec::encode(8, 2, 4, &samples).unwrap_err();
    assert!(matches!(err, VdifError::ShapeMismatch { .. }));
}
