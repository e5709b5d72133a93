//! VDIF reference-epoch timekeeping and Mark 5B BCD timestamp conversion.
//!
//! Grounded in `get_time`/`set_time` and the `ref_epochs` table in
//! `vdif/header.py`: VDIF timestamps a frame as a half-year index since
//! 2000-01-01 plus a whole second count plus a frame number, and Mark 5B
//! timestamps a frame as BCD day-of-year/seconds-of-day/fraction-of-second
//! digits, disambiguated against an approximate reference MJD supplied by
//! the caller (`Mark5BHeader.fromfile(fh, ref_mjd=...)` in the original).

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

use crate::bcd::{bcd_decode, bcd_encode};
use crate::error::{Result, VdifError};

/// Start of the VDIF reference-epoch table: half-year index 0 is 2000-01-01.
pub fn ref_epoch_start(index: u32) -> Result<DateTime<Utc>> {
    let year = 2000 + (index / 2) as i32;
    let month = if index % 2 == 0 { 1 } else { 7 };
    let naive = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| VdifError::ShapeMismatch { reason: format!("ref_epoch index {index} is out of range") })?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// The largest reference-epoch index whose start is not after `time`.
pub fn ref_epoch_index_for(time: DateTime<Utc>) -> Result<u32> {
    if time < ref_epoch_start(0)? {
        return Err(VdifError::ShapeMismatch { reason: "time precedes the VDIF reference epoch of 2000-01-01".into() });
    }
    let years = (time.year() - 2000).max(0) as u32;
    let mut index = years * 2 + if time.month() >= 7 { 1 } else { 0 };
    while ref_epoch_start(index)? > time {
        index -= 1;
    }
    while ref_epoch_start(index + 1)? <= time {
        index += 1;
    }
    Ok(index)
}

/// Resolve a VDIF header's `(ref_epoch, seconds, frame_nr)` triple to an absolute time.
///
/// `frame_rate`, in frames per second, is required whenever `frame_nr != 0`; pass it
/// explicitly when the header itself cannot derive one (legacy VDIF, some EDVs).
pub fn vdif_time(ref_epoch: u32, seconds: u32, frame_nr: u32, frame_rate: Option<f64>) -> Result<DateTime<Utc>> {
    let epoch = ref_epoch_start(ref_epoch)?;
    let offset_ns = if frame_nr == 0 {
        0
    } else {
        let rate = frame_rate.ok_or(VdifError::MissingFrameRate)?;
        ((frame_nr as f64 / rate) * 1e9).round() as i64
    };
    Ok(epoch + Duration::seconds(seconds as i64) + Duration::nanoseconds(offset_ns))
}

/// Invert [`vdif_time`]: decompose an absolute time into `(ref_epoch, seconds, frame_nr)`.
///
/// Offsets under 2 ns from a whole second collapse to `frame_nr = 0`, matching the
/// tolerance the original uses to treat a time as falling exactly on a frame boundary.
pub fn vdif_time_components(time: DateTime<Utc>, frame_rate: Option<f64>) -> Result<(u32, u32, u32)> {
    let index = ref_epoch_index_for(time)?;
    let epoch = ref_epoch_start(index)?;
    let elapsed = time - epoch;
    let total_ns = elapsed
        .num_nanoseconds()
        .ok_or_else(|| VdifError::ShapeMismatch { reason: "offset from reference epoch overflows i64 nanoseconds".into() })?;
    let seconds = (total_ns / 1_000_000_000) as u32;
    let frac_ns = total_ns % 1_000_000_000;
    let frame_nr = if frac_ns.abs() < 2 {
        0
    } else {
        let rate = frame_rate.ok_or(VdifError::MissingFrameRate)?;
        ((frac_ns as f64 / 1e9) * rate).round() as u32
    };
    Ok((index, seconds, frame_nr))
}

fn mjd_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1858, 11, 17).expect("1858-11-17 is a valid date")
}

fn mjd_of(date: NaiveDate) -> i64 {
    (date - mjd_epoch()).num_days()
}

fn date_from_mjd(mjd: i64) -> Result<NaiveDate> {
    mjd_epoch()
        .checked_add_signed(Duration::days(mjd))
        .ok_or_else(|| VdifError::ShapeMismatch { reason: format!("MJD {mjd} is out of range") })
}

/// Resolve a Mark 5B header's BCD day/seconds/fraction fields to an absolute time.
///
/// Mark 5B's day field stores the Modified Julian Day modulo 1000, so the true day has
/// to be recovered against an approximate `ref_mjd` for the recording (typically today's
/// MJD, or the start of the observation): the thousand-day window nearest `ref_mjd` is
/// assumed, matching `Mark5BHeader.fromfile(fh, ref_mjd=...)` in the original. The
/// fraction-of-second field is 4 BCD digits in units of 100 microseconds, the resolution
/// real Mark 5B hardware timestamps at.
pub fn mark5b_time(bcd_jday: u64, bcd_seconds: u64, bcd_fraction: u64, ref_mjd: f64) -> Result<DateTime<Utc>> {
    let jday_mod1000 = bcd_decode(bcd_jday)? as i64;
    let kday = (ref_mjd / 1000.0).floor() as i64 * 1000;
    let mut mjd = kday + jday_mod1000;
    let diff = mjd as f64 - ref_mjd;
    if diff > 500.0 {
        mjd -= 1000;
    } else if diff < -500.0 {
        mjd += 1000;
    }
    let date = date_from_mjd(mjd)?;
    let day_start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
    let seconds = bcd_decode(bcd_seconds)?;
    let frac_ticks = bcd_decode(bcd_fraction)?;
    Ok(day_start + Duration::seconds(seconds as i64) + Duration::nanoseconds(frac_ticks as i64 * 100_000))
}

/// Invert [`mark5b_time`]: decompose an absolute time into the `(bcd_jday, bcd_seconds,
/// bcd_fraction)` fields a Mark 5B header stores.
pub fn mark5b_time_components(time: DateTime<Utc>) -> Result<(u64, u64, u64)> {
    let date = time.date_naive();
    let jday_mod1000 = mjd_of(date).rem_euclid(1000) as u64;
    let day_start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
    let elapsed = time - day_start;
    let total_ns = elapsed
        .num_nanoseconds()
        .ok_or_else(|| VdifError::ShapeMismatch { reason: "offset from day start overflows i64 nanoseconds".into() })?;
    let seconds = (total_ns / 1_000_000_000) as u64;
    let frac_ticks = ((total_ns % 1_000_000_000) as f64 / 100_000.0).round() as u64;
    Ok((bcd_encode(jday_mod1000), bcd_encode(seconds), bcd_encode(frac_ticks)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_epoch_table_matches_spec() {
        assert_eq!(ref_epoch_start(0).unwrap(), Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(ref_epoch_start(1).unwrap(), Utc.with_ymd_and_hms(2000, 7, 1, 0, 0, 0).unwrap());
        assert_eq!(ref_epoch_start(28).unwrap(), Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn vdif_time_round_trips_through_frame_nr() {
        let rate = 4000.0;
        for frame_nr in [0u32, 1, 3999] {
            let t = vdif_time(28, 123, frame_nr, Some(rate)).unwrap();
            let (idx, secs, fnr) = vdif_time_components(t, Some(rate)).unwrap();
            assert_eq!((idx, secs, fnr), (28, 123, frame_nr));
        }
    }

    #[test]
    fn vdif_time_zero_frame_nr_needs_no_rate() {
        let t = vdif_time(28, 5, 0, None).unwrap();
        let (idx, secs, fnr) = vdif_time_components(t, None).unwrap();
        assert_eq!((idx, secs, fnr), (28, 5, 0));
    }

    #[test]
    fn vdif_time_without_rate_and_nonzero_frame_nr_errors() {
        let err = vdif_time(28, 5, 1, None).unwrap_err();
        assert!(matches!(err, VdifError::MissingFrameRate));
    }

    #[test]
    fn mark5b_fixture_time() {
        // From the canonical fixture: year=11 selects an epoch near 2011/2014, bcd_jday
        // 0x821 = 821, bcd_seconds 0x19801 = 19801s = 05:30:01, bcd_fraction 0.
        let ref_mjd = 56809.0; // MJD of 2014-06-01
        let t = mark5b_time(0x821, 0x19801, 0x0, ref_mjd).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2014, 6, 13, 5, 30, 1).unwrap());
    }

    #[test]
    fn mark5b_time_round_trips() {
        let original = Utc.with_ymd_and_hms(2014, 6, 13, 5, 30, 1).unwrap();
        let (jday, seconds, fraction) = mark5b_time_components(original).unwrap();
        let recovered = mark5b_time(jday, seconds, fraction, 56809.0).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn mark5b_window_wraps_near_kday_boundary() {
        // ref_mjd just under a thousand-day boundary; a jday_mod1000 of 2 should resolve
        // to just after, not 998 days in the past.
        let ref_mjd = 56998.0;
        let t = mark5b_time(bcd_encode(2), 0, 0, ref_mjd).unwrap();
        let recovered_mjd = mjd_of(t.date_naive());
        assert_eq!(recovered_mjd, 57002);
    }
}
