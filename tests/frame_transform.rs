mod common;

use approx::assert_abs_diff_eq;
use pointfit::constants::RADSEC;
use pointfit::log_context::LogContext;
use pointfit::site::SiteLocation;
use pointfit::sky::{normalize_signed, AzimuthConvention, Frame, SkyPosition};
use pointfit::time::parse_epoch;
use pointfit::transform::{
    strategy_divergence, Atmosphere, TransformStrategy, DIVERGENCE_BOUND_ARCSEC,
};

#[test]
fn test_equator_round_trip() {
    let ctx = LogContext::default();
    let site = SiteLocation::new(-70.7, 0.0, 2400.0).unwrap();
    let epoch = parse_epoch("2022-03-15T04:30:00").unwrap();

    for strategy in [TransformStrategy::Rigorous, TransformStrategy::Legacy] {
        let engine = strategy.engine(None, &ctx);
        let lst = engine.local_sidereal_time(epoch, &site).unwrap();

        for (ra, dec) in [(1.2, 0.3), (4.0, -0.9), (5.5, 0.05)] {
            let star = SkyPosition::catalog(ra, dec, epoch);
            let horizon = engine
                .to_horizon(&star, epoch, &site, &Atmosphere::vacuum(), false)
                .unwrap();
            let hadec = engine.to_hour_angle_dec(&horizon, epoch, &site).unwrap();

            assert_eq!(hadec.frame, Frame::HourAngleDec);
            assert_abs_diff_eq!(hadec.lat, dec, epsilon = 1e-10);
            assert_abs_diff_eq!(
                normalize_signed(hadec.lon - (lst - ra)),
                0.0,
                epsilon = 1e-10
            );
        }
    }
}

#[test]
fn test_zero_pressure_is_apparent_place() {
    let ctx = LogContext::default();
    let site = common::dome_c();
    let epoch = parse_epoch("2021-06-01T03:00:00").unwrap();
    let humid_cold = Atmosphere::new(-60.0, 0.0, 0.9);

    for strategy in [TransformStrategy::Rigorous, TransformStrategy::Legacy] {
        let engine = strategy.engine(None, &ctx);
        for (ra, dec) in [(0.4, -1.1), (2.2, -0.6), (3.9, -0.3)] {
            let star = SkyPosition::catalog(ra, dec, epoch);

            let corrected = engine
                .to_horizon(&star, epoch, &site, &humid_cold, true)
                .unwrap();
            let apparent = engine.apparent_place(&star, epoch).unwrap();
            let direct = engine
                .to_horizon(&apparent, epoch, &site, &humid_cold, false)
                .unwrap();

            assert_abs_diff_eq!(corrected.lon, direct.lon, epsilon = 1e-12);
            assert_abs_diff_eq!(corrected.lat, direct.lat, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_strategies_within_bound() {
    let ctx = LogContext::default();
    let rigorous = TransformStrategy::Rigorous.engine(Some(AzimuthConvention::NorthEast), &ctx);
    let legacy = TransformStrategy::Legacy.engine(Some(AzimuthConvention::NorthEast), &ctx);
    let site = common::mid_latitude();
    let atmosphere = Atmosphere::new(12.0, 950.0, 0.5);
    let epoch = parse_epoch("2023-11-20T22:15:00").unwrap();
    let lst = rigorous.local_sidereal_time(epoch, &site).unwrap();

    let mut checked = 0;
    for k in 0..36 {
        let ha = -1.5 + 0.25 * (k % 12) as f64;
        let dec = [-0.1, 0.4, 0.9][k / 12];
        let star = SkyPosition::catalog(lst - ha, dec, epoch);

        let horizon = rigorous
            .to_horizon(&star, epoch, &site, &atmosphere, true)
            .unwrap();
        if horizon.lat < 10f64.to_radians() {
            continue;
        }

        let separation = strategy_divergence(
            rigorous.as_ref(),
            legacy.as_ref(),
            &star,
            epoch,
            &site,
            &atmosphere,
        )
        .unwrap();
        assert!(
            separation < DIVERGENCE_BOUND_ARCSEC,
            "star {k} diverges by {separation}\""
        );
        checked += 1;
    }
    assert!(checked > 10);
}

#[test]
fn test_catalog_correction_is_refraction_plus_apparent_place() {
    let ctx = LogContext::default();
    let engine = TransformStrategy::Rigorous.engine(None, &ctx);
    let site = common::dome_c();
    let epoch = parse_epoch("2021-06-01T03:00:00").unwrap();
    let star = SkyPosition::catalog(2.2, -0.6, epoch);

    let vacuum = engine
        .to_horizon(&star, epoch, &site, &Atmosphere::vacuum(), true)
        .unwrap();
    let atmosphere = Atmosphere::new(-50.0, 650.0, 0.2);
    let air = engine
        .to_horizon(&star, epoch, &site, &atmosphere, true)
        .unwrap();

    assert_abs_diff_eq!(air.lon, vacuum.lon, epsilon = 1e-12);
    let lift = (air.lat - vacuum.lat) / RADSEC;
    assert!(lift > 0.0 && lift < 200.0, "refraction {lift}\"");
}

#[test]
fn test_invalid_site_and_time() {
    let ctx = LogContext::default();
    let engine = TransformStrategy::Rigorous.engine(None, &ctx);
    let epoch = parse_epoch("2021-06-01T03:00:00").unwrap();
    let star = SkyPosition::catalog(1.0, 0.2, epoch);

    let mut site = common::dome_c();
    site.latitude = ordered_float::NotNan::new(120.0).unwrap();
    assert!(matches!(
        engine.to_horizon(&star, epoch, &site, &Atmosphere::vacuum(), true),
        Err(pointfit::pointing_errors::PointingError::InvalidSite(_))
    ));

    let far = parse_epoch("3500-01-01T00:00:00").unwrap();
    assert!(matches!(
        engine.to_horizon(&star, far, &common::dome_c(), &Atmosphere::vacuum(), true),
        Err(pointfit::pointing_errors::PointingError::InvalidTime(_))
    ));
}
