#![allow(dead_code)]

use std::f64::consts::TAU;

use approx::assert_abs_diff_eq;
use pointfit::constants::RADSEC;
use pointfit::log_context::LogContext;
use pointfit::models::{FittedModel, PointingModel};
use pointfit::observations::{FitFrame, StoredObservation};
use pointfit::site::SiteLocation;
use pointfit::sky::{normalize_positive, SkyPosition};
use pointfit::time::parse_epoch;
use pointfit::transform::{horizon_to_hadec, Atmosphere, TransformStrategy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

pub const TEMPERATURE: f64 = -50.0;
pub const PRESSURE: f64 = 650.0;
pub const HUMIDITY: f64 = 0.2;

/// Observing conditions of a synthetic session.
pub struct Session {
    pub site: SiteLocation,
    pub strategy: TransformStrategy,
    pub frame: FitFrame,
    /// Gaussian noise added to the mount position on both axes, arcseconds.
    pub noise_arcsec: f64,
    pub seed: u64,
}

impl Session {
    pub fn new(site: SiteLocation, strategy: TransformStrategy, frame: FitFrame) -> Self {
        Session {
            site,
            strategy,
            frame,
            noise_arcsec: 0.0,
            seed: 42,
        }
    }
}

pub fn dome_c() -> SiteLocation {
    SiteLocation::new(123.2994166666666, -75.1, 3237.0).unwrap()
}

pub fn mid_latitude() -> SiteLocation {
    SiteLocation::new(7.5, 46.9, 550.0).unwrap()
}

fn timestamp(i: usize) -> String {
    format!("2021-06-01T{:02}:{:02}:{:02}", 1 + (i / 60) % 22, i % 60, (7 * i) % 60)
}

/// Stored observations whose mount positions differ from the fully corrected catalog
/// positions by exactly `params` of `model` (plus the session noise).
///
/// Stars are drawn uniformly in azimuth and between 20° and 80° altitude; in the
/// hour-angle frame stars closer than 20° to a pole are rejected.
pub fn synthetic_rows(
    session: &Session,
    model: &dyn PointingModel,
    params: &[f64],
    count: usize,
) -> Vec<StoredObservation> {
    let ctx = LogContext::new("pointfit::test");
    let engine = session.strategy.engine(None, &ctx);
    let convention = engine.azimuth_convention();
    let atmosphere = Atmosphere::new(TEMPERATURE, PRESSURE, HUMIDITY);
    let lat = session.site.lat_rad();

    let mut rng = StdRng::seed_from_u64(session.seed);
    let noise = Normal::new(0.0, session.noise_arcsec * RADSEC).unwrap();

    let mut rows = Vec::with_capacity(count);
    let mut i = 0;
    while rows.len() < count {
        i += 1;
        let dt_utc = timestamp(i);
        let epoch = parse_epoch(&dt_utc).unwrap();

        let az = rng.random_range(0.0..TAU);
        let alt = rng.random_range(20f64.to_radians()..80f64.to_radians());
        let lst = engine.local_sidereal_time(epoch, &session.site).unwrap();
        let (ha, dec) = horizon_to_hadec(az, alt, lat);
        if session.frame == FitFrame::HourAngleDec && dec.abs() > 70f64.to_radians() {
            continue;
        }

        let catalog = SkyPosition::catalog(lst - ha, dec, epoch);
        let horizon = engine
            .to_horizon(&catalog, epoch, &session.site, &atmosphere, true)
            .unwrap();

        let (mnt_ra, mnt_dc) = match session.frame {
            FitFrame::Horizon => {
                let (lon, lat_c) = (horizon.lon, horizon.lat);
                let d_lon = (model.model_longitude(params, lon, lat_c) + noise.sample(&mut rng))
                    / lat_c.cos();
                let d_lat = model.model_latitude(params, lon, lat_c) + noise.sample(&mut rng);

                let az_m = convention.to_north_east(lon - d_lon);
                let (ha_m, dec_m) = horizon_to_hadec(az_m, lat_c - d_lat, lat);
                (lst - ha_m, dec_m)
            }
            FitFrame::HourAngleDec => {
                let hadec = engine
                    .to_hour_angle_dec(&horizon, epoch, &session.site)
                    .unwrap();
                let (lon, lat_c) = (hadec.lon, hadec.lat);
                let d_lon = (model.model_longitude(params, lon, lat_c) + noise.sample(&mut rng))
                    / lat_c.cos();
                let d_lat = model.model_latitude(params, lon, lat_c) + noise.sample(&mut rng);

                (lst - (lon - d_lon), lat_c - d_lat)
            }
        };

        let nml_id = rows.len() as u64 + 1;
        rows.push(StoredObservation {
            nml_id,
            cat_ra: catalog.lon,
            cat_dc: catalog.lat,
            astr_ra: Some(normalize_positive(mnt_ra)),
            astr_dc: Some(mnt_dc),
            sxtr_ra: Some(normalize_positive(mnt_ra)),
            sxtr_dc: Some(mnt_dc),
            dt_utc,
            temperature: TEMPERATURE,
            pressure: PRESSURE,
            humidity: HUMIDITY,
            image_fn: Some(format!("dss_{nml_id:05}.fits")),
        });
    }
    rows
}

/// Check every fitted parameter against the expected value, in arcseconds.
pub fn assert_parameters_close(fitted: &FittedModel, expected: &[f64], epsilon_arcsec: f64) {
    assert_eq!(fitted.parameters.len(), expected.len());
    for (parameter, want) in fitted.named_parameters().iter().zip(expected) {
        assert_abs_diff_eq!(
            parameter.value / RADSEC,
            want / RADSEC,
            epsilon = epsilon_arcsec
        );
    }
}

/// Arcseconds to radians for parameter literals.
pub fn arcsec(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v * RADSEC).collect()
}
