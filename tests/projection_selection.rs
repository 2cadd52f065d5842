use approx::assert_abs_diff_eq;
use hifitime::Epoch;
use pointfit::constants::RADSEC;
use pointfit::fitting::fit_projection;
use pointfit::residuals::ResidualPoint;
use pointfit::selection::select;
use pointfit::sky::{AzimuthConvention, Frame, SkyPosition};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

#[test]
fn test_projection_of_normal_sample() {
    let mut rng = StdRng::seed_from_u64(7);
    let normal = Normal::new(0.0, 2.5).unwrap();
    let values: Vec<f64> = (0..20_000).map(|_| normal.sample(&mut rng)).collect();

    let fit = fit_projection(&values, 40).unwrap();

    assert_abs_diff_eq!(fit.mean, 0.0, epsilon = 0.1);
    assert!(
        (fit.spread - 2.5).abs() < 0.05 * 2.5,
        "spread {} outside 5 %",
        fit.spread
    );
    assert!(fit.peak > 0.0);
}

#[test]
fn test_projection_of_shifted_sample() {
    let mut rng = StdRng::seed_from_u64(11);
    let normal = Normal::new(1.5, 4.0).unwrap();
    let values: Vec<f64> = (0..5_000).map(|_| normal.sample(&mut rng)).collect();

    let fit = fit_projection(&values, 30).unwrap();

    assert_abs_diff_eq!(fit.mean, 1.5, epsilon = 0.4);
    assert!((fit.spread - 4.0).abs() < 0.1 * 4.0);
}

fn residual(res_lon_arcsec: f64, res_lat_arcsec: f64) -> ResidualPoint {
    let position = SkyPosition::new(
        2.0,
        0.7,
        Frame::Horizon(AzimuthConvention::SouthWest),
        Epoch::from_gregorian_utc_at_midnight(2021, 6, 1),
    );
    ResidualPoint {
        catalog: position,
        mount: position,
        df_lon: 0.0,
        df_lat: 0.0,
        res_lon: res_lon_arcsec * RADSEC,
        res_lat: res_lat_arcsec * RADSEC,
        nml_id: 1,
        image: None,
    }
}

#[test]
fn test_selection_at_thirty_arcsec() {
    let points = [
        residual(20.0, 20.0),
        residual(25.0, 25.0),
        residual(0.0, -30.0),
        residual(0.0, -30.001),
    ];
    let selection = select(&points, 30.0 * RADSEC);

    assert_eq!(selection.dropped_indices(), vec![0, 2]);
    assert_eq!(selection.selected_indices(), vec![1, 3]);
}
