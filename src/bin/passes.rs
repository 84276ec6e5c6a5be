//! Offline ground-station pass planner.
//!
//! Deliberately decoupled from the autonomy loop: this tool performs the
//! only network I/O in the project, applies a bounded timeout, and falls
//! back to a baked-in element set so it always produces a plan. Pass
//! geometry uses a coarse circular-orbit ground-track model; it plans
//! antenna time, it does not fly the spacecraft.

use clap::{App, Arg};
use std::f64::consts::PI;
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const TLE_URL: &str = "https://celestrak.org/NORAD/elements/gp.php";

// ISS (ZARYA), used whenever the live fetch fails.
const FALLBACK_TLE_NAME: &str = "ISS (ZARYA) [fallback]";
const FALLBACK_TLE_LINE2: &str =
    "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.49511945202200";

const EARTH_RADIUS_KM: f64 = 6371.0;
const EARTH_MU_KM3_S2: f64 = 398_600.4418;
const STEP_S: u64 = 30;

#[derive(Debug, Clone)]
struct Elements {
    name: String,
    inclination_deg: f64,
    raan_deg: f64,
    mean_anomaly_deg: f64,
    mean_motion_rev_day: f64,
}

#[derive(Debug)]
struct Pass {
    aos_offset_s: u64,
    los_offset_s: u64,
    max_elevation_deg: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("satguard-passes")
        .version("0.1.0")
        .about("🛰️  Ground-station pass planner (offline, not part of the control loop)")
        .arg(
            Arg::with_name("catnr")
                .long("catnr")
                .value_name("ID")
                .help("NORAD catalog number")
                .takes_value(true)
                .default_value("25544"),
        )
        .arg(
            Arg::with_name("lat")
                .long("lat")
                .value_name("DEG")
                .help("Ground station latitude")
                .takes_value(true)
                .default_value("47.6"),
        )
        .arg(
            Arg::with_name("lon")
                .long("lon")
                .value_name("DEG")
                .help("Ground station longitude")
                .takes_value(true)
                .default_value("-122.3"),
        )
        .arg(
            Arg::with_name("hours")
                .long("hours")
                .value_name("H")
                .help("Planning horizon in hours")
                .takes_value(true)
                .default_value("24"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("FILE")
                .help("CSV output path (stdout when omitted)")
                .takes_value(true),
        )
        .get_matches();

    let catnr = matches.value_of("catnr").unwrap_or("25544");
    let station_lat: f64 = matches.value_of("lat").unwrap_or("47.6").parse()?;
    let station_lon: f64 = matches.value_of("lon").unwrap_or("-122.3").parse()?;
    let hours: u64 = matches.value_of("hours").unwrap_or("24").parse()?;

    let elements = match fetch_elements(catnr).await {
        Ok(elements) => {
            info!(name = %elements.name, "using live element set");
            elements
        }
        Err(e) => {
            warn!("TLE fetch failed ({}), falling back to baked-in elements", e);
            parse_tle(FALLBACK_TLE_NAME, FALLBACK_TLE_LINE2)?
        }
    };

    let passes = predict_passes(&elements, station_lat, station_lon, hours * 3600);
    info!(count = passes.len(), "passes found in the planning horizon");

    let mut csv = String::from("aos_offset_s,los_offset_s,duration_s,max_elevation_deg\n");
    for pass in &passes {
        csv.push_str(&format!(
            "{},{},{},{:.1}\n",
            pass.aos_offset_s,
            pass.los_offset_s,
            pass.los_offset_s - pass.aos_offset_s,
            pass.max_elevation_deg
        ));
    }

    match matches.value_of("output") {
        Some(path) => {
            std::fs::File::create(path)?.write_all(csv.as_bytes())?;
            info!(path, "pass plan written");
        }
        None => print!("{csv}"),
    }

    Ok(())
}

async fn fetch_elements(catnr: &str) -> Result<Elements, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

    let body = client
        .get(TLE_URL)
        .query(&[("CATNR", catnr), ("FORMAT", "TLE")])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let mut lines = body.lines();
    let name = lines.next().unwrap_or("UNKNOWN").trim().to_string();
    let line2 = lines
        .find(|line| line.starts_with("2 "))
        .ok_or("response carried no TLE line 2")?;

    parse_tle(&name, line2)
}

/// Pull the fields this model needs from TLE line 2 (fixed columns).
fn parse_tle(name: &str, line2: &str) -> Result<Elements, Box<dyn std::error::Error>> {
    if line2.len() < 63 {
        return Err("TLE line 2 too short".into());
    }

    let field = |range: core::ops::Range<usize>| -> Result<f64, Box<dyn std::error::Error>> {
        Ok(line2[range].trim().parse::<f64>()?)
    };

    Ok(Elements {
        name: name.to_string(),
        inclination_deg: field(8..16)?,
        raan_deg: field(17..25)?,
        mean_anomaly_deg: field(43..51)?,
        mean_motion_rev_day: field(52..63)?,
    })
}

/// Coarse circular-orbit pass search: step the sub-satellite point along
/// the ground track and keep intervals where the station sees the
/// spacecraft above its horizon.
fn predict_passes(
    elements: &Elements,
    station_lat_deg: f64,
    station_lon_deg: f64,
    horizon_s: u64,
) -> Vec<Pass> {
    let period_s = 86400.0 / elements.mean_motion_rev_day;
    let semi_major_km = (EARTH_MU_KM3_S2 * (period_s / (2.0 * PI)).powi(2)).cbrt();
    let altitude_km = semi_major_km - EARTH_RADIUS_KM;

    let incl = elements.inclination_deg.to_radians();
    let station_lat = station_lat_deg.to_radians();
    let station_lon = station_lon_deg.to_radians();

    let mut passes = Vec::new();
    let mut current: Option<Pass> = None;

    let mut t = 0;
    while t <= horizon_s {
        let phase = 2.0 * PI * (t as f64 / period_s) + elements.mean_anomaly_deg.to_radians();
        let sat_lat = (incl.sin() * phase.sin()).asin();
        let track_lon = (incl.cos() * phase.sin()).atan2(phase.cos());
        // Ascending-node longitude from the RAAN, regressed by Earth rotation.
        let sat_lon = elements.raan_deg.to_radians() + track_lon
            - 2.0 * PI * (t as f64 / 86400.0);

        let central_angle = (station_lat.sin() * sat_lat.sin()
            + station_lat.cos() * sat_lat.cos() * (sat_lon - station_lon).cos())
        .clamp(-1.0, 1.0)
        .acos();

        let elevation_rad = (central_angle.cos() - EARTH_RADIUS_KM / (EARTH_RADIUS_KM + altitude_km))
            .atan2(central_angle.sin());
        let elevation_deg = elevation_rad.to_degrees();

        if elevation_deg > 0.0 {
            let pass = current.get_or_insert(Pass {
                aos_offset_s: t,
                los_offset_s: t,
                max_elevation_deg: elevation_deg,
            });
            pass.los_offset_s = t;
            pass.max_elevation_deg = pass.max_elevation_deg.max(elevation_deg);
        } else if let Some(pass) = current.take() {
            passes.push(pass);
        }

        t += STEP_S;
    }

    if let Some(pass) = current.take() {
        passes.push(pass);
    }

    passes
}
