use chrono::{Datelike, Timelike};
use polynomials::poly;

pub type Hours = f64;
pub type Degrees = f64;

pub fn deg_to_hours(deg: Degrees) -> Hours {
    deg / 15.
}

pub fn hours_to_deg(hours: Hours) -> Degrees {
    hours * 15.
}

// Convert hms to hours or dms to degrees
pub fn ms_to_dec(d: u32, minutes: u32, seconds: f64) -> f64 {
    (d as f64) + (minutes as f64) / 60. + seconds / 3600.
}

pub fn modulo(val: f64, base: f64) -> f64 {
    ((val % base) + base) % base
}

/// Calculates the Julian Date of a time
/// see https://scienceworld.wolfram.com/astronomy/JulianDate.html
pub fn julian_date(time: chrono::DateTime<chrono::Utc>) -> f64 {
    let y = time.year() as f64;
    let m = time.month() as f64;
    let d = time.day() as f64;

    let mut jd = 367. * y;
    jd -= f64::floor(7. * (y + f64::floor((m + 9.) / 12.)) / 4.);
    jd -= f64::floor(3. * (f64::floor((y + (m - 9.) / 7.) / 100.) + 1.) / 4.);
    jd += f64::floor(275. * m / 9.);
    jd += d;
    jd += 1721028.5;
    jd + ms_to_dec(time.hour(), time.minute(), time.second() as f64) / 24.
}

// see https://thecynster.home.blog/2019/11/04/calculating-sidereal-time/
pub fn greenwich_sidereal_time(jd_utc: f64) -> Hours {
    // The result will be off by the number of leap seconds different from this on the date given
    const LEAP_SECOND_TOTAL: u32 = 27;

    let du = jd_utc - 2451545.0;
    let theta = modulo(0.779_057_273_264f64 + 1.002_737_811_911_354_5f64 * du, 1.) * 24.;

    let poly = poly![
        0.014506,
        4612.156534,
        1.3915817,
        -0.00000044,
        -0.000029956,
        -0.0000000368,
    ];
    let jd_tt = jd_utc + ((LEAP_SECOND_TOTAL as f64 + 32.184) / 3600.) / 24.; // Hours
    let t = (jd_tt - 2451545.0) / 36525.; // years

    let gmstp = deg_to_hours(modulo(poly.eval(t).unwrap() / 3600., 360.));

    modulo(theta + gmstp, 24.)
}

/// longitude in degrees
/// returns hours
pub fn local_sidereal_time(jd_utc: f64, longitude: Degrees) -> Hours {
    modulo(
        greenwich_sidereal_time(jd_utc) + deg_to_hours(longitude),
        24.,
    )
}

/// Renders a decimal hour or degree value as "D:MM:SS" for log messages.
pub fn fmt_sexa(value: f64) -> String {
    let sign = if value < 0. { "-" } else { "" };
    let total = (value.abs() * 3600.).round() as u64;
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::{afe_is_relative_eq, afe_relative_eq_error_msg, assert_float_relative_eq};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_deg_to_hours() {
        assert_eq!(deg_to_hours(0.), 0.);
        assert_float_relative_eq!(deg_to_hours(1.), 0.0666666666666667);
        assert_float_relative_eq!(deg_to_hours(-8.), -0.53333333333333333);
    }

    #[test]
    fn test_hours_to_deg() {
        assert_eq!(hours_to_deg(0.), 0.);
        assert_float_relative_eq!(hours_to_deg(1.), 15.);
        assert_float_relative_eq!(hours_to_deg(-8.), -120.);
    }

    #[test]
    fn test_ms_to_dec() {
        assert_eq!(ms_to_dec(0, 0, 0.), 0.);
        assert_float_relative_eq!(ms_to_dec(1, 1, 1.), 1.0169444);
        assert_float_relative_eq!(-ms_to_dec(8, 8, 8.8), -8.1357778);
    }

    #[test]
    fn test_modulo() {
        assert_eq!(modulo(std::f64::consts::TAU, std::f64::consts::PI), 0.);
        assert_eq!(modulo(-365., 360.), 355.);
    }

    #[test]
    fn test_greenwich_sidereal_time() {
        assert_float_relative_eq!(
            greenwich_sidereal_time(julian_date(Utc.ymd(1969, 1, 6).and_hms(1, 5, 0))),
            8.1127421203,
            1E-4
        );
        assert_float_relative_eq!(
            greenwich_sidereal_time(julian_date(Utc.ymd(2021, 1, 30).and_hms(21, 20, 0))),
            6.0219108930,
            1E-4
        );
    }

    #[test]
    fn test_local_sidereal_time() {
        assert_float_relative_eq!(
            local_sidereal_time(julian_date(Utc.ymd(1969, 1, 6).and_hms(1, 5, 0)), -55.5),
            4.4127385800,
            1E-4
        );
        assert_float_relative_eq!(
            local_sidereal_time(julian_date(Utc.ymd(2021, 1, 30).and_hms(21, 20, 0)), 90.),
            12.0219108930,
            1E-4
        );
    }

    #[test]
    fn test_fmt_sexa() {
        assert_eq!(fmt_sexa(0.), "0:00:00");
        assert_eq!(fmt_sexa(1.5), "1:30:00");
        assert_eq!(fmt_sexa(-8.1357778), "-8:08:09");
        assert_eq!(fmt_sexa(12.9999999), "13:00:00");
    }
}
