//! Conversions into MATLAB date numbers.
//!
//! A MATLAB date number counts days, fractional part included, from the proleptic Gregorian date
//! 0000-01-00. They are ordinary doubles, so they're stored with [`Matrix::new`] like any other
//! `f64` data.
//!
//! [`Matrix::new`]: crate::Matrix::new

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Julian date of MATLAB's day zero.
pub const JD_OFFSET: f64 = 1721058.5;
/// Date number of the UNIX epoch, 1970-01-01 00:00:00 UTC.
pub const UNIX_EPOCH_DATENUM: f64 = 719529.0;

const SECONDS_PER_DAY: f64 = 86400.0;
const TT_MINUS_TAI: f64 = 32.184;
const J2000_JD: f64 = 2451545.0;

/// Julian dates (UTC midnight) on which each leap second since 1972 took effect, newest first.
const LEAP_JD: [f64; 27] = [
    2457754.5, 2457204.5, 2456109.5, 2454832.5, 2453736.5, 2451179.5, 2450630.5, 2450083.5,
    2449534.5, 2449169.5, 2448804.5, 2448257.5, 2447892.5, 2447161.5, 2446247.5, 2445516.5,
    2445151.5, 2444786.5, 2444239.5, 2443874.5, 2443509.5, 2443144.5, 2442778.5, 2442413.5,
    2442048.5, 2441683.5, 2441499.5,
];

/// Julian date of a proleptic Gregorian calendar date and time.
pub fn julian(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> f64 {
    let (y, m, d) = (year as i64, month as i64, day as i64);
    let a = (m - 14) / 12;
    let jdn = (1461 * (y + 4800 + a)) / 4 + (367 * (m - 2 - 12 * a)) / 12
        - (3 * ((y + 4900 + a) / 100)) / 4
        + d
        - 32075;
    let hms = (hour as f64 - 12.0) / 24.0 + minute as f64 / 1440.0 + second / SECONDS_PER_DAY;
    jdn as f64 + hms
}

/// Date number of a calendar date and time, equivalent to MATLAB's `datenum(y,m,d,H,M,S)`.
pub fn datenum(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> f64 {
    julian(year, month, day, hour, minute, second) - JD_OFFSET
}

/// Date number of a fractional day of the year, where 1.0 is midnight on January 1st.
pub fn datenum_from_doy(year: i32, doy: f64) -> f64 {
    datenum(year, 1, 1, 0, 0, 0.0) + doy - 1.0
}

/// Date number of a fractional UNIX timestamp in seconds.
pub fn from_unix(seconds: f64) -> f64 {
    UNIX_EPOCH_DATENUM + seconds / SECONDS_PER_DAY
}

/// Date number of a day count in the J1900 epoch.
pub fn from_j1900(days: f64) -> f64 {
    days + 2415020.0 - JD_OFFSET
}

/// Date number of a day count in the J2000 epoch.
pub fn from_j2000(days: f64) -> f64 {
    days + J2000_JD - JD_OFFSET
}

/// Date number of a modified Julian date.
pub fn from_mjd(days: f64) -> f64 {
    days + 2400000.5 - JD_OFFSET
}

/// Date number (UTC) of a CDF TT2000 timestamp: nanoseconds of terrestrial time since
/// 2000-01-01 12:00:00 TT. Leap seconds are removed using the built-in table, which ends at the
/// 2017 leap second. A double can't hold the full nanosecond precision, so expect rounding to a
/// few microseconds.
pub fn from_tt2000(nanos: i64) -> f64 {
    let tt_seconds = nanos as f64 / 1e9;
    let approx_jd = J2000_JD + tt_seconds / SECONDS_PER_DAY;
    let leaps = LEAP_JD.iter().filter(|&&jd| jd <= approx_jd).count();
    let tai_minus_utc = 10.0 + leaps as f64;
    let utc_seconds = tt_seconds - TT_MINUS_TAI - tai_minus_utc;
    J2000_JD + utc_seconds / SECONDS_PER_DAY - JD_OFFSET
}

/// A broken-down UTC calendar time, used to stamp file headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Civil {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// Day of the week, 0 being Sunday.
    pub weekday: u32,
}

impl Civil {
    /// Break down a UNIX timestamp.
    pub fn from_unix(seconds: i64) -> Civil {
        let days = seconds.div_euclid(86400);
        let rem = seconds.rem_euclid(86400) as u32;

        // Days to civil date, counting in 400-year eras starting from 0000-03-01
        let z = days + 719468;
        let era = z.div_euclid(146097);
        let doe = z.rem_euclid(146097);
        let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
        let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
        let year = yoe + era * 400 + (month <= 2) as i64;

        Civil {
            year,
            month,
            day,
            hour: rem / 3600,
            minute: (rem / 60) % 60,
            second: rem % 60,
            weekday: (days + 4).rem_euclid(7) as u32,
        }
    }

    pub fn now() -> Civil {
        let seconds = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        };
        Civil::from_unix(seconds)
    }

    /// Date number of this time.
    pub fn datenum(&self) -> f64 {
        datenum(
            self.year as i32,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second as f64,
        )
    }
}

/// Formats like C's `ctime`, without the trailing newline: `Thu Jan  1 00:00:00 1970`.
impl fmt::Display for Civil {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        write!(
            f,
            "{} {} {:2} {:02}:{:02}:{:02} {}",
            DAYS[self.weekday as usize],
            MONTHS[(self.month - 1) as usize],
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.year
        )
    }
}
