//! brazilian national holidays

use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

/// fixed national holidays as (month, day)
pub const FIXED_HOLIDAYS: [(u32, u32); 8] = [
    (1, 1),   // confraternização universal
    (4, 21),  // tiradentes
    (5, 1),   // dia do trabalho
    (9, 7),   // independência
    (10, 12), // nossa senhora aparecida
    (11, 2),  // finados
    (11, 15), // proclamação da república
    (12, 25), // natal
];

/// movable holidays as offsets from easter sunday
pub const EASTER_OFFSETS: [i64; 4] = [
    -47, // carnaval
    -2,  // sexta-feira santa
    0,   // páscoa
    60,  // corpus christi
];

/// easter sunday, anonymous gregorian computus
#[allow(clippy::many_single_char_names)]
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = ((h + l - 7 * m + 114) % 31) + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// all holidays of a year: fixed dates, easter-based dates and any extras
pub fn national_holidays(year: i32, extra: &[(u32, u32)]) -> HashSet<NaiveDate> {
    let fixed = FIXED_HOLIDAYS
        .iter()
        .chain(extra.iter())
        .filter_map(|&(month, day)| NaiveDate::from_ymd_opt(year, month, day));

    let movable = easter_sunday(year).into_iter().flat_map(|easter| {
        EASTER_OFFSETS
            .iter()
            .filter_map(move |&offset| easter.checked_add_signed(Duration::days(offset)))
    });

    fixed.chain(movable).collect()
}
