//! IRS life-expectancy tables.
//!
//! Two tables are carried: the Uniform Lifetime table drives required
//! minimum distributions, and the Single Life Expectancy table feeds the
//! 72(t) amortization used for SEPP payments.

/// IRS Uniform Lifetime Table (2022 revision), age -> divisor.
const UNIFORM_LIFETIME: &[(u8, f64)] = &[
    (72, 27.4),
    (73, 26.5),
    (74, 25.5),
    (75, 24.6),
    (76, 23.7),
    (77, 22.9),
    (78, 22.0),
    (79, 21.1),
    (80, 20.2),
    (81, 19.4),
    (82, 18.5),
    (83, 17.7),
    (84, 16.8),
    (85, 16.0),
    (86, 15.2),
    (87, 14.4),
    (88, 13.7),
    (89, 12.9),
    (90, 12.2),
    (91, 11.5),
    (92, 10.8),
    (93, 10.1),
    (94, 9.5),
    (95, 8.9),
    (96, 8.4),
    (97, 7.8),
    (98, 7.3),
    (99, 6.8),
    (100, 6.4),
    (101, 6.0),
    (102, 5.6),
    (103, 5.2),
    (104, 4.9),
    (105, 4.6),
    (106, 4.3),
    (107, 4.1),
    (108, 3.9),
    (109, 3.7),
    (110, 3.5),
    (111, 3.4),
    (112, 3.3),
    (113, 3.1),
    (114, 3.0),
    (115, 2.9),
    (116, 2.8),
    (117, 2.7),
    (118, 2.5),
    (119, 2.3),
    (120, 2.0),
];

/// IRS Single Life Expectancy Table (pre-2022 edition, which established
/// 72(t) schedules amortize against), age -> expectancy. Covers the ages
/// at which a SEPP schedule can plausibly start.
const SINGLE_LIFE: &[(u8, f64)] = &[
    (45, 38.8),
    (46, 37.9),
    (47, 37.0),
    (48, 36.0),
    (49, 35.1),
    (50, 34.2),
    (51, 33.3),
    (52, 32.3),
    (53, 31.4),
    (54, 30.5),
    (55, 29.6),
    (56, 28.7),
    (57, 27.9),
    (58, 27.0),
    (59, 26.1),
    (60, 25.2),
    (61, 24.4),
    (62, 23.5),
    (63, 22.7),
    (64, 21.8),
    (65, 21.0),
    (66, 20.2),
    (67, 19.4),
    (68, 18.6),
    (69, 17.8),
    (70, 17.0),
];

fn lookup(table: &[(u8, f64)], age: u8) -> Option<f64> {
    table.iter().find(|(a, _)| *a == age).map(|(_, d)| *d)
}

/// RMD divisor for an age. Ages past the end of the table clamp to the
/// final entry; ages before the table have no divisor.
#[must_use]
pub fn uniform_lifetime_divisor(age: u8) -> Option<f64> {
    if age > 120 {
        return UNIFORM_LIFETIME.last().map(|(_, d)| *d);
    }
    lookup(UNIFORM_LIFETIME, age)
}

/// Single-life expectancy used by the 72(t) amortization method.
#[must_use]
pub fn single_life_expectancy(age: u8) -> Option<f64> {
    lookup(SINGLE_LIFE, age)
}
