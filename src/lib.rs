pub mod interpret;
pub mod numeric;
pub mod sample;

/// dimensional analysis types
pub type Probability = f64;
pub type Frequency = f64;
pub type Information = f64;
pub type Weight = f64;

// allocation policy parameters
pub const FREQUENCY_EPSILON: f64 = 1e-5;
pub const POST_OPTIMIZATION_SLACK: f64 = 1e-5;
pub const PERTURBATION_EPSILON: f64 = 1e-10;
pub const INDICATOR_EPSILON: f64 = 1e-10;

/// true when unit-level corrections to f fall below double precision,
/// i.e. f * DBL_EPSILON > 0.5. allocation switches to rounded real
/// arithmetic above this threshold.
pub fn is_very_large_frequency(f: Frequency) -> bool {
    assert!(f >= 0.0);
    f * f64::EPSILON > 0.5
}

/// epsilon-stable comparison of scores and contributions. two values
/// within 1e-10 * max(1, |a|, |b|) of each other compare as equal so
/// that float noise never decides a ranking.
pub fn compare_indicator(a: f64, b: f64) -> std::cmp::Ordering {
    let slack = INDICATOR_EPSILON * 1f64.max(a.abs()).max(b.abs());
    if (a - b).abs() < slack {
        std::cmp::Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// initialize terminal logging
#[cfg(feature = "cli")]
pub fn init() {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .expect("initialize logger");
}
