//! KRX-style price grid: band-dependent tick steps and the bounded
//! random walk used when the upstream feed yields nothing usable.

use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Tick step for a price band (simplified KRX table). Steps grow with
/// price magnitude so low-priced instruments move in finer increments.
pub fn band_step(price: Decimal) -> Decimal {
    if price < dec!(1000) {
        dec!(1)
    } else if price < dec!(5000) {
        dec!(5)
    } else if price < dec!(10000) {
        dec!(10)
    } else if price < dec!(50000) {
        dec!(50)
    } else if price < dec!(100000) {
        dec!(100)
    } else {
        dec!(500)
    }
}

/// Snap a price to its band grid, half-up. Anything that would round
/// below one tick comes back as one step.
pub fn nearest_tick(price: Decimal) -> Decimal {
    let step = band_step(price);
    let rounded =
        (price / step).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * step;
    if rounded < Decimal::ONE { step } else { rounded }
}

/// Perturb `last` by -2..=+2 ticks of its band, clamped to `min_tick`.
/// The base is snapped to the grid first so walked prices stay on it.
/// `last` must be positive; callers substitute the fallback price before
/// ever walking from nothing.
pub fn random_walk(last: Decimal, min_tick: Decimal) -> Decimal {
    let step = band_step(last);
    let ticks = rand::rng().random_range(-2i64..=2);
    let candidate = nearest_tick(last) + Decimal::from(ticks) * step;
    if candidate < min_tick { min_tick } else { candidate }
}
