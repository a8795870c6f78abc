//! Support and resistance levels from local extrema.

/// Neighbours inspected on each side of a candidate index.
pub const LEVEL_WINDOW: usize = 20;

/// Levels returned per side.
pub const MAX_LEVELS: usize = 3;

/// Indices whose price is not beaten by any neighbour within `window` on
/// either side, according to `beats(neighbour, candidate)`.
fn local_extrema(prices: &[f64], window: usize, beats: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    if window == 0 || prices.len() <= window * 2 {
        return Vec::new();
    }

    let mut levels: Vec<f64> = (window..prices.len() - window)
        .filter(|&i| {
            let candidate = prices[i];
            (i - window..=i + window)
                .filter(|&j| j != i)
                .all(|j| !beats(prices[j], candidate))
        })
        .map(|i| prices[i])
        .collect();

    if levels.len() > MAX_LEVELS {
        levels.drain(..levels.len() - MAX_LEVELS);
    }
    levels
}

/// The last three local minima, in series order.
pub fn supports(prices: &[f64], window: usize) -> Vec<f64> {
    local_extrema(prices, window, |neighbour, candidate| neighbour < candidate)
}

/// The last three local maxima, in series order.
pub fn resistances(prices: &[f64], window: usize) -> Vec<f64> {
    local_extrema(prices, window, |neighbour, candidate| neighbour > candidate)
}
