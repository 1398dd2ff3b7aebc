// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use store::{Aggregate, Score};

/// Round to a single decimal, halves away from zero
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Build the aggregate of a movie from all of its individual scores
pub fn from_scores<I>(scores: I) -> Aggregate
where
    I: IntoIterator<Item = Score>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0u64, 0u32), |(sum, count), score| {
            (sum + u64::from(score.value()), count + 1)
        });

    if count == 0 {
        return Aggregate::default();
    }

    Aggregate {
        average: round_tenth(sum as f64 / f64::from(count)),
        count,
    }
}
