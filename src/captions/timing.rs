use std::cmp::Reverse;

use crate::model::BLOCK_SECONDS;

/// Silence on each side of a narration centered in one block.
pub fn centered_padding(voice_seconds: f64) -> f64 {
    ((BLOCK_SECONDS - voice_seconds) / 2.0).max(0.0)
}

/// Spoken-length proxy: alphanumeric characters, at least 1.
pub fn word_weight(word: &str) -> u64 {
    (word.chars().filter(|c| c.is_alphanumeric()).count() as u64).max(1)
}

/// Split `budget` frames across `weights` proportionally.
///
/// Every entry gets at least one frame and the result always sums to
/// `budget`, provided `budget >= weights.len()`. Leftover frames go to the
/// largest fractional remainders (earlier index on ties); an over-allocation
/// caused by the one-frame minimum is taken back from the largest buckets.
pub fn allocate_frames(weights: &[u64], budget: u64) -> Vec<u64> {
    if weights.is_empty() {
        return Vec::new();
    }
    let weights: Vec<u64> = weights.iter().map(|&w| w.max(1)).collect();
    let total: u128 = weights.iter().map(|&w| u128::from(w)).sum();
    let budget_wide = u128::from(budget);

    let mut frames = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for &weight in &weights {
        let share = budget_wide * u128::from(weight);
        frames.push(((share / total) as u64).max(1));
        remainders.push(share % total);
    }

    let allocated: u64 = frames.iter().sum();
    if allocated < budget {
        let mut order: Vec<usize> = (0..frames.len()).collect();
        order.sort_by_key(|&i| (Reverse(remainders[i]), i));
        let mut missing = budget - allocated;
        let mut cursor = 0;
        while missing > 0 {
            frames[order[cursor % order.len()]] += 1;
            missing -= 1;
            cursor += 1;
        }
    } else if allocated > budget {
        let mut excess = allocated - budget;
        while excess > 0 {
            // Largest bucket first; among equals, the smallest remainder, then the later index.
            let Some(idx) = (0..frames.len())
                .filter(|&i| frames[i] > 1)
                .max_by_key(|&i| (frames[i], Reverse(remainders[i]), i))
            else {
                break;
            };
            frames[idx] -= 1;
            excess -= 1;
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact(weights: &[u64], budget: u64) {
        let frames = allocate_frames(weights, budget);
        assert_eq!(frames.len(), weights.len());
        assert_eq!(frames.iter().sum::<u64>(), budget, "weights {weights:?} budget {budget}");
        assert!(frames.iter().all(|&f| f >= 1));
    }

    #[test]
    fn padding_centers_a_short_voice() {
        assert!((centered_padding(7.6) - 1.2).abs() < 1e-9);
        assert_eq!(centered_padding(10.0), 0.0);
        assert_eq!(centered_padding(11.5), 0.0);
    }

    #[test]
    fn weights_ignore_punctuation() {
        assert_eq!(word_weight("trees,"), 5);
        assert_eq!(word_weight("..."), 1);
        assert_eq!(word_weight("1970."), 4);
    }

    #[test]
    fn allocation_is_proportional_when_it_divides_evenly() {
        assert_eq!(allocate_frames(&[1, 2, 3], 60), vec![10, 20, 30]);
    }

    #[test]
    fn leftover_frames_go_to_largest_remainders() {
        // Shares 3.33 / 3.33 / 3.33: first index wins the single leftover frame.
        assert_eq!(allocate_frames(&[1, 1, 1], 10), vec![4, 3, 3]);
    }

    #[test]
    fn minimum_frame_is_taken_back_from_largest_bucket() {
        // Raw shares 0.1 / 0.1 / 9.8 floor to 0 / 0 / 9, bumped to 1 / 1 / 9 = 11.
        assert_eq!(allocate_frames(&[1, 1, 98], 10), vec![1, 1, 8]);
    }

    #[test]
    fn allocation_sums_exactly_for_many_shapes() {
        let shapes: [&[u64]; 6] = [
            &[1],
            &[5, 1, 1, 1, 1, 1, 1, 1],
            &[3, 7, 2, 9, 4, 4, 1, 12, 6],
            &[1; 25],
            &[40, 1, 1],
            &[2, 3],
        ];
        for weights in shapes {
            for budget in weights.len() as u64..=310 {
                assert_exact(weights, budget);
            }
        }
    }
}
