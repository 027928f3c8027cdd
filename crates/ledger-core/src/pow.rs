use crate::Hash;

/// Number of leading `0` characters in the lowercase hex rendering of `hash`.
pub fn leading_zero_hex_digits(hash: &Hash) -> usize {
    let mut total = 0;
    for b in hash {
        if *b == 0 {
            total += 2;
        } else {
            if *b < 0x10 {
                total += 1;
            }
            break;
        }
    }
    total
}

pub fn meets_difficulty(hash: &Hash, difficulty: usize) -> bool {
    leading_zero_hex_digits(hash) >= difficulty
}
