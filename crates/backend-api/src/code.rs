use rand::{rngs::OsRng, Rng};

pub const CODE_LENGTH: usize = 6;

/// Six decimal digits, zero padded, drawn from the operating system CSPRNG.
pub fn generate_code() -> String {
    let value: u32 = OsRng.gen_range(0..1_000_000);
    format!("{value:0width$}", width = CODE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_six_ascii_digits() {
        for _ in 0..500 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()), "bad code {code}");
        }
    }

    #[test]
    fn codes_vary_between_calls() {
        let codes: HashSet<String> = (0..50).map(|_| generate_code()).collect();
        assert!(codes.len() > 1);
    }
}
