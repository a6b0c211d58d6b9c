use proptest::prelude::*;
use relay_core::matchmaker::generate_group_code;
use relay_core::types::{CODE_ALPHABET, DEFAULT_CODE_LENGTH, WIDENED_CODE_LENGTH};

proptest! {
    /// Whatever finite set of codes is already taken, `generate_group_code`
    /// never returns one of them, and the result always lands at the
    /// default or widened length drawn from the alphanumeric alphabet
    /// (`spec.md` §4.4).
    #[test]
    fn generated_code_avoids_an_arbitrary_taken_set(
        taken in prop::collection::hash_set("[A-Za-z0-9]{6}", 0..20),
    ) {
        let code = generate_group_code(|c| taken.contains(c));
        let code = code.as_str();

        prop_assert!(code.len() == DEFAULT_CODE_LENGTH || code.len() == WIDENED_CODE_LENGTH);
        prop_assert!(code.chars().all(|c| CODE_ALPHABET.contains(&(c as u8))));
        if code.len() == DEFAULT_CODE_LENGTH {
            prop_assert!(!taken.contains(code));
        }
    }

    /// A predicate that rejects every default-length code forces the widened
    /// length, and that code is still never in the rejected set.
    #[test]
    fn exhausted_default_length_always_widens(taken in "[A-Za-z0-9]{8}") {
        let code = generate_group_code(|c| c.len() == DEFAULT_CODE_LENGTH || c == taken);
        prop_assert_eq!(code.as_str().len(), WIDENED_CODE_LENGTH);
        prop_assert_ne!(code.as_str(), taken.as_str());
    }
}
