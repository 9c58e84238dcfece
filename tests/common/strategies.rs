use proptest::prelude::*;

/// Names inside the accepted 2..=50 character range, with surrounding blanks
pub fn valid_name_strategy() -> impl Strategy<Value = String> {
    ("[A-Za-zÀ-ÿ' -]{2,50}", "[ ]{0,3}", "[ ]{0,3}")
        .prop_filter("trimmed length must stay in range", |(name, _, _)| {
            let length = name.trim().chars().count();
            (2..=50).contains(&length)
        })
        .prop_map(|(name, before, after)| format!("{before}{name}{after}"))
}

/// Names that are too short or too long once trimmed
pub fn invalid_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z]{0,1}",
        "[A-Za-z]{51,80}",
        "[ ]{1,5}",
    ]
}

/// International numbers the phone guard accepts
pub fn valid_phone_strategy() -> impl Strategy<Value = String> {
    ("[+]?", "[0-9]{9,15}").prop_map(|(plus, digits)| format!("{plus}{digits}"))
}

pub fn malformed_phone_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,8}",
        "[0-9]{16,20}",
        "[+]?[0-9]{3,6}[a-z -]{1,3}[0-9]{3,6}",
    ]
}

pub fn government_id_strategy() -> impl Strategy<Value = String> {
    "[A-Z0-9]{5,50}"
}

/// Transport handles; the sender and a stranger are always distinct
pub fn handle_pair_strategy() -> impl Strategy<Value = (i64, i64)> {
    (1i64..1_000_000_000, 1i64..1_000_000_000).prop_filter("handles must differ", |(a, b)| a != b)
}
