//! Messages cycled while a check is in flight.

const LOADING_MESSAGES: [&str; 5] = [
    "Reading your question...",
    "Looking up the General Product Safety Regulation...",
    "Checking UKCA and CE marking rules...",
    "Reviewing applicable harmonised standards...",
    "Putting the answer together...",
];

/// Message for the given UI tick; wraps around.
pub fn loading_message(tick: u64) -> &'static str {
    LOADING_MESSAGES[(tick % LOADING_MESSAGES.len() as u64) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_rotate() {
        assert_eq!(loading_message(0), LOADING_MESSAGES[0]);
        assert_eq!(loading_message(1), LOADING_MESSAGES[1]);
        assert_eq!(loading_message(5), LOADING_MESSAGES[0]);
        assert_eq!(loading_message(u64::MAX), LOADING_MESSAGES[0]);
    }
}
