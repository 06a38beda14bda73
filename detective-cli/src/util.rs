/// Split a comma-separated argument, trimming entries and dropping empties.
pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_skips_empty() {
        assert_eq!(
            split_csv(" perfect, ,hinted,guesser "),
            vec!["perfect", "hinted", "guesser"]
        );
        assert!(split_csv("").is_empty());
    }
}
