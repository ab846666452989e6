use regex::Regex;
use std::sync::LazyLock;

static TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[a-z0-9]{2,}").ok());

/// Lowercased alphanumeric runs of at least two chars, in order.
pub fn tokenize(text: &str) -> Vec<String> {
	let lower = text.to_lowercase();
	match TOKEN.as_ref() {
		Some(re) => re.find_iter(&lower).map(|m| m.as_str().to_string()).collect(),
		None => Vec::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::tokenize;

	#[test]
	fn drops_single_chars_and_punctuation() {
		assert_eq!(tokenize("A quick-fox, v2 & I/O!"), vec!["quick", "fox", "v2"]);
		assert!(tokenize("").is_empty());
	}
}
