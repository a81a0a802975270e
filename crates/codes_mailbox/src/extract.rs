use std::sync::OnceLock;

use regex::Regex;

/// Tried in order; the first pattern that matches wins. The last one takes
/// any 4-8 digit run, so unrelated numbers can be picked up.
const PATTERNS: &[&str] = &[
    r"验证码[：:]\s*([0-9]{4,8})",
    r"(?i)verification code[：:]\s*([0-9]{4,8})",
    r"(?i)code[：:]\s*([0-9]{4,8})",
    r"([0-9]{4,8})\s*是您的验证码",
    r"您的验证码是\s*([0-9]{4,8})",
    r"([0-9]{4,8})",
];

fn patterns() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("valid verification code pattern"))
            .collect()
    })
}

/// Best-effort extraction of a verification code from free-text email content.
pub fn extract_verification_code(content: &str) -> Option<String> {
    patterns()
        .iter()
        .find_map(|re| re.captures(content))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
