use echorag_core::SensitivityLevel;

use crate::pii::{pii_density, PII_PATTERNS};

const MEDIUM_DENSITY: f64 = 0.005;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: String,
    pub redacted: bool,
    pub level: SensitivityLevel,
}

/// Replace every PII match with its class placeholder, pattern by pattern.
pub fn sanitize(text: &str) -> Sanitized {
    let mut out = text.to_string();
    let mut redacted = false;
    for pattern in &PII_PATTERNS {
        let Some(re) = pattern.regex.as_ref() else { continue };
        if re.is_match(&out) {
            out = re.replace_all(&out, pattern.placeholder).into_owned();
            redacted = true;
        }
    }

    let level = if redacted {
        SensitivityLevel::High
    } else if pii_density(text) > MEDIUM_DENSITY {
        SensitivityLevel::Medium
    } else {
        SensitivityLevel::Low
    };
    Sanitized { text: out, redacted, level }
}
