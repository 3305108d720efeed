//! Lowering configuration.

/// Knobs for a lowering pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Fail when a sequence capture has an element with no identity-map
    /// entry, instead of dropping the element.
    pub strict_sequences: bool,
}

impl BuildOptions {
    /// Environment variable read by [`from_env`](Self::from_env).
    pub const STRICT_SEQUENCES_ENV: &'static str = "TESSERA_STRICT_SEQUENCES";

    /// Defaults, overridden by `TESSERA_STRICT_SEQUENCES=1|true`.
    pub fn from_env() -> Self {
        let strict_sequences = std::env::var(Self::STRICT_SEQUENCES_ENV)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);
        BuildOptions { strict_sequences }
    }

    #[must_use]
    pub fn with_strict_sequences(mut self, strict: bool) -> Self {
        self.strict_sequences = strict;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_drops_unmapped_elements() {
        assert!(!BuildOptions::default().strict_sequences);
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("nope"));
    }

    // The only test that touches this variable.
    #[test]
    fn environment_controls_strictness() {
        std::env::set_var(BuildOptions::STRICT_SEQUENCES_ENV, "1");
        assert!(BuildOptions::from_env().strict_sequences);

        std::env::set_var(BuildOptions::STRICT_SEQUENCES_ENV, "off");
        assert!(!BuildOptions::from_env().strict_sequences);

        std::env::remove_var(BuildOptions::STRICT_SEQUENCES_ENV);
        assert_eq!(BuildOptions::from_env(), BuildOptions::default());
    }

    #[test]
    fn builder_sets_strictness() {
        let options = BuildOptions::default().with_strict_sequences(true);
        assert!(options.strict_sequences);
    }
}
