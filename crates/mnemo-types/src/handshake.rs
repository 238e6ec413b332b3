//! Stdout handshake between the spawned service and its launcher.
//!
//! The service prints exactly two machine-readable lines to stdout: the
//! bound URL once the listener is up, and a ready marker once the embedding
//! model finishes warm-up. Everything else (tracing) goes to stderr.

/// Prefix of the line announcing the bound URL.
pub const LISTENING_PREFIX: &str = "MNEMO LISTENING ";

/// Line announcing that the embedding model is loaded.
pub const MODEL_READY: &str = "MNEMO MODEL_READY";

/// Format the listening announcement for a bound URL.
pub fn listening_line(url: &str) -> String {
    format!("{LISTENING_PREFIX}{url}")
}

/// Parse the URL out of a listening announcement, if the line is one.
pub fn parse_listening(line: &str) -> Option<&str> {
    line.trim().strip_prefix(LISTENING_PREFIX).map(str::trim)
}

/// Whether a line is the model-ready announcement.
pub fn is_model_ready(line: &str) -> bool {
    line.trim() == MODEL_READY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listening_roundtrip() {
        let line = listening_line("http://127.0.0.1:49213");
        assert_eq!(parse_listening(&line), Some("http://127.0.0.1:49213"));
    }

    #[test]
    fn test_parse_rejects_other_lines() {
        assert_eq!(parse_listening("starting up"), None);
        assert!(!is_model_ready("MNEMO LISTENING http://x"));
        assert!(is_model_ready("MNEMO MODEL_READY\n"));
    }
}
