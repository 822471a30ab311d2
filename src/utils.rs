use crate::constants::DEFAULT_PORT;
use std::path::PathBuf;

const DEFAULT_UPSTREAM_BASE_URL: &str = "https://query1.finance.yahoo.com";

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173", // Vite dev server
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Get static frontend directory from environment variable or use default
pub fn get_public_dir() -> PathBuf {
    std::env::var("PUBLIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("public"))
}

/// Get upstream API host from environment variable or use default
pub fn get_upstream_base_url() -> String {
    std::env::var("UPSTREAM_BASE_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string())
}

/// Port from `PORT`, falling back to 8080 when unset or unparsable
pub fn get_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Allowed CORS origins from `CORS_ORIGINS` (comma separated)
pub fn get_cors_origins() -> Vec<String> {
    match std::env::var("CORS_ORIGINS") {
        Ok(raw) => parse_origins(&raw),
        Err(_) => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a `YYYY-MM-DD` date argument
pub fn parse_date(s: &str) -> Result<chrono::NaiveDate, String> {
    chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}'. Expected YYYY-MM-DD", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(" https://a.example.com/ ,http://localhost:5173,, ");
        assert_eq!(origins, vec!["https://a.example.com", "http://localhost:5173"]);
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-01").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_date("03/01/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }
}
