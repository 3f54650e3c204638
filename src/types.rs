use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One synthetic subdomain discovered by a scan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub subdomain: String,
    pub status: u16,
    pub status_text: String,
}

impl ScanResult {
    pub fn kind(&self) -> StatusKind {
        StatusKind::of(self.status)
    }
}

/// Summary of one completed scan, kept in the dashboard history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryItem {
    pub id: String,
    pub domain: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub subdomain_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    #[default]
    Idle,
    Scanning,
    Complete,
}

/// A toast-style message shown to the user after an action finishes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Coarse HTTP status class used to colour badges.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Success,
    Redirect,
    ClientError,
    ServerError,
    Other,
}

impl StatusKind {
    pub fn of(status: u16) -> Self {
        match status {
            200..=299 => StatusKind::Success,
            300..=399 => StatusKind::Redirect,
            400..=499 => StatusKind::ClientError,
            500..=u16::MAX => StatusKind::ServerError,
            _ => StatusKind::Other,
        }
    }

    /// CSS class suffix used by the dashboard and the report.
    pub fn css_class(self) -> &'static str {
        match self {
            StatusKind::Success => "status-ok",
            StatusKind::Redirect => "status-redirect",
            StatusKind::ClientError => "status-client",
            StatusKind::ServerError => "status-server",
            StatusKind::Other => "status-other",
        }
    }
}

/// Snapshot of the scanner as exposed by `/api/status`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanStatus {
    pub state: ScanPhase,
    pub domain: Option<String>,
    pub progress: u8,
    pub found: usize,
    pub total: usize,
    pub complete: bool,
    pub notice: Option<Notice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_kind_buckets() {
        assert_eq!(StatusKind::of(200), StatusKind::Success);
        assert_eq!(StatusKind::of(301), StatusKind::Redirect);
        assert_eq!(StatusKind::of(403), StatusKind::ClientError);
        assert_eq!(StatusKind::of(500), StatusKind::ServerError);
        assert_eq!(StatusKind::of(102), StatusKind::Other);
    }

    #[test]
    fn result_serializes_camel_case() {
        let r = ScanResult {
            subdomain: "www.example.com".into(),
            status: 200,
            status_text: "OK".into(),
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["statusText"], "OK");
        assert_eq!(v["status"], 200);
    }
}
