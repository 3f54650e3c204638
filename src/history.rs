use std::collections::VecDeque;

use time::{macros::format_description, OffsetDateTime};

use crate::types::ScanHistoryItem;

/// In-memory list of completed scans, newest first, capped at [`ScanHistory::CAPACITY`].
#[derive(Debug, Clone, Default)]
pub struct ScanHistory {
    items: VecDeque<ScanHistoryItem>,
}

impl ScanHistory {
    pub const CAPACITY: usize = 5;

    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a completed scan and drop anything beyond the cap.
    pub fn push(&mut self, item: ScanHistoryItem) {
        self.items.push_front(item);
        self.items.truncate(Self::CAPACITY);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanHistoryItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_vec(&self) -> Vec<ScanHistoryItem> {
        self.items.iter().cloned().collect()
    }
}

/// Short calendar form used by the sidebar, e.g. `Jan 5, 14:32`.
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    let fmt = format_description!("[month repr:short] [day padding:none], [hour]:[minute]");
    ts.format(&fmt)
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn item(n: usize) -> ScanHistoryItem {
        ScanHistoryItem {
            id: n.to_string(),
            domain: format!("d{n}.com"),
            timestamp: OffsetDateTime::UNIX_EPOCH,
            subdomain_count: 10,
        }
    }

    #[test]
    fn keeps_five_newest_first() {
        let mut h = ScanHistory::new();
        for n in 1..=7 {
            h.push(item(n));
        }
        assert_eq!(h.len(), ScanHistory::CAPACITY);
        let ids: Vec<_> = h.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "6", "5", "4", "3"]);
        assert_eq!(h.iter().next().unwrap().domain, "d7.com");
    }

    #[test]
    fn formats_short_timestamp() {
        let ts = datetime!(2024-01-05 14:32:09 UTC);
        assert_eq!(format_timestamp(ts), "Jan 5, 14:32");
        let ts = datetime!(2024-11-23 03:04:00 UTC);
        assert_eq!(format_timestamp(ts), "Nov 23, 03:04");
    }
}
